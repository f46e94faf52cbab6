use thiserror::Error;

use super::registry::StoreKey;
use super::store::StoreError;
use crate::domain::GridTimestamp;
use crate::upstream::UpstreamError;

/// Failure of a cached series lookup. Any of these aborts the whole request.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("invalid range: 'to' ({to}) must be after 'from' ({from})")]
    InvalidRange {
        from: GridTimestamp,
        to: GridTimestamp,
    },

    #[error("slot store unavailable: {0}")]
    Storage(#[from] StoreError),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error("no slot store registered for {0}")]
    UnknownStore(StoreKey),
}
