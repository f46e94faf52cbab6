//! Upstream metering data sources.
//!
//! The cache core only depends on [`UpstreamSource`]; transport, auth and the
//! provider document format live behind it.

pub mod http;
pub mod normalize;

pub use http::HttpUpstream;
pub use normalize::{normalize, ParseError, ProviderDocument, ProviderPoint};

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{GridTimestamp, Metric, Region, SparseSeries};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UpstreamError {
    /// Worth retrying later: timeouts, connection failures, 429 and 5xx.
    #[error("transient upstream failure: {0}")]
    Transient(String),

    /// Retrying the same request will not help.
    #[error("upstream rejected request: {0}")]
    Permanent(String),
}

impl UpstreamError {
    pub fn is_transient(&self) -> bool {
        matches!(self, UpstreamError::Transient(_))
    }
}

/// Provider of measured and forecast series, normalized to the 15-minute grid.
///
/// Both calls return a sparse map over `[from, to)`: instants the provider has
/// no data for are omitted. Implementations do not retry.
#[async_trait]
pub trait UpstreamSource: Send + Sync {
    async fn fetch_history(
        &self,
        metric: Metric,
        region: Region,
        from: GridTimestamp,
        to: GridTimestamp,
    ) -> Result<SparseSeries, UpstreamError>;

    async fn fetch_forecast(
        &self,
        metric: Metric,
        region: Region,
        from: GridTimestamp,
        to: GridTimestamp,
    ) -> Result<SparseSeries, UpstreamError>;
}
