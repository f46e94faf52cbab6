//! Hit/miss resolution of one window against one slot store.
//!
//! The decision is all-or-nothing: a single absent slot makes the whole
//! window a miss, and the window is fetched from upstream in one call. The
//! result of a miss is the cached hits merged with the fetched values, fetched
//! values winning. Every slot of the window is then persisted, so the same
//! window is never fetched twice; slots with neither a cached nor a fetched
//! value become known-empty markers.
//!
//! Store access is synchronous and may touch tens of thousands of keys for a
//! one-year window, so scans and write-backs run on the blocking pool.

use std::future::Future;
use std::ops::ControlFlow;
use std::sync::Arc;
use tracing::{debug, error, info};

use super::error::CacheError;
use super::store::{Slot, SlotStore, StoreError};
use crate::domain::{GridTimestamp, Series, SparseSeries};
use crate::upstream::UpstreamError;

/// Outcome of resolving one window.
#[derive(Debug)]
pub struct Resolution {
    pub series: Series,
    /// Whether upstream was called for this window.
    pub fetched: bool,
    /// Set when the fetched window could not be written back. The series is
    /// still correct; only later requests are affected.
    pub persist_error: Option<StoreError>,
}

/// Cached values up to the first absent slot, and that slot if there is one.
fn scan_window(
    store: &dyn SlotStore,
    from: GridTimestamp,
    to: GridTimestamp,
) -> Result<(SparseSeries, Option<GridTimestamp>), StoreError> {
    let mut cached = SparseSeries::new();
    let mut first_missing = None;
    store.scan(from, to, &mut |ts, slot| {
        if slot.is_absent() {
            first_missing = Some(ts);
            return ControlFlow::Break(());
        }
        if let Slot::Value(v) = slot {
            cached.insert(ts, v);
        }
        ControlFlow::Continue(())
    })?;
    Ok((cached, first_missing))
}

pub async fn resolve<F, Fut>(
    store: Arc<dyn SlotStore>,
    from: GridTimestamp,
    to: GridTimestamp,
    fetch: F,
) -> Result<Resolution, CacheError>
where
    F: FnOnce(GridTimestamp, GridTimestamp) -> Fut,
    Fut: Future<Output = Result<SparseSeries, UpstreamError>>,
{
    let reader = store.clone();
    let (cached, first_missing) =
        tokio::task::spawn_blocking(move || scan_window(reader.as_ref(), from, to))
            .await
            .map_err(StoreError::from)??;

    let Some(first_missing) = first_missing else {
        debug!(%from, %to, points = cached.len(), "window served from cache");
        return Ok(Resolution {
            series: cached.into(),
            fetched: false,
            persist_error: None,
        });
    };

    debug!(%from, %to, %first_missing, "cache miss, fetching whole window");
    let fetched = fetch(from, to).await?;

    let mut series = Series::with_capacity(from.slots_between(to));
    let mut writes = Vec::with_capacity(from.slots_between(to));
    for ts in from.slots_until(to) {
        match fetched.get(&ts).or_else(|| cached.get(&ts)) {
            Some(&value) => {
                series.push(ts, value);
                writes.push((ts, Slot::Value(value)));
            }
            None => writes.push((ts, Slot::KnownEmpty)),
        }
    }

    let slots = writes.len();
    let persist_error = match tokio::task::spawn_blocking(move || store.put_batch(&writes)).await {
        Ok(result) => result.err(),
        Err(e) => Some(StoreError::from(e)),
    };
    match &persist_error {
        Some(e) => error!(error = %e, %from, %to, "failed to persist backfilled window"),
        None => info!(
            %from,
            %to,
            slots,
            values = series.len(),
            "backfilled window"
        ),
    }

    Ok(Resolution {
        series,
        fetched: true,
        persist_error,
    })
}
