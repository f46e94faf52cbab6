//! Multi-window orchestration on top of the range resolver.
//!
//! A request is cut into consecutive windows of at most one calendar year.
//! Each window is classified against the hour-granular "now": windows in the
//! past are served from the history store, windows in the future from the
//! forecast store, and a window straddling "now" is clipped so its past part
//! goes to history while the loop resumes at "now" with a forecast window.
//! Windows are resolved sequentially, so a request has at most one upstream
//! fetch in flight.

use std::sync::Arc;
use tracing::{debug, instrument, warn};

use super::error::CacheError;
use super::registry::{StoreKey, StoreRegistry};
use super::resolver::resolve;
use crate::domain::{Clock, GridTimestamp, Horizon, Metric, Region, Series};
use crate::upstream::UpstreamSource;

/// Position of a window relative to "now".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// The window lies entirely before "now" and ends at the given instant.
    HistoricalOnly(GridTimestamp),
    /// The window starts at or after "now".
    ForecastOnly,
    /// The window contains "now": history up to the first instant, forecast from the second.
    Split(GridTimestamp, GridTimestamp),
}

pub fn classify(start: GridTimestamp, end: GridTimestamp, now: GridTimestamp) -> Classification {
    if start >= now {
        Classification::ForecastOnly
    } else if end <= now {
        Classification::HistoricalOnly(end)
    } else {
        Classification::Split(now, now)
    }
}

/// End of the window starting at `start`: one calendar year later, capped at `to`.
pub fn window_end(start: GridTimestamp, to: GridTimestamp) -> GridTimestamp {
    start
        .add_calendar_year()
        .filter(|end| *end < to)
        .unwrap_or(to)
}

pub struct BackfillEngine {
    registry: Arc<StoreRegistry>,
    source: Arc<dyn UpstreamSource>,
    clock: Arc<dyn Clock>,
}

impl BackfillEngine {
    pub fn new(
        registry: Arc<StoreRegistry>,
        source: Arc<dyn UpstreamSource>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            registry,
            source,
            clock,
        }
    }

    /// Current hour according to the engine's clock.
    pub fn now(&self) -> GridTimestamp {
        self.clock.now()
    }

    /// Ordered series for `[from, to)`, served from cache and backfilled from upstream.
    #[instrument(skip_all, fields(metric = %metric, region = %region, from = %from, to = %to))]
    pub async fn get_series(
        &self,
        metric: Metric,
        region: Region,
        from: GridTimestamp,
        to: GridTimestamp,
    ) -> Result<Series, CacheError> {
        if to <= from {
            return Err(CacheError::InvalidRange { from, to });
        }

        let mut out = Series::with_capacity(from.slots_between(to));
        let mut fetched_windows = 0usize;
        let mut start = from;
        while start < to {
            let end = window_end(start, to);
            let now = self.clock.now();
            let (horizon, end) = match classify(start, end, now) {
                Classification::ForecastOnly => (Horizon::Forecast, end),
                Classification::HistoricalOnly(end) => (Horizon::History, end),
                Classification::Split(historical_end, _) => (Horizon::History, historical_end),
            };

            let key = StoreKey::new(metric, horizon, region);
            let store = self
                .registry
                .get(&key)
                .ok_or(CacheError::UnknownStore(key))?;

            debug!(store = %key, %start, %end, "resolving window");
            let source = self.source.as_ref();
            let resolution = resolve(store, start, end, |f, t| async move {
                match horizon {
                    Horizon::History => source.fetch_history(metric, region, f, t).await,
                    Horizon::Forecast => source.fetch_forecast(metric, region, f, t).await,
                }
            })
            .await?;

            if resolution.fetched {
                fetched_windows += 1;
            }
            if let Some(e) = &resolution.persist_error {
                warn!(error = %e, store = %key, %start, %end, "window served uncached, next request refetches it");
            }
            out.append(resolution.series);
            start = end;
        }

        debug!(points = out.len(), fetched_windows, "series assembled");
        Ok(out)
    }
}
