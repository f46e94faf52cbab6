#![allow(dead_code)]
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::sync::Arc;

use energy_forecast::cache::{BackfillEngine, StoreRegistry};
use energy_forecast::domain::{FixedClock, GridTimestamp, Metric, Region, SparseSeries};
use energy_forecast::upstream::{UpstreamError, UpstreamSource};

pub type Window = (GridTimestamp, GridTimestamp);

pub fn ts(s: &str) -> GridTimestamp {
    GridTimestamp::parse_rfc3339(s).unwrap()
}

pub fn utc(s: &str) -> DateTime<Utc> {
    ts(s).as_datetime()
}

pub const FORECAST_OFFSET: i64 = 10_000_000;

/// Deterministic value for a slot: measured values count quarter hours since
/// the epoch, forecast values are shifted so the two are distinguishable.
pub fn history_value(t: GridTimestamp) -> i64 {
    t.as_datetime().timestamp() / 900 % 1_000_000
}

pub fn forecast_value(t: GridTimestamp) -> i64 {
    history_value(t) + FORECAST_OFFSET
}

/// Upstream double that records every call and answers from a fixed formula.
#[derive(Default)]
pub struct ScriptedUpstream {
    pub history_calls: Mutex<Vec<Window>>,
    pub forecast_calls: Mutex<Vec<Window>>,
    omit: Vec<GridTimestamp>,
    fail_from: Option<(GridTimestamp, UpstreamError)>,
}

impl ScriptedUpstream {
    pub fn new() -> Self {
        Self::default()
    }

    /// Leave these instants out of every response.
    pub fn omitting(mut self, omit: &[GridTimestamp]) -> Self {
        self.omit = omit.to_vec();
        self
    }

    /// Fail every call whose window starts at or after `from`.
    pub fn failing_from(mut self, from: GridTimestamp, err: UpstreamError) -> Self {
        self.fail_from = Some((from, err));
        self
    }

    pub fn total_calls(&self) -> usize {
        self.history_calls.lock().len() + self.forecast_calls.lock().len()
    }

    fn answer(
        &self,
        from: GridTimestamp,
        to: GridTimestamp,
        value: fn(GridTimestamp) -> i64,
    ) -> Result<SparseSeries, UpstreamError> {
        if let Some((fail_from, err)) = &self.fail_from {
            if from >= *fail_from {
                return Err(err.clone());
            }
        }
        Ok(from
            .slots_until(to)
            .filter(|t| !self.omit.contains(t))
            .map(|t| (t, value(t)))
            .collect())
    }
}

#[async_trait]
impl UpstreamSource for ScriptedUpstream {
    async fn fetch_history(
        &self,
        _metric: Metric,
        _region: Region,
        from: GridTimestamp,
        to: GridTimestamp,
    ) -> Result<SparseSeries, UpstreamError> {
        self.history_calls.lock().push((from, to));
        self.answer(from, to, history_value)
    }

    async fn fetch_forecast(
        &self,
        _metric: Metric,
        _region: Region,
        from: GridTimestamp,
        to: GridTimestamp,
    ) -> Result<SparseSeries, UpstreamError> {
        self.forecast_calls.lock().push((from, to));
        self.answer(from, to, forecast_value)
    }
}

pub struct Harness {
    pub engine: BackfillEngine,
    pub registry: Arc<StoreRegistry>,
    pub upstream: Arc<ScriptedUpstream>,
    pub clock: Arc<FixedClock>,
}

pub fn harness(upstream: ScriptedUpstream, now: &str) -> Harness {
    harness_with_registry(upstream, now, StoreRegistry::in_memory())
}

pub fn harness_with_registry(upstream: ScriptedUpstream, now: &str, registry: StoreRegistry) -> Harness {
    let registry = Arc::new(registry);
    let upstream = Arc::new(upstream);
    let clock = Arc::new(FixedClock::new(utc(now)));
    let engine = BackfillEngine::new(registry.clone(), upstream.clone(), clock.clone());
    Harness {
        engine,
        registry,
        upstream,
        clock,
    }
}
