use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::GridTimestamp;

/// Sparse, grid-aligned upstream result: slots with no data are simply missing.
pub type SparseSeries = BTreeMap<GridTimestamp, i64>;

/// One point of a served series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub time: GridTimestamp,
    pub value: i64,
}

/// Ordered time series, strictly increasing in time with no duplicate timestamps.
///
/// Serializes as `[{"time": "<RFC3339>", "value": <int64>}, ...]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Series(Vec<SeriesPoint>);

impl Series {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self(Vec::with_capacity(capacity))
    }

    /// Append a point. Callers feed points in grid order.
    pub(crate) fn push(&mut self, time: GridTimestamp, value: i64) {
        debug_assert!(
            self.0.last().map_or(true, |last| last.time < time),
            "series points must be strictly increasing"
        );
        self.0.push(SeriesPoint { time, value });
    }

    /// Concatenate a series that starts after this one ends.
    pub fn append(&mut self, mut later: Series) {
        debug_assert!(
            match (self.0.last(), later.0.first()) {
                (Some(a), Some(b)) => a.time < b.time,
                _ => true,
            },
            "appended series must start after the current one ends"
        );
        self.0.append(&mut later.0);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn points(&self) -> &[SeriesPoint] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SeriesPoint> {
        self.0.iter()
    }

    pub fn value_at(&self, time: GridTimestamp) -> Option<i64> {
        self.0
            .binary_search_by(|p| p.time.cmp(&time))
            .ok()
            .map(|i| self.0[i].value)
    }

    pub fn is_strictly_increasing(&self) -> bool {
        self.0.windows(2).all(|w| w[0].time < w[1].time)
    }
}

impl From<SparseSeries> for Series {
    fn from(sparse: SparseSeries) -> Self {
        Self(
            sparse
                .into_iter()
                .map(|(time, value)| SeriesPoint { time, value })
                .collect(),
        )
    }
}

impl<'a> IntoIterator for &'a Series {
    type Item = &'a SeriesPoint;
    type IntoIter = std::slice::Iter<'a, SeriesPoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
