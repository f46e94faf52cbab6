//! Fixed 15-minute time grid shared by the slot cache and the upstream adapters.
//!
//! Every persisted or returned timestamp is a [`GridTimestamp`]; there are no
//! sub-grid values anywhere in the cache. "Now" is hour-granular: the
//! historical/forecast split happens on full hours while the cache grid itself
//! stays at 15 minutes.

use chrono::{DateTime, Duration, Months, SecondsFormat, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

/// Width of one grid slot in minutes.
pub const SLOT_MINUTES: i64 = 15;

const SLOT_SECONDS: i64 = SLOT_MINUTES * 60;
const HOUR_SECONDS: i64 = 3600;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GridError {
    #[error("timestamp {0} is not aligned to the 15-minute grid")]
    Unaligned(DateTime<Utc>),

    #[error("invalid RFC3339 timestamp {input:?}: {reason}")]
    Malformed { input: String, reason: String },
}

/// Length of one grid slot.
pub fn slot_duration() -> Duration {
    Duration::minutes(SLOT_MINUTES)
}

/// Truncate an instant to the start of its UTC hour.
pub fn floor_to_hour(t: DateTime<Utc>) -> DateTime<Utc> {
    truncate(t, HOUR_SECONDS)
}

fn truncate(t: DateTime<Utc>, period_seconds: i64) -> DateTime<Utc> {
    let excess = Duration::seconds(t.timestamp().rem_euclid(period_seconds))
        + Duration::nanoseconds(i64::from(t.timestamp_subsec_nanos()));
    t - excess
}

/// An instant aligned to the 15-minute grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GridTimestamp(DateTime<Utc>);

impl GridTimestamp {
    /// Wrap an already aligned instant; unaligned input is rejected.
    pub fn new(t: DateTime<Utc>) -> Result<Self, GridError> {
        if t.timestamp().rem_euclid(SLOT_SECONDS) == 0 && t.timestamp_subsec_nanos() == 0 {
            Ok(Self(t))
        } else {
            Err(GridError::Unaligned(t))
        }
    }

    /// Truncate an arbitrary instant down to its grid slot.
    pub fn floor(t: DateTime<Utc>) -> Self {
        Self(truncate(t, SLOT_SECONDS))
    }

    /// Truncate an arbitrary instant down to the start of its hour.
    pub fn floor_to_hour(t: DateTime<Utc>) -> Self {
        Self(floor_to_hour(t))
    }

    pub fn parse_rfc3339(input: &str) -> Result<Self, GridError> {
        let parsed = DateTime::parse_from_rfc3339(input).map_err(|e| GridError::Malformed {
            input: input.to_string(),
            reason: e.to_string(),
        })?;
        Self::new(parsed.with_timezone(&Utc))
    }

    pub fn as_datetime(&self) -> DateTime<Utc> {
        self.0
    }

    /// The following grid slot (`t + 15min`).
    pub fn next_slot(&self) -> Self {
        Self(self.0 + slot_duration())
    }

    /// Same instant one calendar year later, clamped to the end of shorter months.
    ///
    /// Minutes and seconds are untouched, so the result stays on the grid.
    pub fn add_calendar_year(&self) -> Option<Self> {
        self.0.checked_add_months(Months::new(12)).map(Self)
    }

    /// Iterate all grid slots in `[self, end)`.
    pub fn slots_until(self, end: GridTimestamp) -> SlotIter {
        SlotIter { next: self, end }
    }

    /// Number of grid slots in `[self, end)`, zero when `end <= self`.
    pub fn slots_between(self, end: GridTimestamp) -> usize {
        let seconds = (end.0 - self.0).num_seconds();
        if seconds <= 0 {
            0
        } else {
            (seconds / SLOT_SECONDS) as usize
        }
    }

    /// RFC3339 with second precision and a `Z` suffix, e.g. `2024-01-01T03:15:00Z`.
    pub fn to_rfc3339(&self) -> String {
        self.0.to_rfc3339_opts(SecondsFormat::Secs, true)
    }
}

impl fmt::Display for GridTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_rfc3339())
    }
}

impl TryFrom<DateTime<Utc>> for GridTimestamp {
    type Error = GridError;

    fn try_from(t: DateTime<Utc>) -> Result<Self, Self::Error> {
        Self::new(t)
    }
}

impl From<GridTimestamp> for DateTime<Utc> {
    fn from(t: GridTimestamp) -> Self {
        t.0
    }
}

impl Serialize for GridTimestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_rfc3339())
    }
}

impl<'de> Deserialize<'de> for GridTimestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse_rfc3339(&raw).map_err(serde::de::Error::custom)
    }
}

/// Iterator over consecutive grid slots in a half-open range.
#[derive(Debug, Clone)]
pub struct SlotIter {
    next: GridTimestamp,
    end: GridTimestamp,
}

impl Iterator for SlotIter {
    type Item = GridTimestamp;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.end {
            return None;
        }
        let current = self.next;
        self.next = current.next_slot();
        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.next.slots_between(self.end);
        (remaining, Some(remaining))
    }
}

/// Source of the hour-granular "now" used to split history from forecast.
pub trait Clock: Send + Sync {
    fn now(&self) -> GridTimestamp;
}

/// Wall clock, floored to the hour.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> GridTimestamp {
        GridTimestamp::floor_to_hour(Utc::now())
    }
}

/// Manually driven clock for replays and tests.
#[derive(Debug)]
pub struct FixedClock {
    now: RwLock<GridTimestamp>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: RwLock::new(GridTimestamp::floor_to_hour(now)),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.write() = GridTimestamp::floor_to_hour(now);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> GridTimestamp {
        *self.now.read()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    #[rstest]
    #[case(utc(2024, 1, 1, 3, 0, 0), true)]
    #[case(utc(2024, 1, 1, 3, 45, 0), true)]
    #[case(utc(2024, 1, 1, 3, 7, 0), false)]
    #[case(utc(2024, 1, 1, 3, 15, 1), false)]
    fn test_alignment(#[case] t: DateTime<Utc>, #[case] aligned: bool) {
        assert_eq!(GridTimestamp::new(t).is_ok(), aligned);
    }

    #[test]
    fn test_floor_and_hour_floor() {
        let t = utc(2024, 3, 5, 17, 44, 59) + Duration::milliseconds(250);
        assert_eq!(GridTimestamp::floor(t).as_datetime(), utc(2024, 3, 5, 17, 30, 0));
        assert_eq!(floor_to_hour(t), utc(2024, 3, 5, 17, 0, 0));
        assert_eq!(GridTimestamp::floor_to_hour(t).as_datetime(), utc(2024, 3, 5, 17, 0, 0));
    }

    #[test]
    fn test_next_slot_and_iteration() {
        let start = GridTimestamp::new(utc(2024, 1, 1, 23, 30, 0)).unwrap();
        let end = GridTimestamp::new(utc(2024, 1, 2, 0, 15, 0)).unwrap();
        let slots: Vec<_> = start.slots_until(end).map(|t| t.to_rfc3339()).collect();
        assert_eq!(
            slots,
            vec!["2024-01-01T23:30:00Z", "2024-01-01T23:45:00Z", "2024-01-02T00:00:00Z"]
        );
        assert_eq!(start.slots_between(end), 3);
        assert_eq!(end.slots_between(start), 0);
    }

    #[test]
    fn test_calendar_year_clamps_leap_day() {
        let leap = GridTimestamp::new(utc(2024, 2, 29, 12, 15, 0)).unwrap();
        let next = leap.add_calendar_year().unwrap();
        assert_eq!(next.as_datetime(), utc(2025, 2, 28, 12, 15, 0));
    }

    #[test]
    fn test_rfc3339_roundtrip_through_serde() {
        let t = GridTimestamp::parse_rfc3339("2024-01-01T01:00:00+01:00").unwrap();
        assert_eq!(t.to_rfc3339(), "2024-01-01T00:00:00Z");
        let json = serde_json::to_string(&t).unwrap();
        assert_eq!(json, "\"2024-01-01T00:00:00Z\"");
        assert!(serde_json::from_str::<GridTimestamp>("\"2024-01-01T00:05:00Z\"").is_err());
    }

    #[test]
    fn test_fixed_clock_floors_to_hour() {
        let clock = FixedClock::new(utc(2024, 6, 1, 10, 59, 0));
        assert_eq!(clock.now().as_datetime(), utc(2024, 6, 1, 10, 0, 0));
        clock.set(utc(2024, 6, 1, 11, 1, 0));
        assert_eq!(clock.now().as_datetime(), utc(2024, 6, 1, 11, 0, 0));
    }
}
