//! Slot store abstraction: one ordered key-value store per (metric, horizon, region).
//!
//! Keys are `region + "_" + RFC3339(ts)`. Values are a decimal integer for a
//! known value and an empty string for a slot that upstream was asked about
//! and had nothing for. A key with no record is [`Slot::Absent`], which is
//! never written.

use std::ops::ControlFlow;
use thiserror::Error;

use crate::domain::{GridTimestamp, Region};

/// Cached state of one grid slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Value(i64),
    KnownEmpty,
    Absent,
}

impl Slot {
    pub fn is_absent(&self) -> bool {
        matches!(self, Slot::Absent)
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("slot store backend failure: {0}")]
    Backend(#[from] redb::Error),

    #[error("slot store I/O failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt slot value {value:?} under key {key}")]
    Corrupt { key: String, value: String },

    #[error("cannot persist an absent slot at {0}")]
    AbsentWrite(GridTimestamp),

    #[error("slot store task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Visitor passed to [`SlotStore::scan`]; return `ControlFlow::Break` to stop early.
pub type SlotVisitor<'a> = dyn FnMut(GridTimestamp, Slot) -> ControlFlow<()> + 'a;

pub trait SlotStore: Send + Sync {
    fn get(&self, ts: GridTimestamp) -> Result<Slot, StoreError>;

    /// Overwrite one slot. Idempotent.
    fn put(&self, ts: GridTimestamp, slot: Slot) -> Result<(), StoreError> {
        self.put_batch(&[(ts, slot)])
    }

    /// Overwrite many slots atomically: either all are written or none.
    fn put_batch(&self, slots: &[(GridTimestamp, Slot)]) -> Result<(), StoreError>;

    /// Visit every grid slot in `[from, to)` in time order, including absent ones.
    fn scan(
        &self,
        from: GridTimestamp,
        to: GridTimestamp,
        visit: &mut SlotVisitor<'_>,
    ) -> Result<(), StoreError>;
}

pub(crate) fn slot_key(region: Region, ts: GridTimestamp) -> String {
    format!("{}_{}", region.as_ref(), ts.to_rfc3339())
}

/// Encoded form of a slot, `None` for [`Slot::Absent`].
pub(crate) fn encode_slot(slot: Slot) -> Option<String> {
    match slot {
        Slot::Value(v) => Some(v.to_string()),
        Slot::KnownEmpty => Some(String::new()),
        Slot::Absent => None,
    }
}

pub(crate) fn decode_slot(key: &str, raw: Option<&str>) -> Result<Slot, StoreError> {
    match raw {
        None => Ok(Slot::Absent),
        Some("") => Ok(Slot::KnownEmpty),
        Some(v) => v.parse::<i64>().map(Slot::Value).map_err(|_| StoreError::Corrupt {
            key: key.to_string(),
            value: v.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_format() {
        let ts = GridTimestamp::parse_rfc3339("2024-01-01T03:15:00Z").unwrap();
        assert_eq!(slot_key(Region::DE, ts), "DE_2024-01-01T03:15:00Z");
        assert_eq!(slot_key(Region::GBNIR, ts), "GBNIR_2024-01-01T03:15:00Z");
    }

    #[test]
    fn test_slot_codec() {
        assert_eq!(encode_slot(Slot::Value(-12)).as_deref(), Some("-12"));
        assert_eq!(encode_slot(Slot::KnownEmpty).as_deref(), Some(""));
        assert_eq!(encode_slot(Slot::Absent), None);

        assert_eq!(decode_slot("k", Some("42")).unwrap(), Slot::Value(42));
        assert_eq!(decode_slot("k", Some("")).unwrap(), Slot::KnownEmpty);
        assert_eq!(decode_slot("k", None).unwrap(), Slot::Absent);
        assert!(matches!(
            decode_slot("k", Some("4.2")),
            Err(StoreError::Corrupt { .. })
        ));
    }
}
