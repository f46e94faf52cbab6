use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::ops::ControlFlow;

use super::store::{decode_slot, encode_slot, slot_key, Slot, SlotStore, SlotVisitor, StoreError};
use crate::domain::{GridTimestamp, Region};

/// Process-local slot store. Contents are lost on restart.
#[derive(Debug)]
pub struct MemorySlotStore {
    region: Region,
    slots: RwLock<BTreeMap<String, String>>,
}

impl MemorySlotStore {
    pub fn new(region: Region) -> Self {
        Self {
            region,
            slots: RwLock::new(BTreeMap::new()),
        }
    }

    /// Number of persisted slots, values and known-empty markers alike.
    pub fn len(&self) -> usize {
        self.slots.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SlotStore for MemorySlotStore {
    fn get(&self, ts: GridTimestamp) -> Result<Slot, StoreError> {
        let key = slot_key(self.region, ts);
        let slots = self.slots.read();
        decode_slot(&key, slots.get(&key).map(String::as_str))
    }

    fn put_batch(&self, batch: &[(GridTimestamp, Slot)]) -> Result<(), StoreError> {
        let mut encoded = Vec::with_capacity(batch.len());
        for (ts, slot) in batch {
            let value = encode_slot(*slot).ok_or(StoreError::AbsentWrite(*ts))?;
            encoded.push((slot_key(self.region, *ts), value));
        }
        self.slots.write().extend(encoded);
        Ok(())
    }

    fn scan(
        &self,
        from: GridTimestamp,
        to: GridTimestamp,
        visit: &mut SlotVisitor<'_>,
    ) -> Result<(), StoreError> {
        let slots = self.slots.read();
        for ts in from.slots_until(to) {
            let key = slot_key(self.region, ts);
            let slot = decode_slot(&key, slots.get(&key).map(String::as_str))?;
            if let ControlFlow::Break(()) = visit(ts, slot) {
                break;
            }
        }
        Ok(())
    }
}
