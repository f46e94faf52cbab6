//! On-disk slot store backed by redb.
//!
//! One database file holds every region of one (metric, horizon) pair; a
//! [`RedbSlotStore`] is a cheap handle that pins the region prefix.

use redb::{Database, ReadableTable, TableDefinition};
use std::ops::ControlFlow;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

use super::store::{decode_slot, encode_slot, slot_key, Slot, SlotStore, SlotVisitor, StoreError};
use crate::domain::{GridTimestamp, Region};

const SLOTS: TableDefinition<&str, &str> = TableDefinition::new("slots");

fn backend<E: Into<redb::Error>>(err: E) -> StoreError {
    StoreError::Backend(err.into())
}

/// Open (or create) a slot database and make sure the slot table exists.
pub fn open_database(path: &Path) -> Result<Arc<Database>, StoreError> {
    let db = Database::create(path).map_err(backend)?;
    let txn = db.begin_write().map_err(backend)?;
    txn.open_table(SLOTS).map_err(backend)?;
    txn.commit().map_err(backend)?;
    debug!(path = %path.display(), "opened slot database");
    Ok(Arc::new(db))
}

#[derive(Clone)]
pub struct RedbSlotStore {
    db: Arc<Database>,
    region: Region,
}

impl RedbSlotStore {
    pub fn new(db: Arc<Database>, region: Region) -> Self {
        Self { db, region }
    }
}

impl SlotStore for RedbSlotStore {
    fn get(&self, ts: GridTimestamp) -> Result<Slot, StoreError> {
        let key = slot_key(self.region, ts);
        let txn = self.db.begin_read().map_err(backend)?;
        let table = txn.open_table(SLOTS).map_err(backend)?;
        let raw = table.get(key.as_str()).map_err(backend)?;
        decode_slot(&key, raw.as_ref().map(|guard| guard.value()))
    }

    fn put_batch(&self, batch: &[(GridTimestamp, Slot)]) -> Result<(), StoreError> {
        let mut encoded = Vec::with_capacity(batch.len());
        for (ts, slot) in batch {
            let value = encode_slot(*slot).ok_or(StoreError::AbsentWrite(*ts))?;
            encoded.push((slot_key(self.region, *ts), value));
        }

        let txn = self.db.begin_write().map_err(backend)?;
        {
            let mut table = txn.open_table(SLOTS).map_err(backend)?;
            for (key, value) in &encoded {
                table.insert(key.as_str(), value.as_str()).map_err(backend)?;
            }
        }
        txn.commit().map_err(backend)?;
        Ok(())
    }

    fn scan(
        &self,
        from: GridTimestamp,
        to: GridTimestamp,
        visit: &mut SlotVisitor<'_>,
    ) -> Result<(), StoreError> {
        let txn = self.db.begin_read().map_err(backend)?;
        let table = txn.open_table(SLOTS).map_err(backend)?;
        for ts in from.slots_until(to) {
            let key = slot_key(self.region, ts);
            let raw = table.get(key.as_str()).map_err(backend)?;
            let slot = decode_slot(&key, raw.as_ref().map(|guard| guard.value()))?;
            if let ControlFlow::Break(()) = visit(ts, slot) {
                break;
            }
        }
        Ok(())
    }
}
