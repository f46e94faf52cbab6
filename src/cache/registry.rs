use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use strum::IntoEnumIterator;
use tracing::info;

use super::memory::MemorySlotStore;
use super::redb_store::{open_database, RedbSlotStore};
use super::store::{SlotStore, StoreError};
use crate::domain::{Horizon, Metric, Region};

/// Identity of one independent slot store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StoreKey {
    pub metric: Metric,
    pub horizon: Horizon,
    pub region: Region,
}

impl StoreKey {
    pub fn new(metric: Metric, horizon: Horizon, region: Region) -> Self {
        Self {
            metric,
            horizon,
            region,
        }
    }

    /// Every (metric, horizon, region) combination the service serves.
    pub fn all() -> impl Iterator<Item = StoreKey> {
        Metric::all().into_iter().flat_map(|metric| {
            Horizon::iter().flat_map(move |horizon| {
                Region::iter().map(move |region| StoreKey::new(metric, horizon, region))
            })
        })
    }
}

impl fmt::Display for StoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.metric.store_name(self.horizon), self.region)
    }
}

/// Mapping from store identity to store handle, built once at startup.
#[derive(Default, Clone)]
pub struct StoreRegistry {
    stores: HashMap<StoreKey, Arc<dyn SlotStore>>,
}

impl StoreRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with a fresh in-memory store for every key.
    pub fn in_memory() -> Self {
        let mut registry = Self::new();
        for key in StoreKey::all() {
            registry.insert(key, Arc::new(MemorySlotStore::new(key.region)));
        }
        registry
    }

    /// Registry backed by one redb file per (metric, horizon) under `dir`.
    pub fn open_redb(dir: &Path) -> Result<Self, StoreError> {
        std::fs::create_dir_all(dir)?;
        let mut registry = Self::new();
        for metric in Metric::all() {
            for horizon in Horizon::iter() {
                let path = dir.join(format!("{}.redb", metric.store_name(horizon)));
                let db = open_database(&path)?;
                for region in Region::iter() {
                    registry.insert(
                        StoreKey::new(metric, horizon, region),
                        Arc::new(RedbSlotStore::new(db.clone(), region)),
                    );
                }
            }
        }
        info!(dir = %dir.display(), stores = registry.len(), "slot stores opened");
        Ok(registry)
    }

    pub fn insert(&mut self, key: StoreKey, store: Arc<dyn SlotStore>) {
        self.stores.insert(key, store);
    }

    pub fn get(&self, key: &StoreKey) -> Option<Arc<dyn SlotStore>> {
        self.stores.get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.stores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stores.is_empty()
    }
}
