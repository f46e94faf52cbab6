//! Temporal slot cache with transparent upstream backfill.

pub mod backfill;
pub mod error;
pub mod memory;
pub mod redb_store;
pub mod registry;
pub mod resolver;
pub mod store;

pub use backfill::{classify, BackfillEngine, Classification};
pub use error::CacheError;
pub use memory::MemorySlotStore;
pub use redb_store::RedbSlotStore;
pub use registry::{StoreKey, StoreRegistry};
pub use resolver::{resolve, Resolution};
pub use store::{Slot, SlotStore, StoreError};
