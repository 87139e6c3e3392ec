//! In-memory local store for testing.

use crate::error::StoreResult;
use crate::state::StoreState;
use crate::store::LocalStore;
use parking_lot::RwLock;
use std::collections::HashSet;
use tillsync_model::{Record, SyncQueueItem, Table};
use uuid::Uuid;

/// An in-memory local store.
///
/// This store keeps all rows and the sync queue in memory and is suitable for:
/// - Unit tests
/// - Integration tests
/// - Sessions that don't need persistence
///
/// # Thread Safety
///
/// This store is thread-safe and can be shared across threads.
///
/// # Example
///
/// ```rust
/// use tillsync_model::Table;
/// use tillsync_store::{LocalStore, MemoryStore};
///
/// let store = MemoryStore::new();
/// store.delete(Table::Categories, "c1").unwrap();
/// assert_eq!(store.sync_queue().unwrap().len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<StoreState>,
}

impl MemoryStore {
    /// Creates a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store with pre-existing state.
    #[must_use]
    pub fn with_state(state: StoreState) -> Self {
        Self {
            state: RwLock::new(state),
        }
    }

    /// Returns a copy of the full state, including synced queue items.
    #[must_use]
    pub fn snapshot(&self) -> StoreState {
        self.state.read().clone()
    }
}

impl LocalStore for MemoryStore {
    fn get(&self, table: Table, id: &str) -> StoreResult<Option<Record>> {
        Ok(self.state.read().get(table, id))
    }

    fn get_all(&self, table: Table) -> StoreResult<Vec<Record>> {
        Ok(self.state.read().get_all(table))
    }

    fn save(&self, table: Table, record: Record) -> StoreResult<SyncQueueItem> {
        self.state.write().save(table, record)
    }

    fn delete(&self, table: Table, id: &str) -> StoreResult<SyncQueueItem> {
        Ok(self.state.write().delete(table, id))
    }

    fn apply_remote(&self, table: Table, rows: Vec<Record>) -> StoreResult<usize> {
        Ok(self.state.write().apply_remote(table, rows))
    }

    fn sync_queue(&self) -> StoreResult<Vec<SyncQueueItem>> {
        Ok(self.state.read().pending())
    }

    fn mark_synced(&self, queue_id: Uuid) -> StoreResult<()> {
        self.state.write().mark_synced(queue_id)
    }

    fn pending_ids(&self, table: Table) -> StoreResult<HashSet<String>> {
        Ok(self.state.read().pending_ids(table))
    }

    fn compact_queue(&self) -> StoreResult<usize> {
        Ok(self.state.write().compact())
    }
}
