//! Local store trait definition.

use crate::error::StoreResult;
use std::collections::HashSet;
use tillsync_model::{Record, SyncQueueItem, Table};
use uuid::Uuid;

/// Durable per-table storage plus the pending-operations log.
///
/// # Invariants
///
/// - `save` and `delete` append exactly one queue item before returning
/// - `apply_remote` never appends to the queue
/// - `sync_queue` returns unsynced items in insertion order
/// - Stores must be `Send + Sync`; the engine and the façade share one store
///
/// # Implementors
///
/// - [`super::MemoryStore`] - For testing
/// - [`super::FileStore`] - For persistent storage
pub trait LocalStore: Send + Sync {
    /// Returns the row with `id` in `table`.
    fn get(&self, table: Table, id: &str) -> StoreResult<Option<Record>>;

    /// Returns every row of `table`, ordered by ID.
    fn get_all(&self, table: Table) -> StoreResult<Vec<Record>>;

    /// Inserts or replaces `record` and queues an upsert.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::MissingId`](crate::StoreError::MissingId) if the
    /// record has no `id`, or an I/O error from a persistent store.
    fn save(&self, table: Table, record: Record) -> StoreResult<SyncQueueItem>;

    /// Deletes the row per the table's delete policy and queues a delete.
    ///
    /// Soft-deleted tables keep the row with its active flag cleared. The
    /// delete is queued even if the row is not present locally.
    fn delete(&self, table: Table, id: &str) -> StoreResult<SyncQueueItem>;

    /// Writes rows fetched from the remote, overwriting local copies.
    ///
    /// Rows without an `id` are skipped. Returns the number written.
    fn apply_remote(&self, table: Table, rows: Vec<Record>) -> StoreResult<usize>;

    /// Returns unsynced queue items in FIFO order.
    fn sync_queue(&self) -> StoreResult<Vec<SyncQueueItem>>;

    /// Marks a queue item as applied remotely.
    fn mark_synced(&self, queue_id: Uuid) -> StoreResult<()>;

    /// Returns the IDs of entities in `table` with unsynced queue items.
    fn pending_ids(&self, table: Table) -> StoreResult<HashSet<String>>;

    /// Drops synced queue items. Returns how many were removed.
    fn compact_queue(&self) -> StoreResult<usize>;
}
