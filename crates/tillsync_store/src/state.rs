//! In-memory store state shared by every store implementation.

use crate::error::{StoreError, StoreResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use tillsync_model::{record_id, DeletePolicy, Record, SyncQueueItem, Table};
use uuid::Uuid;

/// Pending and synced queue item counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QueueCounts {
    /// Items not yet applied remotely.
    pub pending: usize,
    /// Items applied remotely but not compacted.
    pub synced: usize,
}

/// Rows per table and the sync queue.
///
/// This is also the on-disk snapshot format of [`crate::FileStore`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreState {
    tables: BTreeMap<Table, BTreeMap<String, Record>>,
    queue: Vec<SyncQueueItem>,
}

impl StoreState {
    /// Creates an empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the row with `id` in `table`.
    pub fn get(&self, table: Table, id: &str) -> Option<Record> {
        self.tables.get(&table).and_then(|rows| rows.get(id)).cloned()
    }

    /// Returns every row of `table`, ordered by ID.
    pub fn get_all(&self, table: Table) -> Vec<Record> {
        self.tables
            .get(&table)
            .map(|rows| rows.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Upserts a row and appends the matching queue item.
    pub fn save(&mut self, table: Table, record: Record) -> StoreResult<SyncQueueItem> {
        let id = record_id(&record)
            .ok_or(StoreError::MissingId { table })?
            .to_string();
        self.tables
            .entry(table)
            .or_default()
            .insert(id, record.clone());

        let item = SyncQueueItem::upsert(table, record);
        self.queue.push(item.clone());
        Ok(item)
    }

    /// Deletes a row per the table's policy and appends the matching queue item.
    pub fn delete(&mut self, table: Table, id: &str) -> SyncQueueItem {
        let rows = self.tables.entry(table).or_default();
        match table.delete_policy() {
            DeletePolicy::Soft { flag } => {
                if let Some(row) = rows.get_mut(id) {
                    row.insert(flag.to_string(), Value::Bool(false));
                }
            }
            DeletePolicy::Hard => {
                rows.remove(id);
            }
        }

        let item = SyncQueueItem::delete(table, id);
        self.queue.push(item.clone());
        item
    }

    /// Overwrites local rows with remote ones, skipping rows without an ID.
    pub fn apply_remote(&mut self, table: Table, rows: Vec<Record>) -> usize {
        let local = self.tables.entry(table).or_default();
        let mut written = 0;
        for row in rows {
            if let Some(id) = record_id(&row).map(str::to_string) {
                local.insert(id, row);
                written += 1;
            }
        }
        written
    }

    /// Returns unsynced queue items in insertion order.
    pub fn pending(&self) -> Vec<SyncQueueItem> {
        self.queue.iter().filter(|item| !item.synced).cloned().collect()
    }

    /// Returns every queue item, synced or not, in insertion order.
    pub fn queue(&self) -> &[SyncQueueItem] {
        &self.queue
    }

    /// Marks a queue item as synced.
    pub fn mark_synced(&mut self, queue_id: Uuid) -> StoreResult<()> {
        self.queue
            .iter_mut()
            .find(|item| item.id == queue_id)
            .map(SyncQueueItem::mark_synced)
            .ok_or(StoreError::UnknownQueueItem(queue_id))
    }

    /// Returns the IDs of entities in `table` with unsynced queue items.
    pub fn pending_ids(&self, table: Table) -> HashSet<String> {
        self.queue
            .iter()
            .filter(|item| !item.synced && item.store_name == table)
            .filter_map(|item| item.entity_id().map(str::to_string))
            .collect()
    }

    /// Drops synced queue items.
    pub fn compact(&mut self) -> usize {
        let before = self.queue.len();
        self.queue.retain(|item| !item.synced);
        before - self.queue.len()
    }

    /// Returns the number of rows per table, for every synchronized table.
    pub fn row_counts(&self) -> Vec<(Table, usize)> {
        Table::ALL
            .into_iter()
            .map(|table| (table, self.tables.get(&table).map_or(0, BTreeMap::len)))
            .collect()
    }

    /// Returns pending and synced queue counts.
    pub fn queue_counts(&self) -> QueueCounts {
        let pending = self.queue.iter().filter(|item| !item.synced).count();
        QueueCounts {
            pending,
            synced: self.queue.len() - pending,
        }
    }
}
