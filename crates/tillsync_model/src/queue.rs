//! Sync queue items.

use crate::record::{record_id, Record};
use crate::table::Table;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Kind of queued mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueOperation {
    /// Insert or replace the row by primary key.
    Upsert,
    /// Delete the row (soft or hard, see [`Table::delete_policy`]).
    Delete,
}

impl QueueOperation {
    /// Returns the lowercase name used on the wire and in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            QueueOperation::Upsert => "upsert",
            QueueOperation::Delete => "delete",
        }
    }
}

/// A single pending local mutation.
///
/// The queue is replayed in insertion order; `created_at` records when the
/// mutation happened and `synced` is flipped once the remote accepted it.
///
/// # Fields
///
/// - `id`: identifier of the queue entry, not of the entity
/// - `store_name`: target table
/// - `operation`: upsert or delete
/// - `data`: the full row for upserts, at least `{"id": ...}` for deletes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncQueueItem {
    /// Queue entry ID.
    pub id: Uuid,
    /// Target table.
    pub store_name: Table,
    /// Operation type.
    pub operation: QueueOperation,
    /// Row payload.
    pub data: Record,
    /// Insertion time.
    pub created_at: DateTime<Utc>,
    /// Whether the remote has applied this item.
    pub synced: bool,
}

impl SyncQueueItem {
    /// Creates an unsynced upsert of `record` into `table`.
    pub fn upsert(table: Table, record: Record) -> Self {
        Self {
            id: Uuid::new_v4(),
            store_name: table,
            operation: QueueOperation::Upsert,
            data: record,
            created_at: Utc::now(),
            synced: false,
        }
    }

    /// Creates an unsynced delete of entity `id` from `table`.
    pub fn delete(table: Table, id: &str) -> Self {
        let mut data = Record::new();
        data.insert("id".into(), Value::String(id.to_string()));
        Self {
            id: Uuid::new_v4(),
            store_name: table,
            operation: QueueOperation::Delete,
            data,
            created_at: Utc::now(),
            synced: false,
        }
    }

    /// Returns the ID of the entity this item touches.
    pub fn entity_id(&self) -> Option<&str> {
        record_id(&self.data)
    }

    /// Marks this item as applied remotely.
    pub fn mark_synced(&mut self) {
        self.synced = true;
    }
}
