//! Remote service abstraction.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use thiserror::Error;
use tillsync_model::{record_id, Record, Table};
use tokio::sync::Semaphore;

/// Result type for remote calls.
pub type RemoteResult<T> = Result<T, RemoteError>;

/// Errors returned by a remote service.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RemoteError {
    /// The service answered with a non-success status.
    #[error("remote returned status {status}: {message}")]
    Status {
        /// HTTP-style status code.
        status: u16,
        /// Response body or reason.
        message: String,
    },

    /// The request never produced a response.
    #[error("transport error: {0}")]
    Transport(String),

    /// The request body could not be encoded.
    #[error("encode error: {0}")]
    Encode(String),

    /// The response could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),
}

impl RemoteError {
    /// Creates a status error.
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: message.into(),
        }
    }

    /// Returns true if the call can be retried as-is.
    pub fn is_retryable(&self) -> bool {
        match self {
            RemoteError::Transport(_) => true,
            RemoteError::Status { status, .. } => matches!(status, 408 | 429 | 500..=599),
            RemoteError::Encode(_) | RemoteError::Decode(_) => false,
        }
    }
}

/// Per-table query/update API of the remote service.
///
/// This trait abstracts the network layer, allowing for different
/// implementations (REST, in-memory for testing, etc.).
#[async_trait]
pub trait RemoteService: Send + Sync {
    /// Inserts or replaces `rows` by primary key.
    async fn upsert(&self, table: Table, rows: Vec<Record>) -> RemoteResult<()>;

    /// Applies `patch` to the row with `id`.
    async fn update(&self, table: Table, id: &str, patch: Record) -> RemoteResult<()>;

    /// Removes the row with `id`.
    async fn delete(&self, table: Table, id: &str) -> RemoteResult<()>;

    /// Returns every row of `table`.
    async fn select_all(&self, table: Table) -> RemoteResult<Vec<Record>>;
}

/// A call observed by [`MemoryRemote`].
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteCall {
    /// `upsert` with the IDs of the rows sent.
    Upsert {
        /// Target table.
        table: Table,
        /// Row IDs, in request order.
        ids: Vec<String>,
    },
    /// `update` of one row.
    Update {
        /// Target table.
        table: Table,
        /// Row ID.
        id: String,
        /// Patch applied.
        patch: Record,
    },
    /// `delete` of one row.
    Delete {
        /// Target table.
        table: Table,
        /// Row ID.
        id: String,
    },
    /// `select_all` of a table.
    SelectAll {
        /// Target table.
        table: Table,
    },
}

/// An in-memory remote for testing.
///
/// Keeps rows per table, records every call in order, can be told to fail
/// all calls touching a table, and can hold calls at a gate so a test can
/// observe an operation while it is in flight.
#[derive(Debug, Default)]
pub struct MemoryRemote {
    tables: Mutex<BTreeMap<Table, BTreeMap<String, Record>>>,
    calls: Mutex<Vec<RemoteCall>>,
    failures: Mutex<HashMap<Table, RemoteError>>,
    gate: Mutex<Option<Arc<Semaphore>>>,
}

impl MemoryRemote {
    /// Creates an empty remote.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads rows into `table` without recording a call.
    pub fn seed(&self, table: Table, rows: impl IntoIterator<Item = Record>) {
        let mut tables = self.tables.lock();
        let target = tables.entry(table).or_default();
        for row in rows {
            if let Some(id) = record_id(&row).map(str::to_string) {
                target.insert(id, row);
            }
        }
    }

    /// Returns the rows of `table`, ordered by ID.
    pub fn rows(&self, table: Table) -> Vec<Record> {
        self.tables
            .lock()
            .get(&table)
            .map(|rows| rows.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Returns the row with `id` in `table`.
    pub fn row(&self, table: Table, id: &str) -> Option<Record> {
        self.tables
            .lock()
            .get(&table)
            .and_then(|rows| rows.get(id))
            .cloned()
    }

    /// Returns every call received so far.
    pub fn calls(&self) -> Vec<RemoteCall> {
        self.calls.lock().clone()
    }

    /// Forgets recorded calls.
    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    /// Makes every call touching `table` fail with `error`.
    pub fn fail_table(&self, table: Table, error: RemoteError) {
        self.failures.lock().insert(table, error);
    }

    /// Stops failing calls touching `table`.
    pub fn heal_table(&self, table: Table) {
        self.failures.lock().remove(&table);
    }

    /// Suspends every subsequent call until [`release`](Self::release).
    pub fn hold(&self) {
        *self.gate.lock() = Some(Arc::new(Semaphore::new(0)));
    }

    /// Lets held and future calls through.
    pub fn release(&self) {
        if let Some(gate) = self.gate.lock().take() {
            gate.close();
        }
    }

    async fn enter(&self, call: RemoteCall) -> RemoteResult<Table> {
        let gate = self.gate.lock().clone();
        if let Some(gate) = gate {
            // Resolves with an error once the gate is closed.
            let _ = gate.acquire().await;
        }

        let table = match &call {
            RemoteCall::Upsert { table, .. }
            | RemoteCall::Update { table, .. }
            | RemoteCall::Delete { table, .. }
            | RemoteCall::SelectAll { table } => *table,
        };
        self.calls.lock().push(call);

        match self.failures.lock().get(&table) {
            Some(error) => Err(error.clone()),
            None => Ok(table),
        }
    }
}

#[async_trait]
impl RemoteService for MemoryRemote {
    async fn upsert(&self, table: Table, rows: Vec<Record>) -> RemoteResult<()> {
        let ids = rows
            .iter()
            .map(|row| record_id(row).unwrap_or_default().to_string())
            .collect();
        self.enter(RemoteCall::Upsert { table, ids }).await?;

        if rows.iter().any(|row| record_id(row).is_none()) {
            return Err(RemoteError::status(400, "row without id"));
        }
        self.seed(table, rows);
        Ok(())
    }

    async fn update(&self, table: Table, id: &str, patch: Record) -> RemoteResult<()> {
        self.enter(RemoteCall::Update {
            table,
            id: id.to_string(),
            patch: patch.clone(),
        })
        .await?;

        if let Some(row) = self
            .tables
            .lock()
            .get_mut(&table)
            .and_then(|rows| rows.get_mut(id))
        {
            for (column, value) in patch {
                row.insert(column, value);
            }
        }
        Ok(())
    }

    async fn delete(&self, table: Table, id: &str) -> RemoteResult<()> {
        self.enter(RemoteCall::Delete {
            table,
            id: id.to_string(),
        })
        .await?;

        if let Some(rows) = self.tables.lock().get_mut(&table) {
            rows.remove(id);
        }
        Ok(())
    }

    async fn select_all(&self, table: Table) -> RemoteResult<Vec<Record>> {
        self.enter(RemoteCall::SelectAll { table }).await?;
        Ok(self.rows(table))
    }
}

/// Returns a patch that sets `flag` to `false`.
pub(crate) fn deactivate_patch(flag: &str) -> Record {
    let mut patch = Record::new();
    patch.insert(flag.to_string(), Value::Bool(false));
    patch
}
