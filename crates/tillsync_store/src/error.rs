//! Error types for local store operations.

use std::io;
use thiserror::Error;
use tillsync_model::Table;
use uuid::Uuid;

/// Result type for local store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur while reading or writing the local store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The snapshot could not be encoded or decoded.
    #[error("snapshot codec error: {0}")]
    Codec(String),

    /// A record was written without an `id` column.
    #[error("record for table {table} has no id")]
    MissingId {
        /// Target table.
        table: Table,
    },

    /// `mark_synced` was called with an ID not in the queue.
    #[error("unknown sync queue item {0}")]
    UnknownQueueItem(Uuid),

    /// The snapshot file is corrupted.
    #[error("store corrupted: {0}")]
    Corrupted(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = StoreError::MissingId {
            table: Table::Products,
        };
        assert_eq!(err.to_string(), "record for table products has no id");

        let err = StoreError::from(io::Error::new(io::ErrorKind::Other, "disk full"));
        assert!(err.to_string().contains("disk full"));
    }
}
