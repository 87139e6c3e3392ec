//! Error types for the sync engine.

use crate::remote::RemoteError;
use thiserror::Error;
use tillsync_model::{ModelError, Table};
use tillsync_store::StoreError;
use uuid::Uuid;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur during sync and façade operations.
#[derive(Error, Debug)]
pub enum SyncError {
    /// A manual sync was requested while offline.
    #[error("not connected to remote service")]
    Offline,

    /// A queue item could not be applied remotely.
    #[error("failed to apply queue item {queue_id} to {table}: {source}")]
    RemoteApply {
        /// Target table.
        table: Table,
        /// Queue entry that failed.
        queue_id: Uuid,
        /// Underlying remote failure.
        #[source]
        source: RemoteError,
    },

    /// A table could not be fetched during pull.
    #[error("failed to fetch {table}: {source}")]
    RemoteFetch {
        /// Table being fetched.
        table: Table,
        /// Underlying remote failure.
        #[source]
        source: RemoteError,
    },

    /// The local store failed.
    #[error("local store error: {0}")]
    Store(#[from] StoreError),

    /// An entity failed conversion or validation at the façade boundary.
    #[error("invalid entity: {0}")]
    InvalidEntity(#[from] ModelError),

    /// A scheduled push task was cancelled before it finished.
    #[error("sync cancelled")]
    Cancelled,
}

impl SyncError {
    /// Returns true if a later attempt may succeed without intervention.
    pub fn is_retryable(&self) -> bool {
        match self {
            SyncError::Offline | SyncError::Cancelled => true,
            SyncError::RemoteApply { source, .. } | SyncError::RemoteFetch { source, .. } => {
                source.is_retryable()
            }
            SyncError::Store(_) | SyncError::InvalidEntity(_) => false,
        }
    }
}
