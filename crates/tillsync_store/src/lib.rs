//! # tillsync store
//!
//! The Local Store contract and its implementations.
//!
//! A local store holds one row map per [`Table`](tillsync_model::Table) and
//! the sync queue. Every local mutation appends exactly one
//! [`SyncQueueItem`](tillsync_model::SyncQueueItem) before returning, so the
//! queue is always a complete, ordered record of unsynced changes.
//!
//! ## Available Stores
//!
//! - [`MemoryStore`] - For testing and ephemeral sessions
//! - [`FileStore`] - Persists a CBOR snapshot after every mutation
//!
//! ## Example
//!
//! ```rust
//! use serde_json::json;
//! use tillsync_model::Table;
//! use tillsync_store::{LocalStore, MemoryStore};
//!
//! let store = MemoryStore::new();
//! let row = json!({"id": "c1", "name": "Drinks"}).as_object().cloned().unwrap();
//! store.save(Table::Categories, row).unwrap();
//! assert_eq!(store.sync_queue().unwrap().len(), 1);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod file;
mod memory;
mod state;
mod store;

pub use error::{StoreError, StoreResult};
pub use file::FileStore;
pub use memory::MemoryStore;
pub use state::{QueueCounts, StoreState};
pub use store::LocalStore;
