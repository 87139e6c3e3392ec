//! CLI command implementations.

pub mod compact;
pub mod inspect;
pub mod queue;
pub mod sync;

use std::path::Path;
use tillsync_store::FileStore;

/// Opens an existing store file.
pub(crate) fn open_existing(path: &Path) -> Result<FileStore, Box<dyn std::error::Error>> {
    if !path.exists() {
        return Err(format!("No store found at {:?}", path).into());
    }
    Ok(FileStore::open(path)?)
}
