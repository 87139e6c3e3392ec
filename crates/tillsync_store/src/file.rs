//! File-backed local store.

use crate::error::{StoreError, StoreResult};
use crate::state::StoreState;
use crate::store::LocalStore;
use parking_lot::RwLock;
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tillsync_model::{Record, SyncQueueItem, Table};
use tracing::debug;
use uuid::Uuid;

/// A local store persisted to a single file.
///
/// The full [`StoreState`] is written as CBOR after every mutation. Writes
/// go to a sibling temporary file that is synced and then renamed over the
/// snapshot, so a crash leaves either the old or the new state on disk.
///
/// # Durability
///
/// A mutation is applied in memory only after its snapshot was written. A
/// failed write returns the I/O error and leaves the store unchanged.
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use tillsync_model::Table;
/// use tillsync_store::{FileStore, LocalStore};
///
/// let store = FileStore::open(Path::new("till.store")).unwrap();
/// store.delete(Table::Categories, "c1").unwrap();  // durable on return
/// ```
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    state: RwLock<StoreState>,
}

impl FileStore {
    /// Opens the store at `path`, creating an empty one if the file is missing.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Corrupted`] if the file exists but does not hold
    /// a valid snapshot.
    pub fn open(path: &Path) -> StoreResult<Self> {
        let state = if path.exists() {
            Self::load(path)?
        } else {
            StoreState::new()
        };

        Ok(Self {
            path: path.to_path_buf(),
            state: RwLock::new(state),
        })
    }

    /// Opens the store, creating parent directories if needed.
    pub fn open_with_create_dirs(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Self::open(path)
    }

    /// Returns the path to the snapshot file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns a copy of the full state, including synced queue items.
    #[must_use]
    pub fn snapshot(&self) -> StoreState {
        self.state.read().clone()
    }

    fn load(path: &Path) -> StoreResult<StoreState> {
        let file = File::open(path)?;
        if file.metadata()?.len() == 0 {
            return Ok(StoreState::new());
        }
        ciborium::de::from_reader(BufReader::new(file))
            .map_err(|e| StoreError::Corrupted(format!("{}: {e}", path.display())))
    }

    fn persist(&self, state: &StoreState) -> StoreResult<()> {
        let tmp = temp_path(&self.path);
        {
            let mut writer = BufWriter::new(File::create(&tmp)?);
            ciborium::ser::into_writer(state, &mut writer)
                .map_err(|e| StoreError::Codec(e.to_string()))?;
            writer.flush()?;
            writer.get_ref().sync_all()?;
        }
        fs::rename(&tmp, &self.path)?;
        debug!(path = %self.path.display(), "store snapshot written");
        Ok(())
    }

    /// Applies `f` to a copy of the state, persists it, then publishes it.
    fn mutate<T>(&self, f: impl FnOnce(&mut StoreState) -> StoreResult<T>) -> StoreResult<T> {
        let mut state = self.state.write();
        let mut next = state.clone();
        let out = f(&mut next)?;
        self.persist(&next)?;
        *state = next;
        Ok(out)
    }
}

/// Returns the sibling file a snapshot is staged in, `<path>.tmp`.
fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".tmp");
    PathBuf::from(name)
}

impl LocalStore for FileStore {
    fn get(&self, table: Table, id: &str) -> StoreResult<Option<Record>> {
        Ok(self.state.read().get(table, id))
    }

    fn get_all(&self, table: Table) -> StoreResult<Vec<Record>> {
        Ok(self.state.read().get_all(table))
    }

    fn save(&self, table: Table, record: Record) -> StoreResult<SyncQueueItem> {
        self.mutate(|state| state.save(table, record))
    }

    fn delete(&self, table: Table, id: &str) -> StoreResult<SyncQueueItem> {
        self.mutate(|state| Ok(state.delete(table, id)))
    }

    fn apply_remote(&self, table: Table, rows: Vec<Record>) -> StoreResult<usize> {
        self.mutate(|state| Ok(state.apply_remote(table, rows)))
    }

    fn sync_queue(&self) -> StoreResult<Vec<SyncQueueItem>> {
        Ok(self.state.read().pending())
    }

    fn mark_synced(&self, queue_id: Uuid) -> StoreResult<()> {
        self.mutate(|state| state.mark_synced(queue_id))
    }

    fn pending_ids(&self, table: Table) -> StoreResult<HashSet<String>> {
        Ok(self.state.read().pending_ids(table))
    }

    fn compact_queue(&self) -> StoreResult<usize> {
        self.mutate(|state| Ok(state.compact()))
    }
}
