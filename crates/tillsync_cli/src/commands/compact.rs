//! Compact command implementation.

use std::path::Path;
use tillsync_store::LocalStore;

/// Runs the compact command.
pub fn run(path: &Path, dry_run: bool) -> Result<(), Box<dyn std::error::Error>> {
    let store = super::open_existing(path)?;

    println!("Compacting sync queue at {:?}", path);
    if dry_run {
        println!("(dry run - no changes will be made)");
    }
    println!();

    let counts = store.snapshot().queue_counts();
    println!("Queue Analysis:");
    println!("  Pending entries: {} (kept)", counts.pending);
    println!("  Synced entries:  {} (will be removed)", counts.synced);

    if dry_run {
        return Ok(());
    }

    println!();
    if counts.synced == 0 {
        println!("No compaction needed - queue has no synced entries");
    } else {
        let bytes_before = std::fs::metadata(path)?.len();
        let removed = store.compact_queue()?;
        let bytes_after = std::fs::metadata(path)?.len();
        println!("✓ Removed {} entries", removed);
        println!("  Size before: {} bytes", bytes_before);
        println!("  Size after:  {} bytes", bytes_after);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tillsync_model::Table;
    use tillsync_store::FileStore;

    #[test]
    fn removes_only_synced_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("till.db");
        {
            let store = FileStore::open(&path).unwrap();
            let item = store
                .save(
                    Table::Categories,
                    json!({"id": "c1"}).as_object().cloned().unwrap(),
                )
                .unwrap();
            store.delete(Table::Categories, "c2").unwrap();
            store.mark_synced(item.id).unwrap();
        }

        run(&path, true).unwrap();
        assert_eq!(FileStore::open(&path).unwrap().snapshot().queue().len(), 2);

        run(&path, false).unwrap();
        let counts = FileStore::open(&path).unwrap().snapshot().queue_counts();
        assert_eq!((counts.pending, counts.synced), (1, 0));
    }

    #[test]
    fn missing_store_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(run(&dir.path().join("absent.db"), false).is_err());
    }
}
