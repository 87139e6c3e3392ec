//! Queue command implementation.

use std::path::Path;
use tillsync_model::SyncQueueItem;
use tillsync_store::StoreState;

/// Runs the queue command.
pub fn run(
    path: &Path,
    all: bool,
    limit: Option<usize>,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = super::open_existing(path)?;
    let state = store.snapshot();
    let entries = select(&state, all, limit);

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
        _ => {
            if entries.is_empty() {
                println!("Sync queue is empty");
            }
            for item in &entries {
                println!(
                    "{} {:<7} {:<7} {:<16} {} {}",
                    item.created_at.format("%Y-%m-%d %H:%M:%S"),
                    if item.synced { "synced" } else { "pending" },
                    item.operation.as_str(),
                    item.store_name,
                    item.entity_id().unwrap_or("-"),
                    item.id,
                );
            }
        }
    }

    Ok(())
}

/// Returns queue entries in FIFO order, pending only unless `all` is set.
pub fn select(state: &StoreState, all: bool, limit: Option<usize>) -> Vec<SyncQueueItem> {
    state
        .queue()
        .iter()
        .filter(|item| all || !item.synced)
        .take(limit.unwrap_or(usize::MAX))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tillsync_model::Table;

    #[test]
    fn filters_synced_and_limits() {
        let mut state = StoreState::new();
        let first = state
            .save(
                Table::Categories,
                json!({"id": "c1"}).as_object().cloned().unwrap(),
            )
            .unwrap();
        state.delete(Table::Products, "p1");
        state.delete(Table::Returns, "r1");
        state.mark_synced(first.id).unwrap();

        let pending = select(&state, false, None);
        assert_eq!(pending.len(), 2);
        assert_eq!(pending[0].store_name, Table::Products);

        assert_eq!(select(&state, true, None).len(), 3);
        assert_eq!(select(&state, true, Some(1))[0].id, first.id);
    }
}
