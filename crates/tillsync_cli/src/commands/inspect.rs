//! Inspect command implementation.

use serde::Serialize;
use std::path::Path;
use tillsync_store::StoreState;

/// Store inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Store path.
    pub path: String,
    /// File size in bytes.
    pub file_size: u64,
    /// Rows per table.
    pub tables: Vec<TableStats>,
    /// Total rows.
    pub total_rows: usize,
    /// Queue entries not yet applied remotely.
    pub pending: usize,
    /// Queue entries applied but not compacted.
    pub synced: usize,
}

/// Statistics for a single table.
#[derive(Debug, Serialize)]
pub struct TableStats {
    /// Table name.
    pub name: String,
    /// Number of rows.
    pub rows: usize,
    /// Rows with unsynced changes.
    pub pending: usize,
}

/// Runs the inspect command.
pub fn run(path: &Path, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let store = super::open_existing(path)?;
    let mut result = inspect(&store.snapshot());
    result.path = path.display().to_string();
    result.file_size = std::fs::metadata(path)?.len();

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => {
            print_text_output(&result);
        }
    }

    Ok(())
}

/// Summarizes a store state.
pub fn inspect(state: &StoreState) -> InspectResult {
    let tables: Vec<TableStats> = state
        .row_counts()
        .into_iter()
        .map(|(table, rows)| TableStats {
            name: table.to_string(),
            rows,
            pending: state.pending_ids(table).len(),
        })
        .collect();
    let counts = state.queue_counts();

    InspectResult {
        path: String::new(),
        file_size: 0,
        total_rows: tables.iter().map(|t| t.rows).sum(),
        tables,
        pending: counts.pending,
        synced: counts.synced,
    }
}

fn print_text_output(result: &InspectResult) {
    println!("tillsync store: {}", result.path);
    println!();
    println!("Size: {} bytes", result.file_size);
    println!();
    println!("Tables:");
    for table in &result.tables {
        println!(
            "  {:<16} {:>6} rows  {:>4} pending",
            table.name, table.rows, table.pending
        );
    }
    println!("  {:<16} {:>6} rows", "total", result.total_rows);
    println!();
    println!("Sync queue:");
    println!("  Pending: {}", result.pending);
    println!("  Synced:  {}", result.synced);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tillsync_model::Table;

    #[test]
    fn counts_rows_and_queue() {
        let mut state = StoreState::new();
        state
            .save(
                Table::Products,
                json!({"id": "p1", "name": "Tea"}).as_object().cloned().unwrap(),
            )
            .unwrap();
        state.apply_remote(
            Table::Categories,
            vec![json!({"id": "c1"}).as_object().cloned().unwrap()],
        );

        let result = inspect(&state);
        assert_eq!(result.total_rows, 2);
        assert_eq!(result.pending, 1);
        assert_eq!(result.synced, 0);

        let products = result.tables.iter().find(|t| t.name == "products").unwrap();
        assert_eq!((products.rows, products.pending), (1, 1));
        let categories = result.tables.iter().find(|t| t.name == "categories").unwrap();
        assert_eq!((categories.rows, categories.pending), (1, 0));
    }
}
