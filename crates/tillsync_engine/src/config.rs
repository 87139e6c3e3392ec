//! Configuration for the sync engine.

use tillsync_model::Table;

/// Configuration for sync operations.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Tables fetched by `pull`, in order.
    pub pull_tables: Vec<Table>,
    /// Whether a transition to online triggers a push.
    pub push_on_reconnect: bool,
    /// Whether façade writes schedule a push while online.
    pub opportunistic_push: bool,
    /// Whether pull skips remote rows that have unsynced local changes.
    ///
    /// Off by default: remote data wins for every row present remotely.
    pub preserve_pending_on_pull: bool,
}

impl SyncConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self {
            pull_tables: Table::ALL.to_vec(),
            push_on_reconnect: true,
            opportunistic_push: true,
            preserve_pending_on_pull: false,
        }
    }

    /// Sets the tables fetched by `pull`.
    pub fn with_pull_tables(mut self, tables: impl IntoIterator<Item = Table>) -> Self {
        self.pull_tables = tables.into_iter().collect();
        self
    }

    /// Enables or disables the push on reconnect.
    pub fn with_push_on_reconnect(mut self, enabled: bool) -> Self {
        self.push_on_reconnect = enabled;
        self
    }

    /// Enables or disables the push after façade writes.
    pub fn with_opportunistic_push(mut self, enabled: bool) -> Self {
        self.opportunistic_push = enabled;
        self
    }

    /// Keeps rows with unsynced local changes out of pull overwrites.
    pub fn with_preserve_pending_on_pull(mut self, enabled: bool) -> Self {
        self.preserve_pending_on_pull = enabled;
        self
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::new()
    }
}
