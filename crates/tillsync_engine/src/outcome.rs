//! Results of push, pull and sync cycles.

use crate::error::SyncError;
use std::time::Duration;
use tillsync_model::Table;
use tokio::task::JoinHandle;

/// Why a push did not run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The engine is offline.
    Offline,
    /// Another push is in flight.
    AlreadyRunning,
    /// Opportunistic pushes are disabled in the configuration.
    Disabled,
    /// No Tokio runtime was available to run the push on.
    NoRuntime,
}

/// Result of one push.
#[derive(Debug)]
pub enum PushOutcome {
    /// Nothing was attempted.
    Skipped(SkipReason),
    /// Every item pending at push start was applied.
    Drained {
        /// Number of items applied.
        applied: usize,
    },
    /// The drain stopped at the first failing item.
    Aborted {
        /// Number of items applied before the failure.
        applied: usize,
        /// The failure; the item stays pending.
        error: SyncError,
    },
}

impl PushOutcome {
    /// Returns the number of items applied remotely.
    pub fn applied(&self) -> usize {
        match self {
            PushOutcome::Skipped(_) => 0,
            PushOutcome::Drained { applied } | PushOutcome::Aborted { applied, .. } => *applied,
        }
    }

    /// Returns the skip reason, if the push did not run.
    pub fn skip_reason(&self) -> Option<SkipReason> {
        match self {
            PushOutcome::Skipped(reason) => Some(*reason),
            _ => None,
        }
    }

    /// Returns the failure that aborted the drain.
    pub fn error(&self) -> Option<&SyncError> {
        match self {
            PushOutcome::Aborted { error, .. } => Some(error),
            _ => None,
        }
    }
}

/// Result of pulling one table.
#[derive(Debug)]
pub enum TableOutcome {
    /// The snapshot was fetched and written locally.
    Fetched {
        /// Rows written to the local store.
        rows: usize,
        /// Rows withheld because they had unsynced local changes.
        preserved: usize,
    },
    /// Fetching or writing the table failed; other tables were unaffected.
    Failed(SyncError),
}

/// Result of one pull.
#[derive(Debug, Default)]
pub struct PullReport {
    /// True if the pull did not run because the engine was offline.
    pub skipped: bool,
    /// Outcome per table, in pull order.
    pub tables: Vec<(Table, TableOutcome)>,
}

impl PullReport {
    /// A pull that did not run.
    pub fn offline() -> Self {
        Self {
            skipped: true,
            tables: Vec::new(),
        }
    }

    /// Returns the total rows written locally.
    pub fn rows(&self) -> usize {
        self.tables
            .iter()
            .map(|(_, outcome)| match outcome {
                TableOutcome::Fetched { rows, .. } => *rows,
                TableOutcome::Failed(_) => 0,
            })
            .sum()
    }

    /// Returns the tables that failed.
    pub fn failed_tables(&self) -> Vec<Table> {
        self.tables
            .iter()
            .filter(|(_, outcome)| matches!(outcome, TableOutcome::Failed(_)))
            .map(|(table, _)| *table)
            .collect()
    }

    /// Returns true if the pull ran and every table succeeded.
    pub fn is_complete(&self) -> bool {
        !self.skipped && self.failed_tables().is_empty()
    }
}

/// Result of a manual sync: push, then pull.
#[derive(Debug)]
pub struct SyncCycleResult {
    /// Push phase.
    pub push: PushOutcome,
    /// Pull phase.
    pub pull: PullReport,
    /// Duration of the cycle.
    pub duration: Duration,
}

impl SyncCycleResult {
    /// Returns true if the push drained and every table was pulled.
    pub fn success(&self) -> bool {
        matches!(self.push, PushOutcome::Drained { .. }) && self.pull.is_complete()
    }
}

/// Handle on the push scheduled after a local write.
///
/// Dropping the ticket leaves the push running in the background.
#[derive(Debug)]
pub struct SyncTicket {
    inner: Ticket,
}

#[derive(Debug)]
enum Ticket {
    Skipped(SkipReason),
    Scheduled(JoinHandle<PushOutcome>),
}

impl SyncTicket {
    pub(crate) fn skipped(reason: SkipReason) -> Self {
        Self {
            inner: Ticket::Skipped(reason),
        }
    }

    pub(crate) fn scheduled(handle: JoinHandle<PushOutcome>) -> Self {
        Self {
            inner: Ticket::Scheduled(handle),
        }
    }

    /// Returns true if a push task was spawned.
    pub fn is_scheduled(&self) -> bool {
        matches!(self.inner, Ticket::Scheduled(_))
    }

    /// Waits for the scheduled push, if any.
    pub async fn wait(self) -> PushOutcome {
        match self.inner {
            Ticket::Skipped(reason) => PushOutcome::Skipped(reason),
            Ticket::Scheduled(handle) => handle.await.unwrap_or(PushOutcome::Aborted {
                applied: 0,
                error: SyncError::Cancelled,
            }),
        }
    }
}
