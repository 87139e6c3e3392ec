//! Reconciliation engine.

use crate::config::SyncConfig;
use crate::connectivity::ConnectivityObserver;
use crate::error::{SyncError, SyncResult};
use crate::outcome::{PullReport, PushOutcome, SkipReason, SyncCycleResult, SyncTicket, TableOutcome};
use crate::remote::{deactivate_patch, RemoteService};
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tillsync_model::{DeletePolicy, QueueOperation, SyncQueueItem, Table};
use tillsync_store::{LocalStore, StoreError};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// The current state of the push path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// No push is running.
    Idle,
    /// A push is draining the queue.
    Pushing,
}

impl SyncState {
    /// Returns true if a push is running.
    pub fn is_active(&self) -> bool {
        matches!(self, SyncState::Pushing)
    }
}

/// Statistics about sync operations.
#[derive(Debug, Clone, Default)]
pub struct SyncStats {
    /// Pushes that drained the queue.
    pub pushes_completed: u64,
    /// Pushes that stopped at a failing item.
    pub pushes_aborted: u64,
    /// Queue items applied remotely.
    pub items_pushed: u64,
    /// Pulls that ran (including partially failed ones).
    pub pulls_completed: u64,
    /// Rows written locally by pulls.
    pub rows_pulled: u64,
    /// Last time a push ran.
    pub last_push_at: Option<DateTime<Utc>>,
    /// Last time a pull ran.
    pub last_pull_at: Option<DateTime<Utc>>,
    /// Last error message.
    pub last_error: Option<String>,
}

/// Releases the single-flight flag when the push ends, however it ends.
struct FlightGuard<'a>(&'a AtomicBool);

impl<'a> FlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// The sync engine reconciles a local store with a remote service.
///
/// # Invariants
///
/// - At most one push runs at a time; a concurrent push is a no-op
/// - Queue items are applied in FIFO order and the drain stops at the first failure
/// - A pull failure in one table never aborts the other tables
/// - Pull is not guarded and may interleave with a push or a local write
pub struct SyncEngine<S: LocalStore, R: RemoteService> {
    config: SyncConfig,
    store: Arc<S>,
    remote: Arc<R>,
    connectivity: watch::Receiver<bool>,
    push_in_flight: AtomicBool,
    stats: RwLock<SyncStats>,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl<S, R> SyncEngine<S, R>
where
    S: LocalStore + 'static,
    R: RemoteService + 'static,
{
    /// Creates a new sync engine.
    ///
    /// The engine subscribes to `connectivity` immediately, so
    /// [`connection_status`](Self::connection_status) is accurate before
    /// [`start`](Self::start) is called.
    pub fn new(
        config: SyncConfig,
        store: Arc<S>,
        remote: Arc<R>,
        connectivity: &dyn ConnectivityObserver,
    ) -> Self {
        Self {
            config,
            store,
            remote,
            connectivity: connectivity.subscribe(),
            push_in_flight: AtomicBool::new(false),
            stats: RwLock::new(SyncStats::default()),
            listener: Mutex::new(None),
        }
    }

    /// Gets the configuration.
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Gets the local store.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Gets the remote service.
    pub fn remote(&self) -> &Arc<R> {
        &self.remote
    }

    /// Returns the most recently published connectivity state.
    pub fn connection_status(&self) -> bool {
        *self.connectivity.borrow()
    }

    /// Gets the current state.
    pub fn state(&self) -> SyncState {
        if self.push_in_flight.load(Ordering::Acquire) {
            SyncState::Pushing
        } else {
            SyncState::Idle
        }
    }

    /// Gets the current stats.
    pub fn stats(&self) -> SyncStats {
        self.stats.read().clone()
    }

    /// Starts reacting to connectivity transitions.
    ///
    /// A transition to online triggers a push (unless disabled in the
    /// configuration); a transition to offline is only logged. Calling
    /// `start` on a running engine does nothing.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn start(self: &Arc<Self>) {
        let mut listener = self.listener.lock();
        if listener.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return;
        }

        let engine = Arc::downgrade(self);
        let mut receiver = self.connectivity.clone();
        let mut was_online = *receiver.borrow_and_update();

        *listener = Some(tokio::spawn(async move {
            while receiver.changed().await.is_ok() {
                let online = *receiver.borrow_and_update();
                let Some(engine) = engine.upgrade() else {
                    break;
                };
                engine.on_connectivity_change(was_online, online).await;
                was_online = online;
            }
            debug!("connectivity listener stopped");
        }));
        info!(online = was_online, "sync engine started");
    }

    /// Stops reacting to connectivity transitions.
    pub fn stop(&self) {
        if let Some(handle) = self.listener.lock().take() {
            handle.abort();
            info!("sync engine stopped");
        }
    }

    /// Returns true if the connectivity listener is running.
    pub fn is_running(&self) -> bool {
        self.listener
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    async fn on_connectivity_change(&self, was_online: bool, online: bool) {
        match (was_online, online) {
            (false, true) => {
                info!("connection restored");
                if self.config.push_on_reconnect {
                    let outcome = self.push().await;
                    debug!(applied = outcome.applied(), "reconnect push finished");
                }
            }
            (true, false) => info!("connection lost, writes will queue locally"),
            _ => {}
        }
    }

    /// Drains the sync queue against the remote service.
    ///
    /// Returns immediately if offline or if another push is running. Items
    /// are applied in FIFO order and marked synced one by one; the first
    /// failure stops the drain and leaves the rest pending for the next
    /// push. Failures are logged and reported in the outcome, not raised.
    pub async fn push(&self) -> PushOutcome {
        if !self.connection_status() {
            debug!("push skipped: offline");
            return PushOutcome::Skipped(SkipReason::Offline);
        }
        let Some(_flight) = FlightGuard::acquire(&self.push_in_flight) else {
            debug!("push skipped: already running");
            return PushOutcome::Skipped(SkipReason::AlreadyRunning);
        };

        let queue = match self.store.sync_queue() {
            Ok(queue) => queue,
            Err(e) => {
                let error = SyncError::from(e);
                error!(%error, "failed to read sync queue");
                self.record_push(0, Some(&error));
                return PushOutcome::Aborted { applied: 0, error };
            }
        };

        if !queue.is_empty() {
            info!(pending = queue.len(), "pushing sync queue");
        }

        let mut applied = 0;
        for item in queue {
            let result = match self.apply_item(&item).await {
                Ok(()) => self.store.mark_synced(item.id).map_err(SyncError::from),
                Err(e) => Err(e),
            };

            if let Err(error) = result {
                warn!(
                    table = %item.store_name,
                    queue_id = %item.id,
                    applied,
                    %error,
                    "push aborted"
                );
                self.record_push(applied, Some(&error));
                return PushOutcome::Aborted { applied, error };
            }
            applied += 1;
        }

        if applied > 0 {
            info!(applied, "sync queue drained");
        }
        self.record_push(applied, None);
        PushOutcome::Drained { applied }
    }

    /// Applies one queue item remotely.
    async fn apply_item(&self, item: &SyncQueueItem) -> SyncResult<()> {
        let table = item.store_name;
        let result = match item.operation {
            QueueOperation::Upsert => self.remote.upsert(table, vec![item.data.clone()]).await,
            QueueOperation::Delete => {
                let id = item
                    .entity_id()
                    .ok_or(SyncError::Store(StoreError::MissingId { table }))?;
                match table.delete_policy() {
                    DeletePolicy::Soft { flag } => {
                        self.remote.update(table, id, deactivate_patch(flag)).await
                    }
                    DeletePolicy::Hard => self.remote.delete(table, id).await,
                }
            }
        };

        debug!(
            table = %table,
            queue_id = %item.id,
            operation = item.operation.as_str(),
            ok = result.is_ok(),
            "queue item applied"
        );
        result.map_err(|source| SyncError::RemoteApply {
            table,
            queue_id: item.id,
            source,
        })
    }

    /// Replaces local snapshots of the configured tables with remote data.
    ///
    /// Every table is fetched in full and written over local copies. A
    /// failing table is logged and skipped; the remaining tables still run.
    pub async fn pull(&self) -> PullReport {
        if !self.connection_status() {
            debug!("pull skipped: offline");
            return PullReport::offline();
        }

        let mut report = PullReport::default();
        for &table in &self.config.pull_tables {
            let outcome = self.pull_table(table).await;
            match &outcome {
                TableOutcome::Fetched { rows, preserved } => {
                    debug!(table = %table, rows, preserved, "table pulled");
                }
                TableOutcome::Failed(error) => {
                    warn!(table = %table, %error, "table pull failed");
                }
            }
            report.tables.push((table, outcome));
        }

        info!(
            rows = report.rows(),
            failed = report.failed_tables().len(),
            "pull finished"
        );
        self.record_pull(&report);
        report
    }

    async fn pull_table(&self, table: Table) -> TableOutcome {
        let rows = match self.remote.select_all(table).await {
            Ok(rows) => rows,
            Err(source) => return TableOutcome::Failed(SyncError::RemoteFetch { table, source }),
        };

        let fetched = rows.len();
        let rows = if self.config.preserve_pending_on_pull {
            match self.store.pending_ids(table) {
                Ok(pending) if !pending.is_empty() => rows
                    .into_iter()
                    .filter(|row| {
                        tillsync_model::record_id(row).map_or(true, |id| !pending.contains(id))
                    })
                    .collect(),
                Ok(_) => rows,
                Err(e) => return TableOutcome::Failed(e.into()),
            }
        } else {
            rows
        };
        let preserved = fetched - rows.len();

        match self.store.apply_remote(table, rows) {
            Ok(written) => TableOutcome::Fetched {
                rows: written,
                preserved,
            },
            Err(e) => TableOutcome::Failed(e.into()),
        }
    }

    /// Pushes, then pulls.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Offline`] without doing anything if offline.
    /// Failures inside the push or pull are reported in the result.
    pub async fn manual_sync(&self) -> SyncResult<SyncCycleResult> {
        if !self.connection_status() {
            return Err(SyncError::Offline);
        }

        let start = Instant::now();
        let push = self.push().await;
        let pull = self.pull().await;

        Ok(SyncCycleResult {
            push,
            pull,
            duration: start.elapsed(),
        })
    }

    /// Spawns a push on the current runtime after a local write.
    ///
    /// The write has already completed; the returned ticket may be awaited
    /// to observe the push or dropped to let it run in the background.
    pub fn schedule_push(self: &Arc<Self>) -> SyncTicket {
        if !self.config.opportunistic_push {
            return SyncTicket::skipped(SkipReason::Disabled);
        }
        if !self.connection_status() {
            return SyncTicket::skipped(SkipReason::Offline);
        }

        match Handle::try_current() {
            Ok(handle) => {
                let engine = Arc::clone(self);
                SyncTicket::scheduled(handle.spawn(async move { engine.push().await }))
            }
            Err(_) => {
                debug!("push not scheduled: no runtime");
                SyncTicket::skipped(SkipReason::NoRuntime)
            }
        }
    }

    fn record_push(&self, applied: usize, error: Option<&SyncError>) {
        let mut stats = self.stats.write();
        stats.items_pushed += applied as u64;
        stats.last_push_at = Some(Utc::now());
        match error {
            Some(error) => {
                stats.pushes_aborted += 1;
                stats.last_error = Some(error.to_string());
            }
            None => {
                stats.pushes_completed += 1;
                stats.last_error = None;
            }
        }
    }

    fn record_pull(&self, report: &PullReport) {
        let mut stats = self.stats.write();
        stats.pulls_completed += 1;
        stats.rows_pulled += report.rows() as u64;
        stats.last_pull_at = Some(Utc::now());
        if let Some((_, TableOutcome::Failed(error))) = report
            .tables
            .iter()
            .find(|(_, outcome)| matches!(outcome, TableOutcome::Failed(_)))
        {
            stats.last_error = Some(error.to_string());
        }
    }
}

impl<S: LocalStore, R: RemoteService> Drop for SyncEngine<S, R> {
    fn drop(&mut self) {
        if let Some(handle) = self.listener.get_mut().take() {
            handle.abort();
        }
    }
}
