//! Sync command implementation.

use std::path::Path;
use std::sync::Arc;
use tillsync_engine::{
    AlwaysOnline, PullReport, PushOutcome, ReqwestClient, RestConfig, RestRemote, SyncConfig,
    SyncEngine, TableOutcome,
};
use tillsync_store::FileStore;
use tracing::info;

/// Which directions to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Push, then pull.
    Full,
    /// Pull only.
    PullOnly,
    /// Push only.
    PushOnly,
}

impl Mode {
    /// Derives the mode from the command-line flags.
    pub fn from_flags(pull_only: bool, push_only: bool) -> Self {
        match (pull_only, push_only) {
            (true, _) => Mode::PullOnly,
            (false, true) => Mode::PushOnly,
            (false, false) => Mode::Full,
        }
    }
}

/// Runs the sync command.
pub fn run(
    path: &Path,
    url: &str,
    api_key: &str,
    mode: Mode,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(FileStore::open_with_create_dirs(path)?);
    let remote = Arc::new(RestRemote::new(
        RestConfig::new(url, api_key),
        ReqwestClient::new(),
    )?);
    let engine = SyncEngine::new(SyncConfig::default(), store, remote, &AlwaysOnline);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    info!(path = %path.display(), url, ?mode, "starting sync");
    let (push, pull) = runtime.block_on(async {
        let push = match mode {
            Mode::PullOnly => None,
            _ => Some(engine.push().await),
        };
        let pull = match mode {
            Mode::PushOnly => None,
            _ => Some(engine.pull().await),
        };
        (push, pull)
    });

    if let Some(push) = &push {
        print_push(push);
    }
    if let Some(pull) = &pull {
        print_pull(pull);
    }

    let failed = push.as_ref().is_some_and(|p| p.error().is_some())
        || pull.as_ref().is_some_and(|p| !p.is_complete());
    if failed {
        return Err("sync finished with errors".into());
    }
    Ok(())
}

fn print_push(outcome: &PushOutcome) {
    match outcome {
        PushOutcome::Skipped(reason) => println!("Push skipped: {:?}", reason),
        PushOutcome::Drained { applied } => println!("✓ Pushed {} queue entries", applied),
        PushOutcome::Aborted { applied, error } => {
            println!("✗ Push stopped after {} entries: {}", applied, error)
        }
    }
}

fn print_pull(report: &PullReport) {
    println!("Pull:");
    for (table, outcome) in &report.tables {
        match outcome {
            TableOutcome::Fetched { rows, .. } => println!("  ✓ {:<16} {} rows", table, rows),
            TableOutcome::Failed(error) => println!("  ✗ {:<16} {}", table, error),
        }
    }
}
