//! tillsync CLI
//!
//! Command-line tools for tillsync local stores.
//!
//! # Commands
//!
//! - `inspect` - Display row counts and queue state
//! - `queue` - List sync queue entries
//! - `compact` - Drop synced queue entries
//! - `sync` - Push and pull against a REST remote

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// tillsync command-line store tools.
#[derive(Parser)]
#[command(name = "tillsync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the store file
    #[arg(global = true, short, long)]
    path: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display row counts and queue state
    Inspect {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// List sync queue entries
    Queue {
        /// Include entries already applied remotely
        #[arg(short, long)]
        all: bool,

        /// Maximum number of entries to show
        #[arg(short, long)]
        limit: Option<usize>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Drop synced queue entries
    Compact {
        /// Dry run - show what would be done
        #[arg(short, long)]
        dry_run: bool,
    },

    /// Push pending changes, then pull every table
    Sync {
        /// Remote project URL
        #[arg(long, env = "TILLSYNC_URL")]
        url: String,

        /// Remote API key
        #[arg(long, env = "TILLSYNC_API_KEY", hide_env_values = true)]
        api_key: String,

        /// Only pull
        #[arg(long, conflicts_with = "push_only")]
        pull_only: bool,

        /// Only push
        #[arg(long)]
        push_only: bool,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Inspect { format } => {
            let path = cli.path.ok_or("Store path required for inspect")?;
            commands::inspect::run(&path, &format)?;
        }
        Commands::Queue { all, limit, format } => {
            let path = cli.path.ok_or("Store path required for queue")?;
            commands::queue::run(&path, all, limit, &format)?;
        }
        Commands::Compact { dry_run } => {
            let path = cli.path.ok_or("Store path required for compact")?;
            commands::compact::run(&path, dry_run)?;
        }
        Commands::Sync {
            url,
            api_key,
            pull_only,
            push_only,
        } => {
            let path = cli.path.ok_or("Store path required for sync")?;
            let mode = commands::sync::Mode::from_flags(pull_only, push_only);
            commands::sync::run(&path, &url, &api_key, mode)?;
        }
        Commands::Version => {
            println!("tillsync CLI v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
