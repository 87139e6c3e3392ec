//! # tillsync engine
//!
//! Offline-first reconciliation between a local store and a remote service.
//!
//! This crate provides:
//! - The sync engine: push, pull, manual sync and connectivity handling
//! - The entity façade used by the application for local reads and writes
//! - Remote service abstractions (in-memory and PostgREST-style REST)
//! - Connectivity observers
//!
//! ## Architecture
//!
//! Every write lands in the local store and the sync queue first. The engine
//! then reconciles in two directions:
//! 1. Push drains the queue in FIFO order, stopping at the first failure
//! 2. Pull replaces local table snapshots with remote data, table by table
//!
//! A manual sync runs push, then pull.
//!
//! ## Key Invariants
//!
//! - Local writes never wait for the network
//! - At most one push runs at a time
//! - A queue item is marked synced only after the remote accepted it
//! - Pull writes never enter the sync queue

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod catalog;
mod config;
mod connectivity;
mod error;
mod outcome;
mod remote;
mod rest;
mod state;

#[cfg(feature = "reqwest")]
mod reqwest_client;

pub use catalog::{Catalog, Repository, Written};
pub use config::SyncConfig;
pub use connectivity::{AlwaysOnline, ConnectivityObserver, ManualConnectivity};
pub use error::{SyncError, SyncResult};
pub use outcome::{PullReport, PushOutcome, SkipReason, SyncCycleResult, SyncTicket, TableOutcome};
pub use remote::{MemoryRemote, RemoteCall, RemoteError, RemoteResult, RemoteService};
pub use rest::{HttpClient, HttpRequest, HttpResponse, Method, RestConfig, RestRemote};
pub use state::{SyncEngine, SyncState, SyncStats};

#[cfg(feature = "reqwest")]
pub use reqwest_client::ReqwestClient;
