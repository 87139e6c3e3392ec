//! # tillsync model
//!
//! Data model shared by the tillsync store, engine and CLI.
//!
//! This crate provides:
//! - [`Table`] - the fixed set of synchronized tables and their delete policy
//! - [`Record`] - the JSON row envelope exchanged with stores and remotes
//! - [`SyncQueueItem`] - one pending local mutation
//! - Typed entities ([`Product`], [`Category`], [`Shopkeeper`], [`Receipt`],
//!   [`Return`]) behind the [`Entity`] trait
//! - Human-readable sequence codes (`RCP001`, `RET014`, ...)
//!
//! This is a pure data crate with no I/O operations.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod entity;
mod error;
mod queue;
mod record;
mod sequence;
mod table;

pub use entity::{
    Category, Entity, Product, Receipt, Return, SequenceField, Shopkeeper, ShopkeeperProfile,
    DEFAULT_SHOPKEEPER_ROLE,
};
pub use error::{ModelError, ModelResult};
pub use queue::{QueueOperation, SyncQueueItem};
pub use record::{from_record, record_id, to_record, Record};
pub use sequence::{next_code, parse_code};
pub use table::{DeletePolicy, Table};
