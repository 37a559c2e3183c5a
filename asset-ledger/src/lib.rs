//! Asset Ledger
//!
//! Ledger-resident accounting engine over a single-key key-value store:
//! loyalty balances and points, multi-asset supply-chain accounts,
//! inventory-backed products and a task tracker with token awards, with an
//! append-only transaction journal and index collections for enumeration.
//!
//! # Architecture
//!
//! - **Staged writes**: operations stage every write in a change set and
//!   commit once, after all validation
//! - **Per-key serialization**: writers touching the same entity or
//!   collection key run one after another
//! - **Single Writer**: commands submitted through [`Ledger`] go through one
//!   actor mailbox
//!
//! # Invariants
//!
//! - Conservation: transfers, purchases and exchanges never create or
//!   destroy value
//! - Non-negative holdings and inventory at rest
//! - Index completeness: every created product and journal record is listed
//!   in its collection, and every listed key resolves
//! - Append-only: journal records and collection entries are never modified

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms, clippy::all)]

pub mod actor;
pub mod codec;
pub mod command;
pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod index;
pub mod journal;
pub mod ledger;
pub mod locks;
pub mod metrics;
pub mod sequence;
pub mod state;
pub mod store;
pub mod types;

// Re-exports
pub use command::{Command, Query, Reply};
pub use config::Config;
pub use context::{TransactionContext, TxContext};
pub use engine::TransitionEngine;
pub use error::{Error, ErrorKind, Result};
pub use ledger::Ledger;
pub use store::{KeyValueStore, MemoryStore, RocksStore};
pub use types::{
    Asset, Champion, Entity, EntityKind, Holdings, PriceKind, Product, TaskHolder, User,
};
