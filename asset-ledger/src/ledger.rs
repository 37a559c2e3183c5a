//! Main ledger orchestration layer
//!
//! This module ties together the store, the transition engine, the actor and
//! metrics into one async API.
//!
//! # Example
//!
//! ```no_run
//! use asset_ledger::{Config, Ledger};
//!
//! #[tokio::main]
//! async fn main() -> asset_ledger::Result<()> {
//!     let ledger = Ledger::open(Config::in_memory()).await?;
//!
//!     ledger.dispatch("initLoyalty", &["alice".into(), "shop".into(), "bank".into()]).await?;
//!     ledger.dispatch("topUp", &["alice".into(), "points".into(), "50".into()]).await?;
//!     let alice = ledger.dispatch("read", &["alice".into()]).await?;
//!     println!("{}", alice);
//!
//!     ledger.shutdown().await
//! }
//! ```

use crate::{
    actor::{spawn_ledger_actor, LedgerHandle},
    command::{Command, Query, Reply},
    engine::TransitionEngine,
    metrics::Metrics,
    store::{open_store, KeyValueStore},
    Config, Error, Result,
};
use std::sync::Arc;

/// Main ledger interface
pub struct Ledger {
    /// Actor handle for commands
    handle: LedgerHandle,

    /// Engine shared with the actor (reads go here directly)
    engine: Arc<TransitionEngine>,

    /// Metrics
    metrics: Metrics,

    /// Configuration
    config: Config,
}

impl Ledger {
    /// Open ledger with configuration
    pub async fn open(config: Config) -> Result<Self> {
        config.validate()?;
        let store = open_store(&config)?;
        Self::with_store(config, store)
    }

    /// Build a ledger over an existing store
    ///
    /// Must be called from within a tokio runtime.
    pub fn with_store(config: Config, store: Arc<dyn KeyValueStore>) -> Result<Self> {
        config.validate()?;
        let engine = Arc::new(TransitionEngine::new(store, &config));
        let metrics = Metrics::new()
            .map_err(|e| Error::Config(format!("Failed to register metrics: {}", e)))?;

        let handle = spawn_ledger_actor(
            engine.clone(),
            metrics.clone(),
            config.actor.mailbox_capacity,
        );

        tracing::info!(
            service = %config.service_name,
            version = %config.service_version,
            storage = ?config.storage,
            "Ledger opened"
        );

        Ok(Self {
            handle,
            engine,
            metrics,
            config,
        })
    }

    /// Execute a command through the single-writer queue
    pub async fn invoke(&self, command: Command) -> Result<Reply> {
        self.handle.invoke(command).await
    }

    /// Answer a read directly from the store
    pub fn query(&self, query: &Query) -> Result<Reply> {
        self.engine.query(query)
    }

    /// Run a function by name with positional arguments
    pub async fn dispatch(&self, function: &str, args: &[String]) -> Result<Reply> {
        if Query::is_query(function) {
            return self.query(&Query::parse(function, args)?);
        }
        self.invoke(Command::parse(function, args)?).await
    }

    /// Transition engine
    pub fn engine(&self) -> &Arc<TransitionEngine> {
        &self.engine
    }

    /// Metrics
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Shutdown ledger gracefully
    pub async fn shutdown(self) -> Result<()> {
        self.handle.shutdown().await?;
        tracing::info!("Ledger shut down");
        Ok(())
    }
}
