//! Single-writer actor
//!
//! Every command submitted through a [`LedgerHandle`] lands in one bounded
//! mailbox and is executed by one task, in arrival order. Senders wait when
//! the mailbox is full.
//!
//! ```text
//!   LedgerHandle (Clone) ──┐
//!   LedgerHandle (Clone) ──┼── mpsc::channel (bounded) ──► LedgerActor
//!   LedgerHandle (Clone) ──┘                                  │
//!                                                             ▼
//!                                              TransitionEngine::execute
//!                                              (KeyLocks + ChangeSet commit)
//! ```
//!
//! The engine keeps its own per-key locks, so callers that share the engine
//! directly (bypassing the actor) are still serialized per key.

use crate::{
    command::{Command, Reply},
    context::TxContext,
    engine::TransitionEngine,
    metrics::Metrics,
    Error, Result,
};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, oneshot};

/// Message sent to the ledger actor
pub enum LedgerMessage {
    /// Execute a command
    Invoke {
        /// Command to run
        command: Command,
        /// Outcome
        response: oneshot::Sender<Result<Reply>>,
    },

    /// Shutdown actor; `done` fires once the engine has been released
    Shutdown {
        /// Completion signal
        done: oneshot::Sender<()>,
    },
}

/// Actor that executes commands one at a time
pub struct LedgerActor {
    engine: Arc<TransitionEngine>,
    metrics: Metrics,
    mailbox: mpsc::Receiver<LedgerMessage>,
}

impl LedgerActor {
    /// Create new actor
    pub fn new(
        engine: Arc<TransitionEngine>,
        metrics: Metrics,
        mailbox: mpsc::Receiver<LedgerMessage>,
    ) -> Self {
        Self {
            engine,
            metrics,
            mailbox,
        }
    }

    /// Run the actor loop until shutdown or until every handle is dropped
    pub async fn run(mut self) {
        let mut done = None;
        while let Some(msg) = self.mailbox.recv().await {
            match msg {
                LedgerMessage::Invoke { command, response } => {
                    let result = self.invoke(&command);
                    if response.send(result).is_err() {
                        tracing::debug!(operation = command.name(), "Caller went away before reply");
                    }
                }
                LedgerMessage::Shutdown { done: signal } => {
                    done = Some(signal);
                    break;
                }
            }
        }

        // Queued commands are dropped with the mailbox
        drop(self);
        tracing::info!("Ledger actor stopped");
        if let Some(signal) = done {
            let _ = signal.send(());
        }
    }

    fn invoke(&self, command: &Command) -> Result<Reply> {
        let started = Instant::now();
        let ctx = TxContext::new();
        let result = self.engine.execute(command, &ctx);
        let elapsed = started.elapsed().as_secs_f64();

        match &result {
            Ok(_) => {
                self.metrics
                    .record_success(command.name(), elapsed, command.is_journaled());
            }
            Err(e) => {
                self.metrics.record_failure(command.name(), e.kind(), elapsed);
                tracing::warn!(
                    operation = command.name(),
                    kind = e.kind().as_str(),
                    error = %e,
                    "Command rejected"
                );
            }
        }
        result
    }
}

/// Handle for sending messages to the actor
#[derive(Clone)]
pub struct LedgerHandle {
    sender: mpsc::Sender<LedgerMessage>,
}

impl LedgerHandle {
    /// Create new handle
    pub fn new(sender: mpsc::Sender<LedgerMessage>) -> Self {
        Self { sender }
    }

    /// Queue a command and wait for its outcome
    pub async fn invoke(&self, command: Command) -> Result<Reply> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(LedgerMessage::Invoke {
                command,
                response: tx,
            })
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))?
    }

    /// Shutdown actor and wait until it has stopped
    pub async fn shutdown(&self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(LedgerMessage::Shutdown { done: tx })
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;

        rx.await
            .map_err(|_| Error::Concurrency("Actor stopped without acknowledging shutdown".to_string()))
    }
}

/// Spawn the ledger actor
pub fn spawn_ledger_actor(
    engine: Arc<TransitionEngine>,
    metrics: Metrics,
    mailbox_capacity: usize,
) -> LedgerHandle {
    let (tx, rx) = mpsc::channel(mailbox_capacity);
    let actor = LedgerActor::new(engine, metrics, rx);

    tokio::spawn(async move {
        actor.run().await;
    });

    LedgerHandle::new(tx)
}
