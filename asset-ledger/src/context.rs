//! Transaction context supplied by the host substrate

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Per-invocation identity and time
pub trait TransactionContext {
    /// Unique id of this invocation
    fn id(&self) -> String;

    /// Invocation time (display only, ordering is not guaranteed)
    fn timestamp(&self) -> DateTime<Utc>;
}

/// Default context: UUIDv7 id and wall-clock time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxContext {
    id: String,
    timestamp: DateTime<Utc>,
}

impl TxContext {
    /// Fresh context
    pub fn new() -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            timestamp: Utc::now(),
        }
    }

    /// Context with fixed id and time (replays, tests)
    pub fn with(id: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            timestamp,
        }
    }
}

impl Default for TxContext {
    fn default() -> Self {
        Self::new()
    }
}

impl TransactionContext for TxContext {
    fn id(&self) -> String {
        self.id.clone()
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}
