//! Persisted counters
//!
//! Ids such as `encash3` or `Account-4` come from counters stored next to the
//! records they name, so several ledger instances sharing one store never hand
//! out the same id. A counter is read, incremented and staged like any other
//! record and must be part of the caller's lock set. The task champion (the
//! running token maximum) lives under the same prefix.

use crate::{error::Result, state::ChangeSet};

/// Key prefix reserved for counters
pub const COUNTER_PREFIX: &str = "counter~";

/// Store key of the task champion record
pub const CHAMPION_KEY: &str = "counter~champion";

/// Named counter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sequence {
    /// Encashment record keys
    Encashment,
    /// Account ids
    Account,
}

impl Sequence {
    /// Store key of the counter
    pub fn key(&self) -> &'static str {
        match self {
            Sequence::Encashment => "counter~encash",
            Sequence::Account => "counter~account",
        }
    }

    /// Stage the increment and return the new value (first value is 1)
    pub fn next(&self, changes: &mut ChangeSet<'_>) -> Result<u64> {
        let current: u64 = changes.load_opt(self.key())?.unwrap_or(0);
        let next = current + 1;
        changes.stage(self.key(), &next)?;
        Ok(next)
    }

    /// Format the id derived from a counter value
    pub fn format(&self, value: u64) -> String {
        match self {
            Sequence::Encashment => format!("encash{}", value),
            Sequence::Account => format!("Account-{}", value),
        }
    }
}
