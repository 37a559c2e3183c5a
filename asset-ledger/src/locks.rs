//! Per-key writer serialization
//!
//! The store is last-write-wins per key with no compare-and-swap, so two
//! operations that load, mutate and save the same key concurrently lose one
//! update. Every engine operation names the keys it will touch and runs with
//! one mutex per key held. Mutexes are taken in sorted key order, so two
//! operations with overlapping key sets cannot deadlock.
//!
//! A slot lives only while some caller holds or waits on it; the last one out
//! removes it, so the table tracks in-flight keys rather than every key ever
//! touched.

use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;

/// Lock table keyed by store key
#[derive(Debug, Default)]
pub struct KeyLocks {
    slots: DashMap<String, Arc<Mutex<()>>>,
}

impl KeyLocks {
    /// Empty lock table
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` while holding every lock in `keys`
    pub fn with_keys<R>(&self, keys: &[&str], f: impl FnOnce() -> R) -> R {
        let mut ordered: Vec<&str> = keys.to_vec();
        ordered.sort_unstable();
        ordered.dedup();

        let out = {
            let slots: Vec<Arc<Mutex<()>>> = ordered.iter().map(|key| self.slot(key)).collect();
            let _guards: Vec<_> = slots.iter().map(|slot| slot.lock()).collect();
            f()
        };

        // Only the table's own reference left: nobody holds or waits on it
        for key in &ordered {
            self.slots
                .remove_if(*key, |_, slot| Arc::strong_count(slot) == 1);
        }
        out
    }

    /// Number of keys currently locked or awaited
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// True if no key is locked or awaited
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn slot(&self, key: &str) -> Arc<Mutex<()>> {
        if let Some(slot) = self.slots.get(key) {
            return slot.clone();
        }
        self.slots.entry(key.to_string()).or_default().clone()
    }
}
