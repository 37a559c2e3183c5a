//! Index collections
//!
//! A collection is a single store entry holding the ordered list of keys
//! created in one category. The store has no list primitive, so `append` is a
//! read-modify-write of the whole list. Two unserialized appends can lose an
//! entry; the engine therefore holds the collection key in its
//! [`KeyLocks`](crate::locks::KeyLocks) set for the whole operation and stages
//! the append in the same [`ChangeSet`] as the record it indexes.
//!
//! Keys are never removed and duplicates are not filtered: a retried creation
//! that reuses its transaction id appears twice.

use crate::{
    codec,
    error::{Error, Result},
    state::ChangeSet,
    store::KeyValueStore,
};
use std::fmt;

/// Known collections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    /// Product names
    Products,
    /// Top-up records
    Topups,
    /// Transfer records
    Transfers,
    /// Purchase records
    Purchases,
    /// Encashment records
    Encashments,
    /// Exchange records
    Exchanges,
    /// Production records
    Productions,
    /// Registered asset-type names
    AssetNames,
}

impl Collection {
    /// Every collection, in initialization order
    pub const ALL: [Collection; 8] = [
        Collection::Products,
        Collection::Topups,
        Collection::Transfers,
        Collection::Purchases,
        Collection::Encashments,
        Collection::Exchanges,
        Collection::Productions,
        Collection::AssetNames,
    ];

    /// Store key of the collection
    pub fn key(&self) -> &'static str {
        match self {
            Collection::Products => "Products",
            Collection::Topups => "TxnTopup",
            Collection::Transfers => "TxnTransfer",
            Collection::Purchases => "TxnGoods",
            Collection::Encashments => "TxnEncash",
            Collection::Exchanges => "TxnExchange",
            Collection::Productions => "TxnProduce",
            Collection::AssetNames => "assetNames",
        }
    }

    /// True if `key` is a collection key
    pub fn is_collection_key(key: &str) -> bool {
        Self::ALL.iter().any(|c| c.key() == key)
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// Write an empty sequence, discarding any previous content
pub fn initialize(changes: &mut ChangeSet<'_>, collection: Collection) -> Result<()> {
    changes.stage(collection.key(), &Vec::<String>::new())
}

/// Initialize if the collection was never written
pub fn ensure_initialized(changes: &mut ChangeSet<'_>, collection: Collection) -> Result<bool> {
    if changes.exists(collection.key())? {
        return Ok(false);
    }
    initialize(changes, collection)?;
    Ok(true)
}

/// Current key sequence, `NotFound` if never initialized
pub fn keys(changes: &ChangeSet<'_>, collection: Collection) -> Result<Vec<String>> {
    changes.load(collection.key())
}

/// Append `key` to the collection
pub fn append(changes: &mut ChangeSet<'_>, collection: Collection, key: &str) -> Result<()> {
    let mut keys = keys(changes, collection)?;
    keys.push(key.to_string());
    changes.stage(collection.key(), &keys)?;

    tracing::debug!(collection = %collection, key, len = keys.len(), "Index appended");
    Ok(())
}

/// True if `key` was ever appended
pub fn contains(changes: &ChangeSet<'_>, collection: Collection, key: &str) -> Result<bool> {
    Ok(keys(changes, collection)?.iter().any(|k| k == key))
}

/// Persisted key sequence, verbatim
pub fn enumerate(store: &dyn KeyValueStore, collection: Collection) -> Result<Vec<String>> {
    let bytes = store
        .get(collection.key())?
        .ok_or_else(|| Error::NotFound(collection.key().to_string()))?;
    codec::decode(&bytes)
}

/// Decoder used to resolve one listed key
pub type Decoder<T> = fn(&str, &[u8]) -> Result<T>;

/// Load and decode every listed key, in insertion order
pub fn resolve<T>(
    store: &dyn KeyValueStore,
    collection: Collection,
    decode: Decoder<T>,
) -> Result<Resolved<'_, T>> {
    let keys = enumerate(store, collection)?;
    Ok(Resolved {
        store,
        collection,
        keys: keys.into_iter(),
        decode,
        failed: false,
    })
}

/// Iterator over the records a collection points at
///
/// Yields the first resolution failure and then ends: an enumeration never
/// silently skips a dangling key.
pub struct Resolved<'a, T> {
    store: &'a dyn KeyValueStore,
    collection: Collection,
    keys: std::vec::IntoIter<String>,
    decode: Decoder<T>,
    failed: bool,
}

impl<T> Iterator for Resolved<'_, T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let key = self.keys.next()?;
        let item = match self.store.get(&key) {
            Ok(Some(bytes)) => (self.decode)(&key, &bytes),
            Ok(None) => Err(Error::NotFound(format!(
                "{} (listed in {})",
                key, self.collection
            ))),
            Err(e) => Err(e),
        };
        if item.is_err() {
            self.failed = true;
            tracing::warn!(collection = %self.collection, key = %key, "Index entry failed to resolve");
        }
        Some(item)
    }
}
