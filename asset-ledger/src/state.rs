//! Entity/Account store
//!
//! [`EntityStore`] is the typed `load`/`save` contract over a
//! [`KeyValueStore`]. [`ChangeSet`] is what the engine actually mutates
//! through: reads fall through to the store unless the key was already
//! staged, writes are buffered, and nothing reaches the store until
//! [`ChangeSet::commit`]. An operation that fails validation simply drops its
//! change set, so it never leaves a partial multi-key write behind.

use crate::{
    codec,
    error::{Error, Result},
    store::KeyValueStore,
    types::{Entity, Product, User},
};
use serde::{de::DeserializeOwned, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Typed access to entities, accounts, products and users
#[derive(Clone)]
pub struct EntityStore {
    store: Arc<dyn KeyValueStore>,
}

impl EntityStore {
    /// Wrap a store
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Load an entity or account
    pub fn load(&self, key: &str) -> Result<Entity> {
        load_record(self.store.as_ref(), key)
    }

    /// Save an entity or account
    pub fn save(&self, key: &str, entity: &Entity) -> Result<()> {
        self.store.put(key, &codec::encode(entity)?)
    }

    /// Load a product
    pub fn load_product(&self, key: &str) -> Result<Product> {
        load_record(self.store.as_ref(), key)
    }

    /// Load a user
    pub fn load_user(&self, key: &str) -> Result<User> {
        load_record(self.store.as_ref(), key)
    }

    /// Raw stored bytes
    pub fn load_raw(&self, key: &str) -> Result<Vec<u8>> {
        self.store
            .get(key)?
            .ok_or_else(|| Error::NotFound(key.to_string()))
    }
}

/// Load and decode one record, `NotFound` if absent
pub fn load_record<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Result<T> {
    let bytes = store
        .get(key)?
        .ok_or_else(|| Error::NotFound(key.to_string()))?;
    codec::decode(&bytes)
}

/// Staged writes of one operation
pub struct ChangeSet<'a> {
    store: &'a dyn KeyValueStore,
    staged: BTreeMap<String, Vec<u8>>,
}

impl<'a> ChangeSet<'a> {
    /// Start an empty change set
    pub fn new(store: &'a dyn KeyValueStore) -> Self {
        Self {
            store,
            staged: BTreeMap::new(),
        }
    }

    /// Raw read with read-your-writes
    pub fn get_raw(&self, key: &str) -> Result<Option<Vec<u8>>> {
        match self.staged.get(key) {
            Some(bytes) => Ok(Some(bytes.clone())),
            None => self.store.get(key),
        }
    }

    /// True if the key resolves (staged or stored)
    pub fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.staged.contains_key(key) || self.store.get(key)?.is_some())
    }

    /// Load a record, `NotFound` if absent
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        self.load_opt(key)?
            .ok_or_else(|| Error::NotFound(key.to_string()))
    }

    /// Load a record if present
    pub fn load_opt<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.get_raw(key)? {
            Some(bytes) => Ok(Some(codec::decode(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Load an entity or account
    pub fn entity(&self, key: &str) -> Result<Entity> {
        self.load(key)
    }

    /// Stage a record write
    pub fn stage<T: Serialize + ?Sized>(&mut self, key: &str, record: &T) -> Result<()> {
        let bytes = codec::encode(record)?;
        self.staged.insert(key.to_string(), bytes);
        Ok(())
    }

    /// Fail with `AlreadyExists` if the key resolves
    pub fn ensure_absent(&self, key: &str) -> Result<()> {
        if self.exists(key)? {
            return Err(Error::AlreadyExists(key.to_string()));
        }
        Ok(())
    }

    /// Number of staged keys
    pub fn len(&self) -> usize {
        self.staged.len()
    }

    /// True if nothing is staged
    pub fn is_empty(&self) -> bool {
        self.staged.is_empty()
    }

    /// Flush every staged write; returns the number of keys written
    pub fn commit(self) -> Result<usize> {
        if self.staged.is_empty() {
            return Ok(0);
        }
        let writes: Vec<(String, Vec<u8>)> = self.staged.into_iter().collect();
        self.store.put_all(&writes)?;
        Ok(writes.len())
    }
}
