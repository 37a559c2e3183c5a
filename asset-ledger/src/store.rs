//! Key-value store capability and its backends
//!
//! The ledger only ever needs single-key `get`/`put`. `put_all` exists so a
//! backend that can commit several keys at once (RocksDB `WriteBatch`) gets
//! the chance to do so; the default falls back to sequential `put`s.
//!
//! # Backends
//!
//! - [`MemoryStore`] - `HashMap` behind a `parking_lot::RwLock`
//! - [`RocksStore`] - RocksDB, single `state` column family

use crate::{
    error::{Error, Result},
    Config,
};
use parking_lot::RwLock;
use rocksdb::{BoundColumnFamily, ColumnFamilyDescriptor, DBCompactionStyle, Options, WriteBatch, DB};
use std::collections::HashMap;
use std::sync::Arc;

/// Column family holding all world state
const CF_STATE: &str = "state";

/// Single-key storage consumed by the engine
pub trait KeyValueStore: Send + Sync {
    /// Read a key; `None` if it was never written
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Write a key (last write wins)
    fn put(&self, key: &str, value: &[u8]) -> Result<()>;

    /// Write several keys
    fn put_all(&self, writes: &[(String, Vec<u8>)]) -> Result<()> {
        for (key, value) in writes {
            self.put(key, value)?;
        }
        Ok(())
    }
}

/// In-memory store
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys written so far
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// True if nothing was written
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn put(&self, key: &str, value: &[u8]) -> Result<()> {
        self.entries.write().insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn put_all(&self, writes: &[(String, Vec<u8>)]) -> Result<()> {
        let mut entries = self.entries.write();
        for (key, value) in writes {
            entries.insert(key.clone(), value.clone());
        }
        Ok(())
    }
}

/// RocksDB-backed store
pub struct RocksStore {
    db: Arc<DB>,
}

impl RocksStore {
    /// Open or create database
    pub fn open(config: &Config) -> Result<Self> {
        let path = &config.data_dir;

        // Create directory if not exists
        std::fs::create_dir_all(path)?;

        // Database options
        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);

        // Tuning from config
        db_opts.set_write_buffer_size(config.rocksdb.write_buffer_size_mb * 1024 * 1024);
        db_opts.set_max_write_buffer_number(config.rocksdb.max_write_buffer_number);
        db_opts.set_max_background_jobs(config.rocksdb.max_background_jobs);
        db_opts.set_compaction_style(DBCompactionStyle::Level);

        if config.rocksdb.enable_statistics {
            db_opts.enable_statistics();
        }

        let cf_descriptors = vec![ColumnFamilyDescriptor::new(
            CF_STATE,
            Self::cf_options_state(),
        )];

        let db = DB::open_cf_descriptors(&db_opts, path, cf_descriptors)?;

        tracing::info!(path = ?path, "Opened RocksDB state store");

        Ok(Self { db: Arc::new(db) })
    }

    fn cf_options_state() -> Options {
        let mut opts = Options::default();
        // State is read on every operation, use LZ4 for speed
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        let mut block_opts = rocksdb::BlockBasedOptions::default();
        block_opts.set_bloom_filter(10.0, false);
        opts.set_block_based_table_factory(&block_opts);
        opts
    }

    fn cf_state(&self) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(CF_STATE)
            .ok_or_else(|| Error::StoreUnavailable(format!("Column family {} not found", CF_STATE)))
    }

    /// Close database (graceful shutdown)
    pub fn close(self) -> Result<()> {
        drop(self.db);
        tracing::info!("RocksDB closed gracefully");
        Ok(())
    }
}

impl KeyValueStore for RocksStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let cf = self.cf_state()?;
        Ok(self.db.get_cf(&cf, key.as_bytes())?)
    }

    fn put(&self, key: &str, value: &[u8]) -> Result<()> {
        let cf = self.cf_state()?;
        self.db.put_cf(&cf, key.as_bytes(), value)?;
        Ok(())
    }

    fn put_all(&self, writes: &[(String, Vec<u8>)]) -> Result<()> {
        let cf = self.cf_state()?;
        let mut batch = WriteBatch::default();
        for (key, value) in writes {
            batch.put_cf(&cf, key.as_bytes(), value);
        }

        // Atomic commit
        self.db.write(batch)?;

        tracing::debug!(keys = writes.len(), "Write batch committed");
        Ok(())
    }
}

/// Open the backend selected in `config`
pub fn open_store(config: &Config) -> Result<Arc<dyn KeyValueStore>> {
    match config.storage {
        crate::config::StorageBackend::RocksDb => Ok(Arc::new(RocksStore::open(config)?)),
        crate::config::StorageBackend::Memory => Ok(Arc::new(MemoryStore::new())),
    }
}
