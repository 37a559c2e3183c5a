//! Configuration for the ledger

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Ledger configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Data directory for RocksDB
    pub data_dir: PathBuf,

    /// Service name
    pub service_name: String,

    /// Service version
    pub service_version: String,

    /// Storage backend
    pub storage: StorageBackend,

    /// RocksDB configuration
    pub rocksdb: RocksDBConfig,

    /// Actor configuration
    pub actor: ActorConfig,

    /// Encashment configuration
    pub encashment: EncashmentConfig,

    /// Genesis data for the bootstrap operations
    pub genesis: GenesisConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data/ledger"),
            service_name: "asset-ledger".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            storage: StorageBackend::RocksDb,
            rocksdb: RocksDBConfig::default(),
            actor: ActorConfig::default(),
            encashment: EncashmentConfig::default(),
            genesis: GenesisConfig::default(),
        }
    }
}

/// Which store backs the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// RocksDB under `data_dir`
    RocksDb,
    /// Process-local map, lost on exit
    Memory,
}

impl std::str::FromStr for StorageBackend {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "rocksdb" => Ok(StorageBackend::RocksDb),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(crate::Error::Config(format!("Unknown storage backend: {}", other))),
        }
    }
}

/// RocksDB configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RocksDBConfig {
    /// Write buffer size (MB)
    pub write_buffer_size_mb: usize,

    /// Max write buffers
    pub max_write_buffer_number: i32,

    /// Max background jobs (compaction + flush)
    pub max_background_jobs: i32,

    /// Enable statistics
    pub enable_statistics: bool,
}

impl Default for RocksDBConfig {
    fn default() -> Self {
        Self {
            write_buffer_size_mb: 64,
            max_write_buffer_number: 3,
            max_background_jobs: 2,
            enable_statistics: false,
        }
    }
}

/// Actor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ActorConfig {
    /// Bounded mailbox size; senders wait when full
    pub mailbox_capacity: usize,
}

impl Default for ActorConfig {
    fn default() -> Self {
        Self {
            mailbox_capacity: 1000,
        }
    }
}

/// Encashment configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EncashmentConfig {
    /// Points exchanged for one unit of balance
    pub points_per_unit: i64,
}

impl Default for EncashmentConfig {
    fn default() -> Self {
        Self {
            points_per_unit: 100,
        }
    }
}

/// Opening holdings of a loyalty entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedHoldings {
    /// Opening balance
    pub balance: Decimal,
    /// Opening points
    pub points: i64,
}

/// Product created at loyalty genesis, owned by the merchant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedProduct {
    /// Product name
    pub name: String,
    /// Unit price in points
    pub points_price: i64,
    /// Unit price in balance
    pub amount_price: Decimal,
    /// Units in stock
    pub quantity: u64,
}

/// Genesis data
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenesisConfig {
    /// Customer opening holdings
    pub customer: SeedHoldings,
    /// Merchant opening holdings
    pub merchant: SeedHoldings,
    /// Bank opening holdings
    pub bank: SeedHoldings,
    /// Seed products
    pub products: Vec<SeedProduct>,
    /// Supply-chain accounts, created in order as `Account-1`, `Account-2`, ...
    pub accounts: Vec<BTreeMap<String, Decimal>>,
    /// Registered asset names
    pub asset_names: Vec<String>,
}

impl Default for GenesisConfig {
    fn default() -> Self {
        let product = |name: &str, points_price: i64, cents: i64| SeedProduct {
            name: name.to_string(),
            points_price,
            amount_price: Decimal::new(cents, 2),
            quantity: 500,
        };
        let account = |assets: &[(&str, i64)]| {
            assets
                .iter()
                .map(|(name, qty)| (name.to_string(), Decimal::from(*qty)))
                .collect::<BTreeMap<_, _>>()
        };

        Self {
            customer: SeedHoldings {
                balance: Decimal::from(3000),
                points: 30000,
            },
            merchant: SeedHoldings {
                balance: Decimal::from(6000),
                points: 60000,
            },
            bank: SeedHoldings {
                balance: Decimal::from(100000),
                points: 100000,
            },
            products: vec![
                product("Café Frappe", 495, 495),
                product("Café Latte", 365, 365),
                product("Café Mocha", 525, 525),
                product("Cappuccino", 295, 295),
            ],
            accounts: vec![
                account(&[("T2Parts", 1000)]),
                account(&[("T1Parts", 1000), ("T2Parts", 100)]),
                account(&[("OEMParts", 1000), ("T1Parts", 100)]),
                account(&[("OEMParts", 100)]),
            ],
            asset_names: vec![
                "T2Parts".to_string(),
                "T1Parts".to_string(),
                "OEMParts".to_string(),
            ],
        }
    }
}

impl Config {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse TOML; absent sections take their defaults
    pub fn from_toml(content: &str) -> crate::Result<Self> {
        let config: Config = toml::from_str(content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> crate::Result<Self> {
        let mut config = Config::default();

        if let Ok(data_dir) = std::env::var("LEDGER_DATA_DIR") {
            config.data_dir = PathBuf::from(data_dir);
        }

        if let Ok(storage) = std::env::var("LEDGER_STORAGE") {
            config.storage = storage.parse()?;
        }

        if let Ok(capacity) = std::env::var("LEDGER_MAILBOX_CAPACITY") {
            config.actor.mailbox_capacity = capacity.parse().map_err(|e| {
                crate::Error::Config(format!("Invalid LEDGER_MAILBOX_CAPACITY: {}", e))
            })?;
        }

        if let Ok(rate) = std::env::var("LEDGER_POINTS_PER_UNIT") {
            config.encashment.points_per_unit = rate.parse().map_err(|e| {
                crate::Error::Config(format!("Invalid LEDGER_POINTS_PER_UNIT: {}", e))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// In-memory configuration, used by tests and embedders
    pub fn in_memory() -> Self {
        Self {
            storage: StorageBackend::Memory,
            ..Self::default()
        }
    }

    /// Reject settings the ledger cannot run with
    pub fn validate(&self) -> crate::Result<()> {
        if self.actor.mailbox_capacity == 0 {
            return Err(crate::Error::Config(
                "actor.mailbox_capacity must be positive".to_string(),
            ));
        }
        if self.encashment.points_per_unit <= 0 {
            return Err(crate::Error::Config(
                "encashment.points_per_unit must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
