//! Error types for the ledger

use rust_decimal::Decimal;
use thiserror::Error;

/// Result type for ledger operations
pub type Result<T> = std::result::Result<T, Error>;

/// Ledger errors
#[derive(Error, Debug)]
pub enum Error {
    /// Key absent in the store
    #[error("Not found: {0}")]
    NotFound(String),

    /// Argument fails to parse or violates its shape
    #[error("Malformed argument: {0}")]
    Malformed(String),

    /// Conservation precondition failed
    #[error("Insufficient funds: {holder} holds {available} {asset}, requires {required}")]
    InsufficientFunds {
        /// Entity or account being debited
        holder: String,
        /// Asset being debited
        asset: String,
        /// Balance at the time of the check
        available: Decimal,
        /// Amount the operation needed
        required: Decimal,
    },

    /// Product stock too low
    #[error("Insufficient inventory: {product} has {available} units, requested {requested}")]
    InsufficientInventory {
        /// Product key
        product: String,
        /// Units in stock
        available: u64,
        /// Units requested
        requested: u64,
    },

    /// Product not owned by the named seller
    #[error("Ownership mismatch: {product} is owned by {owner}, not {seller}")]
    OwnershipMismatch {
        /// Product key
        product: String,
        /// Recorded owner
        owner: String,
        /// Seller named by the caller
        seller: String,
    },

    /// Record or registration already present
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// Asset name not registered in the asset-type collection
    #[error("Unknown asset: {0}")]
    UnknownAsset(String),

    /// Underlying get/put failed
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// Stored data contradicts an index or record invariant
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    /// JSON payload encoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Concurrency error (actor mailbox closed, etc.)
    #[error("Concurrency error: {0}")]
    Concurrency(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Stable classification of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::Malformed(_) => ErrorKind::Malformed,
            Error::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            Error::InsufficientInventory { .. } => ErrorKind::InsufficientInventory,
            Error::OwnershipMismatch { .. } => ErrorKind::OwnershipMismatch,
            Error::AlreadyExists(_) => ErrorKind::AlreadyExists,
            Error::UnknownAsset(_) => ErrorKind::UnknownAsset,
            Error::StoreUnavailable(_) => ErrorKind::StoreUnavailable,
            Error::InvariantViolation(_) => ErrorKind::InvariantViolation,
            Error::Serialization(_) | Error::Json(_) => ErrorKind::Serialization,
            Error::Concurrency(_) => ErrorKind::Concurrency,
            Error::Config(_) => ErrorKind::Config,
            Error::Io(_) => ErrorKind::Io,
        }
    }

    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        Error::Malformed(msg.into())
    }
}

/// Error classification, used for metric labels and caller branching
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// See [`Error::NotFound`]
    NotFound,
    /// See [`Error::Malformed`]
    Malformed,
    /// See [`Error::InsufficientFunds`]
    InsufficientFunds,
    /// See [`Error::InsufficientInventory`]
    InsufficientInventory,
    /// See [`Error::OwnershipMismatch`]
    OwnershipMismatch,
    /// See [`Error::AlreadyExists`]
    AlreadyExists,
    /// See [`Error::UnknownAsset`]
    UnknownAsset,
    /// See [`Error::StoreUnavailable`]
    StoreUnavailable,
    /// See [`Error::InvariantViolation`]
    InvariantViolation,
    /// Binary or JSON encoding failure
    Serialization,
    /// See [`Error::Concurrency`]
    Concurrency,
    /// See [`Error::Config`]
    Config,
    /// See [`Error::Io`]
    Io,
}

impl ErrorKind {
    /// Label used in metrics
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::Malformed => "malformed",
            ErrorKind::InsufficientFunds => "insufficient_funds",
            ErrorKind::InsufficientInventory => "insufficient_inventory",
            ErrorKind::OwnershipMismatch => "ownership_mismatch",
            ErrorKind::AlreadyExists => "already_exists",
            ErrorKind::UnknownAsset => "unknown_asset",
            ErrorKind::StoreUnavailable => "store_unavailable",
            ErrorKind::InvariantViolation => "invariant_violation",
            ErrorKind::Serialization => "serialization",
            ErrorKind::Concurrency => "concurrency",
            ErrorKind::Config => "config",
            ErrorKind::Io => "io",
        }
    }
}

impl From<rocksdb::Error> for Error {
    fn from(err: rocksdb::Error) -> Self {
        Error::StoreUnavailable(err.to_string())
    }
}
