//! Transaction journal
//!
//! Every successful operation writes one immutable [`TransactionRecord`] under
//! its transaction id (encashments use a counter key instead) and appends that
//! key to the collection of its kind. Records are never rewritten by the
//! engine; the journal only grows.
//!
//! Enumeration resolves the collection and decodes each record in insertion
//! order, aborting on the first key that does not resolve to a record of the
//! expected kind.

use crate::{
    codec,
    error::{Error, Result},
    index::{self, Collection},
    state::ChangeSet,
    store::KeyValueStore,
    types::{Asset, PriceKind, Product},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Balance added to (or removed from) one holder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopupRecord {
    /// Transaction id
    pub id: String,
    /// Entity or account credited
    pub initiator: String,
    /// Asset adjusted
    pub asset: Asset,
    /// Signed amount
    pub value: Decimal,
    /// Free-text remark
    pub remarks: String,
    /// Transaction time
    pub timestamp: DateTime<Utc>,
}

/// Value moved between two holders
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRecord {
    /// Transaction id
    pub id: String,
    /// Debited holder
    pub sender: String,
    /// Credited holder
    pub receiver: String,
    /// Asset moved
    pub asset: Asset,
    /// Amount moved
    pub value: Decimal,
    /// Free-text remark
    pub remarks: String,
    /// Transaction time
    pub timestamp: DateTime<Utc>,
}

/// Goods bought from a merchant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseRecord {
    /// Transaction id
    pub id: String,
    /// Buyer
    pub sender: String,
    /// Seller
    pub receiver: String,
    /// Product key
    pub product: String,
    /// Units bought
    pub quantity: u64,
    /// Which price was paid
    pub price_kind: PriceKind,
    /// Total paid
    pub value: Decimal,
    /// `"<product> - <remark>"`
    pub remarks: String,
    /// Transaction time
    pub timestamp: DateTime<Utc>,
}

/// Encashment lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EncashmentStatus {
    /// Requested, no value moved yet
    Pending,
    /// Approved, value moved
    Completed,
}

/// Merchant encashment of points against a bank
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncashmentRecord {
    /// Journal key (`encash<n>`)
    pub key: String,
    /// Transaction id
    pub id: String,
    /// Requesting merchant
    pub initiator: String,
    /// Bank
    pub bank: String,
    /// Points encashed
    pub points: i64,
    /// Balance paid out
    pub amount: Decimal,
    /// Lifecycle state
    pub status: EncashmentStatus,
    /// Free-text remark
    pub remarks: String,
    /// Transaction time
    pub timestamp: DateTime<Utc>,
}

/// Two-leg asset swap between accounts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeRecord {
    /// Transaction id
    pub id: String,
    /// First account
    pub account_a: String,
    /// Asset given by the first account
    pub asset_a: Asset,
    /// Amount given by the first account
    pub amount_a: Decimal,
    /// Second account
    pub account_b: String,
    /// Asset given by the second account
    pub asset_b: Asset,
    /// Amount given by the second account
    pub amount_b: Decimal,
    /// Transaction time
    pub timestamp: DateTime<Utc>,
}

/// Asset consumed to produce another asset in one account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductionRecord {
    /// Transaction id
    pub id: String,
    /// Producing account
    pub account: String,
    /// Consumed asset
    pub input_asset: Asset,
    /// Consumed amount
    pub input_amount: Decimal,
    /// Produced asset
    pub output_asset: Asset,
    /// Produced amount
    pub output_amount: Decimal,
    /// Transaction time
    pub timestamp: DateTime<Utc>,
}

/// Journal entry, one variant per operation family
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionRecord {
    /// Top-up, asset creation or issuance
    Topup(TopupRecord),
    /// Transfer
    Transfer(TransferRecord),
    /// Purchase
    Purchase(PurchaseRecord),
    /// Encashment request or approval
    Encashment(EncashmentRecord),
    /// Exchange
    Exchange(ExchangeRecord),
    /// Production
    Production(ProductionRecord),
}

impl TransactionRecord {
    /// Collection this record is listed in
    pub fn collection(&self) -> Collection {
        match self {
            TransactionRecord::Topup(_) => Collection::Topups,
            TransactionRecord::Transfer(_) => Collection::Transfers,
            TransactionRecord::Purchase(_) => Collection::Purchases,
            TransactionRecord::Encashment(_) => Collection::Encashments,
            TransactionRecord::Exchange(_) => Collection::Exchanges,
            TransactionRecord::Production(_) => Collection::Productions,
        }
    }

    /// Store key the record was written under
    pub fn journal_key(&self) -> &str {
        match self {
            TransactionRecord::Topup(r) => &r.id,
            TransactionRecord::Transfer(r) => &r.id,
            TransactionRecord::Purchase(r) => &r.id,
            TransactionRecord::Encashment(r) => &r.key,
            TransactionRecord::Exchange(r) => &r.id,
            TransactionRecord::Production(r) => &r.id,
        }
    }
}

/// Stage `record` under `key` and list it in its collection
///
/// The collection must already be initialized; otherwise this fails with
/// `NotFound` before anything is staged.
///
/// A key that already holds a record of the same kind is a retried
/// transaction: the record is replaced and listed again. A key holding a
/// record of another kind is `AlreadyExists`; a key holding anything that is
/// not a journal record (entity, product, collection) is `Malformed`.
pub fn record(changes: &mut ChangeSet<'_>, key: &str, record: &TransactionRecord) -> Result<()> {
    let collection = record.collection();
    // Resolve the collection first so a missing one fails before staging
    index::keys(changes, collection)?;
    ensure_journal_slot(changes, key, collection)?;
    changes.stage(key, record)?;
    index::append(changes, collection, key)
}

fn ensure_journal_slot(changes: &ChangeSet<'_>, key: &str, collection: Collection) -> Result<()> {
    let Some(bytes) = changes.get_raw(key)? else {
        return Ok(());
    };
    match codec::decode::<TransactionRecord>(&bytes) {
        Ok(existing) if existing.journal_key() == key => {
            if existing.collection() != collection {
                return Err(Error::AlreadyExists(format!(
                    "transaction id {} already holds a {} record",
                    key,
                    existing.collection()
                )));
            }
            tracing::debug!(key, collection = %collection, "Transaction id retried");
            Ok(())
        }
        _ => Err(Error::malformed(format!(
            "transaction id {} collides with a non-journal record",
            key
        ))),
    }
}

macro_rules! decode_variant {
    ($name:ident, $variant:ident, $ty:ty) => {
        fn $name(key: &str, bytes: &[u8]) -> Result<$ty> {
            match codec::decode::<TransactionRecord>(bytes)? {
                TransactionRecord::$variant(record) => Ok(record),
                other => Err(Error::InvariantViolation(format!(
                    "{} is listed as {} but holds a {} record",
                    key,
                    stringify!($variant),
                    other.collection()
                ))),
            }
        }
    };
}

decode_variant!(decode_topup, Topup, TopupRecord);
decode_variant!(decode_transfer, Transfer, TransferRecord);
decode_variant!(decode_purchase, Purchase, PurchaseRecord);
decode_variant!(decode_encashment, Encashment, EncashmentRecord);
decode_variant!(decode_exchange, Exchange, ExchangeRecord);
decode_variant!(decode_production, Production, ProductionRecord);

fn decode_product(_key: &str, bytes: &[u8]) -> Result<Product> {
    codec::decode(bytes)
}

/// Read-only enumeration queries
pub struct Journal<'a> {
    store: &'a dyn KeyValueStore,
}

impl<'a> Journal<'a> {
    /// Journal over a store
    pub fn new(store: &'a dyn KeyValueStore) -> Self {
        Self { store }
    }

    /// All top-up records
    pub fn topups(&self) -> Result<Vec<TopupRecord>> {
        index::resolve(self.store, Collection::Topups, decode_topup)?.collect()
    }

    /// All transfer records
    pub fn transfers(&self) -> Result<Vec<TransferRecord>> {
        index::resolve(self.store, Collection::Transfers, decode_transfer)?.collect()
    }

    /// All purchase records
    pub fn purchases(&self) -> Result<Vec<PurchaseRecord>> {
        index::resolve(self.store, Collection::Purchases, decode_purchase)?.collect()
    }

    /// All encashment records (requests and approvals)
    pub fn encashments(&self) -> Result<Vec<EncashmentRecord>> {
        index::resolve(self.store, Collection::Encashments, decode_encashment)?.collect()
    }

    /// All exchange records
    pub fn exchanges(&self) -> Result<Vec<ExchangeRecord>> {
        index::resolve(self.store, Collection::Exchanges, decode_exchange)?.collect()
    }

    /// All production records
    pub fn productions(&self) -> Result<Vec<ProductionRecord>> {
        index::resolve(self.store, Collection::Productions, decode_production)?.collect()
    }

    /// All products
    pub fn products(&self) -> Result<Vec<Product>> {
        index::resolve(self.store, Collection::Products, decode_product)?.collect()
    }

    /// Registered asset-type names
    pub fn asset_names(&self) -> Result<Vec<String>> {
        index::enumerate(self.store, Collection::AssetNames)
    }

    /// Lazily resolved top-ups, for callers that stream
    pub fn iter_topups(&self) -> Result<index::Resolved<'a, TopupRecord>> {
        index::resolve(self.store, Collection::Topups, decode_topup)
    }
}
