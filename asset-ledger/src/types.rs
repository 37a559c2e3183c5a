//! Core types for the ledger
//!
//! All types are designed for:
//! - Deterministic serialization (bincode, `BTreeMap` for named holdings)
//! - Exact arithmetic (Decimal for balances, i64 for points)
//! - Non-negative quantities at rest

use crate::{Error, Result};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Asset moved by an operation
///
/// Scalar entities hold exactly `points` and `balance`; accounts hold any
/// number of named assets.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Asset {
    /// Integral loyalty points
    Points,
    /// Monetary balance
    Balance,
    /// Named asset of a multi-asset account
    Named(String),
}

impl Asset {
    /// Create a named asset
    pub fn named(name: impl Into<String>) -> Self {
        Asset::from(name.into())
    }

    /// Canonical name
    pub fn as_str(&self) -> &str {
        match self {
            Asset::Points => "points",
            Asset::Balance => "balance",
            Asset::Named(name) => name,
        }
    }

    /// Reject amounts this asset cannot represent (fractional points)
    pub fn validate_amount(&self, amount: Decimal) -> Result<()> {
        if *self == Asset::Points && !amount.fract().is_zero() {
            return Err(Error::malformed(format!(
                "points amount must be integral, got {}",
                amount
            )));
        }
        Ok(())
    }
}

impl From<String> for Asset {
    fn from(name: String) -> Self {
        match name.as_str() {
            "points" => Asset::Points,
            "balance" | "amount" => Asset::Balance,
            _ => Asset::Named(name),
        }
    }
}

impl From<Asset> for String {
    fn from(asset: Asset) -> Self {
        match asset {
            Asset::Named(name) => name,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Entity role tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum EntityKind {
    /// Loyalty customer
    Customer = 1,
    /// Merchant selling products
    Merchant = 2,
    /// Bank backing encashments
    Bank = 3,
    /// Anything else, including supply-chain accounts
    Generic = 4,
}

impl EntityKind {
    /// Lowercase label
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Customer => "customer",
            EntityKind::Merchant => "merchant",
            EntityKind::Bank => "bank",
            EntityKind::Generic => "generic",
        }
    }
}

impl FromStr for EntityKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "customer" => Ok(EntityKind::Customer),
            "merchant" => Ok(EntityKind::Merchant),
            "bank" => Ok(EntityKind::Bank),
            "generic" => Ok(EntityKind::Generic),
            other => Err(Error::malformed(format!("unknown entity kind '{}'", other))),
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which product price a purchase pays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriceKind {
    /// Pay `points_price` per unit from the points holding
    Points,
    /// Pay `amount_price` per unit from the balance holding
    Amount,
}

impl PriceKind {
    /// Holding debited by this price kind
    pub fn asset(&self) -> Asset {
        match self {
            PriceKind::Points => Asset::Points,
            PriceKind::Amount => Asset::Balance,
        }
    }
}

impl FromStr for PriceKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "points" => Ok(PriceKind::Points),
            "amount" | "balance" => Ok(PriceKind::Amount),
            other => Err(Error::malformed(format!("unknown price kind '{}'", other))),
        }
    }
}

/// What a principal holds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Holdings {
    /// Two-asset loyalty variant
    Scalar {
        /// Monetary balance
        balance: Decimal,
        /// Loyalty points
        points: i64,
    },
    /// Multi-asset variant
    Named(BTreeMap<String, Decimal>),
}

impl Holdings {
    /// Empty named holdings
    pub fn named() -> Self {
        Holdings::Named(BTreeMap::new())
    }

    fn get(&self, asset: &Asset) -> Option<Decimal> {
        match (self, asset) {
            (Holdings::Scalar { balance, .. }, Asset::Balance) => Some(*balance),
            (Holdings::Scalar { points, .. }, Asset::Points) => Some(Decimal::from(*points)),
            (Holdings::Named(map), Asset::Named(name)) => {
                Some(map.get(name).copied().unwrap_or(Decimal::ZERO))
            }
            _ => None,
        }
    }

    fn set(&mut self, asset: &Asset, value: Decimal) -> Result<()> {
        match (self, asset) {
            (Holdings::Scalar { balance, .. }, Asset::Balance) => *balance = value,
            (Holdings::Scalar { points, .. }, Asset::Points) => {
                *points = value.to_i64().ok_or_else(|| {
                    Error::malformed(format!("points value {} out of range", value))
                })?;
            }
            (Holdings::Named(map), Asset::Named(name)) => {
                map.insert(name.clone(), value);
            }
            _ => {
                return Err(Error::malformed(format!(
                    "asset '{}' not supported by these holdings",
                    asset
                )))
            }
        }
        Ok(())
    }

    fn is_non_negative(&self) -> bool {
        match self {
            Holdings::Scalar { balance, points } => !balance.is_sign_negative() && *points >= 0,
            Holdings::Named(map) => map.values().all(|v| !v.is_sign_negative()),
        }
    }
}

/// Principal holding assets: customer, merchant, bank or account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    /// Unique name, doubles as store key
    pub name: String,

    /// Role tag
    pub kind: EntityKind,

    /// Holdings
    pub holdings: Holdings,
}

impl Entity {
    /// Scalar entity with initial balance and points
    pub fn scalar(kind: EntityKind, name: impl Into<String>, balance: Decimal, points: i64) -> Self {
        Self {
            name: name.into(),
            kind,
            holdings: Holdings::Scalar { balance, points },
        }
    }

    /// Multi-asset account with no holdings
    pub fn account(account_id: impl Into<String>) -> Self {
        Self {
            name: account_id.into(),
            kind: EntityKind::Generic,
            holdings: Holdings::named(),
        }
    }

    /// Multi-asset account with initial holdings
    pub fn account_with(account_id: impl Into<String>, assets: BTreeMap<String, Decimal>) -> Self {
        Self {
            name: account_id.into(),
            kind: EntityKind::Generic,
            holdings: Holdings::Named(assets),
        }
    }

    /// Current quantity of `asset`
    pub fn balance(&self, asset: &Asset) -> Result<Decimal> {
        self.holdings.get(asset).ok_or_else(|| {
            Error::malformed(format!("entity {} does not hold asset '{}'", self.name, asset))
        })
    }

    /// Fail with `InsufficientFunds` unless at least `amount` of `asset` is held
    pub fn ensure_covers(&self, asset: &Asset, amount: Decimal) -> Result<()> {
        let available = self.balance(asset)?;
        if available < amount {
            return Err(Error::InsufficientFunds {
                holder: self.name.clone(),
                asset: asset.to_string(),
                available,
                required: amount,
            });
        }
        Ok(())
    }

    /// Add a signed amount; the result must stay non-negative
    pub fn adjust(&mut self, asset: &Asset, amount: Decimal) -> Result<()> {
        asset.validate_amount(amount)?;
        let current = self.balance(asset)?;
        let next = current
            .checked_add(amount)
            .ok_or_else(|| Error::malformed(format!("{} overflows {}", amount, asset)))?;
        if next.is_sign_negative() && !next.is_zero() {
            return Err(Error::InsufficientFunds {
                holder: self.name.clone(),
                asset: asset.to_string(),
                available: current,
                required: -amount,
            });
        }
        self.holdings.set(asset, next)
    }

    /// Add `amount` of `asset`
    pub fn credit(&mut self, asset: &Asset, amount: Decimal) -> Result<()> {
        self.adjust(asset, amount)
    }

    /// Remove `amount` of `asset`
    pub fn debit(&mut self, asset: &Asset, amount: Decimal) -> Result<()> {
        self.ensure_covers(asset, amount)?;
        self.adjust(asset, -amount)
    }

    /// Overwrite the holding of `asset`
    pub fn set_balance(&mut self, asset: &Asset, value: Decimal) -> Result<()> {
        asset.validate_amount(value)?;
        if value.is_sign_negative() && !value.is_zero() {
            return Err(Error::malformed(format!("negative quantity {}", value)));
        }
        self.holdings.set(asset, value)
    }

    /// True when every holding is ≥ 0
    pub fn is_non_negative(&self) -> bool {
        self.holdings.is_non_negative()
    }
}

/// Inventory-backed product sold by a merchant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Product name, doubles as store key
    pub name: String,

    /// Unit price in points
    pub points_price: i64,

    /// Unit price in balance
    pub amount_price: Decimal,

    /// Owning entity (by name)
    pub owner: String,

    /// Units in stock
    pub quantity_available: u64,
}

impl Product {
    /// Unit price for the given price kind
    pub fn unit_price(&self, kind: PriceKind) -> Decimal {
        match kind {
            PriceKind::Points => Decimal::from(self.points_price),
            PriceKind::Amount => self.amount_price,
        }
    }
}

/// User owning multi-asset accounts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// User id, doubles as store key
    pub user_id: String,

    /// Display name
    pub display_name: String,

    /// Owned account ids, in creation order
    pub account_ids: Vec<String>,
}

/// Participant of the task tracker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskHolder {
    /// Unique name, doubles as store key
    pub name: String,

    /// Task name to completion flag
    pub tasks: BTreeMap<String, bool>,

    /// Tokens earned so far
    pub tokens: i64,
}

impl TaskHolder {
    /// Holder with one open task
    pub fn new(name: impl Into<String>, task: impl Into<String>, tokens: i64) -> Self {
        let mut tasks = BTreeMap::new();
        tasks.insert(task.into(), false);
        Self {
            name: name.into(),
            tasks,
            tokens,
        }
    }

    /// Open a new task; a task name is used once per holder
    pub fn add_task(&mut self, task: &str) -> Result<()> {
        if self.tasks.contains_key(task) {
            return Err(Error::AlreadyExists(format!("task {} of {}", task, self.name)));
        }
        self.tasks.insert(task.to_string(), false);
        Ok(())
    }

    /// Close an open task and earn `tokens`
    pub fn complete(&mut self, task: &str, tokens: i64) -> Result<()> {
        match self.tasks.get_mut(task) {
            None => Err(Error::NotFound(format!("task {} of {}", task, self.name))),
            Some(true) => Err(Error::AlreadyExists(format!(
                "task {} of {} is already completed",
                task, self.name
            ))),
            Some(done) => {
                let earned = self.tokens.checked_add(tokens).ok_or_else(|| {
                    Error::malformed(format!("{} tokens overflow {}", tokens, self.name))
                })?;
                *done = true;
                self.tokens = earned;
                Ok(())
            }
        }
    }
}

/// Holder with the most tokens so far
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Champion {
    /// Leading holder, `None` until the first completion
    pub holder: Option<String>,

    /// Token count of the leader
    pub tokens: i64,
}

impl Champion {
    /// Take the lead if `holder` strictly beats the current count
    pub fn observe(&mut self, holder: &TaskHolder) -> bool {
        if holder.tokens > self.tokens {
            self.holder = Some(holder.name.clone());
            self.tokens = holder.tokens;
            return true;
        }
        false
    }
}
