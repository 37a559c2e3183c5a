//! Typed command boundary
//!
//! Mutations are [`Command`]s, reads are [`Query`]s. Both can be built
//! directly or parsed from the positional string form used by hosts, e.g.
//! `topUp ["alice", "points", "50"]`. Parsing only checks arity and number
//! syntax; the argument rules (positive amounts, distinct parties, integral
//! points) are checked by [`Command::validate`] before the engine touches the
//! store.

use crate::{
    error::{Error, Result},
    types::{Asset, EntityKind, PriceKind},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Adjust one holding by a signed amount
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopUp {
    pub entity: String,
    pub asset: Asset,
    pub amount: Decimal,
}

/// Move value between two holders
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub from: String,
    pub to: String,
    pub asset: Asset,
    pub amount: Decimal,
    pub remarks: String,
}

/// Buy goods from the product's owner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Purchase {
    pub buyer: String,
    pub seller: String,
    pub product: String,
    pub quantity: u64,
    pub price_kind: PriceKind,
    pub remarks: String,
}

/// Swap `amount_a` of `asset_a` for `amount_b` of `asset_b`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exchange {
    pub account_a: String,
    pub asset_a: Asset,
    pub amount_a: Decimal,
    pub account_b: String,
    pub asset_b: Asset,
    pub amount_b: Decimal,
}

/// Consume one asset to produce another inside one account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Produce {
    pub account: String,
    pub input_asset: Asset,
    pub input_amount: Decimal,
    pub output_asset: Asset,
    pub output_amount: Decimal,
}

/// Open a pending encashment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestEncashment {
    pub initiator: String,
    pub bank: String,
    pub points: i64,
}

/// Settle an encashment: points to the bank, balance to the merchant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApproveEncashment {
    pub merchant: String,
    pub bank: String,
    pub points: i64,
    pub amount: Decimal,
}

/// Create a scalar entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateEntity {
    pub kind: EntityKind,
    pub name: String,
    pub balance: Decimal,
    pub points: i64,
}

/// Create a product owned by an existing entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddProduct {
    pub name: String,
    pub points_price: i64,
    pub amount_price: Decimal,
    pub owner: String,
    pub quantity: u64,
}

/// Create a user with no accounts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateUser {
    pub user_id: String,
    pub display_name: String,
}

/// Allocate a new account for a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateAccount {
    pub user_id: String,
}

/// Register a new asset name and seed it into an account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateAsset {
    pub account: String,
    pub asset: String,
    pub quantity: Decimal,
}

/// Issue more of a registered asset into an account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueMore {
    pub account: String,
    pub asset: String,
    pub amount: Decimal,
}

/// Loyalty genesis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitLoyalty {
    pub customer: String,
    pub merchant: String,
    pub bank: String,
}

/// Register a task-tracker participant with one open task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTaskHolder {
    pub name: String,
    pub task: String,
    pub tokens: i64,
}

/// Open another task for a participant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddTask {
    pub holder: String,
    pub task: String,
}

/// Close a task and award tokens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompleteTask {
    pub holder: String,
    pub task: String,
    pub tokens: i64,
}

/// State-changing operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    TopUp(TopUp),
    Transfer(Transfer),
    Purchase(Purchase),
    Exchange(Exchange),
    Produce(Produce),
    RequestEncashment(RequestEncashment),
    ApproveEncashment(ApproveEncashment),
    CreateEntity(CreateEntity),
    AddProduct(AddProduct),
    CreateUser(CreateUser),
    CreateAccount(CreateAccount),
    CreateAsset(CreateAsset),
    IssueMore(IssueMore),
    InitLoyalty(InitLoyalty),
    InitLedger,
    CreateTaskHolder(CreateTaskHolder),
    AddTask(AddTask),
    CompleteTask(CompleteTask),
}

/// Read-only operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Query {
    /// Entity or account by key
    Entity(String),
    /// Product by key
    Product(String),
    /// User by key
    User(String),
    AllProducts,
    AllTopups,
    AllTransfers,
    AllPurchases,
    AllEncashments,
    AllExchanges,
    AllProductions,
    /// Registered asset names
    AssetTypes,
    /// Task-tracker participant by name
    TaskHolder(String),
    /// Participant with the most tokens
    Champion,
}

/// Opaque success payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Done, nothing to return
    Ack,
    /// Key of the created record
    Key(String),
    /// JSON-encoded read result
    Payload(Vec<u8>),
}

impl Reply {
    /// Payload bytes, if any
    pub fn payload(&self) -> Option<&[u8]> {
        match self {
            Reply::Payload(bytes) => Some(bytes),
            _ => None,
        }
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Ack => write!(f, "OK"),
            Reply::Key(key) => write!(f, "{}", key),
            Reply::Payload(bytes) => write!(f, "{}", String::from_utf8_lossy(bytes)),
        }
    }
}

fn expect_arity(function: &str, args: &[String], expected: &[usize]) -> Result<()> {
    if !expected.contains(&args.len()) {
        return Err(Error::malformed(format!(
            "{} expects {} argument(s), got {}",
            function,
            expected
                .iter()
                .map(|n| n.to_string())
                .collect::<Vec<_>>()
                .join(" or "),
            args.len()
        )));
    }
    Ok(())
}

fn decimal(field: &str, raw: &str) -> Result<Decimal> {
    Decimal::from_str(raw.trim())
        .map_err(|e| Error::malformed(format!("{} '{}' is not a number: {}", field, raw, e)))
}

fn integer<T: FromStr>(field: &str, raw: &str) -> Result<T>
where
    T::Err: fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| Error::malformed(format!("{} '{}' is not an integer: {}", field, raw, e)))
}

fn optional(args: &[String], idx: usize) -> String {
    args.get(idx).cloned().unwrap_or_default()
}

fn positive(field: &str, value: Decimal) -> Result<()> {
    if value <= Decimal::ZERO {
        return Err(Error::malformed(format!("{} must be positive, got {}", field, value)));
    }
    Ok(())
}

fn distinct(a: &str, b: &str) -> Result<()> {
    if a == b {
        return Err(Error::malformed(format!("{} cannot trade with itself", a)));
    }
    Ok(())
}

fn non_negative_tokens(tokens: i64) -> Result<()> {
    if tokens < 0 {
        return Err(Error::malformed(format!("tokens must not be negative, got {}", tokens)));
    }
    Ok(())
}

fn non_empty(field: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(Error::malformed(format!("{} must not be empty", field)));
    }
    Ok(())
}

impl Command {
    /// Parse the positional form
    pub fn parse(function: &str, args: &[String]) -> Result<Self> {
        let arg = |i: usize| args[i].clone();
        let command = match function {
            "topUp" => {
                expect_arity(function, args, &[3])?;
                Command::TopUp(TopUp {
                    entity: arg(0),
                    asset: Asset::from(arg(1)),
                    amount: decimal("amount", &args[2])?,
                })
            }
            "transfer" => {
                expect_arity(function, args, &[4, 5])?;
                Command::Transfer(Transfer {
                    from: arg(0),
                    to: arg(1),
                    asset: Asset::from(arg(2)),
                    amount: decimal("amount", &args[3])?,
                    remarks: optional(args, 4),
                })
            }
            "purchase" => {
                expect_arity(function, args, &[5, 6])?;
                Command::Purchase(Purchase {
                    buyer: arg(0),
                    seller: arg(1),
                    product: arg(2),
                    quantity: integer("quantity", &args[3])?,
                    price_kind: args[4].parse()?,
                    remarks: optional(args, 5),
                })
            }
            "exchange" => {
                expect_arity(function, args, &[6])?;
                Command::Exchange(Exchange {
                    account_a: arg(0),
                    asset_a: Asset::from(arg(1)),
                    amount_a: decimal("amount", &args[2])?,
                    account_b: arg(3),
                    asset_b: Asset::from(arg(4)),
                    amount_b: decimal("amount", &args[5])?,
                })
            }
            "produce" => {
                expect_arity(function, args, &[5])?;
                Command::Produce(Produce {
                    account: arg(0),
                    input_asset: Asset::from(arg(1)),
                    input_amount: decimal("input amount", &args[2])?,
                    output_asset: Asset::from(arg(3)),
                    output_amount: decimal("output amount", &args[4])?,
                })
            }
            "requestEncashment" => {
                expect_arity(function, args, &[3])?;
                Command::RequestEncashment(RequestEncashment {
                    initiator: arg(0),
                    bank: arg(1),
                    points: integer("points", &args[2])?,
                })
            }
            "approveEncashment" => {
                expect_arity(function, args, &[4])?;
                Command::ApproveEncashment(ApproveEncashment {
                    merchant: arg(0),
                    bank: arg(1),
                    points: integer("points", &args[2])?,
                    amount: decimal("amount", &args[3])?,
                })
            }
            "createEntity" => {
                expect_arity(function, args, &[4])?;
                Command::CreateEntity(CreateEntity {
                    kind: args[0].parse()?,
                    name: arg(1),
                    balance: decimal("balance", &args[2])?,
                    points: integer("points", &args[3])?,
                })
            }
            "addProduct" => {
                expect_arity(function, args, &[5])?;
                Command::AddProduct(AddProduct {
                    name: arg(0),
                    points_price: integer("points price", &args[1])?,
                    amount_price: decimal("amount price", &args[2])?,
                    owner: arg(3),
                    quantity: integer("quantity", &args[4])?,
                })
            }
            "createUser" => {
                expect_arity(function, args, &[2])?;
                Command::CreateUser(CreateUser {
                    user_id: arg(0),
                    display_name: arg(1),
                })
            }
            "createAccount" => {
                expect_arity(function, args, &[1])?;
                Command::CreateAccount(CreateAccount { user_id: arg(0) })
            }
            "createAsset" => {
                expect_arity(function, args, &[3])?;
                Command::CreateAsset(CreateAsset {
                    account: arg(0),
                    asset: arg(1),
                    quantity: decimal("quantity", &args[2])?,
                })
            }
            "issueMore" => {
                expect_arity(function, args, &[3])?;
                Command::IssueMore(IssueMore {
                    account: arg(0),
                    asset: arg(1),
                    amount: decimal("amount", &args[2])?,
                })
            }
            "initLoyalty" => {
                expect_arity(function, args, &[3])?;
                Command::InitLoyalty(InitLoyalty {
                    customer: arg(0),
                    merchant: arg(1),
                    bank: arg(2),
                })
            }
            "initLedger" => {
                expect_arity(function, args, &[0])?;
                Command::InitLedger
            }
            "createTaskEntity" => {
                expect_arity(function, args, &[3])?;
                Command::CreateTaskHolder(CreateTaskHolder {
                    name: arg(0),
                    task: arg(1),
                    tokens: integer("tokens", &args[2])?,
                })
            }
            "addTask" => {
                expect_arity(function, args, &[2])?;
                Command::AddTask(AddTask {
                    holder: arg(0),
                    task: arg(1),
                })
            }
            "taskCompletion" => {
                expect_arity(function, args, &[3])?;
                Command::CompleteTask(CompleteTask {
                    holder: arg(0),
                    task: arg(1),
                    tokens: integer("tokens", &args[2])?,
                })
            }
            other => return Err(Error::malformed(format!("unknown function '{}'", other))),
        };
        Ok(command)
    }

    /// Function name, also the metric label
    pub fn name(&self) -> &'static str {
        match self {
            Command::TopUp(_) => "topUp",
            Command::Transfer(_) => "transfer",
            Command::Purchase(_) => "purchase",
            Command::Exchange(_) => "exchange",
            Command::Produce(_) => "produce",
            Command::RequestEncashment(_) => "requestEncashment",
            Command::ApproveEncashment(_) => "approveEncashment",
            Command::CreateEntity(_) => "createEntity",
            Command::AddProduct(_) => "addProduct",
            Command::CreateUser(_) => "createUser",
            Command::CreateAccount(_) => "createAccount",
            Command::CreateAsset(_) => "createAsset",
            Command::IssueMore(_) => "issueMore",
            Command::InitLoyalty(_) => "initLoyalty",
            Command::InitLedger => "initLedger",
            Command::CreateTaskHolder(_) => "createTaskEntity",
            Command::AddTask(_) => "addTask",
            Command::CompleteTask(_) => "taskCompletion",
        }
    }

    /// True if a successful run writes a journal record
    pub fn is_journaled(&self) -> bool {
        !matches!(
            self,
            Command::CreateEntity(_)
                | Command::AddProduct(_)
                | Command::CreateUser(_)
                | Command::CreateAccount(_)
                | Command::InitLoyalty(_)
                | Command::InitLedger
                | Command::CreateTaskHolder(_)
                | Command::AddTask(_)
                | Command::CompleteTask(_)
        )
    }

    /// Check the argument rules
    pub fn validate(&self) -> Result<()> {
        match self {
            Command::TopUp(c) => c.validate(),
            Command::Transfer(c) => c.validate(),
            Command::Purchase(c) => c.validate(),
            Command::Exchange(c) => c.validate(),
            Command::Produce(c) => c.validate(),
            Command::RequestEncashment(c) => c.validate(),
            Command::ApproveEncashment(c) => c.validate(),
            Command::CreateEntity(c) => c.validate(),
            Command::AddProduct(c) => c.validate(),
            Command::CreateUser(c) => non_empty("user id", &c.user_id),
            Command::CreateAccount(c) => non_empty("user id", &c.user_id),
            Command::CreateAsset(c) => c.validate(),
            Command::IssueMore(c) => c.validate(),
            Command::InitLoyalty(c) => c.validate(),
            Command::InitLedger => Ok(()),
            Command::CreateTaskHolder(c) => c.validate(),
            Command::AddTask(c) => c.validate(),
            Command::CompleteTask(c) => c.validate(),
        }
    }
}

impl TopUp {
    /// Amount may be any sign but must fit the asset
    pub fn validate(&self) -> Result<()> {
        non_empty("entity", &self.entity)?;
        self.asset.validate_amount(self.amount)
    }
}

impl Transfer {
    pub fn validate(&self) -> Result<()> {
        distinct(&self.from, &self.to)?;
        positive("amount", self.amount)?;
        self.asset.validate_amount(self.amount)
    }
}

impl Purchase {
    pub fn validate(&self) -> Result<()> {
        distinct(&self.buyer, &self.seller)?;
        if self.quantity == 0 {
            return Err(Error::malformed("quantity must be positive"));
        }
        Ok(())
    }
}

impl Exchange {
    pub fn validate(&self) -> Result<()> {
        distinct(&self.account_a, &self.account_b)?;
        positive("amount", self.amount_a)?;
        positive("amount", self.amount_b)?;
        self.asset_a.validate_amount(self.amount_a)?;
        self.asset_b.validate_amount(self.amount_b)
    }
}

impl Produce {
    pub fn validate(&self) -> Result<()> {
        if self.input_asset == self.output_asset {
            return Err(Error::malformed(format!(
                "{} cannot be produced from itself",
                self.output_asset
            )));
        }
        positive("input amount", self.input_amount)?;
        positive("output amount", self.output_amount)?;
        self.input_asset.validate_amount(self.input_amount)?;
        self.output_asset.validate_amount(self.output_amount)
    }
}

impl RequestEncashment {
    pub fn validate(&self) -> Result<()> {
        distinct(&self.initiator, &self.bank)?;
        if self.points <= 0 {
            return Err(Error::malformed(format!(
                "points must be positive, got {}",
                self.points
            )));
        }
        Ok(())
    }
}

impl ApproveEncashment {
    pub fn validate(&self) -> Result<()> {
        distinct(&self.merchant, &self.bank)?;
        if self.points <= 0 {
            return Err(Error::malformed(format!(
                "points must be positive, got {}",
                self.points
            )));
        }
        if self.amount.is_sign_negative() && !self.amount.is_zero() {
            return Err(Error::malformed(format!(
                "amount must not be negative, got {}",
                self.amount
            )));
        }
        Ok(())
    }
}

impl CreateEntity {
    pub fn validate(&self) -> Result<()> {
        non_empty("name", &self.name)?;
        if (self.balance.is_sign_negative() && !self.balance.is_zero()) || self.points < 0 {
            return Err(Error::malformed(format!(
                "{} cannot start with negative holdings",
                self.name
            )));
        }
        Ok(())
    }
}

impl AddProduct {
    pub fn validate(&self) -> Result<()> {
        non_empty("name", &self.name)?;
        if self.points_price < 0 || (self.amount_price.is_sign_negative() && !self.amount_price.is_zero()) {
            return Err(Error::malformed(format!("{} has a negative price", self.name)));
        }
        Ok(())
    }
}

impl CreateAsset {
    pub fn validate(&self) -> Result<()> {
        let asset = Asset::named(self.asset.clone());
        if !matches!(asset, Asset::Named(_)) || self.asset.is_empty() {
            return Err(Error::malformed(format!("'{}' is not a valid asset name", self.asset)));
        }
        if self.quantity.is_sign_negative() && !self.quantity.is_zero() {
            return Err(Error::malformed(format!(
                "quantity must not be negative, got {}",
                self.quantity
            )));
        }
        Ok(())
    }
}

impl IssueMore {
    pub fn validate(&self) -> Result<()> {
        non_empty("asset", &self.asset)?;
        positive("amount", self.amount)
    }
}

impl InitLoyalty {
    pub fn validate(&self) -> Result<()> {
        distinct(&self.customer, &self.merchant)?;
        distinct(&self.customer, &self.bank)?;
        distinct(&self.merchant, &self.bank)
    }
}

impl CreateTaskHolder {
    pub fn validate(&self) -> Result<()> {
        non_empty("name", &self.name)?;
        non_empty("task", &self.task)?;
        non_negative_tokens(self.tokens)
    }
}

impl AddTask {
    pub fn validate(&self) -> Result<()> {
        non_empty("holder", &self.holder)?;
        non_empty("task", &self.task)
    }
}

impl CompleteTask {
    pub fn validate(&self) -> Result<()> {
        non_empty("holder", &self.holder)?;
        non_empty("task", &self.task)?;
        non_negative_tokens(self.tokens)
    }
}

impl Query {
    /// Parse the positional form
    pub fn parse(function: &str, args: &[String]) -> Result<Self> {
        let keyed = |make: fn(String) -> Query| -> Result<Query> {
            expect_arity(function, args, &[1])?;
            Ok(make(args[0].clone()))
        };
        let bare = |query: Query| -> Result<Query> {
            expect_arity(function, args, &[0])?;
            Ok(query)
        };
        match function {
            "read" => keyed(Query::Entity),
            "readProduct" => keyed(Query::Product),
            "readUser" => keyed(Query::User),
            "getAllProducts" => bare(Query::AllProducts),
            "getAllTxnTopup" => bare(Query::AllTopups),
            "getAllTxnTransfer" => bare(Query::AllTransfers),
            "getAllTxnGoods" => bare(Query::AllPurchases),
            "getAllTxnEncash" => bare(Query::AllEncashments),
            "getAllTxnExchange" => bare(Query::AllExchanges),
            "getAllTxnProduce" => bare(Query::AllProductions),
            "getAssetTypes" => bare(Query::AssetTypes),
            "getEntity" => keyed(Query::TaskHolder),
            "getChampion" => bare(Query::Champion),
            other => Err(Error::malformed(format!("unknown query '{}'", other))),
        }
    }

    /// True if `function` names a query
    pub fn is_query(function: &str) -> bool {
        matches!(
            function,
            "read"
                | "readProduct"
                | "readUser"
                | "getAllProducts"
                | "getAllTxnTopup"
                | "getAllTxnTransfer"
                | "getAllTxnGoods"
                | "getAllTxnEncash"
                | "getAllTxnExchange"
                | "getAllTxnProduce"
                | "getAssetTypes"
                | "getEntity"
                | "getChampion"
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_parse_top_up() {
        let command = Command::parse("topUp", &args(&["alice", "points", "50"])).unwrap();
        assert_eq!(
            command,
            Command::TopUp(TopUp {
                entity: "alice".to_string(),
                asset: Asset::Points,
                amount: Decimal::from(50),
            })
        );
        assert_eq!(command.name(), "topUp");
    }

    #[test]
    fn test_wrong_arity_is_malformed() {
        let err = Command::parse("transfer", &args(&["alice", "bob", "points"])).unwrap_err();
        assert!(matches!(err, Error::Malformed(_)));
        assert!(Command::parse("initLedger", &args(&["extra"])).is_err());
        assert!(Query::parse("read", &[]).is_err());
    }

    #[test]
    fn test_bad_number_is_malformed() {
        let err = Command::parse("topUp", &args(&["alice", "balance", "ten"])).unwrap_err();
        assert!(matches!(err, Error::Malformed(_)));
        let err = Command::parse("purchase", &args(&["a", "m", "latte", "-1", "points"])).unwrap_err();
        assert!(matches!(err, Error::Malformed(_)));
    }

    #[test]
    fn test_transfer_remarks_are_optional() {
        let Command::Transfer(t) = Command::parse("transfer", &args(&["a", "b", "balance", "1.5"])).unwrap() else {
            panic!("expected transfer");
        };
        assert_eq!(t.remarks, "");
        assert_eq!(t.amount, Decimal::new(15, 1));
    }

    #[test]
    fn test_argument_rules() {
        let same_party = Command::parse("transfer", &args(&["a", "a", "points", "1"])).unwrap();
        assert!(same_party.validate().is_err());

        let zero = Command::parse("transfer", &args(&["a", "b", "points", "0"])).unwrap();
        assert!(zero.validate().is_err());

        let fractional = Command::parse("transfer", &args(&["a", "b", "points", "1.5"])).unwrap();
        assert!(fractional.validate().is_err());

        let negative_topup = Command::parse("topUp", &args(&["a", "balance", "-5"])).unwrap();
        assert!(negative_topup.validate().is_ok());

        let zero_points = Command::parse("requestEncashment", &args(&["m", "bank", "0"])).unwrap();
        assert!(zero_points.validate().is_err());

        let free_approval = Command::parse("approveEncashment", &args(&["m", "bank", "100", "0"])).unwrap();
        assert!(free_approval.validate().is_ok());
    }

    #[test]
    fn test_parse_queries() {
        assert_eq!(
            Query::parse("readProduct", &args(&["Café Latte"])).unwrap(),
            Query::Product("Café Latte".to_string())
        );
        assert_eq!(Query::parse("getAllTxnGoods", &[]).unwrap(), Query::AllPurchases);
        assert!(Query::is_query("getAssetTypes"));
        assert!(!Query::is_query("topUp"));
        assert!(Query::parse("topUp", &[]).is_err());
    }

    #[test]
    fn test_parse_task_commands() {
        let command = Command::parse("taskCompletion", &args(&["dev", "review", "15"])).unwrap();
        assert_eq!(
            command,
            Command::CompleteTask(CompleteTask {
                holder: "dev".to_string(),
                task: "review".to_string(),
                tokens: 15,
            })
        );
        assert!(!command.is_journaled());

        let negative = Command::parse("createTaskEntity", &args(&["dev", "design", "-1"])).unwrap();
        assert!(matches!(negative.validate(), Err(Error::Malformed(_))));
        assert!(Command::parse("addTask", &args(&["dev"])).is_err());

        assert_eq!(Query::parse("getChampion", &[]).unwrap(), Query::Champion);
        assert!(Query::is_query("getEntity"));
    }

    #[test]
    fn test_unknown_function() {
        assert!(matches!(
            Command::parse("mint", &[]),
            Err(Error::Malformed(_))
        ));
    }

    #[test]
    fn test_reply_display() {
        assert_eq!(Reply::Ack.to_string(), "OK");
        assert_eq!(Reply::Key("encash1".to_string()).to_string(), "encash1");
        assert_eq!(Reply::Payload(b"[]".to_vec()).to_string(), "[]");
    }
}
