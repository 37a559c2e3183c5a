//! Transition engine
//!
//! Every operation follows the same shape:
//!
//! 1. check the argument rules of its command
//! 2. take the per-key locks of every key it will read or write
//! 3. load, validate and stage all writes in one [`ChangeSet`]
//! 4. commit the change set and release the locks
//!
//! A failure in step 1 or 3 returns before anything is written, so an
//! operation either completes fully or leaves the store untouched.
//!
//! Operations are grouped by family: loyalty (top-up, transfer, purchase,
//! encashment) in [`loyalty`], multi-asset accounts (exchange, production,
//! asset registration) in [`assets`], the task tracker in [`tasks`],
//! creation and genesis here.

mod assets;
mod loyalty;
mod tasks;

use crate::{
    codec,
    command::{
        AddProduct, Command, CreateAccount, CreateEntity, CreateUser, InitLoyalty, Query, Reply,
    },
    config::{Config, EncashmentConfig, GenesisConfig},
    context::TransactionContext,
    error::{Error, Result},
    index::{self, Collection},
    journal::Journal,
    locks::KeyLocks,
    sequence::{Sequence, COUNTER_PREFIX},
    state::{load_record, ChangeSet, EntityStore},
    store::KeyValueStore,
    types::{Entity, EntityKind, Product, TaskHolder, User},
};
use std::sync::Arc;

/// Executes commands against a key-value store
pub struct TransitionEngine {
    store: Arc<dyn KeyValueStore>,
    locks: KeyLocks,
    encashment: EncashmentConfig,
    genesis: GenesisConfig,
}

impl TransitionEngine {
    /// Engine over `store`
    pub fn new(store: Arc<dyn KeyValueStore>, config: &Config) -> Self {
        Self {
            store,
            locks: KeyLocks::new(),
            encashment: config.encashment.clone(),
            genesis: config.genesis.clone(),
        }
    }

    /// Underlying store
    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    /// Typed entity access over the same store
    pub fn entities(&self) -> EntityStore {
        EntityStore::new(self.store.clone())
    }

    /// Run a command
    pub fn execute(&self, command: &Command, ctx: &dyn TransactionContext) -> Result<Reply> {
        command.validate()?;
        match command {
            Command::TopUp(c) => self.top_up(c, ctx).map(|_| Reply::Ack),
            Command::Transfer(c) => self.transfer(c, ctx).map(|_| Reply::Ack),
            Command::Purchase(c) => self.purchase(c, ctx).map(|_| Reply::Ack),
            Command::Exchange(c) => self.exchange(c, ctx).map(|_| Reply::Ack),
            Command::Produce(c) => self.produce(c, ctx).map(|_| Reply::Ack),
            Command::RequestEncashment(c) => self.request_encashment(c, ctx).map(Reply::Key),
            Command::ApproveEncashment(c) => self.approve_encashment(c, ctx).map(Reply::Key),
            Command::CreateEntity(c) => self.create_entity(c).map(|_| Reply::Ack),
            Command::AddProduct(c) => self.add_product(c).map(|_| Reply::Ack),
            Command::CreateUser(c) => self.create_user(c).map(|_| Reply::Ack),
            Command::CreateAccount(c) => self.create_account(c).map(Reply::Key),
            Command::CreateAsset(c) => self.create_asset(c, ctx).map(|_| Reply::Ack),
            Command::IssueMore(c) => self.issue_more(c, ctx).map(|_| Reply::Ack),
            Command::InitLoyalty(c) => self.init_loyalty(c).map(|_| Reply::Ack),
            Command::InitLedger => self.init_ledger().map(|_| Reply::Ack),
            Command::CreateTaskHolder(c) => self.create_task_holder(c).map(|_| Reply::Ack),
            Command::AddTask(c) => self.add_task(c).map(|_| Reply::Ack),
            Command::CompleteTask(c) => self.complete_task(c).map(|_| Reply::Ack),
        }
    }

    /// Answer a read; never takes locks
    pub fn query(&self, query: &Query) -> Result<Reply> {
        let store = self.store.as_ref();
        let journal = Journal::new(store);
        let payload = match query {
            Query::Entity(key) => codec::to_payload(&load_record::<Entity>(store, key)?)?,
            Query::Product(key) => codec::to_payload(&load_record::<Product>(store, key)?)?,
            Query::User(key) => codec::to_payload(&load_record::<User>(store, key)?)?,
            Query::AllProducts => codec::to_payload(&journal.products()?)?,
            Query::AllTopups => codec::to_payload(&journal.topups()?)?,
            Query::AllTransfers => codec::to_payload(&journal.transfers()?)?,
            Query::AllPurchases => codec::to_payload(&journal.purchases()?)?,
            Query::AllEncashments => codec::to_payload(&journal.encashments()?)?,
            Query::AllExchanges => codec::to_payload(&journal.exchanges()?)?,
            Query::AllProductions => codec::to_payload(&journal.productions()?)?,
            Query::AssetTypes => codec::to_payload(&journal.asset_names()?)?,
            Query::TaskHolder(key) => codec::to_payload(&load_record::<TaskHolder>(store, key)?)?,
            Query::Champion => codec::to_payload(&self.champion_holder()?)?,
        };
        Ok(Reply::Payload(payload))
    }

    /// Lock `keys`, stage through `op`, commit
    fn transact<R>(
        &self,
        keys: &[&str],
        op: impl FnOnce(&mut ChangeSet<'_>) -> Result<R>,
    ) -> Result<R> {
        self.locks.with_keys(keys, || {
            let mut changes = ChangeSet::new(self.store.as_ref());
            let out = op(&mut changes)?;
            let written = changes.commit()?;
            tracing::trace!(keys = written, "Change set committed");
            Ok(out)
        })
    }

    /// Create a scalar entity
    pub fn create_entity(&self, cmd: &CreateEntity) -> Result<()> {
        cmd.validate()?;
        ensure_record_key(&cmd.name)?;
        self.transact(&[cmd.name.as_str()], |changes| {
            changes.ensure_absent(&cmd.name)?;
            let entity = Entity::scalar(cmd.kind, cmd.name.clone(), cmd.balance, cmd.points);
            changes.stage(&cmd.name, &entity)
        })?;

        tracing::info!(entity = %cmd.name, kind = %cmd.kind, "Entity created");
        Ok(())
    }

    /// Create a product and list it in `Products`
    pub fn add_product(&self, cmd: &AddProduct) -> Result<()> {
        cmd.validate()?;
        ensure_record_key(&cmd.name)?;
        let keys = [cmd.name.as_str(), cmd.owner.as_str(), Collection::Products.key()];
        self.transact(&keys, |changes| {
            changes.ensure_absent(&cmd.name)?;
            changes.entity(&cmd.owner)?;
            let product = Product {
                name: cmd.name.clone(),
                points_price: cmd.points_price,
                amount_price: cmd.amount_price,
                owner: cmd.owner.clone(),
                quantity_available: cmd.quantity,
            };
            changes.stage(&cmd.name, &product)?;
            index::append(changes, Collection::Products, &cmd.name)
        })?;

        tracing::info!(product = %cmd.name, owner = %cmd.owner, quantity = cmd.quantity, "Product added");
        Ok(())
    }

    /// Create a user with no accounts
    pub fn create_user(&self, cmd: &CreateUser) -> Result<()> {
        ensure_record_key(&cmd.user_id)?;
        self.transact(&[cmd.user_id.as_str()], |changes| {
            changes.ensure_absent(&cmd.user_id)?;
            let user = User {
                user_id: cmd.user_id.clone(),
                display_name: cmd.display_name.clone(),
                account_ids: Vec::new(),
            };
            changes.stage(&cmd.user_id, &user)
        })?;

        tracing::info!(user = %cmd.user_id, "User created");
        Ok(())
    }

    /// Allocate `Account-<n>` for a user; returns the account id
    pub fn create_account(&self, cmd: &CreateAccount) -> Result<String> {
        let keys = [cmd.user_id.as_str(), Sequence::Account.key()];
        let account_id = self.transact(&keys, |changes| {
            let mut user: User = changes.load(&cmd.user_id)?;
            let account_id = allocate_account(changes, Entity::account)?;
            user.account_ids.push(account_id.clone());
            changes.stage(&cmd.user_id, &user)?;
            Ok(account_id)
        })?;

        tracing::info!(user = %cmd.user_id, account = %account_id, "Account created");
        Ok(account_id)
    }

    /// Initialize collections, create the loyalty entities and seed products
    pub fn init_loyalty(&self, cmd: &InitLoyalty) -> Result<()> {
        cmd.validate()?;
        let genesis = &self.genesis;
        let seeds = [
            (EntityKind::Customer, &cmd.customer, &genesis.customer),
            (EntityKind::Merchant, &cmd.merchant, &genesis.merchant),
            (EntityKind::Bank, &cmd.bank, &genesis.bank),
        ];

        let mut keys: Vec<&str> = Collection::ALL.iter().map(|c| c.key()).collect();
        keys.extend(seeds.iter().map(|(_, name, _)| name.as_str()));
        keys.extend(genesis.products.iter().map(|p| p.name.as_str()));

        for (_, name, _) in &seeds {
            ensure_record_key(name)?;
        }
        for product in &genesis.products {
            ensure_record_key(&product.name)?;
        }

        self.transact(&keys, |changes| {
            initialize_collections(changes)?;

            for (kind, name, holdings) in &seeds {
                changes.ensure_absent(name)?;
                let entity = Entity::scalar(*kind, name.as_str(), holdings.balance, holdings.points);
                changes.stage(name, &entity)?;
            }

            for seed in &genesis.products {
                changes.ensure_absent(&seed.name)?;
                let product = Product {
                    name: seed.name.clone(),
                    points_price: seed.points_price,
                    amount_price: seed.amount_price,
                    owner: cmd.merchant.clone(),
                    quantity_available: seed.quantity,
                };
                changes.stage(&seed.name, &product)?;
                index::append(changes, Collection::Products, &seed.name)?;
            }
            Ok(())
        })?;

        tracing::info!(
            customer = %cmd.customer,
            merchant = %cmd.merchant,
            bank = %cmd.bank,
            products = genesis.products.len(),
            "Loyalty genesis applied"
        );
        Ok(())
    }

    /// Initialize collections on their own (idempotent)
    pub fn initialize_collections(&self) -> Result<()> {
        let keys: Vec<&str> = Collection::ALL.iter().map(|c| c.key()).collect();
        self.transact(&keys, initialize_collections)
    }
}

/// Initialize every collection that was never written
fn initialize_collections(changes: &mut ChangeSet<'_>) -> Result<()> {
    for collection in Collection::ALL {
        if index::ensure_initialized(changes, collection)? {
            tracing::debug!(collection = %collection, "Collection initialized");
        }
    }
    Ok(())
}

/// Take the next account id and stage the account built by `make`
fn allocate_account(
    changes: &mut ChangeSet<'_>,
    make: impl FnOnce(String) -> Entity,
) -> Result<String> {
    let value = Sequence::Account.next(changes)?;
    let account_id = Sequence::Account.format(value);
    changes.ensure_absent(&account_id)?;
    let account = make(account_id.clone());
    changes.stage(&account_id, &account)?;
    Ok(account_id)
}

/// Names may not shadow a collection or counter
fn ensure_record_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(Error::malformed("record key must not be empty"));
    }
    if Collection::is_collection_key(key) || key.starts_with(COUNTER_PREFIX) {
        return Err(Error::malformed(format!("'{}' is a reserved key", key)));
    }
    Ok(())
}

#[cfg(test)]
mod tests;
