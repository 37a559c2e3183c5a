//! Multi-asset account operations
//!
//! Exchange and production take their amounts as given. No conversion rate
//! between the two legs (or between input and output) is enforced, so
//! `produce` does not conserve value.

use super::{allocate_account, initialize_collections, TransitionEngine};
use crate::{
    command::{CreateAsset, Exchange, IssueMore, Produce},
    context::TransactionContext,
    error::{Error, Result},
    index::{self, Collection},
    journal::{self, ExchangeRecord, ProductionRecord, TopupRecord, TransactionRecord},
    sequence::Sequence,
    types::{Asset, Entity},
};

impl TransitionEngine {
    /// Swap between two holders: `amount_a` of `asset_a` goes A to B,
    /// `amount_b` of `asset_b` goes B to A
    pub fn exchange(&self, cmd: &Exchange, ctx: &dyn TransactionContext) -> Result<()> {
        cmd.validate()?;
        let id = ctx.id();
        let keys = [
            cmd.account_a.as_str(),
            cmd.account_b.as_str(),
            Collection::Exchanges.key(),
            id.as_str(),
        ];

        self.transact(&keys, |changes| {
            let mut a = changes.entity(&cmd.account_a)?;
            let mut b = changes.entity(&cmd.account_b)?;

            // Both legs are checked against opening balances
            a.ensure_covers(&cmd.asset_a, cmd.amount_a)?;
            b.ensure_covers(&cmd.asset_b, cmd.amount_b)?;

            a.debit(&cmd.asset_a, cmd.amount_a)?;
            b.credit(&cmd.asset_a, cmd.amount_a)?;
            b.debit(&cmd.asset_b, cmd.amount_b)?;
            a.credit(&cmd.asset_b, cmd.amount_b)?;

            changes.stage(&cmd.account_a, &a)?;
            changes.stage(&cmd.account_b, &b)?;

            let record = TransactionRecord::Exchange(ExchangeRecord {
                id: id.clone(),
                account_a: cmd.account_a.clone(),
                asset_a: cmd.asset_a.clone(),
                amount_a: cmd.amount_a,
                account_b: cmd.account_b.clone(),
                asset_b: cmd.asset_b.clone(),
                amount_b: cmd.amount_b,
                timestamp: ctx.timestamp(),
            });
            journal::record(changes, &id, &record)
        })?;

        tracing::info!(
            tx_id = %id,
            account_a = %cmd.account_a,
            asset_a = %cmd.asset_a,
            amount_a = %cmd.amount_a,
            account_b = %cmd.account_b,
            asset_b = %cmd.asset_b,
            amount_b = %cmd.amount_b,
            "Exchange applied"
        );
        Ok(())
    }

    /// Consume `input_amount` of one asset and add `output_amount` of another
    pub fn produce(&self, cmd: &Produce, ctx: &dyn TransactionContext) -> Result<()> {
        cmd.validate()?;
        let id = ctx.id();
        let keys = [cmd.account.as_str(), Collection::Productions.key(), id.as_str()];

        self.transact(&keys, |changes| {
            let mut account = changes.entity(&cmd.account)?;
            account.debit(&cmd.input_asset, cmd.input_amount)?;
            account.credit(&cmd.output_asset, cmd.output_amount)?;
            changes.stage(&cmd.account, &account)?;

            let record = TransactionRecord::Production(ProductionRecord {
                id: id.clone(),
                account: cmd.account.clone(),
                input_asset: cmd.input_asset.clone(),
                input_amount: cmd.input_amount,
                output_asset: cmd.output_asset.clone(),
                output_amount: cmd.output_amount,
                timestamp: ctx.timestamp(),
            });
            journal::record(changes, &id, &record)
        })?;

        tracing::info!(
            tx_id = %id,
            account = %cmd.account,
            input = %cmd.input_asset,
            input_amount = %cmd.input_amount,
            output = %cmd.output_asset,
            output_amount = %cmd.output_amount,
            "Production applied"
        );
        Ok(())
    }

    /// Register a new asset name and set the account's holding of it
    pub fn create_asset(&self, cmd: &CreateAsset, ctx: &dyn TransactionContext) -> Result<()> {
        cmd.validate()?;
        let id = ctx.id();
        let keys = [
            cmd.account.as_str(),
            Collection::AssetNames.key(),
            Collection::Topups.key(),
            id.as_str(),
        ];
        let asset = Asset::named(cmd.asset.clone());

        self.transact(&keys, |changes| {
            if index::contains(changes, Collection::AssetNames, &cmd.asset)? {
                return Err(Error::AlreadyExists(format!("asset {}", cmd.asset)));
            }
            let mut account = changes.entity(&cmd.account)?;
            account.set_balance(&asset, cmd.quantity)?;
            changes.stage(&cmd.account, &account)?;
            index::append(changes, Collection::AssetNames, &cmd.asset)?;

            let record = TransactionRecord::Topup(TopupRecord {
                id: id.clone(),
                initiator: cmd.account.clone(),
                asset: asset.clone(),
                value: cmd.quantity,
                remarks: format!("{} added", cmd.asset),
                timestamp: ctx.timestamp(),
            });
            journal::record(changes, &id, &record)
        })?;

        tracing::info!(
            tx_id = %id,
            account = %cmd.account,
            asset = %cmd.asset,
            quantity = %cmd.quantity,
            "Asset created"
        );
        Ok(())
    }

    /// Add more of a registered asset to an account
    pub fn issue_more(&self, cmd: &IssueMore, ctx: &dyn TransactionContext) -> Result<()> {
        cmd.validate()?;
        let id = ctx.id();
        let keys = [
            cmd.account.as_str(),
            Collection::AssetNames.key(),
            Collection::Topups.key(),
            id.as_str(),
        ];
        let asset = Asset::named(cmd.asset.clone());

        self.transact(&keys, |changes| {
            if !index::contains(changes, Collection::AssetNames, &cmd.asset)? {
                return Err(Error::UnknownAsset(cmd.asset.clone()));
            }
            let mut account = changes.entity(&cmd.account)?;
            account.credit(&asset, cmd.amount)?;
            changes.stage(&cmd.account, &account)?;

            let record = TransactionRecord::Topup(TopupRecord {
                id: id.clone(),
                initiator: cmd.account.clone(),
                asset: asset.clone(),
                value: cmd.amount,
                remarks: format!("{} added", cmd.asset),
                timestamp: ctx.timestamp(),
            });
            journal::record(changes, &id, &record)
        })?;

        tracing::info!(
            tx_id = %id,
            account = %cmd.account,
            asset = %cmd.asset,
            amount = %cmd.amount,
            "Asset issued"
        );
        Ok(())
    }

    /// Supply-chain genesis: collections, seed accounts, asset names
    ///
    /// Seed accounts take the next ids from the account counter, so a second
    /// run creates a second set. Asset names already registered are kept.
    pub fn init_ledger(&self) -> Result<Vec<String>> {
        let mut keys: Vec<&str> = Collection::ALL.iter().map(|c| c.key()).collect();
        keys.push(Sequence::Account.key());
        let genesis = &self.genesis;

        let account_ids = self.transact(&keys, |changes| {
            initialize_collections(changes)?;

            let mut account_ids = Vec::with_capacity(genesis.accounts.len());
            for holdings in &genesis.accounts {
                let id = allocate_account(changes, |id| Entity::account_with(id, holdings.clone()))?;
                account_ids.push(id);
            }

            for name in &genesis.asset_names {
                if !index::contains(changes, Collection::AssetNames, name)? {
                    index::append(changes, Collection::AssetNames, name)?;
                }
            }
            Ok(account_ids)
        })?;

        tracing::info!(
            accounts = ?account_ids,
            asset_names = ?genesis.asset_names,
            "Supply-chain genesis applied"
        );
        Ok(account_ids)
    }
}
