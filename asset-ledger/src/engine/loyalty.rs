//! Loyalty operations: top-up, transfer, purchase, encashment

use super::TransitionEngine;
use crate::{
    command::{ApproveEncashment, Purchase, RequestEncashment, TopUp, Transfer},
    context::TransactionContext,
    error::{Error, Result},
    index::Collection,
    journal::{
        self, EncashmentRecord, EncashmentStatus, PurchaseRecord, TopupRecord, TransactionRecord,
        TransferRecord,
    },
    sequence::Sequence,
    types::{Asset, Product},
};
use rust_decimal::Decimal;

impl TransitionEngine {
    /// Add a signed amount to one holding
    ///
    /// A negative amount withdraws; the holding may not end below zero.
    pub fn top_up(&self, cmd: &TopUp, ctx: &dyn TransactionContext) -> Result<()> {
        cmd.validate()?;
        let id = ctx.id();
        let keys = [cmd.entity.as_str(), Collection::Topups.key(), id.as_str()];

        self.transact(&keys, |changes| {
            let mut entity = changes.entity(&cmd.entity)?;
            entity.adjust(&cmd.asset, cmd.amount)?;
            changes.stage(&cmd.entity, &entity)?;

            let record = TransactionRecord::Topup(TopupRecord {
                id: id.clone(),
                initiator: cmd.entity.clone(),
                asset: cmd.asset.clone(),
                value: cmd.amount,
                remarks: format!("{} added", cmd.asset),
                timestamp: ctx.timestamp(),
            });
            journal::record(changes, &id, &record)
        })?;

        tracing::info!(
            tx_id = %id,
            entity = %cmd.entity,
            asset = %cmd.asset,
            amount = %cmd.amount,
            "Top-up applied"
        );
        Ok(())
    }

    /// Move `amount` of one asset from one holder to another
    pub fn transfer(&self, cmd: &Transfer, ctx: &dyn TransactionContext) -> Result<()> {
        cmd.validate()?;
        let id = ctx.id();
        let keys = [
            cmd.from.as_str(),
            cmd.to.as_str(),
            Collection::Transfers.key(),
            id.as_str(),
        ];

        self.transact(&keys, |changes| {
            let mut from = changes.entity(&cmd.from)?;
            let mut to = changes.entity(&cmd.to)?;
            from.debit(&cmd.asset, cmd.amount)?;
            to.credit(&cmd.asset, cmd.amount)?;
            changes.stage(&cmd.from, &from)?;
            changes.stage(&cmd.to, &to)?;

            let record = TransactionRecord::Transfer(TransferRecord {
                id: id.clone(),
                sender: cmd.from.clone(),
                receiver: cmd.to.clone(),
                asset: cmd.asset.clone(),
                value: cmd.amount,
                remarks: cmd.remarks.clone(),
                timestamp: ctx.timestamp(),
            });
            journal::record(changes, &id, &record)
        })?;

        tracing::info!(
            tx_id = %id,
            from = %cmd.from,
            to = %cmd.to,
            asset = %cmd.asset,
            amount = %cmd.amount,
            "Transfer applied"
        );
        Ok(())
    }

    /// Buy `quantity` units of a product from its owner
    ///
    /// Checks, in order: all three records exist, the seller owns the
    /// product, stock covers the quantity, the buyer covers the total.
    pub fn purchase(&self, cmd: &Purchase, ctx: &dyn TransactionContext) -> Result<()> {
        cmd.validate()?;
        let id = ctx.id();
        let keys = [
            cmd.buyer.as_str(),
            cmd.seller.as_str(),
            cmd.product.as_str(),
            Collection::Purchases.key(),
            id.as_str(),
        ];

        let total = self.transact(&keys, |changes| {
            let mut buyer = changes.entity(&cmd.buyer)?;
            let mut seller = changes.entity(&cmd.seller)?;
            let mut product: Product = changes.load(&cmd.product)?;

            if product.owner != cmd.seller {
                return Err(Error::OwnershipMismatch {
                    product: cmd.product.clone(),
                    owner: product.owner,
                    seller: cmd.seller.clone(),
                });
            }
            if product.quantity_available < cmd.quantity {
                return Err(Error::InsufficientInventory {
                    product: cmd.product.clone(),
                    available: product.quantity_available,
                    requested: cmd.quantity,
                });
            }

            let asset = cmd.price_kind.asset();
            let total = product
                .unit_price(cmd.price_kind)
                .checked_mul(Decimal::from(cmd.quantity))
                .ok_or_else(|| Error::malformed(format!("{} x {} overflows", cmd.quantity, cmd.product)))?;

            buyer.debit(&asset, total)?;
            seller.credit(&asset, total)?;
            product.quantity_available -= cmd.quantity;

            changes.stage(&cmd.buyer, &buyer)?;
            changes.stage(&cmd.seller, &seller)?;
            changes.stage(&cmd.product, &product)?;

            let record = TransactionRecord::Purchase(PurchaseRecord {
                id: id.clone(),
                sender: cmd.buyer.clone(),
                receiver: cmd.seller.clone(),
                product: cmd.product.clone(),
                quantity: cmd.quantity,
                price_kind: cmd.price_kind,
                value: total,
                remarks: format!("{} - {}", cmd.product, cmd.remarks),
                timestamp: ctx.timestamp(),
            });
            journal::record(changes, &id, &record)?;
            Ok(total)
        })?;

        tracing::info!(
            tx_id = %id,
            buyer = %cmd.buyer,
            seller = %cmd.seller,
            product = %cmd.product,
            quantity = cmd.quantity,
            total = %total,
            "Purchase applied"
        );
        Ok(())
    }

    /// Open a pending encashment; returns its journal key
    ///
    /// No value moves and neither party is checked until approval.
    pub fn request_encashment(
        &self,
        cmd: &RequestEncashment,
        ctx: &dyn TransactionContext,
    ) -> Result<String> {
        cmd.validate()?;
        let keys = [Sequence::Encashment.key(), Collection::Encashments.key()];
        let per_unit = self.encashment.points_per_unit;
        if per_unit <= 0 {
            return Err(Error::Config(format!(
                "encashment.points_per_unit must be positive, got {}",
                per_unit
            )));
        }
        let amount = Decimal::from(cmd.points / per_unit);

        let key = self.transact(&keys, |changes| {
            let key = Sequence::Encashment.format(Sequence::Encashment.next(changes)?);
            let record = TransactionRecord::Encashment(EncashmentRecord {
                key: key.clone(),
                id: ctx.id(),
                initiator: cmd.initiator.clone(),
                bank: cmd.bank.clone(),
                points: cmd.points,
                amount,
                status: EncashmentStatus::Pending,
                remarks: "New Request for Encashment".to_string(),
                timestamp: ctx.timestamp(),
            });
            journal::record(changes, &key, &record)?;
            Ok(key)
        })?;

        tracing::info!(
            key = %key,
            initiator = %cmd.initiator,
            bank = %cmd.bank,
            points = cmd.points,
            amount = %amount,
            "Encashment requested"
        );
        Ok(key)
    }

    /// Settle an encashment; returns the journal key of the completion record
    ///
    /// Points move merchant to bank, `amount` of balance moves bank to
    /// merchant. The amount is taken as given: nothing ties it to the points
    /// or to an earlier request.
    pub fn approve_encashment(
        &self,
        cmd: &ApproveEncashment,
        ctx: &dyn TransactionContext,
    ) -> Result<String> {
        cmd.validate()?;
        let keys = [
            cmd.merchant.as_str(),
            cmd.bank.as_str(),
            Sequence::Encashment.key(),
            Collection::Encashments.key(),
        ];
        let points = Decimal::from(cmd.points);

        let key = self.transact(&keys, |changes| {
            let mut merchant = changes.entity(&cmd.merchant)?;
            let mut bank = changes.entity(&cmd.bank)?;

            merchant.debit(&Asset::Points, points)?;
            bank.debit(&Asset::Balance, cmd.amount)?;
            bank.credit(&Asset::Points, points)?;
            merchant.credit(&Asset::Balance, cmd.amount)?;

            changes.stage(&cmd.merchant, &merchant)?;
            changes.stage(&cmd.bank, &bank)?;

            let key = Sequence::Encashment.format(Sequence::Encashment.next(changes)?);
            let record = TransactionRecord::Encashment(EncashmentRecord {
                key: key.clone(),
                id: ctx.id(),
                initiator: cmd.merchant.clone(),
                bank: cmd.bank.clone(),
                points: cmd.points,
                amount: cmd.amount,
                status: EncashmentStatus::Completed,
                remarks: "Encashment Completed".to_string(),
                timestamp: ctx.timestamp(),
            });
            journal::record(changes, &key, &record)?;
            Ok(key)
        })?;

        tracing::info!(
            key = %key,
            merchant = %cmd.merchant,
            bank = %cmd.bank,
            points = cmd.points,
            amount = %cmd.amount,
            "Encashment approved"
        );
        Ok(key)
    }
}
