//! Property-based tests for ledger invariants
//!
//! These tests use proptest to verify critical invariants:
//! - Conservation: successful transfers move value without creating it
//! - Rejection: a failed operation leaves every participant unchanged
//! - Non-negative holdings after any sequence of operations
//! - Inventory bound: stock never goes below zero

use asset_ledger::{
    command::{CreateEntity, Purchase, TopUp, Transfer},
    journal::Journal,
    Asset, Command, Config, Entity, EntityKind, Error, Ledger, MemoryStore, PriceKind,
    TransitionEngine, TxContext,
};
use proptest::prelude::*;
use rust_decimal::Decimal;
use std::sync::Arc;

const PARTIES: [&str; 3] = ["alice", "bob", "carol"];

/// Engine with initialized collections and scalar entities
fn engine_with(holdings: &[(&str, i64, i64)]) -> TransitionEngine {
    let engine = TransitionEngine::new(Arc::new(MemoryStore::new()), &Config::in_memory());
    engine.initialize_collections().unwrap();
    for (name, balance, points) in holdings {
        engine
            .create_entity(&CreateEntity {
                kind: EntityKind::Customer,
                name: name.to_string(),
                balance: Decimal::from(*balance),
                points: *points,
            })
            .unwrap();
    }
    engine
}

fn load(engine: &TransitionEngine, name: &str) -> Entity {
    engine.entities().load(name).unwrap()
}

fn points(engine: &TransitionEngine, name: &str) -> Decimal {
    load(engine, name).balance(&Asset::Points).unwrap()
}

/// Strategy for generating assets held by scalar entities
fn asset_strategy() -> impl Strategy<Value = Asset> {
    prop_oneof![Just(Asset::Points), Just(Asset::Balance)]
}

/// Strategy for generating transfers among the fixed parties
fn transfer_strategy() -> impl Strategy<Value = Transfer> {
    (0usize..3, 1usize..3, asset_strategy(), 1i64..5_000).prop_map(|(from, offset, asset, amount)| {
        Transfer {
            from: PARTIES[from].to_string(),
            to: PARTIES[(from + offset) % 3].to_string(),
            asset,
            amount: Decimal::from(amount),
            remarks: String::new(),
        }
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property: a transfer either conserves the pair's total or changes nothing
    #[test]
    fn prop_transfer_conserves_or_rejects(
        alice in 0i64..10_000,
        bob in 0i64..10_000,
        amount in 1i64..20_000,
    ) {
        let engine = engine_with(&[("alice", 0, alice), ("bob", 0, bob)]);
        let before_alice = load(&engine, "alice");
        let before_bob = load(&engine, "bob");

        let result = engine.transfer(
            &Transfer {
                from: "alice".to_string(),
                to: "bob".to_string(),
                asset: Asset::Points,
                amount: Decimal::from(amount),
                remarks: String::new(),
            },
            &TxContext::new(),
        );

        if amount <= alice {
            prop_assert!(result.is_ok());
            prop_assert_eq!(points(&engine, "alice"), Decimal::from(alice - amount));
            prop_assert_eq!(points(&engine, "bob"), Decimal::from(bob + amount));
        } else {
            let is_insufficient = matches!(result, Err(Error::InsufficientFunds { .. }));
            prop_assert!(is_insufficient);
            prop_assert_eq!(load(&engine, "alice"), before_alice);
            prop_assert_eq!(load(&engine, "bob"), before_bob);
        }
        prop_assert_eq!(
            points(&engine, "alice") + points(&engine, "bob"),
            Decimal::from(alice + bob)
        );
    }

    /// Property: any sequence of transfers keeps totals and holdings non-negative
    #[test]
    fn prop_transfer_sequences_conserve(transfers in prop::collection::vec(transfer_strategy(), 1..40)) {
        let engine = engine_with(&[("alice", 5_000, 5_000), ("bob", 1_000, 0), ("carol", 0, 2_500)]);

        let mut accepted = 0usize;
        for transfer in &transfers {
            if engine.transfer(transfer, &TxContext::new()).is_ok() {
                accepted += 1;
            }
        }

        let entities: Vec<Entity> = PARTIES.iter().map(|p| load(&engine, p)).collect();
        let total = |asset: &Asset| -> Decimal {
            entities.iter().map(|e| e.balance(asset).unwrap()).sum()
        };
        prop_assert_eq!(total(&Asset::Balance), Decimal::from(6_000));
        prop_assert_eq!(total(&Asset::Points), Decimal::from(7_500));
        prop_assert!(entities.iter().all(Entity::is_non_negative));

        let journaled = Journal::new(engine.store().as_ref()).transfers().unwrap();
        prop_assert_eq!(journaled.len(), accepted);
    }

    /// Property: a top-up lands exactly, or is rejected when it would overdraw
    #[test]
    fn prop_top_up_exact(initial in 0i64..10_000, delta in -20_000i64..20_000) {
        let engine = engine_with(&[("alice", initial, 0)]);
        let result = engine.top_up(
            &TopUp {
                entity: "alice".to_string(),
                asset: Asset::Balance,
                amount: Decimal::from(delta),
            },
            &TxContext::new(),
        );

        let balance = load(&engine, "alice").balance(&Asset::Balance).unwrap();
        if initial + delta >= 0 {
            prop_assert!(result.is_ok());
            prop_assert_eq!(balance, Decimal::from(initial + delta));
        } else {
            prop_assert!(result.is_err());
            prop_assert_eq!(balance, Decimal::from(initial));
        }
    }

    /// Property: purchases never take stock below zero
    #[test]
    fn prop_purchase_inventory_bound(quantities in prop::collection::vec(1u64..200, 1..10)) {
        let engine = TransitionEngine::new(Arc::new(MemoryStore::new()), &Config::in_memory());
        engine
            .init_loyalty(&asset_ledger::command::InitLoyalty {
                customer: "alice".to_string(),
                merchant: "cafe".to_string(),
                bank: "bank".to_string(),
            })
            .unwrap();

        let mut stock = 500u64;
        for quantity in quantities {
            let result = engine.purchase(
                &Purchase {
                    buyer: "alice".to_string(),
                    seller: "cafe".to_string(),
                    product: "Café Mocha".to_string(),
                    quantity,
                    price_kind: PriceKind::Points,
                    remarks: String::new(),
                },
                &TxContext::new(),
            );
            if quantity <= stock && Decimal::from(quantity * 525) <= points(&engine, "alice") {
                prop_assert!(result.is_ok());
                stock -= quantity;
            } else {
                prop_assert!(result.is_err());
            }
            let product = engine.entities().load_product("Café Mocha").unwrap();
            prop_assert_eq!(product.quantity_available, stock);
        }
    }

    /// Property: commands through the actor keep the same conservation rule
    #[test]
    fn prop_ledger_transfer_conserves(amount in 1i64..100_000) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let ledger = Ledger::open(Config::in_memory()).await.unwrap();
            let init = Command::parse(
                "initLoyalty",
                &["alice".to_string(), "cafe".to_string(), "bank".to_string()],
            )
            .unwrap();
            ledger.invoke(init).await.unwrap();

            let result = ledger
                .invoke(Command::Transfer(Transfer {
                    from: "bank".to_string(),
                    to: "alice".to_string(),
                    asset: Asset::Balance,
                    amount: Decimal::from(amount),
                    remarks: "grant".to_string(),
                }))
                .await;
            prop_assert_eq!(result.is_ok(), amount <= 100_000);

            let entities = ledger.engine().entities();
            let sum = entities.load("bank").unwrap().balance(&Asset::Balance).unwrap()
                + entities.load("alice").unwrap().balance(&Asset::Balance).unwrap();
            prop_assert_eq!(sum, Decimal::from(103_000));

            ledger.shutdown().await.unwrap();
            Ok(())
        })?;
    }
}
