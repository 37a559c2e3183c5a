use super::*;
use crate::command::{
    AddTask, ApproveEncashment, CompleteTask, CreateAsset, CreateTaskHolder, Exchange, IssueMore,
    Produce, Purchase, RequestEncashment, TopUp, Transfer,
};
use crate::context::TxContext;
use crate::error::ErrorKind;
use crate::journal::EncashmentStatus;
use crate::store::MemoryStore;
use crate::types::{Asset, PriceKind};
use rust_decimal::Decimal;

fn engine() -> TransitionEngine {
    TransitionEngine::new(Arc::new(MemoryStore::new()), &Config::in_memory())
}

fn loyalty_engine() -> TransitionEngine {
    let engine = engine();
    engine
        .init_loyalty(&InitLoyalty {
            customer: "alice".to_string(),
            merchant: "cafe".to_string(),
            bank: "bank".to_string(),
        })
        .unwrap();
    engine
}

fn ctx() -> TxContext {
    TxContext::new()
}

fn holding(engine: &TransitionEngine, key: &str, asset: &Asset) -> Decimal {
    engine.entities().load(key).unwrap().balance(asset).unwrap()
}

fn purchase(qty: u64, seller: &str) -> Purchase {
    Purchase {
        buyer: "alice".to_string(),
        seller: seller.to_string(),
        product: "Cappuccino".to_string(),
        quantity: qty,
        price_kind: PriceKind::Amount,
        remarks: "to go".to_string(),
    }
}

#[test]
fn test_top_up_records_journal_entry() {
    let engine = loyalty_engine();
    engine
        .top_up(
            &TopUp {
                entity: "alice".to_string(),
                asset: Asset::Points,
                amount: Decimal::from(50),
            },
            &TxContext::with("tx-1", chrono::Utc::now()),
        )
        .unwrap();

    assert_eq!(holding(&engine, "alice", &Asset::Points), Decimal::from(30050));
    let topups = Journal::new(engine.store().as_ref()).topups().unwrap();
    assert_eq!(topups.len(), 1);
    assert_eq!(topups[0].id, "tx-1");
    assert_eq!(topups[0].remarks, "points added");
}

#[test]
fn test_negative_top_up_cannot_overdraw() {
    let engine = loyalty_engine();
    let err = engine
        .top_up(
            &TopUp {
                entity: "alice".to_string(),
                asset: Asset::Balance,
                amount: Decimal::from(-3001),
            },
            &ctx(),
        )
        .unwrap_err();
    assert!(matches!(err, Error::InsufficientFunds { .. }));
    assert_eq!(holding(&engine, "alice", &Asset::Balance), Decimal::from(3000));
    assert!(Journal::new(engine.store().as_ref()).topups().unwrap().is_empty());
}

#[test]
fn test_transfer_missing_receiver_writes_nothing() {
    let engine = loyalty_engine();
    let err = engine
        .transfer(
            &Transfer {
                from: "alice".to_string(),
                to: "ghost".to_string(),
                asset: Asset::Points,
                amount: Decimal::from(1),
                remarks: String::new(),
            },
            &ctx(),
        )
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(k) if k == "ghost"));
    assert_eq!(holding(&engine, "alice", &Asset::Points), Decimal::from(30000));
}

#[test]
fn test_purchase_checks_ownership_then_inventory() {
    let engine = loyalty_engine();

    let err = engine.purchase(&purchase(1, "bank"), &ctx()).unwrap_err();
    assert!(matches!(err, Error::OwnershipMismatch { .. }));

    let err = engine.purchase(&purchase(501, "cafe"), &ctx()).unwrap_err();
    assert!(matches!(err, Error::InsufficientInventory { available: 500, requested: 501, .. }));

    engine.purchase(&purchase(500, "cafe"), &ctx()).unwrap();
    let product: Product = engine.entities().load_product("Cappuccino").unwrap();
    assert_eq!(product.quantity_available, 0);
    assert_eq!(holding(&engine, "alice", &Asset::Balance), Decimal::new(300000 - 147500, 2));
    assert_eq!(holding(&engine, "cafe", &Asset::Balance), Decimal::new(600000 + 147500, 2));
}

#[test]
fn test_purchase_insufficient_funds_leaves_inventory() {
    let engine = loyalty_engine();
    engine
        .top_up(
            &TopUp {
                entity: "alice".to_string(),
                asset: Asset::Balance,
                amount: Decimal::from(-2999),
            },
            &ctx(),
        )
        .unwrap();

    let err = engine.purchase(&purchase(1, "cafe"), &ctx()).unwrap_err();
    assert!(matches!(err, Error::InsufficientFunds { .. }));
    let product = engine.entities().load_product("Cappuccino").unwrap();
    assert_eq!(product.quantity_available, 500);
    assert_eq!(holding(&engine, "cafe", &Asset::Balance), Decimal::from(6000));
}

#[test]
fn test_encashment_keys_come_from_counter() {
    let engine = loyalty_engine();
    let request = RequestEncashment {
        initiator: "cafe".to_string(),
        bank: "bank".to_string(),
        points: 250,
    };
    assert_eq!(engine.request_encashment(&request, &ctx()).unwrap(), "encash1");
    assert_eq!(engine.request_encashment(&request, &ctx()).unwrap(), "encash2");

    let records = Journal::new(engine.store().as_ref()).encashments().unwrap();
    assert_eq!(records[0].amount, Decimal::from(2));
    assert_eq!(records[1].key, "encash2");
    assert_eq!(holding(&engine, "cafe", &Asset::Points), Decimal::from(60000));
}

#[test]
fn test_approval_that_overdraws_bank_is_rejected() {
    let engine = loyalty_engine();
    let approve = ApproveEncashment {
        merchant: "cafe".to_string(),
        bank: "bank".to_string(),
        points: 100,
        amount: Decimal::from(100001),
    };
    let err = engine.approve_encashment(&approve, &ctx()).unwrap_err();
    assert!(matches!(err, Error::InsufficientFunds { .. }));
    assert_eq!(holding(&engine, "cafe", &Asset::Points), Decimal::from(60000));

    let ok = ApproveEncashment {
        amount: Decimal::from(1),
        ..approve
    };
    assert_eq!(engine.approve_encashment(&ok, &ctx()).unwrap(), "encash1");
    let records = Journal::new(engine.store().as_ref()).encashments().unwrap();
    assert_eq!(records[0].status, EncashmentStatus::Completed);
    assert_eq!(holding(&engine, "bank", &Asset::Points), Decimal::from(100100));
}

#[test]
fn test_exchange_same_asset_checks_opening_balances() {
    let engine = engine();
    engine.init_ledger().unwrap();

    // Account-4 holds 100 OEMParts; it may not pay with parts it receives
    let err = engine
        .exchange(
            &Exchange {
                account_a: "Account-3".to_string(),
                asset_a: Asset::named("OEMParts"),
                amount_a: Decimal::from(500),
                account_b: "Account-4".to_string(),
                asset_b: Asset::named("OEMParts"),
                amount_b: Decimal::from(200),
            },
            &ctx(),
        )
        .unwrap_err();
    assert!(matches!(err, Error::InsufficientFunds { .. }));

    engine
        .exchange(
            &Exchange {
                account_a: "Account-2".to_string(),
                asset_a: Asset::named("T1Parts"),
                amount_a: Decimal::from(10),
                account_b: "Account-1".to_string(),
                asset_b: Asset::named("T2Parts"),
                amount_b: Decimal::from(20),
            },
            &ctx(),
        )
        .unwrap();
    let t1 = Asset::named("T1Parts");
    let t2 = Asset::named("T2Parts");
    assert_eq!(holding(&engine, "Account-2", &t1), Decimal::from(990));
    assert_eq!(holding(&engine, "Account-2", &t2), Decimal::from(120));
    assert_eq!(holding(&engine, "Account-1", &t1), Decimal::from(10));
    assert_eq!(holding(&engine, "Account-1", &t2), Decimal::from(980));
    assert_eq!(Journal::new(engine.store().as_ref()).exchanges().unwrap().len(), 1);
}

#[test]
fn test_produce_consumes_input() {
    let engine = engine();
    engine.init_ledger().unwrap();
    let produce = Produce {
        account: "Account-3".to_string(),
        input_asset: Asset::named("T1Parts"),
        input_amount: Decimal::from(101),
        output_asset: Asset::named("OEMParts"),
        output_amount: Decimal::from(1),
    };
    assert!(matches!(
        engine.produce(&produce, &ctx()),
        Err(Error::InsufficientFunds { .. })
    ));

    let produce = Produce {
        input_amount: Decimal::from(100),
        ..produce
    };
    engine.produce(&produce, &ctx()).unwrap();
    assert_eq!(holding(&engine, "Account-3", &Asset::named("T1Parts")), Decimal::ZERO);
    assert_eq!(holding(&engine, "Account-3", &Asset::named("OEMParts")), Decimal::from(1001));
}

#[test]
fn test_create_asset_registers_once() {
    let engine = engine();
    engine.init_ledger().unwrap();
    let create = CreateAsset {
        account: "Account-1".to_string(),
        asset: "Bolts".to_string(),
        quantity: Decimal::from(40),
    };
    engine.create_asset(&create, &ctx()).unwrap();
    assert!(matches!(
        engine.create_asset(&create, &ctx()),
        Err(Error::AlreadyExists(_))
    ));

    engine
        .issue_more(
            &IssueMore {
                account: "Account-1".to_string(),
                asset: "Bolts".to_string(),
                amount: Decimal::from(2),
            },
            &ctx(),
        )
        .unwrap();
    assert_eq!(holding(&engine, "Account-1", &Asset::named("Bolts")), Decimal::from(42));

    let journal = Journal::new(engine.store().as_ref());
    assert_eq!(journal.asset_names().unwrap().last().map(String::as_str), Some("Bolts"));
    assert_eq!(journal.topups().unwrap().len(), 2);
}

#[test]
fn test_init_ledger_twice_allocates_new_accounts() {
    let engine = engine();
    assert_eq!(
        engine.init_ledger().unwrap(),
        vec!["Account-1", "Account-2", "Account-3", "Account-4"]
    );
    assert_eq!(engine.init_ledger().unwrap()[0], "Account-5");
    assert_eq!(Journal::new(engine.store().as_ref()).asset_names().unwrap().len(), 3);
}

#[test]
fn test_creation_rejects_duplicates_and_reserved_keys() {
    let engine = loyalty_engine();
    let entity = CreateEntity {
        kind: EntityKind::Customer,
        name: "alice".to_string(),
        balance: Decimal::ZERO,
        points: 0,
    };
    assert!(matches!(engine.create_entity(&entity), Err(Error::AlreadyExists(_))));

    let reserved = CreateEntity {
        name: "TxnGoods".to_string(),
        ..entity.clone()
    };
    assert!(matches!(engine.create_entity(&reserved), Err(Error::Malformed(_))));

    let counter = CreateEntity {
        name: "counter~encash".to_string(),
        ..entity
    };
    assert!(matches!(engine.create_entity(&counter), Err(Error::Malformed(_))));

    assert!(matches!(
        engine.init_loyalty(&InitLoyalty {
            customer: "alice".to_string(),
            merchant: "cafe".to_string(),
            bank: "bank".to_string(),
        }),
        Err(Error::AlreadyExists(_))
    ));
}

#[test]
fn test_add_product_requires_owner_and_collection() {
    let engine = engine();
    let product = AddProduct {
        name: "Scone".to_string(),
        points_price: 200,
        amount_price: Decimal::new(200, 2),
        owner: "cafe".to_string(),
        quantity: 10,
    };
    assert!(matches!(engine.add_product(&product), Err(Error::NotFound(_))));

    engine
        .create_entity(&CreateEntity {
            kind: EntityKind::Merchant,
            name: "cafe".to_string(),
            balance: Decimal::ZERO,
            points: 0,
        })
        .unwrap();
    // Owner exists but the collection was never initialized
    assert!(matches!(engine.add_product(&product), Err(Error::NotFound(k)) if k == "Products"));
    assert!(engine.store().get("Scone").unwrap().is_none());

    engine.initialize_collections().unwrap();
    engine.add_product(&product).unwrap();
    let products = Journal::new(engine.store().as_ref()).products().unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].owner, "cafe");
}

#[test]
fn test_create_account_appends_to_user() {
    let engine = engine();
    assert!(matches!(
        engine.create_account(&CreateAccount {
            user_id: "nobody".to_string()
        }),
        Err(Error::NotFound(_))
    ));

    engine
        .create_user(&CreateUser {
            user_id: "u1".to_string(),
            display_name: "Supplier".to_string(),
        })
        .unwrap();
    let first = engine
        .create_account(&CreateAccount {
            user_id: "u1".to_string(),
        })
        .unwrap();
    let second = engine
        .create_account(&CreateAccount {
            user_id: "u1".to_string(),
        })
        .unwrap();
    assert_eq!((first.as_str(), second.as_str()), ("Account-1", "Account-2"));

    let user = engine.entities().load_user("u1").unwrap();
    assert_eq!(user.account_ids, vec!["Account-1", "Account-2"]);
    assert_eq!(engine.entities().load("Account-2").unwrap(), Entity::account("Account-2"));
}

#[test]
fn test_execute_validates_before_touching_store() {
    let engine = loyalty_engine();
    let command = Command::Transfer(Transfer {
        from: "alice".to_string(),
        to: "alice".to_string(),
        asset: Asset::Points,
        amount: Decimal::from(10),
        remarks: String::new(),
    });
    assert!(matches!(engine.execute(&command, &ctx()), Err(Error::Malformed(_))));
}

#[test]
fn test_query_payloads() {
    let engine = loyalty_engine();
    let reply = engine.query(&Query::Entity("alice".to_string())).unwrap();
    let alice: Entity = codec::from_payload(reply.payload().unwrap()).unwrap();
    assert_eq!(alice.kind, EntityKind::Customer);

    let reply = engine.query(&Query::AllProducts).unwrap();
    let products: Vec<Product> = codec::from_payload(reply.payload().unwrap()).unwrap();
    let names: Vec<&str> = products.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Café Frappe", "Café Latte", "Café Mocha", "Cappuccino"]);

    assert!(matches!(
        engine.query(&Query::Product("Espresso".to_string())),
        Err(Error::NotFound(_))
    ));
}

#[test]
fn test_lock_table_does_not_grow_with_transactions() {
    let engine = loyalty_engine();
    for _ in 0..1000 {
        engine
            .top_up(
                &TopUp {
                    entity: "alice".to_string(),
                    asset: Asset::Points,
                    amount: Decimal::ONE,
                },
                &ctx(),
            )
            .unwrap();
    }
    assert!(engine.locks.is_empty());
    assert_eq!(holding(&engine, "alice", &Asset::Points), Decimal::from(31000));
}

#[test]
fn test_transaction_id_cannot_overwrite_an_entity() {
    let engine = loyalty_engine();
    let before = engine.entities().load("alice").unwrap();

    let err = engine
        .top_up(
            &TopUp {
                entity: "cafe".to_string(),
                asset: Asset::Points,
                amount: Decimal::from(10),
            },
            &TxContext::with("alice", chrono::Utc::now()),
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Malformed);

    assert_eq!(engine.entities().load("alice").unwrap(), before);
    assert_eq!(holding(&engine, "cafe", &Asset::Points), Decimal::from(60000));
    assert!(Journal::new(engine.store().as_ref()).topups().unwrap().is_empty());
}

#[test]
fn test_transaction_id_reused_across_kinds_is_rejected() {
    let engine = loyalty_engine();
    let tx = TxContext::with("tx-9", chrono::Utc::now());
    engine
        .top_up(
            &TopUp {
                entity: "alice".to_string(),
                asset: Asset::Balance,
                amount: Decimal::from(5),
            },
            &tx,
        )
        .unwrap();

    let err = engine
        .transfer(
            &Transfer {
                from: "alice".to_string(),
                to: "cafe".to_string(),
                asset: Asset::Points,
                amount: Decimal::from(100),
                remarks: String::new(),
            },
            &tx,
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AlreadyExists);
    assert_eq!(holding(&engine, "alice", &Asset::Points), Decimal::from(30000));

    let journal = Journal::new(engine.store().as_ref());
    assert_eq!(journal.topups().unwrap().len(), 1);
    assert!(journal.transfers().unwrap().is_empty());
}

#[test]
fn test_zero_encashment_rate_is_a_config_error() {
    let mut config = Config::in_memory();
    config.encashment.points_per_unit = 0;
    let engine = TransitionEngine::new(Arc::new(MemoryStore::new()), &config);
    engine.initialize_collections().unwrap();

    let err = engine
        .request_encashment(
            &RequestEncashment {
                initiator: "cafe".to_string(),
                bank: "bank".to_string(),
                points: 100,
            },
            &ctx(),
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Config);
    assert!(Journal::new(engine.store().as_ref()).encashments().unwrap().is_empty());
}

fn task_holder(name: &str, task: &str) -> CreateTaskHolder {
    CreateTaskHolder {
        name: name.to_string(),
        task: task.to_string(),
        tokens: 0,
    }
}

fn completion(holder: &str, task: &str, tokens: i64) -> CompleteTask {
    CompleteTask {
        holder: holder.to_string(),
        task: task.to_string(),
        tokens,
    }
}

#[test]
fn test_task_completion_moves_champion() {
    let engine = engine();
    assert_eq!(engine.champion().unwrap(), None);
    engine.create_task_holder(&task_holder("ana", "design")).unwrap();
    engine.create_task_holder(&task_holder("ben", "build")).unwrap();
    engine
        .add_task(&AddTask {
            holder: "ben".to_string(),
            task: "ship".to_string(),
        })
        .unwrap();

    engine.complete_task(&completion("ana", "design", 40)).unwrap();
    let champion = engine.champion().unwrap().unwrap();
    assert_eq!((champion.holder.as_deref(), champion.tokens), (Some("ana"), 40));

    // A tie keeps the earlier leader
    engine.complete_task(&completion("ben", "build", 40)).unwrap();
    assert_eq!(engine.champion().unwrap().unwrap().holder.as_deref(), Some("ana"));

    engine.complete_task(&completion("ben", "ship", 5)).unwrap();
    let champion = engine.champion().unwrap().unwrap();
    assert_eq!((champion.holder.as_deref(), champion.tokens), (Some("ben"), 45));

    let reply = engine.query(&Query::Champion).unwrap();
    let ben: TaskHolder = codec::from_payload(reply.payload().unwrap()).unwrap();
    assert_eq!(ben.tokens, 45);
    assert_eq!(ben.tasks.values().filter(|done| **done).count(), 2);
}

#[test]
fn test_champion_survives_new_engine_instance() {
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let first = TransitionEngine::new(store.clone(), &Config::in_memory());
    first.create_task_holder(&task_holder("ana", "design")).unwrap();
    first.create_task_holder(&task_holder("ben", "build")).unwrap();
    first.complete_task(&completion("ana", "design", 30)).unwrap();
    drop(first);

    let second = TransitionEngine::new(store, &Config::in_memory());
    let champion = second.champion().unwrap().unwrap();
    assert_eq!((champion.holder.as_deref(), champion.tokens), (Some("ana"), 30));

    // A fresh instance compares against the persisted maximum, not zero
    second.complete_task(&completion("ben", "build", 20)).unwrap();
    assert_eq!(second.champion().unwrap().unwrap().holder.as_deref(), Some("ana"));
}

#[test]
fn test_task_operations_reject_bad_targets() {
    let engine = loyalty_engine();
    assert!(matches!(
        engine.query(&Query::Champion),
        Err(Error::NotFound(_))
    ));
    assert_eq!(
        engine.create_task_holder(&task_holder("alice", "x")).unwrap_err().kind(),
        ErrorKind::AlreadyExists
    );
    assert_eq!(
        engine.create_task_holder(&task_holder("counter~champion", "x")).unwrap_err().kind(),
        ErrorKind::Malformed
    );

    engine.create_task_holder(&task_holder("dev", "design")).unwrap();
    assert_eq!(
        engine.complete_task(&completion("dev", "deploy", 5)).unwrap_err().kind(),
        ErrorKind::NotFound
    );
    engine.complete_task(&completion("dev", "design", 5)).unwrap();
    assert_eq!(
        engine.complete_task(&completion("dev", "design", 5)).unwrap_err().kind(),
        ErrorKind::AlreadyExists
    );
    let reply = engine.query(&Query::TaskHolder("dev".to_string())).unwrap();
    let dev: TaskHolder = codec::from_payload(reply.payload().unwrap()).unwrap();
    assert_eq!(dev.tokens, 5);
}
