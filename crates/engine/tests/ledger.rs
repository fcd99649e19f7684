use std::sync::Arc;

use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use uuid::Uuid;

use engine::{
    ApplyCmd, ChargeCmd, Engine, EngineError, ErrorKind, Money, NewAccountCmd, TopUpCmd,
    TransactionKind,
};
use migration::MigratorTrait;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

async fn engine_with_file_db() -> (Engine, DatabaseConnection, std::path::PathBuf) {
    let root = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../target/test_dbs");
    std::fs::create_dir_all(&root).unwrap();

    let path = root.join(format!("ledger_{}.db", Uuid::new_v4()));
    let url = format!("sqlite:{}?mode=rwc", path.display());

    // The SQLite driver defaults to a single pooled connection, which would
    // run every unit of work one after the other.
    let mut options = ConnectOptions::new(url);
    options.max_connections(8);
    let db = Database::connect(options).await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();

    (engine, db, path)
}

async fn open_account(engine: &Engine, email: &str) -> Uuid {
    engine
        .create_account_with_user(NewAccountCmd::new(email, "Ada", "Lovelace"))
        .await
        .unwrap()
        .account
        .id
}

fn money(major: f64) -> Money {
    Money::from_major(major).unwrap()
}

async fn count_transactions(db: &DatabaseConnection) -> i64 {
    let row = db
        .query_one(Statement::from_string(
            db.get_database_backend(),
            "SELECT COUNT(*) AS n FROM transactions",
        ))
        .await
        .unwrap()
        .unwrap();
    row.try_get("", "n").unwrap()
}

#[tokio::test]
async fn top_up_charge_and_rejections_follow_the_ledger_rules() {
    let (engine, _db) = engine_with_db().await;
    let account_id = open_account(&engine, "ada@example.com").await;

    let applied = engine
        .top_up(TopUpCmd::new(account_id, money(50.0)).reference("A"))
        .await
        .unwrap();
    assert_eq!(applied.balance, money(50.0));
    assert_eq!(applied.transaction.kind, TransactionKind::TopUp);
    assert_eq!(applied.transaction.amount, money(50.0));
    assert_eq!(applied.transaction.reference, "A");

    let applied = engine
        .charge(ChargeCmd::new(account_id, money(20.0)).reference("B"))
        .await
        .unwrap();
    assert_eq!(applied.balance, money(30.0));
    assert_eq!(applied.transaction.kind, TransactionKind::Charge);

    let err = engine
        .charge(ChargeCmd::new(account_id, money(50.0)).reference("C"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InsufficientFunds);
    assert_eq!(engine.account(account_id).await.unwrap().balance, money(30.0));

    let err = engine
        .top_up(TopUpCmd::new(account_id, money(10.0)).reference("A"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::DuplicateReference(ref r) if r == "A"));
    assert_eq!(engine.account(account_id).await.unwrap().balance, money(30.0));

    let history = engine.transactions_for_account(account_id).await.unwrap();
    let refs: Vec<&str> = history.iter().map(|tx| tx.reference.as_str()).collect();
    assert_eq!(refs, vec!["A", "B"]);
}

#[tokio::test]
async fn apply_accepts_either_direction() {
    let (engine, _db) = engine_with_db().await;
    let account_id = open_account(&engine, "ada@example.com").await;

    let applied = engine
        .apply(ApplyCmd::new(account_id, TransactionKind::TopUp, money(8.0)).reference("in-1"))
        .await
        .unwrap();
    assert_eq!(applied.transaction.kind, TransactionKind::TopUp);
    assert_eq!(applied.transaction.reference, "in-1");
    assert_eq!(applied.balance, money(8.0));

    let applied = engine
        .apply(ApplyCmd::new(account_id, TransactionKind::Charge, money(3.0)).reference("out-1"))
        .await
        .unwrap();
    assert_eq!(applied.transaction.kind, TransactionKind::Charge);
    assert_eq!(applied.balance, money(5.0));

    let applied = engine
        .apply(ApplyCmd::new(account_id, TransactionKind::Charge, money(1.0)))
        .await
        .unwrap();
    assert!(applied.transaction.reference.starts_with("TXN-"));

    let err = engine
        .apply(ApplyCmd::new(account_id, TransactionKind::TopUp, money(1.0)).reference("out-1"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DuplicateReference);
    assert_eq!(engine.account(account_id).await.unwrap().balance, money(4.0));
}

#[tokio::test]
async fn charge_of_exact_balance_reaches_zero() {
    let (engine, _db) = engine_with_db().await;
    let account_id = open_account(&engine, "ada@example.com").await;

    engine
        .top_up(TopUpCmd::new(account_id, money(12.34)))
        .await
        .unwrap();
    let applied = engine
        .charge(ChargeCmd::new(account_id, money(12.34)))
        .await
        .unwrap();
    assert_eq!(applied.balance, Money::ZERO);

    let err = engine
        .charge(ChargeCmd::new(account_id, money(0.01)))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InsufficientFunds(_)));
}

#[tokio::test]
async fn insufficient_funds_leaves_log_unchanged() {
    let (engine, db) = engine_with_db().await;
    let account_id = open_account(&engine, "ada@example.com").await;

    engine
        .top_up(TopUpCmd::new(account_id, money(5.0)))
        .await
        .unwrap();
    let before = count_transactions(&db).await;

    let err = engine
        .charge(ChargeCmd::new(account_id, money(5.01)).reference("too-much"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InsufficientFunds);
    assert_eq!(count_transactions(&db).await, before);

    // The reference of a rejected charge was never recorded, so it stays usable.
    engine
        .top_up(TopUpCmd::new(account_id, money(1.0)).reference("too-much"))
        .await
        .unwrap();
}

#[tokio::test]
async fn invalid_input_is_rejected_before_storage() {
    let (engine, db) = engine_with_db().await;
    let account_id = open_account(&engine, "ada@example.com").await;

    let err = engine
        .top_up(TopUpCmd::new(account_id, Money::ZERO))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));

    let err = engine
        .charge(ChargeCmd::new(account_id, Money::new(-500)))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));

    let err = engine
        .top_up(TopUpCmd::new(account_id, money(1.0)).reference("   "))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidReference(_)));

    // Validation wins over a missing account.
    let err = engine
        .top_up(TopUpCmd::new(Uuid::new_v4(), Money::ZERO))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    assert_eq!(count_transactions(&db).await, 0);
}

#[tokio::test]
async fn sub_cent_amounts_round_once_at_the_boundary() {
    let (engine, _db) = engine_with_db().await;
    let account_id = open_account(&engine, "ada@example.com").await;

    let applied = engine
        .top_up(TopUpCmd::new(account_id, money(0.125)))
        .await
        .unwrap();
    assert_eq!(applied.transaction.amount.cents(), 13);

    let err = engine
        .top_up(TopUpCmd::new(account_id, money(0.004)))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));
}

#[tokio::test]
async fn unknown_or_deleted_account_is_not_found() {
    let (engine, _db) = engine_with_db().await;

    let err = engine
        .top_up(TopUpCmd::new(Uuid::new_v4(), money(1.0)))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let account_id = open_account(&engine, "ada@example.com").await;
    engine
        .top_up(TopUpCmd::new(account_id, money(3.0)).reference("before-delete"))
        .await
        .unwrap();
    engine.delete_account(account_id).await.unwrap();

    let err = engine
        .charge(ChargeCmd::new(account_id, money(1.0)))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(engine.account(account_id).await.unwrap_err().kind(), ErrorKind::NotFound);
    assert_eq!(
        engine.delete_account(account_id).await.unwrap_err().kind(),
        ErrorKind::NotFound
    );

    // History survives the delete.
    let tx = engine.transaction_by_reference("before-delete").await.unwrap();
    assert_eq!(tx.account_id, account_id);
}

#[tokio::test]
async fn missing_reference_is_generated() {
    let (engine, _db) = engine_with_db().await;
    let account_id = open_account(&engine, "ada@example.com").await;

    let first = engine
        .top_up(TopUpCmd::new(account_id, money(1.0)))
        .await
        .unwrap();
    let second = engine
        .top_up(TopUpCmd::new(account_id, money(1.0)))
        .await
        .unwrap();

    assert!(first.transaction.reference.starts_with("TXN-"));
    assert_ne!(first.transaction.reference, second.transaction.reference);
    assert_eq!(second.balance, money(2.0));
}

#[tokio::test]
async fn supplied_reference_is_trimmed() {
    let (engine, _db) = engine_with_db().await;
    let account_id = open_account(&engine, "ada@example.com").await;

    let applied = engine
        .top_up(TopUpCmd::new(account_id, money(1.0)).reference("  order-7 "))
        .await
        .unwrap();
    assert_eq!(applied.transaction.reference, "order-7");

    let err = engine
        .top_up(TopUpCmd::new(account_id, money(1.0)).reference("order-7"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DuplicateReference);
}

#[tokio::test]
async fn references_are_unique_across_accounts() {
    let (engine, _db) = engine_with_db().await;
    let alice = open_account(&engine, "alice@example.com").await;
    let bob = open_account(&engine, "bob@example.com").await;

    engine
        .top_up(TopUpCmd::new(alice, money(1.0)).reference("shared"))
        .await
        .unwrap();
    let err = engine
        .top_up(TopUpCmd::new(bob, money(1.0)).reference("shared"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DuplicateReference);
    assert_eq!(engine.account(bob).await.unwrap().balance, Money::ZERO);
}

#[tokio::test]
async fn balance_above_storable_maximum_is_rejected() {
    let (engine, _db) = engine_with_db().await;
    let account_id = open_account(&engine, "ada@example.com").await;

    engine
        .top_up(TopUpCmd::new(account_id, Money::MAX))
        .await
        .unwrap();
    let err = engine
        .top_up(TopUpCmd::new(account_id, Money::new(1)))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(engine.account(account_id).await.unwrap().balance, Money::MAX);
}

#[tokio::test]
async fn failed_balance_write_rolls_back_the_transaction_insert() {
    let (engine, db) = engine_with_db().await;
    let account_id = open_account(&engine, "ada@example.com").await;

    db.execute_unprepared(
        "CREATE TRIGGER fail_balance_update BEFORE UPDATE OF balance_minor ON accounts \
         WHEN NEW.balance_minor = 4242 \
         BEGIN SELECT RAISE(ABORT, 'simulated balance write failure'); END;",
    )
    .await
    .unwrap();

    let err = engine
        .top_up(TopUpCmd::new(account_id, money(42.42)).reference("doomed"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Storage);
    assert!(!err.is_recoverable());

    assert_eq!(count_transactions(&db).await, 0);
    assert_eq!(engine.account(account_id).await.unwrap().balance, Money::ZERO);
    assert_eq!(
        engine.transaction_by_reference("doomed").await.unwrap_err().kind(),
        ErrorKind::NotFound
    );

    // The reference was rolled back with everything else.
    engine
        .top_up(TopUpCmd::new(account_id, money(1.0)).reference("doomed"))
        .await
        .unwrap();
}

#[tokio::test]
async fn verify_balance_replays_the_log() {
    let (engine, db) = engine_with_db().await;
    let account_id = open_account(&engine, "ada@example.com").await;

    engine
        .top_up(TopUpCmd::new(account_id, money(10.0)))
        .await
        .unwrap();
    engine
        .charge(ChargeCmd::new(account_id, money(2.5)))
        .await
        .unwrap();
    engine
        .top_up(TopUpCmd::new(account_id, money(0.75)))
        .await
        .unwrap();

    let check = engine.verify_balance(account_id).await.unwrap();
    assert!(check.is_consistent());
    assert_eq!(check.computed, money(8.25));
    assert_eq!(check.transactions, 3);

    db.execute(Statement::from_sql_and_values(
        db.get_database_backend(),
        "UPDATE accounts SET balance_minor = ? WHERE id = ?",
        vec![1.into(), account_id.to_string().into()],
    ))
    .await
    .unwrap();
    let check = engine.verify_balance(account_id).await.unwrap();
    assert!(!check.is_consistent());
    assert_eq!(check.stored, Money::new(1));
    assert_eq!(check.computed, money(8.25));
}

#[tokio::test]
async fn one_account_per_user_and_unique_emails() {
    let (engine, _db) = engine_with_db().await;

    let opened = engine
        .create_account_with_user(NewAccountCmd::new(" Ada@Example.com ", "Ada", "Lovelace"))
        .await
        .unwrap();
    assert_eq!(opened.user.email, "ada@example.com");
    assert_eq!(opened.account.balance, Money::ZERO);
    assert_eq!(opened.account.user_id, opened.user.id);

    let err = engine
        .create_account_with_user(NewAccountCmd::new("ADA@example.com", "Other", "Person"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    let err = engine.create_account(opened.user.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    let err = engine.create_account(Uuid::new_v4()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let user = engine.user_by_email("ada@EXAMPLE.com").await.unwrap();
    assert_eq!(user.id, opened.user.id);
    assert_eq!(engine.user(user.id).await.unwrap().first_name, "Ada");
}

#[tokio::test]
async fn account_opening_validates_input() {
    let (engine, _db) = engine_with_db().await;

    for cmd in [
        NewAccountCmd::new("not-an-email", "Ada", "Lovelace"),
        NewAccountCmd::new("ada@example.com", "  ", "Lovelace"),
        NewAccountCmd::new("ada@example.com", "Ada", ""),
    ] {
        let err = engine.create_account_with_user(cmd).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_top_ups_do_not_lose_updates() {
    let (engine, _db, path) = engine_with_file_db().await;
    let engine = Arc::new(engine);
    let account_id = open_account(&engine, "ada@example.com").await;

    let mut handles = Vec::new();
    for i in 0..50 {
        let engine = Arc::clone(&engine);
        handles.push(tokio::spawn(async move {
            engine
                .top_up(TopUpCmd::new(account_id, money(1.0)).reference(format!("par-{i}")))
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(engine.account(account_id).await.unwrap().balance, money(50.0));
    assert!(engine.verify_balance(account_id).await.unwrap().is_consistent());

    let _ = std::fs::remove_file(path);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_charges_never_overdraw() {
    let (engine, _db, path) = engine_with_file_db().await;
    let engine = Arc::new(engine);
    let account_id = open_account(&engine, "ada@example.com").await;
    engine
        .top_up(TopUpCmd::new(account_id, money(5.0)))
        .await
        .unwrap();

    let mut handles = Vec::new();
    for _ in 0..20 {
        let engine = Arc::clone(&engine);
        handles.push(tokio::spawn(async move {
            engine.charge(ChargeCmd::new(account_id, money(1.0))).await
        }));
    }

    let mut succeeded = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => succeeded += 1,
            Err(err) => assert_eq!(err.kind(), ErrorKind::InsufficientFunds),
        }
    }

    assert_eq!(succeeded, 5);
    assert_eq!(engine.account(account_id).await.unwrap().balance, Money::ZERO);

    let _ = std::fs::remove_file(path);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_same_reference_commits_once() {
    let (engine, db, path) = engine_with_file_db().await;
    let engine = Arc::new(engine);
    let account_id = open_account(&engine, "ada@example.com").await;

    let mut handles = Vec::new();
    for _ in 0..8 {
        let engine = Arc::clone(&engine);
        handles.push(tokio::spawn(async move {
            engine
                .top_up(TopUpCmd::new(account_id, money(7.0)).reference("same"))
                .await
        }));
    }

    let mut ok = 0;
    let mut duplicates = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => ok += 1,
            Err(err) => {
                assert_eq!(err.kind(), ErrorKind::DuplicateReference);
                duplicates += 1;
            }
        }
    }

    assert_eq!((ok, duplicates), (1, 7));
    assert_eq!(count_transactions(&db).await, 1);
    assert_eq!(engine.account(account_id).await.unwrap().balance, money(7.0));

    let _ = std::fs::remove_file(path);
}
