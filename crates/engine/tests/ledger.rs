use chrono::{DateTime, Duration, TimeZone, Utc};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};

use engine::{
    ClientFilter, ClientRef, Engine, EngineError, ExpenseCmd, ExpenseFilter, NewClientCmd,
    NewMerchant, PaymentCmd, PaymentMode, SaleCmd, SaleFilter,
};
use migration::MigratorTrait;
use uuid::Uuid;

fn at(hours: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 8, 0, 0).unwrap() + Duration::hours(hours)
}

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

async fn merchant(engine: &Engine, phone: &str) -> Uuid {
    let (merchant, _) = engine
        .register_merchant(
            NewMerchant {
                phone: phone.to_string(),
                shop_name: "Boutique Awa".to_string(),
                ..Default::default()
            },
            at(0),
        )
        .await
        .unwrap();
    merchant.id
}

async fn set_credit(db: &DatabaseConnection, client_id: Uuid, amount: i64) {
    let backend = db.get_database_backend();
    db.execute(Statement::from_sql_and_values(
        backend,
        "UPDATE clients SET total_credit = ? WHERE id = ?",
        vec![amount.into(), client_id.into()],
    ))
    .await
    .unwrap();
}

#[tokio::test]
async fn credit_sales_and_payments_replay_to_stored_credit() {
    let (engine, _db) = engine_with_db().await;
    let account = merchant(&engine, "0700000001").await;
    let client = engine
        .new_client(NewClientCmd::new(account, "Marie Koné", at(1)))
        .await
        .unwrap();
    assert_eq!(client.total_credit, 0);

    let receipt = engine
        .record_credit_sale(account, ClientRef::Id(client.id), 5_000, at(2))
        .await
        .unwrap();
    assert_eq!(receipt.client.as_ref().unwrap().total_credit, 5_000);
    assert_eq!(receipt.sale.client_id, Some(client.id));

    engine
        .record_credit_sale(account, ClientRef::Id(client.id), 2_500, at(3))
        .await
        .unwrap();
    let paid = engine
        .record_payment(PaymentCmd::new(account, client.id, 3_000, at(4)))
        .await
        .unwrap();
    assert_eq!(paid.client.total_credit, 4_500);

    // Cash sales never touch a balance.
    engine
        .record_cash_sale(account, 1_000, Some("passant"), at(5))
        .await
        .unwrap();

    let audit = engine.audit_client_credit(account, client.id).await.unwrap();
    assert!(audit.is_consistent());
    assert_eq!(audit.stored, 4_500);

    let detail = engine.client(account, client.id).await.unwrap();
    assert_eq!(detail.credit_sales.len(), 2);
    assert_eq!(detail.credit_sales[0].amount, 2_500);
    assert_eq!(detail.payments.len(), 1);
}

#[tokio::test]
async fn reversing_a_credit_sale_restores_the_balance() {
    let (engine, _db) = engine_with_db().await;
    let account = merchant(&engine, "0700000002").await;
    let client = engine
        .new_client(NewClientCmd::new(account, "Ibrahim", at(1)))
        .await
        .unwrap();
    engine
        .record_credit_sale(account, ClientRef::Id(client.id), 1_200, at(2))
        .await
        .unwrap();
    let sale = engine
        .record_credit_sale(account, ClientRef::Id(client.id), 800, at(3))
        .await
        .unwrap()
        .sale;

    let reversed = engine.reverse_sale(account, sale.id).await.unwrap();
    assert_eq!(reversed.id, sale.id);

    let detail = engine.client(account, client.id).await.unwrap();
    assert_eq!(detail.client.total_credit, 1_200);
    assert_eq!(
        engine.sale(account, sale.id).await.unwrap_err(),
        EngineError::KeyNotFound("sale not exists".to_string())
    );
}

#[tokio::test]
async fn reversal_never_clamps_a_drifted_balance() {
    let (engine, db) = engine_with_db().await;
    let account = merchant(&engine, "0700000003").await;
    let client = engine
        .new_client(NewClientCmd::new(account, "Fanta", at(1)))
        .await
        .unwrap();
    let sale = engine
        .record_credit_sale(account, ClientRef::Id(client.id), 1_000, at(2))
        .await
        .unwrap()
        .sale;

    set_credit(&db, client.id, 400).await;

    let err = engine.reverse_sale(account, sale.id).await.unwrap_err();
    assert_eq!(err.kind(), "consistency_error");
    // Rolled back: the sale is still there and the balance untouched.
    assert_eq!(engine.sale(account, sale.id).await.unwrap().amount, 1_000);
    let detail = engine.client(account, client.id).await.unwrap();
    assert_eq!(detail.client.total_credit, 400);

    let audit = engine.audit_client_credit(account, client.id).await.unwrap();
    assert_eq!((audit.stored, audit.replayed), (400, 1_000));
    let fixed = engine
        .recompute_client_credit(account, client.id)
        .await
        .unwrap();
    assert_eq!(fixed.total_credit, 1_000);
    engine.reverse_sale(account, sale.id).await.unwrap();
}

#[tokio::test]
async fn overpayment_is_rejected_without_side_effects() {
    let (engine, _db) = engine_with_db().await;
    let account = merchant(&engine, "0700000004").await;
    let client = engine
        .new_client(NewClientCmd::new(account, "Kouassi", at(1)))
        .await
        .unwrap();
    engine
        .record_credit_sale(account, ClientRef::Id(client.id), 1_000, at(2))
        .await
        .unwrap();

    let err = engine
        .record_payment(PaymentCmd::new(account, client.id, 1_500, at(3)))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::OverpaymentRejected {
            requested: 1_500,
            available: 1_000
        }
    );

    let detail = engine.client(account, client.id).await.unwrap();
    assert_eq!(detail.client.total_credit, 1_000);
    assert!(detail.payments.is_empty());

    let err = engine
        .record_payment(PaymentCmd::new(account, client.id, 0, at(3)))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "validation_error");
}

#[tokio::test]
async fn concurrent_payments_cannot_overdraw() {
    let (engine, _db) = engine_with_db().await;
    let account = merchant(&engine, "0700000005").await;
    let client = engine
        .new_client(NewClientCmd::new(account, "Adjoua", at(1)))
        .await
        .unwrap();
    engine
        .record_credit_sale(account, ClientRef::Id(client.id), 1_000, at(2))
        .await
        .unwrap();

    let (first, second) = tokio::join!(
        engine.record_payment(PaymentCmd::new(account, client.id, 600, at(3))),
        engine.record_payment(PaymentCmd::new(account, client.id, 700, at(3))),
    );

    let outcomes = [first, second];
    let successes = outcomes.iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1);
    assert!(
        outcomes
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| e.kind() == "overpayment_rejected")
    );

    let remaining = engine.client(account, client.id).await.unwrap().client.total_credit;
    assert!(remaining == 400 || remaining == 300, "remaining = {remaining}");
    assert!(
        engine
            .audit_client_credit(account, client.id)
            .await
            .unwrap()
            .is_consistent()
    );
}

#[tokio::test]
async fn client_deletion_requires_a_cleared_balance() {
    let (engine, _db) = engine_with_db().await;
    let account = merchant(&engine, "0700000006").await;
    let client = engine
        .new_client(NewClientCmd::new(account, "Seydou", at(1)))
        .await
        .unwrap();
    let sale = engine
        .record_credit_sale(account, ClientRef::Id(client.id), 700, at(2))
        .await
        .unwrap()
        .sale;

    assert_eq!(
        engine.delete_client(account, client.id).await.unwrap_err(),
        EngineError::OutstandingBalance(700)
    );

    engine
        .record_payment(PaymentCmd::new(account, client.id, 700, at(3)))
        .await
        .unwrap();
    engine.delete_client(account, client.id).await.unwrap();

    assert_eq!(
        engine.client(account, client.id).await.unwrap_err(),
        EngineError::ClientNotFound(client.id.to_string())
    );
    let kept = engine.sale(account, sale.id).await.unwrap();
    assert_eq!(kept.client_id, None);
    assert_eq!(kept.customer_name.as_deref(), Some("Seydou"));
}

#[tokio::test]
async fn name_references_use_the_fuzzy_lookup() {
    let (engine, _db) = engine_with_db().await;
    let account = merchant(&engine, "0700000007").await;
    let marie = engine
        .new_client(NewClientCmd::new(account, "Marie Koné", at(1)))
        .await
        .unwrap();
    engine
        .new_client(NewClientCmd::new(account, "Marie Diallo", at(2)))
        .await
        .unwrap();

    let found = engine
        .find_client_by_name(account, "KONE")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.id, marie.id);
    // Ambiguous fragments resolve to the oldest client.
    let found = engine
        .find_client_by_name(account, "marie")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.id, marie.id);

    let receipt = engine
        .record_credit_sale(account, ClientRef::Name("koné".to_string()), 3_000, at(3))
        .await
        .unwrap();
    assert_eq!(receipt.client.unwrap().id, marie.id);

    let err = engine
        .record_credit_sale(account, ClientRef::Name("Moussa".to_string()), 3_000, at(3))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "client_not_found");
    assert!(err.to_string().contains("create the client first"));
    let sales = engine.sales(account, &SaleFilter::default()).await.unwrap();
    assert_eq!(sales.len(), 1);
}

#[tokio::test]
async fn free_text_credit_sale_has_no_balance_effect() {
    let (engine, _db) = engine_with_db().await;
    let account = merchant(&engine, "0700000008").await;

    let receipt = engine
        .record_sale(
            SaleCmd::new(account, 2_000, PaymentMode::Credit, at(1)).customer_name("Un voisin"),
        )
        .await
        .unwrap();
    assert!(receipt.client.is_none());
    assert!(!receipt.sale.affects_balance());

    let err = engine
        .record_sale(SaleCmd::cash(account, 500, at(1)).client(ClientRef::Id(Uuid::new_v4())))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "client_not_found");
}

#[tokio::test]
async fn cash_sale_to_a_client_is_kept_off_the_balance() {
    let (engine, _db) = engine_with_db().await;
    let account = merchant(&engine, "0700000018").await;
    let awa = engine
        .new_client(NewClientCmd::new(account, "Awa Traoré", at(1)))
        .await
        .unwrap();
    engine
        .record_credit_sale(account, ClientRef::Id(awa.id), 1_500, at(2))
        .await
        .unwrap();

    let receipt = engine
        .record_sale(SaleCmd::cash(account, 700, at(3)).client(ClientRef::Id(awa.id)))
        .await
        .unwrap();
    assert_eq!(receipt.sale.client_id, Some(awa.id));
    assert_eq!(receipt.sale.customer_name.as_deref(), Some("Awa Traoré"));
    assert!(receipt.client.is_none());

    let receipt = engine
        .record_sale(
            SaleCmd::cash(account, 300, at(4)).client(ClientRef::Name("Passant".to_string())),
        )
        .await
        .unwrap();
    assert_eq!(receipt.sale.client_id, None);
    assert_eq!(receipt.sale.customer_name.as_deref(), Some("Passant"));

    let detail = engine.client(account, awa.id).await.unwrap();
    assert_eq!(detail.client.total_credit, 1_500);
    assert_eq!(detail.credit_sales.len(), 1);
    let audit = engine.audit_client_credit(account, awa.id).await.unwrap();
    assert!(audit.is_consistent());
}

#[tokio::test]
async fn oversized_amounts_never_reach_the_ledger() {
    let (engine, db) = engine_with_db().await;
    let account = merchant(&engine, "0700000019").await;
    let client = engine
        .new_client(NewClientCmd::new(account, "Seydou", at(1)))
        .await
        .unwrap();

    let err = engine
        .record_credit_sale(account, ClientRef::Id(client.id), i64::MAX, at(2))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "validation_error");
    let err = engine
        .new_expense(ExpenseCmd::new(account, i64::MAX, "Stock", at(2)))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "validation_error");

    set_credit(&db, client.id, i64::MAX - 10).await;
    let err = engine
        .record_credit_sale(account, ClientRef::Id(client.id), 11, at(3))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "validation_error");

    let detail = engine.client(account, client.id).await.unwrap();
    assert_eq!(detail.client.total_credit, i64::MAX - 10);
    assert!(detail.credit_sales.is_empty());
    assert!(
        engine
            .sales(account, &SaleFilter::default())
            .await
            .unwrap()
            .is_empty()
    );

    let other = engine
        .new_client(NewClientCmd::new(account, "Salif", at(4)))
        .await
        .unwrap();
    set_credit(&db, other.id, 20).await;
    let err = engine.credit_summary(account).await.unwrap_err();
    assert_eq!(err.kind(), "consistency_error");
}

#[tokio::test]
async fn duplicate_client_names_are_rejected_per_account() {
    let (engine, _db) = engine_with_db().await;
    let account = merchant(&engine, "0700000009").await;
    let other = merchant(&engine, "0700000010").await;

    engine
        .new_client(NewClientCmd::new(account, "Awa Traoré", at(1)))
        .await
        .unwrap();
    let err = engine
        .new_client(NewClientCmd::new(account, "  AWA traore ", at(2)))
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::DuplicateClient("AWA traore".to_string()));

    // Another merchant may have a client with the same name.
    engine
        .new_client(NewClientCmd::new(other, "Awa Traoré", at(2)))
        .await
        .unwrap();

    let err = engine
        .new_client(NewClientCmd::new(account, "   ", at(2)))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "validation_error");
}

#[tokio::test]
async fn entities_of_other_accounts_are_not_found() {
    let (engine, _db) = engine_with_db().await;
    let account = merchant(&engine, "0700000011").await;
    let intruder = merchant(&engine, "0700000012").await;
    let client = engine
        .new_client(NewClientCmd::new(account, "Yao", at(1)))
        .await
        .unwrap();
    let sale = engine
        .record_credit_sale(account, ClientRef::Id(client.id), 900, at(2))
        .await
        .unwrap()
        .sale;

    assert_eq!(
        engine
            .record_payment(PaymentCmd::new(intruder, client.id, 100, at(3)))
            .await
            .unwrap_err()
            .kind(),
        "client_not_found"
    );
    assert_eq!(
        engine
            .record_credit_sale(intruder, ClientRef::Id(client.id), 100, at(3))
            .await
            .unwrap_err()
            .kind(),
        "client_not_found"
    );
    assert_eq!(
        engine
            .find_client_by_name(intruder, "yao")
            .await
            .unwrap(),
        None
    );
    assert_eq!(
        engine.reverse_sale(intruder, sale.id).await.unwrap_err().kind(),
        "not_found"
    );
    assert_eq!(
        engine.client(account, client.id).await.unwrap().client.total_credit,
        900
    );
}

#[tokio::test]
async fn client_listing_puts_debtors_first() {
    let (engine, _db) = engine_with_db().await;
    let account = merchant(&engine, "0700000013").await;
    let small = engine
        .new_client(NewClientCmd::new(account, "Bakary", at(1)))
        .await
        .unwrap();
    let big = engine
        .new_client(NewClientCmd::new(account, "Chantal", at(1)).phone("0102030405"))
        .await
        .unwrap();
    engine
        .new_client(NewClientCmd::new(account, "Aminata", at(1)))
        .await
        .unwrap();
    engine
        .record_credit_sale(account, ClientRef::Id(small.id), 500, at(2))
        .await
        .unwrap();
    engine
        .record_credit_sale(account, ClientRef::Id(big.id), 4_000, at(2))
        .await
        .unwrap();

    let all = engine
        .clients(account, ClientFilter::default())
        .await
        .unwrap();
    let names: Vec<&str> = all.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["Chantal", "Bakary", "Aminata"]);

    let debtors = engine
        .clients(
            account,
            ClientFilter {
                with_credit_only: true,
            },
        )
        .await
        .unwrap();
    assert_eq!(debtors.len(), 2);

    let summary = engine.credit_summary(account).await.unwrap();
    assert_eq!(summary.clients_count, 2);
    assert_eq!(summary.total_credit, 4_500);
    assert_eq!(summary.clients[0].phone.as_deref(), Some("0102030405"));
}

#[tokio::test]
async fn expenses_and_period_statistics() {
    let (engine, _db) = engine_with_db().await;
    let account = merchant(&engine, "0700000014").await;
    let client = engine
        .new_client(NewClientCmd::new(account, "Oumar", at(0)))
        .await
        .unwrap();

    engine.record_cash_sale(account, 10_000, None, at(1)).await.unwrap();
    engine.record_cash_sale(account, 2_000, None, at(2)).await.unwrap();
    engine
        .record_credit_sale(account, ClientRef::Id(client.id), 3_000, at(3))
        .await
        .unwrap();
    // Outside the day.
    engine.record_cash_sale(account, 50_000, None, at(30)).await.unwrap();

    let rent = engine
        .new_expense(ExpenseCmd::new(account, 4_000, "Loyer", at(4)).category("local"))
        .await
        .unwrap();
    engine
        .new_expense(ExpenseCmd::new(account, 1_500, "Transport", at(5)))
        .await
        .unwrap();

    let summary = engine.period_summary(account, at(0), at(24)).await.unwrap();
    assert_eq!(summary.sales_total, 15_000);
    assert_eq!(summary.sales_cash, 12_000);
    assert_eq!(summary.sales_credit, 3_000);
    assert_eq!(summary.sales_count, 3);
    assert_eq!(summary.expenses_total, 5_500);
    assert_eq!(summary.expenses_count, 2);
    assert_eq!(summary.profit, 6_500);

    let overview = engine.overview(account, at(0), at(24)).await.unwrap();
    assert_eq!(overview.sales_today, 15_000);
    assert_eq!(overview.outstanding_credit, 3_000);
    assert_eq!(overview.clients_with_credit, 1);

    let local = engine
        .expenses(
            account,
            &ExpenseFilter {
                category: Some("local".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(local, vec![rent.clone()]);

    let credit_only = engine
        .sales(
            account,
            &SaleFilter {
                payment_mode: Some(PaymentMode::Credit),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(credit_only.len(), 1);

    engine.delete_expense(account, rent.id).await.unwrap();
    assert_eq!(
        engine.expense(account, rent.id).await.unwrap_err().kind(),
        "not_found"
    );
    let err = engine
        .new_expense(ExpenseCmd::new(account, 100, " ", at(6)))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "validation_error");
}
