use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use chrono::{Duration, Utc};
use http_body_util::BodyExt;
use migration::MigratorTrait;
use sea_orm::Database;
use serde_json::{Value, json};
use server::{ServerConfig, ServerState, router};
use tower::util::ServiceExt;
use uuid::Uuid;

async fn engine() -> engine::Engine {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    engine::Engine::builder().database(db).build().await.unwrap()
}

fn app(engine: engine::Engine, config: ServerConfig) -> Router {
    router(ServerState::new(engine, config))
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    merchant: Option<Uuid>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(id) = merchant {
        builder = builder.header("x-merchant-id", id.to_string());
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

async fn register(app: &Router, phone: &str) -> Uuid {
    let (status, body) = send(
        app,
        "POST",
        "/accounts",
        None,
        Some(json!({"phone": phone, "shop_name": "Boutique Awa"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["subscription"]["status"], "trial");
    body["account"]["id"].as_str().unwrap().parse().unwrap()
}

#[tokio::test]
async fn account_routes_require_a_known_merchant() {
    let app = app(engine().await, ServerConfig::default());
    let id = register(&app, "0700000001").await;

    let (status, body) = send(&app, "GET", "/accounts/me", Some(id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["phone"], "0700000001");

    let (status, _) = send(&app, "GET", "/accounts/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, "GET", "/clients", Some(Uuid::new_v4()), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(
        &app,
        "POST",
        "/accounts",
        None,
        Some(json!({"phone": "0700000001", "shop_name": "Autre"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["kind"], "already_exists");
}

#[tokio::test]
async fn credit_ledger_flow() {
    let app = app(engine().await, ServerConfig::default());
    let id = register(&app, "0700000002").await;

    let (status, body) = send(
        &app,
        "POST",
        "/clients",
        Some(id),
        Some(json!({"name": "Marie Koné", "phone": "0708"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let client_id = body["client"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        "POST",
        "/sales",
        Some(id),
        Some(json!({"amount": 5000, "payment_mode": "credit", "client_name": "marie kone"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["client"]["total_credit"], 5000);

    let payments = format!("/clients/{client_id}/payments");
    let (status, body) = send(&app, "POST", &payments, Some(id), Some(json!({"amount": 6000}))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["success"], false);
    assert_eq!(body["kind"], "overpayment_rejected");

    let (status, body) = send(&app, "POST", &payments, Some(id), Some(json!({"amount": 2000}))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["client"]["total_credit"], 3000);

    let (status, body) = send(&app, "GET", "/stats/credits", Some(id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_credit"], 3000);
    assert_eq!(body["clients"][0]["name"], "Marie Koné");

    let (status, body) =
        send(&app, "DELETE", &format!("/clients/{client_id}"), Some(id), None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["kind"], "outstanding_balance");

    let (status, body) = send(
        &app,
        "POST",
        "/sales",
        Some(id),
        Some(json!({"amount": 100, "payment_mode": "credit", "client_name": "Inconnu"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["kind"], "client_not_found");

    let (status, body) = send(
        &app,
        "POST",
        "/sales",
        Some(id),
        Some(json!({"amount": 1200, "payment_mode": "cash", "client_name": "Marie"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["sale"]["client_id"], client_id.as_str());
    assert!(body["client"].is_null());

    let (status, body) = send(
        &app,
        "POST",
        "/sales",
        Some(id),
        Some(json!({"amount": i64::MAX, "payment_mode": "cash"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "validation_error");

    let (status, body) = send(&app, "GET", "/sales", Some(id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 2);
    assert_eq!(body["sales"].as_array().unwrap().len(), 2);

    for amount in [4000, 1500] {
        let (status, _) = send(
            &app,
            "POST",
            "/expenses",
            Some(id),
            Some(json!({"amount": amount, "motif": "Stock"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }
    let (status, body) = send(&app, "GET", "/expenses", Some(id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 2);

    let (status, body) = send(&app, "GET", "/clients", Some(id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_credit"], 3000);
}

#[tokio::test]
async fn interpreted_command_is_applied() {
    let app = app(engine().await, ServerConfig::default());
    let id = register(&app, "0700000003").await;

    let (status, body) = send(
        &app,
        "POST",
        "/commands",
        Some(id),
        Some(json!({"type": "depense", "montant": 1500, "motif": "Transport"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["kind"], "expense");
    assert_eq!(body["data"]["entity"]["amount"], 1500);

    let (status, body) = send(
        &app,
        "POST",
        "/commands",
        Some(id),
        Some(json!({"type": "erreur", "message": "Je n'ai pas compris"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "validation_error");
}

#[tokio::test]
async fn expired_trial_is_refused_until_payment() {
    let engine = engine().await;
    let (merchant, _) = engine
        .register_merchant(
            engine::NewMerchant {
                phone: "0700000004".to_string(),
                shop_name: "Maquis".to_string(),
                ..Default::default()
            },
            Utc::now() - Duration::hours(100),
        )
        .await
        .unwrap();
    let config = ServerConfig {
        webhook_secret: Some("s3cret".to_string()),
        ..ServerConfig::default()
    };
    let app = app(engine, config);

    let (status, body) = send(&app, "GET", "/sales", Some(merchant.id), None).await;
    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
    assert_eq!(body["has_access"], false);
    assert_eq!(body["reason"], "trial_expired");

    // Subscription routes stay reachable without access.
    let (status, body) = send(&app, "GET", "/subscription/check", Some(merchant.id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "expired");

    let event = json!({
        "transactionId": "TXN_42",
        "status": "success",
        "userId": merchant.id,
        "plan": "monthly"
    });
    let (status, _) = send(&app, "POST", "/subscription/webhook", None, Some(event.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let request = Request::builder()
        .method("POST")
        .uri("/subscription/webhook")
        .header("content-type", "application/json")
        .header("x-webhook-secret", "s3cret")
        .body(Body::from(event.to_string()))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let (status, body) = send(&app, "GET", "/sales", Some(merchant.id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 0);

    let (status, body) = send(&app, "GET", "/subscription/info", Some(merchant.id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["subscription"]["plan"], "monthly");
    assert_eq!(body["subscription"]["transaction_ref"], "TXN_42");
    assert_eq!(body["access"]["days_left"], 30);
}

#[tokio::test]
async fn subscription_activation_and_cancellation() {
    let app = app(engine().await, ServerConfig::default());
    let id = register(&app, "0700000005").await;

    let (status, body) = send(&app, "GET", "/subscription/plans", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["plans"].as_array().unwrap().len(), 4);
    assert_eq!(body["savings"][2]["savings_percent"], 17);

    let (status, body) = send(
        &app,
        "POST",
        "/subscription/activate",
        Some(id),
        Some(json!({"plan": "weekly", "payment_method": "wave", "phone_number": "0700"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "invalid_plan");

    let (status, body) = send(
        &app,
        "POST",
        "/subscription/activate",
        Some(id),
        Some(json!({"plan": "yearly", "payment_method": "wave", "phone_number": "0700"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["transaction_ref"].as_str().unwrap().starts_with("TXN_"));
    assert_eq!(body["subscription"]["amount"], 20000);

    let (status, _) = send(&app, "POST", "/subscription/cancel", Some(id), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, "GET", "/clients", Some(id), None).await;
    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
    assert_eq!(body["reason"], "cancelled");

    let (status, body) = send(
        &app,
        "POST",
        "/subscription/renew",
        Some(id),
        Some(json!({"payment_method": "wave"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["kind"], "invalid_transition");
}

#[tokio::test]
async fn access_is_not_checked_when_enforcement_is_off() {
    let engine = engine().await;
    let (merchant, _) = engine
        .register_merchant(
            engine::NewMerchant {
                phone: "0700000006".to_string(),
                shop_name: "Kiosque".to_string(),
                ..Default::default()
            },
            Utc::now() - Duration::days(30),
        )
        .await
        .unwrap();
    let config = ServerConfig {
        enforce_subscription: false,
        ..ServerConfig::default()
    };
    let app = app(engine, config);

    let (status, _) = send(&app, "GET", "/stats/overview", Some(merchant.id), None).await;
    assert_eq!(status, StatusCode::OK);
}
