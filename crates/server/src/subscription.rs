//! Subscription endpoints.
//!
//! Payments are confirmed by the mobile money provider. Activation and renewal
//! here stand for an already confirmed payment and only stamp a transaction
//! reference; the webhook is the path used by the provider itself.

use api_types::{
    Ack,
    subscription::{
        AccessView, Activate, Activated, PlansResponse, Renew, SubscriptionInfo, WebhookEvent,
    },
};
use axum::{
    Extension, Json,
    extract::State,
    http::{HeaderMap, StatusCode},
};
use chrono::Utc;
use engine::Merchant;

use crate::{ServerError, server::ServerState, views};

const WEBHOOK_SECRET_HEADER: &str = "x-webhook-secret";

fn transaction_ref(prefix: &str) -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!(
        "{prefix}_{}_{}",
        Utc::now().timestamp_millis(),
        &suffix[..9]
    )
}

fn require_field<'a>(value: &'a str, name: &str) -> Result<&'a str, ServerError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ServerError::Generic(format!("{name} is required")));
    }
    Ok(trimmed)
}

pub async fn plans() -> Json<PlansResponse> {
    Json(PlansResponse {
        plans: engine::plans().into_iter().map(views::plan_view).collect(),
        savings: engine::savings()
            .into_iter()
            .map(views::savings_view)
            .collect(),
    })
}

pub async fn check(
    Extension(merchant): Extension<Merchant>,
    State(state): State<ServerState>,
) -> Result<Json<AccessView>, ServerError> {
    let decision = state.engine.check_access(merchant.id, Utc::now()).await?;
    Ok(Json(views::access_view(&decision)))
}

pub async fn info(
    Extension(merchant): Extension<Merchant>,
    State(state): State<ServerState>,
) -> Result<Json<SubscriptionInfo>, ServerError> {
    let info = state
        .engine
        .subscription_info(merchant.id, Utc::now())
        .await?;

    Ok(Json(SubscriptionInfo {
        access: views::access_view(&info.access),
        subscription: views::subscription_view(info.subscription),
        plans: info.plans.into_iter().map(views::plan_view).collect(),
    }))
}

pub async fn activate(
    Extension(merchant): Extension<Merchant>,
    State(state): State<ServerState>,
    Json(payload): Json<Activate>,
) -> Result<Json<Activated>, ServerError> {
    let plan = require_field(&payload.plan, "plan")?;
    let payment_method = require_field(&payload.payment_method, "payment_method")?;
    require_field(&payload.phone_number, "phone_number")?;

    let tx_ref = transaction_ref("TXN");
    let sub = state
        .engine
        .activate(merchant.id, plan, &tx_ref, payment_method, Utc::now())
        .await?;

    let plan_name = sub.plan.map_or("Paid", |p| p.display_name());
    Ok(Json(Activated {
        success: true,
        message: format!("{plan_name} subscription activated"),
        transaction_ref: tx_ref,
        subscription: views::subscription_view(sub),
    }))
}

pub async fn renew(
    Extension(merchant): Extension<Merchant>,
    State(state): State<ServerState>,
    Json(payload): Json<Renew>,
) -> Result<Json<Activated>, ServerError> {
    let payment_method = require_field(&payload.payment_method, "payment_method")?;

    let tx_ref = transaction_ref("TXN_RENEW");
    let sub = state
        .engine
        .renew(merchant.id, &tx_ref, payment_method, Utc::now())
        .await?;

    Ok(Json(Activated {
        success: true,
        message: "Subscription renewed".to_string(),
        transaction_ref: tx_ref,
        subscription: views::subscription_view(sub),
    }))
}

pub async fn cancel(
    Extension(merchant): Extension<Merchant>,
    State(state): State<ServerState>,
) -> Result<Json<Ack>, ServerError> {
    state
        .engine
        .cancel_subscription(merchant.id, Utc::now())
        .await?;

    Ok(Json(Ack {
        success: true,
        message: "Subscription cancelled".to_string(),
    }))
}

/// Payment provider notification.
///
/// Only `success` events change state. A notification without a plan renews
/// the plan already on file.
pub async fn webhook(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Json(event): Json<WebhookEvent>,
) -> Result<(StatusCode, Json<Ack>), ServerError> {
    if let Some(secret) = state.config.webhook_secret.as_deref() {
        let provided = headers
            .get(WEBHOOK_SECRET_HEADER)
            .and_then(|v| v.to_str().ok());
        if provided != Some(secret) {
            tracing::warn!(transaction_id = %event.transaction_id, "webhook with a bad secret");
            return Ok((
                StatusCode::UNAUTHORIZED,
                Json(Ack {
                    success: false,
                    message: "invalid webhook secret".to_string(),
                }),
            ));
        }
    }

    if event.status != "success" {
        tracing::info!(
            transaction_id = %event.transaction_id,
            status = %event.status,
            "ignoring webhook event"
        );
        return Ok((
            StatusCode::OK,
            Json(Ack {
                success: true,
                message: format!("event {} ignored", event.status),
            }),
        ));
    }

    let payment_method = event.payment_method.as_deref().unwrap_or("mobile_money");
    let now = Utc::now();
    let sub = match event.plan.as_deref() {
        Some(plan) => {
            state
                .engine
                .activate(event.user_id, plan, &event.transaction_id, payment_method, now)
                .await?
        }
        None => {
            state
                .engine
                .renew(event.user_id, &event.transaction_id, payment_method, now)
                .await?
        }
    };
    tracing::info!(
        account_id = %event.user_id,
        transaction_id = %event.transaction_id,
        period_end = ?sub.period_end,
        "payment confirmed by webhook"
    );

    Ok((
        StatusCode::OK,
        Json(Ack {
            success: true,
            message: "payment applied".to_string(),
        }),
    ))
}
