//! Merchant account endpoints.

use api_types::account::{AccountCreated, AccountNew, AccountView};
use axum::{Extension, Json, extract::State, http::StatusCode};
use chrono::Utc;
use engine::{Merchant, NewMerchant};

use crate::{ServerError, server::ServerState, views};

/// Register a merchant and start its free trial.
pub async fn register(
    State(state): State<ServerState>,
    Json(payload): Json<AccountNew>,
) -> Result<(StatusCode, Json<AccountCreated>), ServerError> {
    let (merchant, subscription) = state
        .engine
        .register_merchant(
            NewMerchant {
                phone: payload.phone,
                shop_name: payload.shop_name,
                email: payload.email,
                business_type: payload.business_type,
            },
            Utc::now(),
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(AccountCreated {
            success: true,
            message: format!("Account created. Free trial until {}", subscription.trial_end),
            account: views::account_view(merchant),
            subscription: views::subscription_view(subscription),
        }),
    ))
}

pub async fn me(Extension(merchant): Extension<Merchant>) -> Json<AccountView> {
    Json(views::account_view(merchant))
}
