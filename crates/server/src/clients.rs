//! Client and payment endpoints.

use api_types::{
    Ack,
    client::{
        ClientCreated, ClientDetail, ClientList, ClientNew, ClientsResponse, PaymentCreated,
        PaymentNew, PaymentsResponse,
    },
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use engine::{ClientFilter, EngineError, Merchant, NewClientCmd, PaymentCmd};
use uuid::Uuid;

use crate::{ServerError, server::ServerState, views};

pub async fn list(
    Extension(merchant): Extension<Merchant>,
    State(state): State<ServerState>,
    Query(query): Query<ClientList>,
) -> Result<Json<ClientsResponse>, ServerError> {
    let filter = ClientFilter {
        with_credit_only: query.with_credit.unwrap_or(false),
    };
    let clients = state.engine.clients(merchant.id, filter).await?;
    let total_credit = clients
        .iter()
        .try_fold(0i64, |acc, c| acc.checked_add(c.total_credit))
        .ok_or_else(|| {
            ServerError::Engine(EngineError::Consistency(
                "outstanding credit total overflows".to_string(),
            ))
        })?;

    Ok(Json(ClientsResponse {
        clients: clients.into_iter().map(views::client_view).collect(),
        total_credit,
    }))
}

pub async fn client_new(
    Extension(merchant): Extension<Merchant>,
    State(state): State<ServerState>,
    Json(payload): Json<ClientNew>,
) -> Result<(StatusCode, Json<ClientCreated>), ServerError> {
    let mut cmd = NewClientCmd::new(merchant.id, payload.name, Utc::now());
    cmd.phone = payload.phone;
    cmd.address = payload.address;
    let client = state.engine.new_client(cmd).await?;

    Ok((
        StatusCode::CREATED,
        Json(ClientCreated {
            success: true,
            message: format!("Client {} created", client.name),
            client: views::client_view(client),
        }),
    ))
}

pub async fn get(
    Extension(merchant): Extension<Merchant>,
    State(state): State<ServerState>,
    Path(client_id): Path<Uuid>,
) -> Result<Json<ClientDetail>, ServerError> {
    let detail = state.engine.client(merchant.id, client_id).await?;

    Ok(Json(ClientDetail {
        client: views::client_view(detail.client),
        credit_sales: detail
            .credit_sales
            .into_iter()
            .map(views::sale_view)
            .collect(),
        payments: detail
            .payments
            .into_iter()
            .map(views::payment_view)
            .collect(),
    }))
}

pub async fn delete(
    Extension(merchant): Extension<Merchant>,
    State(state): State<ServerState>,
    Path(client_id): Path<Uuid>,
) -> Result<Json<Ack>, ServerError> {
    state.engine.delete_client(merchant.id, client_id).await?;

    Ok(Json(Ack {
        success: true,
        message: "Client deleted".to_string(),
    }))
}

pub async fn payments(
    Extension(merchant): Extension<Merchant>,
    State(state): State<ServerState>,
    Path(client_id): Path<Uuid>,
) -> Result<Json<PaymentsResponse>, ServerError> {
    let payments = state.engine.payments(merchant.id, client_id).await?;

    Ok(Json(PaymentsResponse {
        payments: payments.into_iter().map(views::payment_view).collect(),
    }))
}

/// Record a repayment. Paying more than the client owes is refused.
pub async fn payment_new(
    Extension(merchant): Extension<Merchant>,
    State(state): State<ServerState>,
    Path(client_id): Path<Uuid>,
    Json(payload): Json<PaymentNew>,
) -> Result<(StatusCode, Json<PaymentCreated>), ServerError> {
    let mut cmd = PaymentCmd::new(
        merchant.id,
        client_id,
        payload.amount,
        views::to_utc(payload.occurred_at),
    );
    cmd.notes = payload.notes;
    let receipt = state.engine.record_payment(cmd).await?;

    Ok((
        StatusCode::CREATED,
        Json(PaymentCreated {
            success: true,
            message: format!(
                "Payment of {} francs recorded. Remaining: {} francs",
                receipt.payment.amount, receipt.client.total_credit
            ),
            payment: views::payment_view(receipt.payment),
            client: views::client_view(receipt.client),
        }),
    ))
}
