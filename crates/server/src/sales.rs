//! Sale endpoints.

use api_types::{
    Ack,
    sale::{SaleCreated, SaleList, SaleNew, SaleView, SalesResponse},
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use engine::{ClientRef, Merchant, PaymentMode, SaleCmd, SaleFilter};
use uuid::Uuid;

use crate::{ServerError, server::ServerState, views};

pub async fn sale_new(
    Extension(merchant): Extension<Merchant>,
    State(state): State<ServerState>,
    Json(payload): Json<SaleNew>,
) -> Result<(StatusCode, Json<SaleCreated>), ServerError> {
    let client = match (payload.client_id, payload.client_name) {
        (Some(id), _) => Some(ClientRef::Id(id)),
        (None, Some(name)) if !name.trim().is_empty() => Some(ClientRef::Name(name)),
        _ => None,
    };
    let mut cmd = SaleCmd::new(
        merchant.id,
        payload.amount,
        views::engine_mode(payload.payment_mode),
        views::to_utc(payload.occurred_at),
    );
    cmd.client = client;
    cmd.customer_name = payload.customer_name;
    cmd.notes = payload.notes;

    let receipt = state.engine.record_sale(cmd).await?;
    let message = match (&receipt.sale.payment_mode, &receipt.client) {
        (PaymentMode::Credit, Some(client)) => format!(
            "Credit sale of {} francs recorded for {}. Total owed: {} francs",
            receipt.sale.amount, client.name, client.total_credit
        ),
        (PaymentMode::Credit, None) => {
            format!("Credit sale of {} francs recorded", receipt.sale.amount)
        }
        (PaymentMode::Cash, _) => format!("Cash sale of {} francs recorded", receipt.sale.amount),
    };

    Ok((
        StatusCode::CREATED,
        Json(SaleCreated {
            success: true,
            message,
            sale: views::sale_view(receipt.sale),
            client: receipt.client.map(views::client_view),
        }),
    ))
}

pub async fn list(
    Extension(merchant): Extension<Merchant>,
    State(state): State<ServerState>,
    Query(query): Query<SaleList>,
) -> Result<Json<SalesResponse>, ServerError> {
    let filter = SaleFilter {
        from: query.from.map(|at| at.to_utc()),
        to: query.to.map(|at| at.to_utc()),
        payment_mode: query.payment_mode.map(views::engine_mode),
        limit: query.limit,
    };
    let sales = state.engine.sales(merchant.id, &filter).await?;
    Ok(Json(SalesResponse {
        total: sales.len() as u64,
        sales: sales.into_iter().map(views::sale_view).collect(),
    }))
}

pub async fn get(
    Extension(merchant): Extension<Merchant>,
    State(state): State<ServerState>,
    Path(sale_id): Path<Uuid>,
) -> Result<Json<SaleView>, ServerError> {
    let sale = state.engine.sale(merchant.id, sale_id).await?;
    Ok(Json(views::sale_view(sale)))
}

/// Delete a sale, giving back the credit it added to its client.
pub async fn delete(
    Extension(merchant): Extension<Merchant>,
    State(state): State<ServerState>,
    Path(sale_id): Path<Uuid>,
) -> Result<Json<Ack>, ServerError> {
    let sale = state.engine.reverse_sale(merchant.id, sale_id).await?;

    Ok(Json(Ack {
        success: true,
        message: format!("Sale of {} francs deleted", sale.amount),
    }))
}
