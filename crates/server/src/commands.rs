//! Endpoint applying the output of the natural language interpreter.

use api_types::command::{CommandApplied, CommandEntity};
use axum::{Extension, Json, extract::State, http::StatusCode};
use chrono::Utc;
use engine::{CommandData, InterpretedCommand, Merchant};

use crate::{ServerError, server::ServerState, views};

pub async fn apply(
    Extension(merchant): Extension<Merchant>,
    State(state): State<ServerState>,
    Json(payload): Json<InterpretedCommand>,
) -> Result<(StatusCode, Json<CommandApplied>), ServerError> {
    let outcome = state
        .engine
        .apply_interpreted(merchant.id, payload, Utc::now())
        .await?;

    let data = match outcome.data {
        CommandData::Sale(receipt) => CommandEntity::Sale {
            sale: views::sale_view(receipt.sale),
            client: receipt.client.map(views::client_view),
        },
        CommandData::Expense(expense) => CommandEntity::Expense(views::expense_view(expense)),
        CommandData::Client(client) => CommandEntity::Client(views::client_view(client)),
    };

    Ok((
        StatusCode::CREATED,
        Json(CommandApplied {
            success: true,
            message: outcome.message,
            data,
        }),
    ))
}
