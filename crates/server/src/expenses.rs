//! Expense endpoints.

use api_types::{
    Ack,
    expense::{ExpenseCreated, ExpenseList, ExpenseNew, ExpenseView, ExpensesResponse},
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use engine::{ExpenseCmd, ExpenseFilter, Merchant};
use uuid::Uuid;

use crate::{ServerError, server::ServerState, views};

pub async fn expense_new(
    Extension(merchant): Extension<Merchant>,
    State(state): State<ServerState>,
    Json(payload): Json<ExpenseNew>,
) -> Result<(StatusCode, Json<ExpenseCreated>), ServerError> {
    let mut cmd = ExpenseCmd::new(
        merchant.id,
        payload.amount,
        payload.motif,
        views::to_utc(payload.occurred_at),
    );
    cmd.category = payload.category;
    let expense = state.engine.new_expense(cmd).await?;

    Ok((
        StatusCode::CREATED,
        Json(ExpenseCreated {
            success: true,
            message: format!(
                "Expense of {} francs recorded: {}",
                expense.amount, expense.motif
            ),
            expense: views::expense_view(expense),
        }),
    ))
}

pub async fn list(
    Extension(merchant): Extension<Merchant>,
    State(state): State<ServerState>,
    Query(query): Query<ExpenseList>,
) -> Result<Json<ExpensesResponse>, ServerError> {
    let filter = ExpenseFilter {
        from: query.from.map(|at| at.to_utc()),
        to: query.to.map(|at| at.to_utc()),
        category: query.category,
        limit: query.limit,
    };
    let expenses = state.engine.expenses(merchant.id, &filter).await?;
    Ok(Json(ExpensesResponse {
        total: expenses.len() as u64,
        expenses: expenses.into_iter().map(views::expense_view).collect(),
    }))
}

pub async fn get(
    Extension(merchant): Extension<Merchant>,
    State(state): State<ServerState>,
    Path(expense_id): Path<Uuid>,
) -> Result<Json<ExpenseView>, ServerError> {
    let expense = state.engine.expense(merchant.id, expense_id).await?;
    Ok(Json(views::expense_view(expense)))
}

pub async fn delete(
    Extension(merchant): Extension<Merchant>,
    State(state): State<ServerState>,
    Path(expense_id): Path<Uuid>,
) -> Result<Json<Ack>, ServerError> {
    state.engine.delete_expense(merchant.id, expense_id).await?;

    Ok(Json(Ack {
        success: true,
        message: "Expense deleted".to_string(),
    }))
}
