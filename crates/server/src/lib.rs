use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::EngineError;

use serde::Serialize;
pub use server::{ServerConfig, ServerState, router, run, run_with_listener, spawn_with_listener};

mod accounts;
mod clients;
mod commands;
mod expenses;
mod sales;
mod server;
mod statistics;
mod subscription;
mod views;

pub mod types {
    pub mod account {
        pub use api_types::account::{AccountCreated, AccountNew, AccountView};
    }

    pub mod client {
        pub use api_types::client::{
            ClientCreated, ClientDetail, ClientList, ClientNew, ClientView, ClientsResponse,
            PaymentCreated, PaymentNew, PaymentView, PaymentsResponse,
        };
    }

    pub mod sale {
        pub use api_types::sale::{
            PaymentMode, SaleCreated, SaleList, SaleNew, SaleView, SalesResponse,
        };
    }

    pub mod expense {
        pub use api_types::expense::{
            ExpenseCreated, ExpenseList, ExpenseNew, ExpenseView, ExpensesResponse,
        };
    }

    pub mod stats {
        pub use api_types::stats::{CreditSummary, DayQuery, MonthQuery, Overview, PeriodSummary};
    }

    pub mod subscription {
        pub use api_types::subscription::{
            AccessView, Activate, Activated, PlansResponse, Renew, SubscriptionInfo,
            SubscriptionView, WebhookEvent,
        };
    }

    pub mod command {
        pub use api_types::command::{CommandApplied, CommandEntity};
        pub use engine::InterpretedCommand;
    }
}

#[derive(Debug)]
pub enum ServerError {
    Engine(EngineError),
    Generic(String),
}

#[derive(Serialize)]
struct Error {
    success: bool,
    kind: &'static str,
    error: String,
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::Validation(_) | EngineError::InvalidPlan(_) => StatusCode::BAD_REQUEST,
        EngineError::ClientNotFound(_) | EngineError::KeyNotFound(_) => StatusCode::NOT_FOUND,
        EngineError::DuplicateClient(_)
        | EngineError::ExistingKey(_)
        | EngineError::InvalidTransition(_) => StatusCode::CONFLICT,
        EngineError::OverpaymentRejected { .. }
        | EngineError::OutstandingBalance(_)
        | EngineError::NoPriorPlan(_) => StatusCode::UNPROCESSABLE_ENTITY,
        EngineError::Consistency(_) | EngineError::Database(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn message_for_engine_error(err: EngineError) -> String {
    match err {
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            "internal server error".to_string()
        }
        EngineError::Consistency(msg) => {
            tracing::error!("ledger inconsistency: {msg}");
            "internal server error".to_string()
        }
        other => other.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, kind, error) = match self {
            ServerError::Engine(err) => (
                status_for_engine_error(&err),
                err.kind(),
                message_for_engine_error(err),
            ),
            ServerError::Generic(err) => (StatusCode::BAD_REQUEST, "bad_request", err),
        };

        (
            status,
            Json(Error {
                success: false,
                kind,
                error,
            }),
        )
            .into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_validation_maps_to_400() {
        let res = ServerError::from(EngineError::Validation("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn engine_not_found_maps_to_404() {
        let res = ServerError::from(EngineError::ClientNotFound("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        let res = ServerError::from(EngineError::KeyNotFound("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn engine_conflict_maps_to_409() {
        let res =
            ServerError::from(EngineError::DuplicateClient("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn engine_guards_map_to_422() {
        let res = ServerError::from(EngineError::OverpaymentRejected {
            requested: 2,
            available: 1,
        })
        .into_response();
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let res = ServerError::from(EngineError::OutstandingBalance(1)).into_response();
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn engine_inconsistency_maps_to_500() {
        let res = ServerError::from(EngineError::Consistency("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn generic_maps_to_400() {
        let res = ServerError::Generic("bad".to_string()).into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}
