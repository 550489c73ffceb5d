//! The module contains the error the engine can throw.
//!
//! Every variant maps to a stable [`kind`] string so callers can tell user
//! errors (bad input, invariant guards) apart from internal failures
//! ([`Consistency`], [`Database`]).
//!
//!  [`kind`]: EngineError::kind
//!  [`Consistency`]: EngineError::Consistency
//!  [`Database`]: EngineError::Database
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Client not found: {0}")]
    ClientNotFound(String),
    #[error("Client \"{0}\" already exists")]
    DuplicateClient(String),
    #[error("Payment of {requested} exceeds outstanding credit of {available}")]
    OverpaymentRejected { requested: i64, available: i64 },
    #[error("Client still owes {0}")]
    OutstandingBalance(i64),
    #[error("Invalid plan: {0}")]
    InvalidPlan(String),
    #[error("No previous plan: {0}")]
    NoPriorPlan(String),
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
    #[error("Ledger inconsistency: {0}")]
    Consistency(String),
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl EngineError {
    /// Stable identifier of the error kind, meant for transport layers.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::ClientNotFound(_) => "client_not_found",
            Self::DuplicateClient(_) => "duplicate_client",
            Self::OverpaymentRejected { .. } => "overpayment_rejected",
            Self::OutstandingBalance(_) => "outstanding_balance",
            Self::InvalidPlan(_) => "invalid_plan",
            Self::NoPriorPlan(_) => "no_prior_plan",
            Self::InvalidTransition(_) => "invalid_transition",
            Self::Consistency(_) => "consistency_error",
            Self::KeyNotFound(_) => "not_found",
            Self::ExistingKey(_) => "already_exists",
            Self::Database(_) => "database_error",
        }
    }

    /// Whether the error signals a bug or a storage failure rather than bad
    /// input.
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Consistency(_) | Self::Database(_))
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Validation(a), Self::Validation(b)) => a == b,
            (Self::ClientNotFound(a), Self::ClientNotFound(b)) => a == b,
            (Self::DuplicateClient(a), Self::DuplicateClient(b)) => a == b,
            (
                Self::OverpaymentRejected {
                    requested: a,
                    available: b,
                },
                Self::OverpaymentRejected {
                    requested: c,
                    available: d,
                },
            ) => a == c && b == d,
            (Self::OutstandingBalance(a), Self::OutstandingBalance(b)) => a == b,
            (Self::InvalidPlan(a), Self::InvalidPlan(b)) => a == b,
            (Self::NoPriorPlan(a), Self::NoPriorPlan(b)) => a == b,
            (Self::InvalidTransition(a), Self::InvalidTransition(b)) => a == b,
            (Self::Consistency(a), Self::Consistency(b)) => a == b,
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overpayment_message_names_both_amounts() {
        let err = EngineError::OverpaymentRejected {
            requested: 1500,
            available: 1000,
        };
        assert_eq!(
            err.to_string(),
            "Payment of 1500 exceeds outstanding credit of 1000"
        );
        assert_eq!(err.kind(), "overpayment_rejected");
    }

    #[test]
    fn internal_errors_are_flagged() {
        assert!(EngineError::Consistency("x".to_string()).is_internal());
        assert!(!EngineError::OutstandingBalance(10).is_internal());
    }
}
