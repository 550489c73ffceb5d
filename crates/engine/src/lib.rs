//! Commerce ledger and entitlement engine.
//!
//! The engine keeps the two invariants of the bookkeeping backend:
//!
//! - a client's `total_credit` always equals its credit sales minus its
//!   payments and never goes negative;
//! - a merchant has access only while its trial or paid period runs.
//!
//! All operations go through [`Engine`], which owns an explicitly passed
//! database connection and runs every write in its own transaction.

pub use accounts::Merchant;
pub use clients::{Client, ClientDetail, CreditAudit};
pub use commands::{
    ClientRef, Command, CommandData, CommandOutcome, ExpenseCmd, InterpretedCommand,
    NewClientCmd, PaymentCmd, SaleCmd,
};
pub use error::EngineError;
pub use expenses::{Expense, ExpenseFilter};
pub use ops::{ClientFilter, Engine, EngineBuilder, NewMerchant};
pub use payments::{Payment, PaymentReceipt};
pub use plans::{Plan, PlanInfo, PlanSavings, parse_plan, plans, savings};
pub use sales::{PaymentMode, Sale, SaleFilter, SaleReceipt};
pub use stats::{ClientCredit, CreditSummary, Overview, PeriodSummary};
pub use subscriptions::{
    AccessDecision, DenyReason, Evaluation, Subscription, SubscriptionInfo, SubscriptionStatus,
    TRIAL_HOURS,
};

mod accounts;
mod clients;
mod commands;
mod error;
mod expenses;
mod ops;
mod payments;
mod plans;
mod sales;
mod stats;
mod subscriptions;
mod util;

type ResultEngine<T> = Result<T, EngineError>;
