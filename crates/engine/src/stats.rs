//! Read-only reports over sales, expenses and client credit.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Totals over a time range.
///
/// `profit` only counts cash sales: credit sales are not money in hand.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodSummary {
    pub sales_total: i64,
    pub sales_cash: i64,
    pub sales_credit: i64,
    pub sales_count: u64,
    pub expenses_total: i64,
    pub expenses_count: u64,
    pub profit: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientCredit {
    pub client_id: Uuid,
    pub name: String,
    pub phone: Option<String>,
    pub amount_due: i64,
}

/// Outstanding credit across all clients of an account, largest first.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditSummary {
    pub clients_count: u64,
    pub total_credit: i64,
    pub clients: Vec<ClientCredit>,
}

/// Dashboard figures: the current day and the outstanding credit.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Overview {
    pub sales_today: i64,
    pub sales_today_count: u64,
    pub expenses_today: i64,
    pub outstanding_credit: i64,
    pub clients_with_credit: u64,
}
