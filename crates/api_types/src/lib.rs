use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Body of responses that carry no entity.
#[derive(Debug, Serialize, Deserialize)]
pub struct Ack {
    pub success: bool,
    pub message: String,
}

pub mod account {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AccountNew {
        pub phone: String,
        pub shop_name: String,
        pub email: Option<String>,
        pub business_type: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AccountView {
        pub id: Uuid,
        pub phone: String,
        pub email: Option<String>,
        pub shop_name: String,
        pub business_type: Option<String>,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AccountCreated {
        pub success: bool,
        pub message: String,
        pub account: AccountView,
        pub subscription: super::subscription::SubscriptionView,
    }
}

pub mod client {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ClientNew {
        pub name: String,
        pub phone: Option<String>,
        pub address: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ClientView {
        pub id: Uuid,
        pub name: String,
        pub phone: Option<String>,
        pub address: Option<String>,
        /// Outstanding credit in francs.
        pub total_credit: i64,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct ClientList {
        /// Keep only clients that owe money.
        pub with_credit: Option<bool>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ClientsResponse {
        pub clients: Vec<ClientView>,
        pub total_credit: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ClientCreated {
        pub success: bool,
        pub message: String,
        pub client: ClientView,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ClientDetail {
        pub client: ClientView,
        pub credit_sales: Vec<super::sale::SaleView>,
        pub payments: Vec<PaymentView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PaymentNew {
        pub amount: i64,
        pub notes: Option<String>,
        /// RFC3339 timestamp. If absent, server uses now().
        pub occurred_at: Option<DateTime<FixedOffset>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PaymentView {
        pub id: Uuid,
        pub client_id: Uuid,
        pub amount: i64,
        pub notes: Option<String>,
        pub occurred_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PaymentCreated {
        pub success: bool,
        pub message: String,
        pub payment: PaymentView,
        /// The client with its reduced credit.
        pub client: ClientView,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PaymentsResponse {
        pub payments: Vec<PaymentView>,
    }
}

pub mod sale {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum PaymentMode {
        Cash,
        Credit,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SaleNew {
        pub amount: i64,
        pub payment_mode: PaymentMode,
        /// Free-text customer label.
        pub customer_name: Option<String>,
        /// Client the sale belongs to. Only a credit sale moves its credit.
        pub client_id: Option<Uuid>,
        /// Client looked up by name when `client_id` is absent.
        pub client_name: Option<String>,
        pub notes: Option<String>,
        /// RFC3339 timestamp. If absent, server uses now().
        pub occurred_at: Option<DateTime<FixedOffset>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SaleView {
        pub id: Uuid,
        pub amount: i64,
        pub payment_mode: PaymentMode,
        pub customer_name: Option<String>,
        pub client_id: Option<Uuid>,
        pub notes: Option<String>,
        pub occurred_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SaleCreated {
        pub success: bool,
        pub message: String,
        pub sale: SaleView,
        /// The client with its new credit, for a credit sale.
        pub client: Option<super::client::ClientView>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct SaleList {
        pub from: Option<DateTime<FixedOffset>>,
        pub to: Option<DateTime<FixedOffset>>,
        pub payment_mode: Option<PaymentMode>,
        pub limit: Option<u64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SalesResponse {
        pub sales: Vec<SaleView>,
        /// Number of sales returned.
        pub total: u64,
    }
}

pub mod expense {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseNew {
        pub amount: i64,
        pub motif: String,
        pub category: Option<String>,
        /// RFC3339 timestamp. If absent, server uses now().
        pub occurred_at: Option<DateTime<FixedOffset>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseView {
        pub id: Uuid,
        pub amount: i64,
        pub motif: String,
        pub category: Option<String>,
        pub occurred_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseCreated {
        pub success: bool,
        pub message: String,
        pub expense: ExpenseView,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct ExpenseList {
        pub from: Option<DateTime<FixedOffset>>,
        pub to: Option<DateTime<FixedOffset>>,
        pub category: Option<String>,
        pub limit: Option<u64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpensesResponse {
        pub expenses: Vec<ExpenseView>,
        /// Number of expenses returned.
        pub total: u64,
    }
}

pub mod stats {
    use super::*;

    /// Day selector. Defaults to today in the server timezone.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct DayQuery {
        pub date: Option<NaiveDate>,
    }

    /// Month selector. Defaults to the current month in the server timezone.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct MonthQuery {
        pub year: Option<i32>,
        pub month: Option<u32>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PeriodSummary {
        pub from: DateTime<Utc>,
        pub to: DateTime<Utc>,
        pub sales_total: i64,
        pub sales_cash: i64,
        pub sales_credit: i64,
        pub sales_count: u64,
        pub expenses_total: i64,
        pub expenses_count: u64,
        /// Cash sales minus expenses.
        pub profit: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ClientCredit {
        pub client_id: Uuid,
        pub name: String,
        pub phone: Option<String>,
        pub amount_due: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CreditSummary {
        pub clients_count: u64,
        pub total_credit: i64,
        pub clients: Vec<ClientCredit>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Overview {
        pub sales_today: i64,
        pub sales_today_count: u64,
        pub expenses_today: i64,
        pub outstanding_credit: i64,
        pub clients_with_credit: u64,
    }
}

pub mod subscription {
    use super::*;

    /// Entitlement decision.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct AccessView {
        pub has_access: bool,
        pub status: Option<String>,
        /// Why access was refused, e.g. `trial_expired`.
        pub reason: Option<String>,
        pub hours_left: Option<i64>,
        pub days_left: Option<i64>,
        pub plan: Option<String>,
        pub plan_name: Option<String>,
        pub expires_at: Option<DateTime<Utc>>,
        pub message: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PlanView {
        pub id: String,
        pub name: String,
        pub price: i64,
        pub duration_days: i64,
        pub months: i64,
        pub popular: bool,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PlanSavingsView {
        pub id: String,
        pub price: i64,
        pub monthly_equivalent: i64,
        pub savings: i64,
        pub savings_percent: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PlansResponse {
        pub plans: Vec<PlanView>,
        pub savings: Vec<PlanSavingsView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SubscriptionView {
        pub status: String,
        pub trial_start: DateTime<Utc>,
        pub trial_end: DateTime<Utc>,
        pub period_start: Option<DateTime<Utc>>,
        pub period_end: Option<DateTime<Utc>>,
        pub plan: Option<String>,
        pub amount: Option<i64>,
        pub payment_method: Option<String>,
        pub transaction_ref: Option<String>,
        pub last_payment_date: Option<DateTime<Utc>>,
        pub last_payment_amount: Option<i64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SubscriptionInfo {
        pub subscription: SubscriptionView,
        pub access: AccessView,
        pub plans: Vec<PlanView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Activate {
        pub plan: String,
        pub payment_method: String,
        /// Mobile money number charged by the payment provider.
        pub phone_number: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Renew {
        pub payment_method: String,
        pub phone_number: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Activated {
        pub success: bool,
        pub message: String,
        pub transaction_ref: String,
        pub subscription: SubscriptionView,
    }

    /// Payment provider notification.
    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct WebhookEvent {
        pub transaction_id: String,
        pub status: String,
        pub user_id: Uuid,
        pub plan: Option<String>,
        pub payment_method: Option<String>,
    }
}

pub mod command {
    use super::*;

    /// Entity created by an interpreted command.
    #[derive(Debug, Serialize, Deserialize)]
    #[serde(tag = "kind", content = "entity", rename_all = "snake_case")]
    pub enum CommandEntity {
        Sale {
            sale: super::sale::SaleView,
            client: Option<super::client::ClientView>,
        },
        Expense(super::expense::ExpenseView),
        Client(super::client::ClientView),
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CommandApplied {
        pub success: bool,
        pub message: String,
        pub data: CommandEntity,
    }
}
