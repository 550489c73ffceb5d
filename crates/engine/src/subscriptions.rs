//! Subscription state and the entitlement decision derived from it.
//!
//! A subscription moves through a small state machine:
//!
//! ```text
//! trial ──(trial_end passed)──▶ expired ◀──(period_end passed)── active
//!   │                              │                               ▲
//!   └──────────(activate)──────────┴──────────(activate/renew)─────┘
//! any non-cancelled state ──(cancel)──▶ cancelled
//! ```
//!
//! Expiry is detected lazily: [`Subscription::evaluate`] is a pure function
//! of the stored timestamps and `now`, returning the transition to persist (if
//! any) together with the access decision.

use chrono::{DateTime, Duration, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, Plan, ResultEngine, util::ceil_units};

/// Length of the free trial granted at account creation.
pub const TRIAL_HOURS: i64 = 72;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Trial,
    Active,
    Expired,
    Cancelled,
}

impl SubscriptionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Trial => "trial",
            Self::Active => "active",
            Self::Expired => "expired",
            Self::Cancelled => "cancelled",
        }
    }
}

impl TryFrom<&str> for SubscriptionStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "trial" => Ok(Self::Trial),
            "active" => Ok(Self::Active),
            "expired" => Ok(Self::Expired),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(EngineError::Consistency(format!(
                "invalid subscription status: {other}"
            ))),
        }
    }
}

/// Why access was refused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    NoSubscription,
    TrialExpired,
    SubscriptionExpired,
    Expired,
    Cancelled,
}

impl DenyReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NoSubscription => "no_subscription",
            Self::TrialExpired => "trial_expired",
            Self::SubscriptionExpired => "subscription_expired",
            Self::Expired => "expired",
            Self::Cancelled => "cancelled",
        }
    }
}

/// The entitlement decision for one account at one instant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessDecision {
    pub has_access: bool,
    pub status: Option<SubscriptionStatus>,
    pub reason: Option<DenyReason>,
    pub hours_left: Option<i64>,
    pub days_left: Option<i64>,
    pub plan: Option<Plan>,
    pub plan_name: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub message: String,
}

impl AccessDecision {
    fn denied(status: Option<SubscriptionStatus>, reason: DenyReason, message: &str) -> Self {
        Self {
            has_access: false,
            status,
            reason: Some(reason),
            hours_left: None,
            days_left: None,
            plan: None,
            plan_name: None,
            expires_at: None,
            message: message.to_string(),
        }
    }

    /// Decision for an account that never received a subscription.
    pub fn no_subscription() -> Self {
        Self::denied(None, DenyReason::NoSubscription, "No subscription found")
    }
}

/// Outcome of evaluating a subscription at a given instant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Evaluation {
    /// Status to persist, when the stored one is stale.
    pub transition: Option<SubscriptionStatus>,
    pub decision: AccessDecision,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: Uuid,
    pub account_id: Uuid,
    pub status: SubscriptionStatus,
    pub trial_start: DateTime<Utc>,
    pub trial_end: DateTime<Utc>,
    pub period_start: Option<DateTime<Utc>>,
    pub period_end: Option<DateTime<Utc>>,
    pub plan: Option<Plan>,
    pub amount: Option<i64>,
    pub payment_method: Option<String>,
    pub transaction_ref: Option<String>,
    pub last_payment_date: Option<DateTime<Utc>>,
    pub last_payment_amount: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Subscription {
    /// Start a trial window for a new account.
    pub fn trial(account_id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            account_id,
            status: SubscriptionStatus::Trial,
            trial_start: now,
            trial_end: now + Duration::hours(TRIAL_HOURS),
            period_start: None,
            period_end: None,
            plan: None,
            amount: None,
            payment_method: None,
            transaction_ref: None,
            last_payment_date: None,
            last_payment_amount: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Compute the access decision at `now` and the transition it implies.
    ///
    /// Once the transition is applied, evaluating again keeps access denied
    /// with no further transition. The reason then becomes `Expired`, since
    /// the stored state no longer tells a lapsed trial from a lapsed period.
    pub fn evaluate(&self, now: DateTime<Utc>) -> Evaluation {
        match self.status {
            SubscriptionStatus::Trial if now < self.trial_end => {
                let hours_left = ceil_units(self.trial_end - now, Duration::hours(1));
                Evaluation {
                    transition: None,
                    decision: AccessDecision {
                        has_access: true,
                        status: Some(SubscriptionStatus::Trial),
                        reason: None,
                        hours_left: Some(hours_left),
                        days_left: None,
                        plan: None,
                        plan_name: None,
                        expires_at: Some(self.trial_end),
                        message: format!("Free trial - {hours_left}h left"),
                    },
                }
            }
            SubscriptionStatus::Trial => Evaluation {
                transition: Some(SubscriptionStatus::Expired),
                decision: AccessDecision::denied(
                    Some(SubscriptionStatus::Expired),
                    DenyReason::TrialExpired,
                    "The 72h free trial has ended. Please subscribe to a plan.",
                ),
            },
            SubscriptionStatus::Active => match self.period_end {
                Some(period_end) if now < period_end => {
                    let days_left = ceil_units(period_end - now, Duration::days(1));
                    let plan_name = self.plan.map(|p| p.display_name().to_string());
                    Evaluation {
                        transition: None,
                        decision: AccessDecision {
                            has_access: true,
                            status: Some(SubscriptionStatus::Active),
                            reason: None,
                            hours_left: None,
                            days_left: Some(days_left),
                            plan: self.plan,
                            message: format!(
                                "{} subscription active - {days_left} days left",
                                plan_name.as_deref().unwrap_or("Paid")
                            ),
                            plan_name,
                            expires_at: Some(period_end),
                        },
                    }
                }
                // An active row without a period end cannot grant access.
                _ => Evaluation {
                    transition: Some(SubscriptionStatus::Expired),
                    decision: AccessDecision::denied(
                        Some(SubscriptionStatus::Expired),
                        DenyReason::SubscriptionExpired,
                        "Your subscription has expired. Please renew it.",
                    ),
                },
            },
            SubscriptionStatus::Expired => Evaluation {
                transition: None,
                decision: AccessDecision::denied(
                    Some(SubscriptionStatus::Expired),
                    DenyReason::Expired,
                    "Subscription expired. Please renew it.",
                ),
            },
            SubscriptionStatus::Cancelled => Evaluation {
                transition: None,
                decision: AccessDecision::denied(
                    Some(SubscriptionStatus::Cancelled),
                    DenyReason::Cancelled,
                    "Subscription cancelled.",
                ),
            },
        }
    }

    /// Apply a confirmed payment for `plan`, restarting the period at `now`.
    ///
    /// The previous period is discarded, remaining time is not carried over.
    pub fn activate(
        &mut self,
        plan: Plan,
        transaction_ref: String,
        payment_method: String,
        now: DateTime<Utc>,
    ) -> ResultEngine<()> {
        if self.status == SubscriptionStatus::Cancelled {
            return Err(EngineError::InvalidTransition(
                "a cancelled subscription cannot be reactivated".to_string(),
            ));
        }
        self.status = SubscriptionStatus::Active;
        self.plan = Some(plan);
        self.amount = Some(plan.price());
        self.period_start = Some(now);
        self.period_end = Some(now + Duration::days(plan.duration_days()));
        self.payment_method = Some(payment_method);
        self.transaction_ref = Some(transaction_ref);
        self.last_payment_date = Some(now);
        self.last_payment_amount = Some(plan.price());
        self.updated_at = now;
        Ok(())
    }
}

/// Stored subscription, its current decision and the catalog.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionInfo {
    pub subscription: Subscription,
    pub access: AccessDecision,
    pub plans: Vec<crate::PlanInfo>,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "subscriptions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub account_id: Uuid,
    pub status: String,
    pub trial_start: DateTimeUtc,
    pub trial_end: DateTimeUtc,
    pub period_start: Option<DateTimeUtc>,
    pub period_end: Option<DateTimeUtc>,
    pub plan: Option<String>,
    pub amount: Option<i64>,
    pub payment_method: Option<String>,
    pub transaction_ref: Option<String>,
    pub last_payment_date: Option<DateTimeUtc>,
    pub last_payment_amount: Option<i64>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::AccountId",
        to = "super::accounts::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Accounts,
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Accounts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Subscription> for ActiveModel {
    fn from(sub: &Subscription) -> Self {
        Self {
            id: ActiveValue::Set(sub.id),
            account_id: ActiveValue::Set(sub.account_id),
            status: ActiveValue::Set(sub.status.as_str().to_string()),
            trial_start: ActiveValue::Set(sub.trial_start),
            trial_end: ActiveValue::Set(sub.trial_end),
            period_start: ActiveValue::Set(sub.period_start),
            period_end: ActiveValue::Set(sub.period_end),
            plan: ActiveValue::Set(sub.plan.map(|p| p.as_str().to_string())),
            amount: ActiveValue::Set(sub.amount),
            payment_method: ActiveValue::Set(sub.payment_method.clone()),
            transaction_ref: ActiveValue::Set(sub.transaction_ref.clone()),
            last_payment_date: ActiveValue::Set(sub.last_payment_date),
            last_payment_amount: ActiveValue::Set(sub.last_payment_amount),
            created_at: ActiveValue::Set(sub.created_at),
            updated_at: ActiveValue::Set(sub.updated_at),
        }
    }
}

impl TryFrom<Model> for Subscription {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let plan = model
            .plan
            .as_deref()
            .map(|raw| {
                Plan::try_from(raw).map_err(|_| {
                    EngineError::Consistency(format!("stored plan is not in the catalog: {raw}"))
                })
            })
            .transpose()?;
        Ok(Self {
            id: model.id,
            account_id: model.account_id,
            status: SubscriptionStatus::try_from(model.status.as_str())?,
            trial_start: model.trial_start,
            trial_end: model.trial_end,
            period_start: model.period_start,
            period_end: model.period_end,
            plan,
            amount: model.amount,
            payment_method: model.payment_method,
            transaction_ref: model.transaction_ref,
            last_payment_date: model.last_payment_date,
            last_payment_amount: model.last_payment_amount,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}
