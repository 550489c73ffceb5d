//! Business expenses. They carry no cross-entity invariant.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{ResultEngine, util::ensure_positive_amount};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    pub id: Uuid,
    pub account_id: Uuid,
    pub amount: i64,
    pub motif: String,
    pub category: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

impl Expense {
    pub fn new(
        account_id: Uuid,
        amount: i64,
        motif: String,
        category: Option<String>,
        occurred_at: DateTime<Utc>,
    ) -> ResultEngine<Self> {
        ensure_positive_amount(amount, "expense")?;
        Ok(Self {
            id: Uuid::new_v4(),
            account_id,
            amount,
            motif,
            category,
            occurred_at,
        })
    }
}

/// Filters for expense listings.
#[derive(Clone, Debug, Default)]
pub struct ExpenseFilter {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub category: Option<String>,
    pub limit: Option<u64>,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "expenses")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub account_id: Uuid,
    pub amount: i64,
    pub motif: String,
    pub category: Option<String>,
    pub occurred_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Expense> for ActiveModel {
    fn from(expense: &Expense) -> Self {
        Self {
            id: ActiveValue::Set(expense.id),
            account_id: ActiveValue::Set(expense.account_id),
            amount: ActiveValue::Set(expense.amount),
            motif: ActiveValue::Set(expense.motif.clone()),
            category: ActiveValue::Set(expense.category.clone()),
            occurred_at: ActiveValue::Set(expense.occurred_at),
        }
    }
}

impl From<Model> for Expense {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            account_id: model.account_id,
            amount: model.amount,
            motif: model.motif,
            category: model.category,
            occurred_at: model.occurred_at,
        }
    }
}
