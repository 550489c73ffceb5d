//! Payments recorded against a client's outstanding credit.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Client, ResultEngine, util::ensure_positive_amount};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub id: Uuid,
    pub client_id: Uuid,
    pub amount: i64,
    pub notes: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

impl Payment {
    pub fn new(
        client_id: Uuid,
        amount: i64,
        notes: Option<String>,
        occurred_at: DateTime<Utc>,
    ) -> ResultEngine<Self> {
        ensure_positive_amount(amount, "payment")?;
        Ok(Self {
            id: Uuid::new_v4(),
            client_id,
            amount,
            notes,
            occurred_at,
        })
    }
}

/// A payment together with the client balance it reduced.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentReceipt {
    pub payment: Payment,
    pub client: Client,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "payments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub client_id: Uuid,
    pub amount: i64,
    pub notes: Option<String>,
    pub occurred_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::clients::Entity",
        from = "Column::ClientId",
        to = "super::clients::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Clients,
}

impl Related<super::clients::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Clients.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Payment> for ActiveModel {
    fn from(payment: &Payment) -> Self {
        Self {
            id: ActiveValue::Set(payment.id),
            client_id: ActiveValue::Set(payment.client_id),
            amount: ActiveValue::Set(payment.amount),
            notes: ActiveValue::Set(payment.notes.clone()),
            occurred_at: ActiveValue::Set(payment.occurred_at),
        }
    }
}

impl From<Model> for Payment {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            client_id: model.client_id,
            amount: model.amount,
            notes: model.notes,
            occurred_at: model.occurred_at,
        }
    }
}
