//! The module contains `Client` struct and its persistence model.

use chrono::{DateTime, Utc};
use sea_orm::entity::{ActiveValue, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Payment, Sale};

/// A customer of the merchant who may buy on credit.
///
/// `total_credit` is a denormalized aggregate: it always equals the sum of
/// the credit sales attached to the client minus the payments recorded for
/// it, and it is never negative.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    pub id: Uuid,
    pub account_id: Uuid,
    pub name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub total_credit: i64,
    pub created_at: DateTime<Utc>,
}

/// A client with its credit history, most recent first.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientDetail {
    pub client: Client,
    pub credit_sales: Vec<Sale>,
    pub payments: Vec<Payment>,
}

/// Result of replaying a client's history against its stored aggregate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditAudit {
    pub client_id: Uuid,
    pub stored: i64,
    pub replayed: i64,
}

impl CreditAudit {
    pub fn is_consistent(&self) -> bool {
        self.stored == self.replayed
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "clients")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub account_id: Uuid,
    pub name: String,
    pub name_norm: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub total_credit: i64,
    pub created_at: DateTimeUtc,
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
    #[sea_orm(has_many = "super::sales::Entity")]
    Sales,
    #[sea_orm(has_many = "super::payments::Entity")]
    Payments,
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Accounts.def()
    }
}

impl Related<super::sales::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sales.def()
    }
}

impl Related<super::payments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Client {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            account_id: model.account_id,
            name: model.name,
            phone: model.phone,
            address: model.address,
            total_credit: model.total_credit,
            created_at: model.created_at,
        }
    }
}

impl From<(&Client, String)> for ActiveModel {
    fn from((client, name_norm): (&Client, String)) -> Self {
        Self {
            id: ActiveValue::Set(client.id),
            account_id: ActiveValue::Set(client.account_id),
            name: ActiveValue::Set(client.name.clone()),
            name_norm: ActiveValue::Set(name_norm),
            phone: ActiveValue::Set(client.phone.clone()),
            address: ActiveValue::Set(client.address.clone()),
            total_credit: ActiveValue::Set(client.total_credit),
            created_at: ActiveValue::Set(client.created_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audit_detects_drift() {
        let id = Uuid::new_v4();
        let ok = CreditAudit {
            client_id: id,
            stored: 500,
            replayed: 500,
        };
        let drift = CreditAudit {
            client_id: id,
            stored: 700,
            replayed: 500,
        };
        assert!(ok.is_consistent());
        assert!(!drift.is_consistent());
    }
}
