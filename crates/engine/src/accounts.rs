//! Merchant accounts.
//!
//! An account is the tenant boundary: every client, sale, expense and
//! subscription belongs to exactly one of them. Credentials live with the
//! authentication collaborator, the engine only keeps the profile.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Merchant {
    pub id: Uuid,
    pub phone: String,
    pub email: Option<String>,
    pub shop_name: String,
    pub business_type: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "merchants")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub phone: String,
    pub email: Option<String>,
    pub shop_name: String,
    pub business_type: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::clients::Entity")]
    Clients,
    #[sea_orm(has_one = "super::subscriptions::Entity")]
    Subscription,
}

impl Related<super::clients::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Clients.def()
    }
}

impl Related<super::subscriptions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Subscription.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Merchant {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            phone: model.phone,
            email: model.email,
            shop_name: model.shop_name,
            business_type: model.business_type,
            created_at: model.created_at,
        }
    }
}
