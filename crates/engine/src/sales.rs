//! Sale primitives.
//!
//! A `Sale` is either paid on the spot (`cash`) or deferred (`credit`). Both may
//! reference a registered client, but only a credit sale moves that client's
//! balance.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Client, EngineError, ResultEngine, util::ensure_positive_amount};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMode {
    Cash,
    Credit,
}

impl PaymentMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::Credit => "credit",
        }
    }
}

impl TryFrom<&str> for PaymentMode {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "cash" => Ok(Self::Cash),
            "credit" => Ok(Self::Credit),
            other => Err(EngineError::Validation(format!(
                "invalid payment mode: {other} (expected cash or credit)"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sale {
    pub id: Uuid,
    pub account_id: Uuid,
    pub amount: i64,
    pub payment_mode: PaymentMode,
    /// Free-text customer label, kept even when no client is attached.
    pub customer_name: Option<String>,
    pub client_id: Option<Uuid>,
    pub notes: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

impl Sale {
    pub fn new(
        account_id: Uuid,
        amount: i64,
        payment_mode: PaymentMode,
        customer_name: Option<String>,
        client_id: Option<Uuid>,
        notes: Option<String>,
        occurred_at: DateTime<Utc>,
    ) -> ResultEngine<Self> {
        ensure_positive_amount(amount, "sale")?;
        Ok(Self {
            id: Uuid::new_v4(),
            account_id,
            amount,
            payment_mode,
            customer_name,
            client_id,
            notes,
            occurred_at,
        })
    }

    /// Whether creating or deleting this sale moves a client balance.
    pub fn affects_balance(&self) -> bool {
        self.payment_mode == PaymentMode::Credit && self.client_id.is_some()
    }
}

/// A sale together with the client whose balance it touched.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleReceipt {
    pub sale: Sale,
    /// The client after the balance change, when the sale moved one.
    pub client: Option<Client>,
}

/// Filters for sale listings.
#[derive(Clone, Debug, Default)]
pub struct SaleFilter {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub payment_mode: Option<PaymentMode>,
    pub limit: Option<u64>,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "sales")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub account_id: Uuid,
    pub amount: i64,
    pub payment_mode: String,
    pub customer_name: Option<String>,
    pub client_id: Option<Uuid>,
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
        on_delete = "SetNull"
    )]
    Clients,
}

impl Related<super::clients::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Clients.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Sale> for ActiveModel {
    fn from(sale: &Sale) -> Self {
        Self {
            id: ActiveValue::Set(sale.id),
            account_id: ActiveValue::Set(sale.account_id),
            amount: ActiveValue::Set(sale.amount),
            payment_mode: ActiveValue::Set(sale.payment_mode.as_str().to_string()),
            customer_name: ActiveValue::Set(sale.customer_name.clone()),
            client_id: ActiveValue::Set(sale.client_id),
            notes: ActiveValue::Set(sale.notes.clone()),
            occurred_at: ActiveValue::Set(sale.occurred_at),
        }
    }
}

impl TryFrom<Model> for Sale {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            account_id: model.account_id,
            amount: model.amount,
            payment_mode: PaymentMode::try_from(model.payment_mode.as_str())?,
            customer_name: model.customer_name,
            client_id: model.client_id,
            notes: model.notes,
            occurred_at: model.occurred_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    #[test]
    fn rejects_non_positive_amount() {
        let err = Sale::new(
            Uuid::new_v4(),
            0,
            PaymentMode::Cash,
            None,
            None,
            None,
            Utc.timestamp_opt(0, 0).unwrap(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            EngineError::Validation("sale amount must be > 0".to_string())
        );
    }

    #[test]
    fn only_attached_credit_sales_affect_balance() {
        let at = Utc.timestamp_opt(0, 0).unwrap();
        let account = Uuid::new_v4();
        let free_text = Sale::new(
            account,
            500,
            PaymentMode::Credit,
            Some("Awa".to_string()),
            None,
            None,
            at,
        )
        .unwrap();
        let attached = Sale::new(
            account,
            500,
            PaymentMode::Credit,
            None,
            Some(Uuid::new_v4()),
            None,
            at,
        )
        .unwrap();
        assert!(!free_text.affects_balance());
        assert!(attached.affects_balance());
    }

    #[test]
    fn cash_sale_to_a_client_leaves_the_balance_alone() {
        let sale = Sale::new(
            Uuid::new_v4(),
            800,
            PaymentMode::Cash,
            None,
            Some(Uuid::new_v4()),
            None,
            Utc.timestamp_opt(0, 0).unwrap(),
        )
        .unwrap();
        assert!(!sale.affects_balance());
    }

    #[test]
    fn parses_payment_mode() {
        assert_eq!(PaymentMode::try_from("credit").unwrap(), PaymentMode::Credit);
        assert!(PaymentMode::try_from("cheque").is_err());
    }
}
