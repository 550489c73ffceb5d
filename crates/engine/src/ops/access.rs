use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, DatabaseTransaction, QueryFilter, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    EngineError, Merchant, ResultEngine, Subscription, accounts, clients, expenses, sales,
    subscriptions,
    util::{normalize_optional_text, normalize_required_text},
};

use super::{Engine, with_tx};

/// Profile of a merchant being registered.
#[derive(Clone, Debug, Default)]
pub struct NewMerchant {
    pub phone: String,
    pub shop_name: String,
    pub email: Option<String>,
    pub business_type: Option<String>,
}

/// Generates `_exists_in_account` and `require_in_account` methods for an
/// account-scoped entity.
macro_rules! impl_target_in_account {
    ($exists_fn:ident, $require_fn:ident, $entity:path, $model:path, $account_col:expr, $err_msg:literal) => {
        async fn $exists_fn(
            &self,
            db: &DatabaseTransaction,
            account_id: Uuid,
            target_id: Uuid,
        ) -> ResultEngine<Option<$model>> {
            <$entity>::find_by_id(target_id)
                .filter($account_col.eq(account_id))
                .one(db)
                .await
                .map_err(Into::into)
        }

        pub(super) async fn $require_fn(
            &self,
            db: &DatabaseTransaction,
            account_id: Uuid,
            target_id: Uuid,
        ) -> ResultEngine<$model> {
            self.$exists_fn(db, account_id, target_id)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound($err_msg.to_string()))
        }
    };
}

impl Engine {
    impl_target_in_account!(
        sale_in_account,
        require_sale_in_account,
        sales::Entity,
        sales::Model,
        sales::Column::AccountId,
        "sale not exists"
    );

    impl_target_in_account!(
        expense_in_account,
        require_expense_in_account,
        expenses::Entity,
        expenses::Model,
        expenses::Column::AccountId,
        "expense not exists"
    );

    /// Register a merchant and open its free trial in the same transaction.
    ///
    /// The phone number is the business identity of a merchant and must be
    /// unique, as must the email when given.
    pub async fn register_merchant(
        &self,
        new: NewMerchant,
        now: DateTime<Utc>,
    ) -> ResultEngine<(Merchant, Subscription)> {
        let phone = normalize_required_text(&new.phone, "phone")?;
        let shop_name = normalize_required_text(&new.shop_name, "shop name")?;
        let email = normalize_optional_text(new.email.as_deref()).map(|e| e.to_lowercase());
        let business_type = normalize_optional_text(new.business_type.as_deref());

        with_tx!(self, |db_tx| {
            let phone_taken = accounts::Entity::find()
                .filter(accounts::Column::Phone.eq(phone.clone()))
                .one(&db_tx)
                .await?
                .is_some();
            if phone_taken {
                return Err(EngineError::ExistingKey(format!("phone {phone}")));
            }
            if let Some(email) = &email {
                let email_taken = accounts::Entity::find()
                    .filter(accounts::Column::Email.eq(email.clone()))
                    .one(&db_tx)
                    .await?
                    .is_some();
                if email_taken {
                    return Err(EngineError::ExistingKey(format!("email {email}")));
                }
            }

            let merchant = accounts::ActiveModel {
                id: ActiveValue::Set(Uuid::new_v4()),
                phone: ActiveValue::Set(phone.clone()),
                email: ActiveValue::Set(email.clone()),
                shop_name: ActiveValue::Set(shop_name.clone()),
                business_type: ActiveValue::Set(business_type.clone()),
                created_at: ActiveValue::Set(now),
            }
            .insert(&db_tx)
            .await?;

            let subscription = Subscription::trial(merchant.id, now);
            let sub_model: subscriptions::ActiveModel = (&subscription).into();
            sub_model.insert(&db_tx).await?;

            tracing::info!(account_id = %merchant.id, "merchant registered with a free trial");
            Ok((Merchant::from(merchant), subscription))
        })
    }

    /// Return a merchant profile.
    pub async fn merchant(&self, account_id: Uuid) -> ResultEngine<Merchant> {
        with_tx!(self, |db_tx| {
            let model = self.require_account(&db_tx, account_id).await?;
            Ok(Merchant::from(model))
        })
    }

    pub(super) async fn require_account(
        &self,
        db: &DatabaseTransaction,
        account_id: Uuid,
    ) -> ResultEngine<accounts::Model> {
        accounts::Entity::find_by_id(account_id)
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("account not exists".to_string()))
    }

    /// Load a client of the account. Clients of other accounts are reported
    /// as missing.
    pub(super) async fn require_client(
        &self,
        db: &DatabaseTransaction,
        account_id: Uuid,
        client_id: Uuid,
    ) -> ResultEngine<clients::Model> {
        clients::Entity::find_by_id(client_id)
            .filter(clients::Column::AccountId.eq(account_id))
            .one(db)
            .await?
            .ok_or_else(|| EngineError::ClientNotFound(client_id.to_string()))
    }
}
