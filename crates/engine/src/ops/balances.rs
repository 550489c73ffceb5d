use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
    prelude::*, sea_query::Expr,
};
use uuid::Uuid;

use crate::{
    Client, CreditAudit, EngineError, PaymentMode, ResultEngine, clients, payments, sales,
    util::checked_total,
};

use super::{Engine, with_tx};

impl Engine {
    /// Add `amount` to a client's outstanding credit.
    ///
    /// The increment is computed by the database so concurrent writers never
    /// lose an update. A balance that would leave the `i64` range is refused
    /// and the row is left untouched.
    pub(super) async fn credit_client(
        &self,
        db: &DatabaseTransaction,
        account_id: Uuid,
        client_id: Uuid,
        amount: i64,
    ) -> ResultEngine<()> {
        let res = clients::Entity::update_many()
            .col_expr(
                clients::Column::TotalCredit,
                Expr::col(clients::Column::TotalCredit).add(amount),
            )
            .filter(clients::Column::Id.eq(client_id))
            .filter(clients::Column::AccountId.eq(account_id))
            .filter(clients::Column::TotalCredit.lte(i64::MAX.saturating_sub(amount)))
            .exec(db)
            .await?;
        if res.rows_affected == 1 {
            return Ok(());
        }
        self.require_client(db, account_id, client_id).await?;
        Err(EngineError::Validation(format!(
            "credit of client {client_id} cannot grow by {amount}"
        )))
    }

    /// Subtract `amount` from a client's outstanding credit if it stays
    /// non-negative.
    ///
    /// Returns `false`, leaving the row untouched, when the balance is too
    /// small. The check and the write are one statement.
    pub(super) async fn debit_client(
        &self,
        db: &DatabaseTransaction,
        account_id: Uuid,
        client_id: Uuid,
        amount: i64,
    ) -> ResultEngine<bool> {
        let res = clients::Entity::update_many()
            .col_expr(
                clients::Column::TotalCredit,
                Expr::col(clients::Column::TotalCredit).sub(amount),
            )
            .filter(clients::Column::Id.eq(client_id))
            .filter(clients::Column::AccountId.eq(account_id))
            .filter(clients::Column::TotalCredit.gte(amount))
            .exec(db)
            .await?;
        Ok(res.rows_affected == 1)
    }

    /// Sum of the client's credit sales minus the sum of its payments.
    async fn replay_client_credit(
        &self,
        db: &DatabaseTransaction,
        client_id: Uuid,
    ) -> ResultEngine<i64> {
        let sold: Vec<i64> = sales::Entity::find()
            .select_only()
            .column(sales::Column::Amount)
            .filter(sales::Column::ClientId.eq(client_id))
            .filter(sales::Column::PaymentMode.eq(PaymentMode::Credit.as_str()))
            .into_tuple()
            .all(db)
            .await?;
        let paid: Vec<i64> = payments::Entity::find()
            .select_only()
            .column(payments::Column::Amount)
            .filter(payments::Column::ClientId.eq(client_id))
            .into_tuple()
            .all(db)
            .await?;
        checked_total(&sold, "credit sales")?
            .checked_sub(checked_total(&paid, "payments")?)
            .ok_or_else(|| {
                EngineError::Consistency(format!("credit of client {client_id} overflows"))
            })
    }

    /// Compare a client's stored credit with the one replayed from its
    /// history.
    pub async fn audit_client_credit(
        &self,
        account_id: Uuid,
        client_id: Uuid,
    ) -> ResultEngine<CreditAudit> {
        with_tx!(self, |db_tx| {
            let model = self.require_client(&db_tx, account_id, client_id).await?;
            let replayed = self.replay_client_credit(&db_tx, client_id).await?;
            Ok(CreditAudit {
                client_id,
                stored: model.total_credit,
                replayed,
            })
        })
    }

    /// Audit every client of an account, in creation order.
    pub async fn audit_account_credit(&self, account_id: Uuid) -> ResultEngine<Vec<CreditAudit>> {
        with_tx!(self, |db_tx| {
            self.require_account(&db_tx, account_id).await?;
            let models: Vec<clients::Model> = clients::Entity::find()
                .filter(clients::Column::AccountId.eq(account_id))
                .order_by_asc(clients::Column::CreatedAt)
                .order_by_asc(clients::Column::Id)
                .all(&db_tx)
                .await?;

            let mut audits = Vec::with_capacity(models.len());
            for model in models {
                let replayed = self.replay_client_credit(&db_tx, model.id).await?;
                if replayed != model.total_credit {
                    tracing::warn!(
                        client_id = %model.id,
                        stored = model.total_credit,
                        replayed,
                        "client credit drift"
                    );
                }
                audits.push(CreditAudit {
                    client_id: model.id,
                    stored: model.total_credit,
                    replayed,
                });
            }
            Ok(audits)
        })
    }

    /// Overwrite a client's stored credit with the replayed value.
    ///
    /// A negative replay means payments exceed credit sales, which no
    /// sequence of engine operations produces: it is reported, not stored.
    pub async fn recompute_client_credit(
        &self,
        account_id: Uuid,
        client_id: Uuid,
    ) -> ResultEngine<Client> {
        with_tx!(self, |db_tx| {
            let model = self.require_client(&db_tx, account_id, client_id).await?;
            let replayed = self.replay_client_credit(&db_tx, client_id).await?;
            if replayed < 0 {
                return Err(EngineError::Consistency(format!(
                    "client {client_id} history replays to a negative credit of {replayed}"
                )));
            }
            if replayed == model.total_credit {
                return Ok(Client::from(model));
            }

            tracing::warn!(
                client_id = %client_id,
                stored = model.total_credit,
                replayed,
                "rewriting drifted client credit"
            );
            let active = clients::ActiveModel {
                id: ActiveValue::Set(client_id),
                total_credit: ActiveValue::Set(replayed),
                ..Default::default()
            };
            let updated = active.update(&db_tx).await?;
            Ok(Client::from(updated))
        })
    }
}
