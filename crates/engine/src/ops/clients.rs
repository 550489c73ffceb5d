use sea_orm::{
    DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*, sea_query::Expr,
};
use uuid::Uuid;

use crate::{
    Client, ClientDetail, ClientRef, EngineError, NewClientCmd, Payment, PaymentCmd,
    PaymentMode, PaymentReceipt, ResultEngine, Sale, clients, payments, sales,
    util::{name_key, normalize_optional_text, normalize_required_text},
};

use super::{Engine, with_tx};

/// Filters for client listings.
#[derive(Clone, Copy, Debug, Default)]
pub struct ClientFilter {
    /// Keep only clients that currently owe money.
    pub with_credit_only: bool,
}

fn client_key(name: &str) -> ResultEngine<String> {
    name_key(name).ok_or_else(|| {
        EngineError::Validation("client name must contain a letter or a digit".to_string())
    })
}

impl Engine {
    /// First client of the account whose normalized name contains `name`.
    ///
    /// Matches are taken in insertion order. Several clients can match a
    /// short query; the oldest one wins.
    pub(super) async fn lookup_client_by_name(
        &self,
        db: &DatabaseTransaction,
        account_id: Uuid,
        name: &str,
    ) -> ResultEngine<Option<clients::Model>> {
        let Some(key) = name_key(name) else {
            return Ok(None);
        };
        clients::Entity::find()
            .filter(clients::Column::AccountId.eq(account_id))
            .filter(clients::Column::NameNorm.contains(key))
            .order_by_asc(clients::Column::CreatedAt)
            .order_by_asc(clients::Column::Id)
            .one(db)
            .await
            .map_err(Into::into)
    }

    /// Resolve a client reference inside the account.
    pub(super) async fn resolve_client(
        &self,
        db: &DatabaseTransaction,
        account_id: Uuid,
        client: &ClientRef,
    ) -> ResultEngine<clients::Model> {
        match client {
            ClientRef::Id(id) => self.require_client(db, account_id, *id).await,
            ClientRef::Name(name) => self
                .lookup_client_by_name(db, account_id, name)
                .await?
                .ok_or_else(|| {
                    EngineError::ClientNotFound(format!(
                        "\"{}\", create the client first",
                        name.trim()
                    ))
                }),
        }
    }

    /// Find a client by a fragment of its name, ignoring case and accents.
    pub async fn find_client_by_name(
        &self,
        account_id: Uuid,
        name: &str,
    ) -> ResultEngine<Option<Client>> {
        with_tx!(self, |db_tx| {
            let model = self
                .lookup_client_by_name(&db_tx, account_id, name)
                .await?;
            Ok(model.map(Client::from))
        })
    }

    /// Register a new client with no outstanding credit.
    pub async fn new_client(&self, cmd: NewClientCmd) -> ResultEngine<Client> {
        let name = normalize_required_text(&cmd.name, "client name")?;
        let key = client_key(&name)?;
        let client = Client {
            id: Uuid::new_v4(),
            account_id: cmd.account_id,
            name,
            phone: normalize_optional_text(cmd.phone.as_deref()),
            address: normalize_optional_text(cmd.address.as_deref()),
            total_credit: 0,
            created_at: cmd.created_at,
        };

        with_tx!(self, |db_tx| {
            self.require_account(&db_tx, client.account_id).await?;

            let exists = clients::Entity::find()
                .filter(clients::Column::AccountId.eq(client.account_id))
                .filter(clients::Column::NameNorm.eq(key.clone()))
                .one(&db_tx)
                .await?
                .is_some();
            if exists {
                return Err(EngineError::DuplicateClient(client.name.clone()));
            }

            let model: clients::ActiveModel = (&client, key.clone()).into();
            model.insert(&db_tx).await?;
            Ok(client.clone())
        })
    }

    /// Return a client with its credit sales and payments, most recent first.
    pub async fn client(&self, account_id: Uuid, client_id: Uuid) -> ResultEngine<ClientDetail> {
        with_tx!(self, |db_tx| {
            let model = self.require_client(&db_tx, account_id, client_id).await?;

            let credit_sales = sales::Entity::find()
                .filter(sales::Column::ClientId.eq(client_id))
                .filter(sales::Column::PaymentMode.eq(PaymentMode::Credit.as_str()))
                .order_by_desc(sales::Column::OccurredAt)
                .all(&db_tx)
                .await?
                .into_iter()
                .map(Sale::try_from)
                .collect::<ResultEngine<Vec<_>>>()?;

            let payments = payments::Entity::find()
                .filter(payments::Column::ClientId.eq(client_id))
                .order_by_desc(payments::Column::OccurredAt)
                .all(&db_tx)
                .await?
                .into_iter()
                .map(Payment::from)
                .collect();

            Ok(ClientDetail {
                client: Client::from(model),
                credit_sales,
                payments,
            })
        })
    }

    /// List the clients of an account, largest debt first.
    pub async fn clients(
        &self,
        account_id: Uuid,
        filter: ClientFilter,
    ) -> ResultEngine<Vec<Client>> {
        with_tx!(self, |db_tx| {
            let mut query = clients::Entity::find()
                .filter(clients::Column::AccountId.eq(account_id));
            if filter.with_credit_only {
                query = query.filter(clients::Column::TotalCredit.gt(0));
            }
            let models = query
                .order_by_desc(clients::Column::TotalCredit)
                .order_by_asc(clients::Column::Name)
                .all(&db_tx)
                .await?;
            Ok(models.into_iter().map(Client::from).collect())
        })
    }

    /// Delete a client that owes nothing.
    ///
    /// Its sales stay in the books with the client reference cleared; the
    /// client name is copied to sales that had no free-text name. Its
    /// payments are removed.
    pub async fn delete_client(&self, account_id: Uuid, client_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let model = self.require_client(&db_tx, account_id, client_id).await?;
            if model.total_credit > 0 {
                tracing::warn!(%client_id, owed = model.total_credit, "refusing to delete indebted client");
                return Err(EngineError::OutstandingBalance(model.total_credit));
            }

            sales::Entity::update_many()
                .col_expr(sales::Column::CustomerName, Expr::value(model.name.clone()))
                .filter(sales::Column::ClientId.eq(client_id))
                .filter(sales::Column::CustomerName.is_null())
                .exec(&db_tx)
                .await?;
            sales::Entity::update_many()
                .col_expr(sales::Column::ClientId, Expr::value(Option::<Uuid>::None))
                .filter(sales::Column::ClientId.eq(client_id))
                .exec(&db_tx)
                .await?;
            payments::Entity::delete_many()
                .filter(payments::Column::ClientId.eq(client_id))
                .exec(&db_tx)
                .await?;

            // The balance may have moved since it was read.
            let res = clients::Entity::delete_many()
                .filter(clients::Column::Id.eq(client_id))
                .filter(clients::Column::AccountId.eq(account_id))
                .filter(clients::Column::TotalCredit.eq(0))
                .exec(&db_tx)
                .await?;
            if res.rows_affected == 0 {
                let owed = self
                    .require_client(&db_tx, account_id, client_id)
                    .await?
                    .total_credit;
                return Err(EngineError::OutstandingBalance(owed));
            }

            tracing::info!(%client_id, %account_id, "client deleted");
            Ok(())
        })
    }

    /// Record a payment and reduce the client's credit by the same amount.
    ///
    /// A payment larger than the outstanding credit is rejected and leaves
    /// the balance untouched.
    pub async fn record_payment(&self, cmd: PaymentCmd) -> ResultEngine<PaymentReceipt> {
        let payment = Payment::new(
            cmd.client_id,
            cmd.amount,
            normalize_optional_text(cmd.notes.as_deref()),
            cmd.occurred_at,
        )?;

        with_tx!(self, |db_tx| {
            self.require_client(&db_tx, cmd.account_id, cmd.client_id)
                .await?;

            let applied = self
                .debit_client(&db_tx, cmd.account_id, cmd.client_id, payment.amount)
                .await?;
            if !applied {
                let available = self
                    .require_client(&db_tx, cmd.account_id, cmd.client_id)
                    .await?
                    .total_credit;
                tracing::warn!(
                    client_id = %cmd.client_id,
                    requested = payment.amount,
                    available,
                    "overpayment rejected"
                );
                return Err(EngineError::OverpaymentRejected {
                    requested: payment.amount,
                    available,
                });
            }

            let model: payments::ActiveModel = (&payment).into();
            model.insert(&db_tx).await?;

            let client = self
                .require_client(&db_tx, cmd.account_id, cmd.client_id)
                .await?;
            Ok(PaymentReceipt {
                payment: payment.clone(),
                client: Client::from(client),
            })
        })
    }

    /// List the payments of a client, most recent first.
    pub async fn payments(&self, account_id: Uuid, client_id: Uuid) -> ResultEngine<Vec<Payment>> {
        with_tx!(self, |db_tx| {
            self.require_client(&db_tx, account_id, client_id).await?;
            let models = payments::Entity::find()
                .filter(payments::Column::ClientId.eq(client_id))
                .order_by_desc(payments::Column::OccurredAt)
                .all(&db_tx)
                .await?;
            Ok(models.into_iter().map(Payment::from).collect())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_key_rejects_symbol_only_names() {
        assert_eq!(client_key("Awa Traoré").unwrap(), "awa traore");
        assert!(client_key("***").is_err());
    }
}
