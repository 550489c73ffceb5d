use chrono::{DateTime, Utc};
use sea_orm::{QueryFilter, QueryOrder, QuerySelect, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    Client, ClientRef, EngineError, PaymentMode, ResultEngine, Sale, SaleCmd, SaleFilter,
    SaleReceipt, sales,
    util::{ensure_positive_amount, normalize_optional_text},
};

use super::{DEFAULT_LIST_LIMIT, Engine, with_tx};

impl Engine {
    /// Record a sale.
    ///
    /// A credit sale that references a client adds its amount to the client's
    /// credit in the same transaction. A name reference is resolved with the
    /// fuzzy lookup and never creates a client. A credit sale with only a
    /// free-text customer name has no balance effect.
    ///
    /// A cash sale may reference a client too; it is stored against that
    /// client and leaves the balance untouched. An unmatched name on a cash
    /// sale is kept as the customer label.
    pub async fn record_sale(&self, cmd: SaleCmd) -> ResultEngine<SaleReceipt> {
        ensure_positive_amount(cmd.amount, "sale")?;
        let mut customer_name = normalize_optional_text(cmd.customer_name.as_deref());
        let notes = normalize_optional_text(cmd.notes.as_deref());

        with_tx!(self, |db_tx| {
            self.require_account(&db_tx, cmd.account_id).await?;

            let client = match (&cmd.client, cmd.payment_mode) {
                (Some(ClientRef::Name(name)), PaymentMode::Cash) => {
                    let found = self
                        .lookup_client_by_name(&db_tx, cmd.account_id, name)
                        .await?;
                    if found.is_none() && customer_name.is_none() {
                        customer_name = normalize_optional_text(Some(name.as_str()));
                    }
                    found
                }
                (Some(client_ref), _) => Some(
                    self.resolve_client(&db_tx, cmd.account_id, client_ref)
                        .await?,
                ),
                (None, _) => None,
            };

            let sale = Sale::new(
                cmd.account_id,
                cmd.amount,
                cmd.payment_mode,
                customer_name.or_else(|| client.as_ref().map(|c| c.name.clone())),
                client.as_ref().map(|c| c.id),
                notes,
                cmd.occurred_at,
            )?;
            let model: sales::ActiveModel = (&sale).into();
            model.insert(&db_tx).await?;

            let client = match client {
                Some(client) if sale.affects_balance() => {
                    self.credit_client(&db_tx, cmd.account_id, client.id, sale.amount)
                        .await?;
                    let updated = self
                        .require_client(&db_tx, cmd.account_id, client.id)
                        .await?;
                    tracing::debug!(
                        client_id = %updated.id,
                        total_credit = updated.total_credit,
                        "client credit increased"
                    );
                    Some(Client::from(updated))
                }
                _ => None,
            };

            Ok(SaleReceipt { sale, client })
        })
    }

    /// Record a sale paid on the spot.
    pub async fn record_cash_sale(
        &self,
        account_id: Uuid,
        amount: i64,
        label: Option<&str>,
        occurred_at: DateTime<Utc>,
    ) -> ResultEngine<SaleReceipt> {
        let mut cmd = SaleCmd::cash(account_id, amount, occurred_at);
        if let Some(label) = label {
            cmd = cmd.customer_name(label);
        }
        self.record_sale(cmd).await
    }

    /// Record a credit sale against a client of the account.
    pub async fn record_credit_sale(
        &self,
        account_id: Uuid,
        client: ClientRef,
        amount: i64,
        occurred_at: DateTime<Utc>,
    ) -> ResultEngine<SaleReceipt> {
        self.record_sale(SaleCmd::credit(account_id, amount, client, occurred_at))
            .await
    }

    /// Delete a sale, reverting its effect on the client's credit.
    ///
    /// The credit is never clamped: a reversal that would leave a negative
    /// balance means the books are already inconsistent and aborts.
    pub async fn reverse_sale(&self, account_id: Uuid, sale_id: Uuid) -> ResultEngine<Sale> {
        with_tx!(self, |db_tx| {
            let model = self
                .require_sale_in_account(&db_tx, account_id, sale_id)
                .await?;
            let sale = Sale::try_from(model)?;

            if let Some(client_id) = sale.client_id.filter(|_| sale.affects_balance()) {
                let applied = self
                    .debit_client(&db_tx, account_id, client_id, sale.amount)
                    .await?;
                if !applied {
                    tracing::error!(
                        %sale_id,
                        %client_id,
                        amount = sale.amount,
                        "sale reversal would make client credit negative"
                    );
                    return Err(EngineError::Consistency(format!(
                        "reversing sale {sale_id} would make client {client_id} credit negative"
                    )));
                }
            }

            sales::Entity::delete_by_id(sale_id).exec(&db_tx).await?;
            Ok(sale)
        })
    }

    /// Return a sale of the account.
    pub async fn sale(&self, account_id: Uuid, sale_id: Uuid) -> ResultEngine<Sale> {
        with_tx!(self, |db_tx| {
            let model = self
                .require_sale_in_account(&db_tx, account_id, sale_id)
                .await?;
            Sale::try_from(model)
        })
    }

    /// List sales, most recent first. `to` is exclusive.
    pub async fn sales(&self, account_id: Uuid, filter: &SaleFilter) -> ResultEngine<Vec<Sale>> {
        with_tx!(self, |db_tx| {
            let mut query = sales::Entity::find().filter(sales::Column::AccountId.eq(account_id));
            if let Some(from) = filter.from {
                query = query.filter(sales::Column::OccurredAt.gte(from));
            }
            if let Some(to) = filter.to {
                query = query.filter(sales::Column::OccurredAt.lt(to));
            }
            if let Some(mode) = filter.payment_mode {
                query = query.filter(sales::Column::PaymentMode.eq(mode.as_str()));
            }
            query
                .order_by_desc(sales::Column::OccurredAt)
                .order_by_desc(sales::Column::Id)
                .limit(filter.limit.unwrap_or(DEFAULT_LIST_LIMIT))
                .all(&db_tx)
                .await?
                .into_iter()
                .map(Sale::try_from)
                .collect::<ResultEngine<Vec<_>>>()
        })
    }
}
