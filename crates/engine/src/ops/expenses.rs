use sea_orm::{QueryFilter, QueryOrder, QuerySelect, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    Expense, ExpenseCmd, ExpenseFilter, ResultEngine, expenses,
    util::{normalize_optional_text, normalize_required_text},
};

use super::{DEFAULT_LIST_LIMIT, Engine, with_tx};

impl Engine {
    /// Record an expense.
    pub async fn new_expense(&self, cmd: ExpenseCmd) -> ResultEngine<Expense> {
        let motif = normalize_required_text(&cmd.motif, "motif")?;
        let expense = Expense::new(
            cmd.account_id,
            cmd.amount,
            motif,
            normalize_optional_text(cmd.category.as_deref()),
            cmd.occurred_at,
        )?;

        with_tx!(self, |db_tx| {
            self.require_account(&db_tx, expense.account_id).await?;
            let model: expenses::ActiveModel = (&expense).into();
            model.insert(&db_tx).await?;
            Ok(expense.clone())
        })
    }

    /// Return an expense of the account.
    pub async fn expense(&self, account_id: Uuid, expense_id: Uuid) -> ResultEngine<Expense> {
        with_tx!(self, |db_tx| {
            let model = self
                .require_expense_in_account(&db_tx, account_id, expense_id)
                .await?;
            Ok(Expense::from(model))
        })
    }

    /// List expenses, most recent first. `to` is exclusive.
    pub async fn expenses(
        &self,
        account_id: Uuid,
        filter: &ExpenseFilter,
    ) -> ResultEngine<Vec<Expense>> {
        with_tx!(self, |db_tx| {
            let mut query =
                expenses::Entity::find().filter(expenses::Column::AccountId.eq(account_id));
            if let Some(from) = filter.from {
                query = query.filter(expenses::Column::OccurredAt.gte(from));
            }
            if let Some(to) = filter.to {
                query = query.filter(expenses::Column::OccurredAt.lt(to));
            }
            if let Some(category) = normalize_optional_text(filter.category.as_deref()) {
                query = query.filter(expenses::Column::Category.eq(category));
            }
            let models = query
                .order_by_desc(expenses::Column::OccurredAt)
                .order_by_desc(expenses::Column::Id)
                .limit(filter.limit.unwrap_or(DEFAULT_LIST_LIMIT))
                .all(&db_tx)
                .await?;
            Ok(models.into_iter().map(Expense::from).collect())
        })
    }

    /// Delete an expense of the account.
    pub async fn delete_expense(&self, account_id: Uuid, expense_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.require_expense_in_account(&db_tx, account_id, expense_id)
                .await?;
            expenses::Entity::delete_by_id(expense_id)
                .exec(&db_tx)
                .await?;
            Ok(())
        })
    }
}
