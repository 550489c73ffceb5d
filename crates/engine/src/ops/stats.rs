use chrono::{DateTime, Utc};
use sea_orm::{
    DatabaseTransaction, QueryFilter, QueryOrder, QuerySelect, TransactionTrait, prelude::*,
};
use uuid::Uuid;

use crate::{
    ClientCredit, CreditSummary, EngineError, Overview, PaymentMode, PeriodSummary, ResultEngine,
    clients, expenses, sales, util::checked_total,
};

use super::{Engine, with_tx};

impl Engine {
    async fn summarize_period(
        &self,
        db: &DatabaseTransaction,
        account_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> ResultEngine<PeriodSummary> {
        if to <= from {
            return Err(EngineError::Validation(
                "period end must be after its start".to_string(),
            ));
        }

        let sold: Vec<(i64, String)> = sales::Entity::find()
            .select_only()
            .column(sales::Column::Amount)
            .column(sales::Column::PaymentMode)
            .filter(sales::Column::AccountId.eq(account_id))
            .filter(sales::Column::OccurredAt.gte(from))
            .filter(sales::Column::OccurredAt.lt(to))
            .into_tuple()
            .all(db)
            .await?;
        let spent: Vec<i64> = expenses::Entity::find()
            .select_only()
            .column(expenses::Column::Amount)
            .filter(expenses::Column::AccountId.eq(account_id))
            .filter(expenses::Column::OccurredAt.gte(from))
            .filter(expenses::Column::OccurredAt.lt(to))
            .into_tuple()
            .all(db)
            .await?;

        let mut cash = Vec::new();
        let mut credit = Vec::new();
        for (amount, mode) in sold {
            match PaymentMode::try_from(mode.as_str())? {
                PaymentMode::Cash => cash.push(amount),
                PaymentMode::Credit => credit.push(amount),
            }
        }

        let sales_cash = checked_total(&cash, "cash sales")?;
        let sales_credit = checked_total(&credit, "credit sales")?;
        let expenses_total = checked_total(&spent, "expenses")?;
        Ok(PeriodSummary {
            sales_total: checked_total(&[sales_cash, sales_credit], "sales")?,
            sales_cash,
            sales_credit,
            sales_count: (cash.len() + credit.len()) as u64,
            expenses_total,
            expenses_count: spent.len() as u64,
            profit: sales_cash.checked_sub(expenses_total).ok_or_else(|| {
                EngineError::Consistency("period profit overflows".to_string())
            })?,
        })
    }

    async fn summarize_credit(
        &self,
        db: &DatabaseTransaction,
        account_id: Uuid,
    ) -> ResultEngine<CreditSummary> {
        let models = clients::Entity::find()
            .filter(clients::Column::AccountId.eq(account_id))
            .filter(clients::Column::TotalCredit.gt(0))
            .order_by_desc(clients::Column::TotalCredit)
            .order_by_asc(clients::Column::Name)
            .all(db)
            .await?;
        let dues: Vec<i64> = models.iter().map(|m| m.total_credit).collect();
        Ok(CreditSummary {
            clients_count: models.len() as u64,
            total_credit: checked_total(&dues, "outstanding credit")?,
            clients: models
                .into_iter()
                .map(|m| ClientCredit {
                    client_id: m.id,
                    name: m.name,
                    phone: m.phone,
                    amount_due: m.total_credit,
                })
                .collect(),
        })
    }

    /// Sales and expense totals over `[from, to)`.
    pub async fn period_summary(
        &self,
        account_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> ResultEngine<PeriodSummary> {
        with_tx!(self, |db_tx| {
            self.summarize_period(&db_tx, account_id, from, to).await
        })
    }

    /// Clients that owe money, largest debt first.
    pub async fn credit_summary(&self, account_id: Uuid) -> ResultEngine<CreditSummary> {
        with_tx!(self, |db_tx| {
            self.summarize_credit(&db_tx, account_id).await
        })
    }

    /// Dashboard figures for the day `[day_start, day_end)`.
    pub async fn overview(
        &self,
        account_id: Uuid,
        day_start: DateTime<Utc>,
        day_end: DateTime<Utc>,
    ) -> ResultEngine<Overview> {
        with_tx!(self, |db_tx| {
            let today = self
                .summarize_period(&db_tx, account_id, day_start, day_end)
                .await?;
            let credit = self.summarize_credit(&db_tx, account_id).await?;
            Ok(Overview {
                sales_today: today.sales_total,
                sales_today_count: today.sales_count,
                expenses_today: today.expenses_total,
                outstanding_credit: credit.total_credit,
                clients_with_credit: credit.clients_count,
            })
        })
    }
}
