use chrono::{DateTime, Utc};
use sea_orm::{
    Condition, DatabaseTransaction, QueryFilter, TransactionTrait, prelude::*, sea_query::Expr,
};
use uuid::Uuid;

use crate::{
    AccessDecision, EngineError, Plan, ResultEngine, Subscription, SubscriptionInfo,
    SubscriptionStatus, parse_plan, plans, subscriptions,
};

use super::{Engine, with_tx};

impl Engine {
    async fn find_subscription(
        &self,
        db: &DatabaseTransaction,
        account_id: Uuid,
    ) -> ResultEngine<Option<Subscription>> {
        subscriptions::Entity::find()
            .filter(subscriptions::Column::AccountId.eq(account_id))
            .one(db)
            .await?
            .map(Subscription::try_from)
            .transpose()
    }

    async fn require_subscription(
        &self,
        db: &DatabaseTransaction,
        account_id: Uuid,
    ) -> ResultEngine<Subscription> {
        self.find_subscription(db, account_id)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("subscription not exists".to_string()))
    }

    /// Evaluate the account's subscription and persist a detected expiry.
    ///
    /// The write only applies while the stored row still satisfies the expiry
    /// predicate, so it cannot undo an activation committed in between.
    async fn evaluate_access(
        &self,
        db: &DatabaseTransaction,
        account_id: Uuid,
        now: DateTime<Utc>,
    ) -> ResultEngine<(Option<Subscription>, AccessDecision)> {
        let Some(mut sub) = self.find_subscription(db, account_id).await? else {
            return Ok((None, AccessDecision::no_subscription()));
        };

        let evaluation = sub.evaluate(now);
        if let Some(next) = evaluation.transition {
            let still_due = match sub.status {
                SubscriptionStatus::Trial => {
                    Condition::all().add(subscriptions::Column::TrialEnd.lte(now))
                }
                _ => Condition::any()
                    .add(subscriptions::Column::PeriodEnd.is_null())
                    .add(subscriptions::Column::PeriodEnd.lte(now)),
            };
            let res = subscriptions::Entity::update_many()
                .col_expr(subscriptions::Column::Status, Expr::value(next.as_str()))
                .col_expr(subscriptions::Column::UpdatedAt, Expr::value(now))
                .filter(subscriptions::Column::Id.eq(sub.id))
                .filter(subscriptions::Column::Status.eq(sub.status.as_str()))
                .filter(still_due)
                .exec(db)
                .await?;
            if res.rows_affected > 0 {
                tracing::info!(
                    %account_id,
                    from = sub.status.as_str(),
                    to = next.as_str(),
                    "subscription expired"
                );
                sub.status = next;
                sub.updated_at = now;
            }
        }

        Ok((Some(sub), evaluation.decision))
    }

    async fn apply_activation(
        &self,
        db: &DatabaseTransaction,
        mut sub: Subscription,
        plan: Plan,
        transaction_ref: &str,
        payment_method: &str,
        now: DateTime<Utc>,
    ) -> ResultEngine<Subscription> {
        let previous = sub.status;
        sub.activate(
            plan,
            transaction_ref.trim().to_string(),
            payment_method.trim().to_string(),
            now,
        )?;
        let model: subscriptions::ActiveModel = (&sub).into();
        model.update(db).await?;
        tracing::info!(
            account_id = %sub.account_id,
            from = previous.as_str(),
            plan = plan.as_str(),
            transaction_ref,
            "subscription activated"
        );
        Ok(sub)
    }

    /// Open the 72h free trial of an account.
    pub async fn init_trial(
        &self,
        account_id: Uuid,
        now: DateTime<Utc>,
    ) -> ResultEngine<Subscription> {
        with_tx!(self, |db_tx| {
            self.require_account(&db_tx, account_id).await?;
            if self.find_subscription(&db_tx, account_id).await?.is_some() {
                return Err(EngineError::ExistingKey("subscription".to_string()));
            }
            let sub = Subscription::trial(account_id, now);
            let model: subscriptions::ActiveModel = (&sub).into();
            model.insert(&db_tx).await?;
            tracing::info!(%account_id, trial_end = %sub.trial_end, "trial started");
            Ok(sub)
        })
    }

    /// Decide whether the account has access at `now`.
    ///
    /// A lapsed trial or period is persisted as `expired` by the first call,
    /// which reports the specific reason. Later calls with the same `now` stay
    /// denied without writing and report `expired`.
    pub async fn check_access(
        &self,
        account_id: Uuid,
        now: DateTime<Utc>,
    ) -> ResultEngine<AccessDecision> {
        with_tx!(self, |db_tx| {
            let (_, decision) = self.evaluate_access(&db_tx, account_id, now).await?;
            Ok(decision)
        })
    }

    /// Activate `plan` after a confirmed payment.
    ///
    /// The new period starts at `now` whatever remained of the previous one.
    pub async fn activate(
        &self,
        account_id: Uuid,
        plan: &str,
        transaction_ref: &str,
        payment_method: &str,
        now: DateTime<Utc>,
    ) -> ResultEngine<Subscription> {
        let plan = parse_plan(plan)?;
        with_tx!(self, |db_tx| {
            let sub = self.require_subscription(&db_tx, account_id).await?;
            self.apply_activation(&db_tx, sub, plan, transaction_ref, payment_method, now)
                .await
        })
    }

    /// Activate the plan stored on the subscription again.
    pub async fn renew(
        &self,
        account_id: Uuid,
        transaction_ref: &str,
        payment_method: &str,
        now: DateTime<Utc>,
    ) -> ResultEngine<Subscription> {
        with_tx!(self, |db_tx| {
            let Some(sub) = self.find_subscription(&db_tx, account_id).await? else {
                return Err(EngineError::NoPriorPlan("no subscription".to_string()));
            };
            let Some(plan) = sub.plan else {
                return Err(EngineError::NoPriorPlan(
                    "choose a plan to subscribe".to_string(),
                ));
            };
            self.apply_activation(&db_tx, sub, plan, transaction_ref, payment_method, now)
                .await
        })
    }

    /// Cancel the subscription. Cancellation is terminal.
    pub async fn cancel_subscription(
        &self,
        account_id: Uuid,
        now: DateTime<Utc>,
    ) -> ResultEngine<Subscription> {
        with_tx!(self, |db_tx| {
            let mut sub = self.require_subscription(&db_tx, account_id).await?;
            if sub.status == SubscriptionStatus::Cancelled {
                return Err(EngineError::InvalidTransition(
                    "subscription already cancelled".to_string(),
                ));
            }
            let previous = sub.status;
            sub.status = SubscriptionStatus::Cancelled;
            sub.updated_at = now;
            let model: subscriptions::ActiveModel = (&sub).into();
            model.update(&db_tx).await?;
            tracing::info!(%account_id, from = previous.as_str(), "subscription cancelled");
            Ok(sub)
        })
    }

    /// Return the stored subscription of the account.
    pub async fn subscription(&self, account_id: Uuid) -> ResultEngine<Subscription> {
        with_tx!(self, |db_tx| {
            self.require_subscription(&db_tx, account_id).await
        })
    }

    /// Return the subscription, its current decision and the plan catalog.
    pub async fn subscription_info(
        &self,
        account_id: Uuid,
        now: DateTime<Utc>,
    ) -> ResultEngine<SubscriptionInfo> {
        with_tx!(self, |db_tx| {
            let (sub, access) = self.evaluate_access(&db_tx, account_id, now).await?;
            let subscription = sub
                .ok_or_else(|| EngineError::KeyNotFound("subscription not exists".to_string()))?;
            Ok(SubscriptionInfo {
                subscription,
                access,
                plans: plans(),
            })
        })
    }
}
