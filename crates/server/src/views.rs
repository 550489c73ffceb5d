//! Conversions from engine values to wire types.

use api_types::{
    account::AccountView,
    client::{ClientView, PaymentView},
    expense::ExpenseView,
    sale::{PaymentMode as WireMode, SaleView},
    stats,
    subscription::{AccessView, PlanSavingsView, PlanView, SubscriptionView},
};
use chrono::{DateTime, FixedOffset, Utc};
use engine::{
    AccessDecision, Client, Expense, Merchant, Payment, PaymentMode, PlanInfo, PlanSavings, Sale,
    Subscription,
};

pub(crate) fn to_utc(at: Option<DateTime<FixedOffset>>) -> DateTime<Utc> {
    at.map_or_else(Utc::now, |at| at.with_timezone(&Utc))
}

pub(crate) fn engine_mode(mode: WireMode) -> PaymentMode {
    match mode {
        WireMode::Cash => PaymentMode::Cash,
        WireMode::Credit => PaymentMode::Credit,
    }
}

fn wire_mode(mode: PaymentMode) -> WireMode {
    match mode {
        PaymentMode::Cash => WireMode::Cash,
        PaymentMode::Credit => WireMode::Credit,
    }
}

pub(crate) fn account_view(merchant: Merchant) -> AccountView {
    AccountView {
        id: merchant.id,
        phone: merchant.phone,
        email: merchant.email,
        shop_name: merchant.shop_name,
        business_type: merchant.business_type,
        created_at: merchant.created_at,
    }
}

pub(crate) fn client_view(client: Client) -> ClientView {
    ClientView {
        id: client.id,
        name: client.name,
        phone: client.phone,
        address: client.address,
        total_credit: client.total_credit,
        created_at: client.created_at,
    }
}

pub(crate) fn payment_view(payment: Payment) -> PaymentView {
    PaymentView {
        id: payment.id,
        client_id: payment.client_id,
        amount: payment.amount,
        notes: payment.notes,
        occurred_at: payment.occurred_at,
    }
}

pub(crate) fn sale_view(sale: Sale) -> SaleView {
    SaleView {
        id: sale.id,
        amount: sale.amount,
        payment_mode: wire_mode(sale.payment_mode),
        customer_name: sale.customer_name,
        client_id: sale.client_id,
        notes: sale.notes,
        occurred_at: sale.occurred_at,
    }
}

pub(crate) fn expense_view(expense: Expense) -> ExpenseView {
    ExpenseView {
        id: expense.id,
        amount: expense.amount,
        motif: expense.motif,
        category: expense.category,
        occurred_at: expense.occurred_at,
    }
}

pub(crate) fn period_view(
    summary: engine::PeriodSummary,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> stats::PeriodSummary {
    stats::PeriodSummary {
        from,
        to,
        sales_total: summary.sales_total,
        sales_cash: summary.sales_cash,
        sales_credit: summary.sales_credit,
        sales_count: summary.sales_count,
        expenses_total: summary.expenses_total,
        expenses_count: summary.expenses_count,
        profit: summary.profit,
    }
}

pub(crate) fn credit_view(summary: engine::CreditSummary) -> stats::CreditSummary {
    stats::CreditSummary {
        clients_count: summary.clients_count,
        total_credit: summary.total_credit,
        clients: summary
            .clients
            .into_iter()
            .map(|c| stats::ClientCredit {
                client_id: c.client_id,
                name: c.name,
                phone: c.phone,
                amount_due: c.amount_due,
            })
            .collect(),
    }
}

pub(crate) fn overview_view(overview: engine::Overview) -> stats::Overview {
    stats::Overview {
        sales_today: overview.sales_today,
        sales_today_count: overview.sales_today_count,
        expenses_today: overview.expenses_today,
        outstanding_credit: overview.outstanding_credit,
        clients_with_credit: overview.clients_with_credit,
    }
}

pub(crate) fn access_view(decision: &AccessDecision) -> AccessView {
    AccessView {
        has_access: decision.has_access,
        status: decision.status.map(|s| s.as_str().to_string()),
        reason: decision.reason.map(|r| r.as_str().to_string()),
        hours_left: decision.hours_left,
        days_left: decision.days_left,
        plan: decision.plan.map(|p| p.as_str().to_string()),
        plan_name: decision.plan_name.clone(),
        expires_at: decision.expires_at,
        message: decision.message.clone(),
    }
}

pub(crate) fn plan_view(info: PlanInfo) -> PlanView {
    PlanView {
        id: info.plan.as_str().to_string(),
        name: info.name,
        price: info.price,
        duration_days: info.duration_days,
        months: info.months,
        popular: info.popular,
    }
}

pub(crate) fn savings_view(savings: PlanSavings) -> PlanSavingsView {
    PlanSavingsView {
        id: savings.plan.as_str().to_string(),
        price: savings.price,
        monthly_equivalent: savings.monthly_equivalent,
        savings: savings.savings,
        savings_percent: savings.savings_percent,
    }
}

pub(crate) fn subscription_view(sub: Subscription) -> SubscriptionView {
    SubscriptionView {
        status: sub.status.as_str().to_string(),
        trial_start: sub.trial_start,
        trial_end: sub.trial_end,
        period_start: sub.period_start,
        period_end: sub.period_end,
        plan: sub.plan.map(|p| p.as_str().to_string()),
        amount: sub.amount,
        payment_method: sub.payment_method,
        transaction_ref: sub.transaction_ref,
        last_payment_date: sub.last_payment_date,
        last_payment_amount: sub.last_payment_amount,
    }
}
