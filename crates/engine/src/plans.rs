//! Subscription plan catalog.
//!
//! The catalog is fixed at compile time. Savings are always derived from the
//! monthly price and never stored.

use serde::{Deserialize, Serialize};

use crate::{EngineError, ResultEngine};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Plan {
    Monthly,
    Quarterly,
    Semesterly,
    Yearly,
}

impl Plan {
    pub const ALL: [Plan; 4] = [
        Plan::Monthly,
        Plan::Quarterly,
        Plan::Semesterly,
        Plan::Yearly,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Monthly => "monthly",
            Self::Quarterly => "quarterly",
            Self::Semesterly => "semesterly",
            Self::Yearly => "yearly",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::Monthly => "Monthly",
            Self::Quarterly => "Quarterly",
            Self::Semesterly => "Semiannual",
            Self::Yearly => "Yearly",
        }
    }

    /// Price in francs.
    pub fn price(self) -> i64 {
        match self {
            Self::Monthly => 2_000,
            Self::Quarterly => 5_000,
            Self::Semesterly => 10_000,
            Self::Yearly => 20_000,
        }
    }

    pub fn duration_days(self) -> i64 {
        match self {
            Self::Monthly => 30,
            Self::Quarterly => 90,
            Self::Semesterly => 180,
            Self::Yearly => 365,
        }
    }

    /// Number of monthly periods the plan replaces.
    pub fn months(self) -> i64 {
        match self {
            Self::Monthly => 1,
            Self::Quarterly => 3,
            Self::Semesterly => 6,
            Self::Yearly => 12,
        }
    }

    pub fn popular(self) -> bool {
        matches!(self, Self::Yearly)
    }

    /// Amount saved compared to paying the monthly plan for the same span.
    pub fn savings(self) -> i64 {
        Plan::Monthly.price() * self.months() - self.price()
    }

    /// Savings relative to the monthly-equivalent price, rounded half up.
    pub fn savings_percent(self) -> i64 {
        let reference = Plan::Monthly.price() * self.months();
        (self.savings() * 200 + reference) / (reference * 2)
    }

    /// Plan price spread over its months, rounded half up.
    pub fn monthly_equivalent(self) -> i64 {
        let months = self.months();
        (self.price() * 2 + months) / (months * 2)
    }

    pub fn info(self) -> PlanInfo {
        PlanInfo {
            plan: self,
            name: self.display_name().to_string(),
            price: self.price(),
            duration_days: self.duration_days(),
            months: self.months(),
            popular: self.popular(),
        }
    }
}

impl TryFrom<&str> for Plan {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "monthly" => Ok(Self::Monthly),
            "quarterly" => Ok(Self::Quarterly),
            "semesterly" => Ok(Self::Semesterly),
            "yearly" => Ok(Self::Yearly),
            other => Err(EngineError::InvalidPlan(format!(
                "{other} (available: {})",
                Plan::ALL
                    .iter()
                    .map(|p| p.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ))),
        }
    }
}

/// Static description of a purchasable plan.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanInfo {
    pub plan: Plan,
    pub name: String,
    pub price: i64,
    pub duration_days: i64,
    pub months: i64,
    pub popular: bool,
}

/// Marketing comparison of a multi-month plan with the monthly one.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanSavings {
    pub plan: Plan,
    pub price: i64,
    pub monthly_equivalent: i64,
    pub savings: i64,
    pub savings_percent: i64,
}

/// Return the full catalog, cheapest first.
pub fn plans() -> Vec<PlanInfo> {
    Plan::ALL.iter().map(|plan| plan.info()).collect()
}

/// Return the savings of every plan longer than a month.
pub fn savings() -> Vec<PlanSavings> {
    Plan::ALL
        .iter()
        .filter(|plan| plan.months() > 1)
        .map(|&plan| PlanSavings {
            plan,
            price: plan.price(),
            monthly_equivalent: plan.monthly_equivalent(),
            savings: plan.savings(),
            savings_percent: plan.savings_percent(),
        })
        .collect()
}

/// Parse a plan identifier coming from outside the engine.
pub fn parse_plan(value: &str) -> ResultEngine<Plan> {
    Plan::try_from(value.trim())
}
