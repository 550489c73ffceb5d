//! Statistics API endpoints.
//!
//! Days and months are cut at local midnight in the configured timezone.

use api_types::stats::{CreditSummary, DayQuery, MonthQuery, Overview, PeriodSummary};
use axum::{
    Extension, Json,
    extract::{Query, State},
};
use chrono::{DateTime, Datelike, Days, Months, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use engine::Merchant;

use crate::{ServerError, server::ServerState, views};

fn local_midnight(tz: Tz, date: NaiveDate) -> Result<DateTime<Utc>, ServerError> {
    tz.from_local_datetime(&date.and_time(NaiveTime::MIN))
        .earliest()
        .map(|at| at.with_timezone(&Utc))
        .ok_or_else(|| ServerError::Generic(format!("no local midnight on {date}")))
}

fn day_bounds(tz: Tz, date: NaiveDate) -> Result<(DateTime<Utc>, DateTime<Utc>), ServerError> {
    let next = date
        .checked_add_days(Days::new(1))
        .ok_or_else(|| ServerError::Generic("date out of range".to_string()))?;
    Ok((local_midnight(tz, date)?, local_midnight(tz, next)?))
}

fn today(tz: Tz) -> NaiveDate {
    Utc::now().with_timezone(&tz).date_naive()
}

pub async fn day(
    Extension(merchant): Extension<Merchant>,
    State(state): State<ServerState>,
    Query(query): Query<DayQuery>,
) -> Result<Json<PeriodSummary>, ServerError> {
    let tz = state.config.timezone;
    let date = query.date.unwrap_or_else(|| today(tz));
    let (from, to) = day_bounds(tz, date)?;
    let summary = state.engine.period_summary(merchant.id, from, to).await?;

    Ok(Json(views::period_view(summary, from, to)))
}

pub async fn month(
    Extension(merchant): Extension<Merchant>,
    State(state): State<ServerState>,
    Query(query): Query<MonthQuery>,
) -> Result<Json<PeriodSummary>, ServerError> {
    let tz = state.config.timezone;
    let now = today(tz);
    let year = query.year.unwrap_or(now.year());
    let month = query.month.unwrap_or(now.month());
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| ServerError::Generic(format!("invalid month {year}-{month}")))?;
    let next = first
        .checked_add_months(Months::new(1))
        .ok_or_else(|| ServerError::Generic("date out of range".to_string()))?;

    let from = local_midnight(tz, first)?;
    let to = local_midnight(tz, next)?;
    let summary = state.engine.period_summary(merchant.id, from, to).await?;

    Ok(Json(views::period_view(summary, from, to)))
}

pub async fn credits(
    Extension(merchant): Extension<Merchant>,
    State(state): State<ServerState>,
) -> Result<Json<CreditSummary>, ServerError> {
    let summary = state.engine.credit_summary(merchant.id).await?;
    Ok(Json(views::credit_view(summary)))
}

pub async fn overview(
    Extension(merchant): Extension<Merchant>,
    State(state): State<ServerState>,
) -> Result<Json<Overview>, ServerError> {
    let tz = state.config.timezone;
    let (from, to) = day_bounds(tz, today(tz))?;
    let overview = state.engine.overview(merchant.id, from, to).await?;
    Ok(Json(views::overview_view(overview)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_bounds_follow_the_timezone() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let (from, to) = day_bounds(chrono_tz::Europe::Paris, date).unwrap();
        assert_eq!(from, Utc.with_ymd_and_hms(2026, 3, 1, 23, 0, 0).unwrap());
        assert_eq!(to, Utc.with_ymd_and_hms(2026, 3, 2, 23, 0, 0).unwrap());

        let (from, _) = day_bounds(chrono_tz::Africa::Abidjan, date).unwrap();
        assert_eq!(from, Utc.with_ymd_and_hms(2026, 3, 2, 0, 0, 0).unwrap());
    }

    #[test]
    fn dst_day_is_shorter() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 29).unwrap();
        let (from, to) = day_bounds(chrono_tz::Europe::Paris, date).unwrap();
        assert_eq!((to - from).num_hours(), 23);
    }
}
