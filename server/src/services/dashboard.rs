use chrono::{DateTime, Datelike, Months, NaiveDate, NaiveTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::db::DashboardRepository;
use crate::services::pricing::round_money;
use crate::utils::error::AppError;

const TRAILING_MONTHS: u32 = 12;

/// Half-open time range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Period {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Period {
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at < self.end
    }
}

/// Date buckets the dashboard compares, computed in UTC.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardWindows {
    pub today: Period,
    pub yesterday: Period,
    pub this_month: Period,
    pub last_month: Period,
    /// First day of each trailing month, oldest first, ending with the current month.
    pub months: Vec<NaiveDate>,
}

fn start_of(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

fn out_of_range() -> AppError {
    AppError::InternalServerError("dashboard date range out of range".to_string())
}

impl DashboardWindows {
    pub fn at(now: DateTime<Utc>) -> Result<Self, AppError> {
        let today = now.date_naive();
        let yesterday = today.pred_opt().ok_or_else(out_of_range)?;
        let tomorrow = today.succ_opt().ok_or_else(out_of_range)?;

        let month_start = today.with_day(1).ok_or_else(out_of_range)?;
        let next_month = month_start
            .checked_add_months(Months::new(1))
            .ok_or_else(out_of_range)?;
        let last_month = month_start
            .checked_sub_months(Months::new(1))
            .ok_or_else(out_of_range)?;

        let months = (0..TRAILING_MONTHS)
            .rev()
            .map(|back| month_start.checked_sub_months(Months::new(back)))
            .collect::<Option<Vec<_>>>()
            .ok_or_else(out_of_range)?;

        Ok(Self {
            today: Period {
                start: start_of(today),
                end: start_of(tomorrow),
            },
            yesterday: Period {
                start: start_of(yesterday),
                end: start_of(today),
            },
            this_month: Period {
                start: start_of(month_start),
                end: start_of(next_month),
            },
            last_month: Period {
                start: start_of(last_month),
                end: start_of(month_start),
            },
            months,
        })
    }

    pub fn trailing_year(&self) -> Period {
        Period {
            start: self.months.first().map_or(self.this_month.start, |m| start_of(*m)),
            end: self.this_month.end,
        }
    }
}

/// `(current - previous) / previous * 100`, and `0` whenever `previous` is zero,
/// so "no prior data" reads the same as "no change".
pub fn percentage_change(current: Decimal, previous: Decimal) -> Decimal {
    if previous.is_zero() {
        return Decimal::ZERO;
    }
    round_money((current - previous) / previous * Decimal::ONE_HUNDRED)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Metric<T> {
    pub current: T,
    pub previous: T,
    pub percentage_change: Decimal,
}

impl Metric<Decimal> {
    fn amounts(current: Decimal, previous: Decimal) -> Self {
        Self {
            current,
            previous,
            percentage_change: percentage_change(current, previous),
        }
    }
}

impl Metric<i64> {
    fn counts(current: i64, previous: i64) -> Self {
        Self {
            current,
            previous,
            percentage_change: percentage_change(Decimal::from(current), Decimal::from(previous)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyRevenue {
    /// `YYYY-MM`
    pub month: String,
    pub revenue: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub revenue_today: Metric<Decimal>,
    pub revenue_this_month: Metric<Decimal>,
    pub tickets_this_month: Metric<i64>,
    pub events_this_month: Metric<i64>,
    pub monthly_revenue: Vec<MonthlyRevenue>,
}

/// Lays the stored month totals over the trailing months, zero-filling gaps.
pub fn revenue_series(months: &[NaiveDate], totals: &[(NaiveDate, Decimal)]) -> Vec<MonthlyRevenue> {
    months
        .iter()
        .map(|month| MonthlyRevenue {
            month: month.format("%Y-%m").to_string(),
            revenue: totals
                .iter()
                .filter(|(bucket, _)| bucket.year() == month.year() && bucket.month() == month.month())
                .map(|(_, amount)| *amount)
                .sum(),
        })
        .collect()
}

pub async fn organizer_dashboard(
    repo: &dyn DashboardRepository,
    organizer_id: Uuid,
    now: DateTime<Utc>,
) -> Result<DashboardStats, AppError> {
    let windows = DashboardWindows::at(now)?;

    let revenue_today = repo.revenue_between(organizer_id, windows.today).await?;
    let revenue_yesterday = repo.revenue_between(organizer_id, windows.yesterday).await?;
    let revenue_this_month = repo.revenue_between(organizer_id, windows.this_month).await?;
    let revenue_last_month = repo.revenue_between(organizer_id, windows.last_month).await?;
    let tickets_this_month = repo
        .tickets_sold_between(organizer_id, windows.this_month)
        .await?;
    let tickets_last_month = repo
        .tickets_sold_between(organizer_id, windows.last_month)
        .await?;
    let events_this_month = repo
        .events_created_between(organizer_id, windows.this_month)
        .await?;
    let events_last_month = repo
        .events_created_between(organizer_id, windows.last_month)
        .await?;
    let monthly = repo
        .monthly_revenue(organizer_id, windows.trailing_year())
        .await?;

    Ok(DashboardStats {
        revenue_today: Metric::amounts(revenue_today, revenue_yesterday),
        revenue_this_month: Metric::amounts(revenue_this_month, revenue_last_month),
        tickets_this_month: Metric::counts(tickets_this_month, tickets_last_month),
        events_this_month: Metric::counts(events_this_month, events_last_month),
        monthly_revenue: revenue_series(&windows.months, &monthly),
    })
}
