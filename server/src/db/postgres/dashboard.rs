use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::DashboardRepository;
use crate::services::dashboard::Period;
use crate::utils::error::AppError;

pub struct PgDashboardRepository {
    pool: PgPool,
}

impl PgDashboardRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DashboardRepository for PgDashboardRepository {
    async fn revenue_between(
        &self,
        organizer_id: Uuid,
        period: Period,
    ) -> Result<Decimal, AppError> {
        let (revenue,): (Decimal,) = sqlx::query_as(
            "SELECT COALESCE(SUM(total_amount), 0)
               FROM orders
              WHERE organizer_id = $1
                AND payment_status = 'completed'
                AND created_at >= $2 AND created_at < $3",
        )
        .bind(organizer_id)
        .bind(period.start)
        .bind(period.end)
        .fetch_one(&self.pool)
        .await?;
        Ok(revenue)
    }

    async fn tickets_sold_between(
        &self,
        organizer_id: Uuid,
        period: Period,
    ) -> Result<i64, AppError> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(t.id)
               FROM tickets t
               JOIN orders o ON o.order_id = t.order_id
              WHERE o.organizer_id = $1
                AND o.payment_status = 'completed'
                AND o.created_at >= $2 AND o.created_at < $3",
        )
        .bind(organizer_id)
        .bind(period.start)
        .bind(period.end)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn events_created_between(
        &self,
        organizer_id: Uuid,
        period: Period,
    ) -> Result<i64, AppError> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*)
               FROM events
              WHERE organizer_id = $1
                AND created_at >= $2 AND created_at < $3",
        )
        .bind(organizer_id)
        .bind(period.start)
        .bind(period.end)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn monthly_revenue(
        &self,
        organizer_id: Uuid,
        period: Period,
    ) -> Result<Vec<(NaiveDate, Decimal)>, AppError> {
        let rows: Vec<(NaiveDate, Decimal)> = sqlx::query_as(
            "SELECT (date_trunc('month', created_at AT TIME ZONE 'UTC'))::date AS month,
                    SUM(total_amount) AS revenue
               FROM orders
              WHERE organizer_id = $1
                AND payment_status = 'completed'
                AND created_at >= $2 AND created_at < $3
              GROUP BY month
              ORDER BY month",
        )
        .bind(organizer_id)
        .bind(period.start)
        .bind(period.end)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
