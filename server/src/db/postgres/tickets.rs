use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::db::TicketRepository;
use crate::models::{Attendee, Ticket};
use crate::utils::error::AppError;

pub(super) const TICKET_COLUMNS: &str = "id, qr_code, order_id, event_id, ticket_type, price, \
     status, checked_in_time, checked_in_by, created_at";

#[derive(FromRow)]
pub(super) struct TicketRow {
    id: Uuid,
    qr_code: String,
    order_id: String,
    event_id: Uuid,
    ticket_type: String,
    price: Decimal,
    status: String,
    checked_in_time: Option<DateTime<Utc>>,
    checked_in_by: Option<Uuid>,
    created_at: DateTime<Utc>,
}

impl TryFrom<TicketRow> for Ticket {
    type Error = AppError;

    fn try_from(row: TicketRow) -> Result<Self, Self::Error> {
        Ok(Ticket {
            id: row.id,
            qr_code: row.qr_code,
            order_id: row.order_id,
            event_id: row.event_id,
            ticket_type: row.ticket_type,
            price: row.price,
            status: row.status.parse()?,
            checked_in_time: row.checked_in_time,
            checked_in_by: row.checked_in_by,
            created_at: row.created_at,
        })
    }
}

#[derive(FromRow)]
struct AttendeeRow {
    qr_code: String,
    order_id: String,
    ticket_type: String,
    status: String,
    checked_in_time: Option<DateTime<Utc>>,
    customer_name: String,
    customer_email: String,
}

pub(super) fn into_tickets(rows: Vec<TicketRow>) -> Result<Vec<Ticket>, AppError> {
    rows.into_iter().map(Ticket::try_from).collect()
}

pub struct PgTicketRepository {
    pool: PgPool,
}

impl PgTicketRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TicketRepository for PgTicketRepository {
    async fn find_by_code(&self, qr_code: &str) -> Result<Option<Ticket>, AppError> {
        sqlx::query_as::<_, TicketRow>(&format!(
            "SELECT {TICKET_COLUMNS} FROM tickets WHERE qr_code = $1"
        ))
        .bind(qr_code)
        .fetch_optional(&self.pool)
        .await?
        .map(Ticket::try_from)
        .transpose()
    }

    async fn list_by_order(&self, order_id: &str) -> Result<Vec<Ticket>, AppError> {
        let rows = sqlx::query_as::<_, TicketRow>(&format!(
            "SELECT {TICKET_COLUMNS} FROM tickets WHERE order_id = $1 ORDER BY created_at, qr_code"
        ))
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;
        into_tickets(rows)
    }

    async fn count_sold_by_type(
        &self,
        event_id: Uuid,
        ticket_type: &str,
    ) -> Result<i64, AppError> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM tickets WHERE event_id = $1 AND ticket_type = $2",
        )
        .bind(event_id)
        .bind(ticket_type)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn list_attendees(&self, event_id: Uuid) -> Result<Vec<Attendee>, AppError> {
        let rows = sqlx::query_as::<_, AttendeeRow>(
            "SELECT t.qr_code, t.order_id, t.ticket_type, t.status, t.checked_in_time,
                    o.customer->>'name' AS customer_name,
                    o.customer->>'email' AS customer_email
               FROM tickets t
               JOIN orders o ON o.order_id = t.order_id
              WHERE t.event_id = $1
              ORDER BY t.created_at, t.qr_code",
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(Attendee {
                    qr_code: row.qr_code,
                    order_id: row.order_id,
                    ticket_type: row.ticket_type,
                    status: row.status.parse()?,
                    checked_in_time: row.checked_in_time,
                    customer_name: row.customer_name,
                    customer_email: row.customer_email,
                })
            })
            .collect()
    }

    async fn check_in_by_code(
        &self,
        qr_code: &str,
        operator_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<Option<Ticket>, AppError> {
        // The IS NULL guard makes the read-and-flip a single atomic statement.
        sqlx::query_as::<_, TicketRow>(&format!(
            "UPDATE tickets
                SET status = 'used', checked_in_time = $2, checked_in_by = $3
              WHERE qr_code = $1 AND checked_in_time IS NULL
              RETURNING {TICKET_COLUMNS}"
        ))
        .bind(qr_code)
        .bind(at)
        .bind(operator_id)
        .fetch_optional(&self.pool)
        .await?
        .map(Ticket::try_from)
        .transpose()
    }

    async fn check_in_by_order(
        &self,
        order_id: &str,
        operator_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<Vec<Ticket>, AppError> {
        let rows = sqlx::query_as::<_, TicketRow>(&format!(
            "UPDATE tickets
                SET status = 'used', checked_in_time = $2, checked_in_by = $3
              WHERE order_id = $1 AND checked_in_time IS NULL
              RETURNING {TICKET_COLUMNS}"
        ))
        .bind(order_id)
        .bind(at)
        .bind(operator_id)
        .fetch_all(&self.pool)
        .await?;
        into_tickets(rows)
    }
}
