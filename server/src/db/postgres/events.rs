use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::db::EventRepository;
use crate::models::{Event, EventTiming, PromoCode, TicketVariant};
use crate::utils::error::AppError;

const EVENT_COLUMNS: &str = "id, organizer_id, venue_id, name, description, status, timings, \
     ticket_variants, promo_codes, platform_fee_payer, gateway_fee_payer, tickets_sold, revenue, \
     created_at, updated_at";

#[derive(FromRow)]
struct EventRow {
    id: Uuid,
    organizer_id: Uuid,
    venue_id: Option<Uuid>,
    name: String,
    description: Option<String>,
    status: String,
    timings: Json<Vec<EventTiming>>,
    ticket_variants: Json<Vec<TicketVariant>>,
    promo_codes: Json<Vec<PromoCode>>,
    platform_fee_payer: String,
    gateway_fee_payer: String,
    tickets_sold: i64,
    revenue: Decimal,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<EventRow> for Event {
    type Error = AppError;

    fn try_from(row: EventRow) -> Result<Self, Self::Error> {
        Ok(Event {
            id: row.id,
            organizer_id: row.organizer_id,
            venue_id: row.venue_id,
            name: row.name,
            description: row.description,
            status: row.status.parse()?,
            timings: row.timings.0,
            ticket_variants: row.ticket_variants.0,
            promo_codes: row.promo_codes.0,
            platform_fee: row.platform_fee_payer.parse()?,
            payment_gateway_fee: row.gateway_fee_payer.parse()?,
            tickets_sold: row.tickets_sold,
            revenue: row.revenue,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

pub struct PgEventRepository {
    pool: PgPool,
}

impl PgEventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventRepository for PgEventRepository {
    async fn insert(&self, event: &Event) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO events (id, organizer_id, venue_id, name, description, status, timings,
                                 ticket_variants, promo_codes, platform_fee_payer, gateway_fee_payer,
                                 tickets_sold, revenue, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)",
        )
        .bind(event.id)
        .bind(event.organizer_id)
        .bind(event.venue_id)
        .bind(&event.name)
        .bind(&event.description)
        .bind(event.status.as_str())
        .bind(Json(&event.timings))
        .bind(Json(&event.ticket_variants))
        .bind(Json(&event.promo_codes))
        .bind(event.platform_fee.as_str())
        .bind(event.payment_gateway_fee.as_str())
        .bind(event.tickets_sold)
        .bind(event.revenue)
        .bind(event.created_at)
        .bind(event.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find(&self, id: Uuid) -> Result<Option<Event>, AppError> {
        sqlx::query_as::<_, EventRow>(&format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Event::try_from)
            .transpose()
    }

    async fn list_by_organizer(&self, organizer_id: Uuid) -> Result<Vec<Event>, AppError> {
        sqlx::query_as::<_, EventRow>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE organizer_id = $1 ORDER BY created_at DESC"
        ))
        .bind(organizer_id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(Event::try_from)
        .collect()
    }

    async fn update(&self, event: &Event) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE events
                SET venue_id = $3, name = $4, description = $5, status = $6, timings = $7,
                    ticket_variants = $8, promo_codes = $9, platform_fee_payer = $10,
                    gateway_fee_payer = $11, updated_at = $12
              WHERE id = $1 AND organizer_id = $2",
        )
        .bind(event.id)
        .bind(event.organizer_id)
        .bind(event.venue_id)
        .bind(&event.name)
        .bind(&event.description)
        .bind(event.status.as_str())
        .bind(Json(&event.timings))
        .bind(Json(&event.ticket_variants))
        .bind(Json(&event.promo_codes))
        .bind(event.platform_fee.as_str())
        .bind(event.payment_gateway_fee.as_str())
        .bind(event.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: Uuid, organizer_id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1 AND organizer_id = $2")
            .bind(id)
            .bind(organizer_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
