use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::tickets::{into_tickets, TicketRow, TICKET_COLUMNS};
use crate::db::OrderRepository;
use crate::models::{CartItem, CustomerInfo, EventSnapshot, Order};
use crate::services::materializer::{MaterializedOrder, OrderDraft};
use crate::utils::error::AppError;

const ORDER_COLUMNS: &str = "id, order_id, checkout_id, event_id, organizer_id, buyer_id, \
     customer, items, subtotal, platform_fee, payment_gateway_fee, discount_amount, total_amount, \
     payout_amount, applied_coupon, currency, gateway_order_id, gateway_payment_id, \
     payment_status, order_status, payout_status, event_snapshot, created_at";

#[derive(FromRow)]
struct OrderRow {
    id: Uuid,
    order_id: String,
    checkout_id: Uuid,
    event_id: Uuid,
    organizer_id: Uuid,
    buyer_id: Uuid,
    customer: Json<CustomerInfo>,
    items: Json<Vec<CartItem>>,
    subtotal: Decimal,
    platform_fee: Decimal,
    payment_gateway_fee: Decimal,
    discount_amount: Decimal,
    total_amount: Decimal,
    payout_amount: Decimal,
    applied_coupon: Option<String>,
    currency: String,
    gateway_order_id: String,
    gateway_payment_id: String,
    payment_status: String,
    order_status: String,
    payout_status: String,
    event_snapshot: Json<EventSnapshot>,
    created_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = AppError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        Ok(Order {
            id: row.id,
            order_id: row.order_id,
            checkout_id: row.checkout_id,
            event_id: row.event_id,
            organizer_id: row.organizer_id,
            buyer_id: row.buyer_id,
            customer: row.customer.0,
            items: row.items.0,
            subtotal: row.subtotal,
            platform_fee: row.platform_fee,
            payment_gateway_fee: row.payment_gateway_fee,
            discount_amount: row.discount_amount,
            total_amount: row.total_amount,
            payout_amount: row.payout_amount,
            applied_coupon: row.applied_coupon,
            currency: row.currency,
            gateway_order_id: row.gateway_order_id,
            gateway_payment_id: row.gateway_payment_id,
            payment_status: row.payment_status.parse()?,
            order_status: row.order_status.parse()?,
            payout_status: row.payout_status.parse()?,
            event_snapshot: row.event_snapshot.0,
            created_at: row.created_at,
        })
    }
}

pub struct PgOrderRepository {
    pool: PgPool,
}

impl PgOrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn existing_for_checkout(
        &self,
        checkout_id: Uuid,
    ) -> Result<Option<MaterializedOrder>, AppError> {
        let Some(row) = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE checkout_id = $1"
        ))
        .bind(checkout_id)
        .fetch_optional(&self.pool)
        .await?
        else {
            return Ok(None);
        };

        let order = Order::try_from(row)?;
        let tickets = sqlx::query_as::<_, TicketRow>(&format!(
            "SELECT {TICKET_COLUMNS} FROM tickets WHERE order_id = $1 ORDER BY created_at, qr_code"
        ))
        .bind(&order.order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(MaterializedOrder {
            order,
            tickets: into_tickets(tickets)?,
            created: false,
        }))
    }
}

#[async_trait]
impl OrderRepository for PgOrderRepository {
    async fn materialize(&self, draft: OrderDraft) -> Result<MaterializedOrder, AppError> {
        let OrderDraft { order, tickets } = draft;
        let mut tx = self.pool.begin().await?;

        // checkout_id is UNIQUE: a concurrent or repeated confirmation inserts nothing.
        let inserted = sqlx::query(
            "INSERT INTO orders (id, order_id, checkout_id, event_id, organizer_id, buyer_id,
                                 customer, items, subtotal, platform_fee, payment_gateway_fee,
                                 discount_amount, total_amount, payout_amount, applied_coupon,
                                 currency, gateway_order_id, gateway_payment_id, payment_status,
                                 order_status, payout_status, event_snapshot, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16,
                     $17, $18, $19, $20, $21, $22, $23)
             ON CONFLICT (checkout_id) DO NOTHING",
        )
        .bind(order.id)
        .bind(&order.order_id)
        .bind(order.checkout_id)
        .bind(order.event_id)
        .bind(order.organizer_id)
        .bind(order.buyer_id)
        .bind(Json(&order.customer))
        .bind(Json(&order.items))
        .bind(order.subtotal)
        .bind(order.platform_fee)
        .bind(order.payment_gateway_fee)
        .bind(order.discount_amount)
        .bind(order.total_amount)
        .bind(order.payout_amount)
        .bind(&order.applied_coupon)
        .bind(&order.currency)
        .bind(&order.gateway_order_id)
        .bind(&order.gateway_payment_id)
        .bind(order.payment_status.as_str())
        .bind(order.order_status.as_str())
        .bind(order.payout_status.as_str())
        .bind(Json(&order.event_snapshot))
        .bind(order.created_at)
        .execute(&mut *tx)
        .await?;

        if inserted.rows_affected() == 0 {
            tx.rollback().await?;
            return self
                .existing_for_checkout(order.checkout_id)
                .await?
                .ok_or_else(|| {
                    AppError::InternalServerError(format!(
                        "order for checkout {} vanished during materialization",
                        order.checkout_id
                    ))
                });
        }

        for ticket in &tickets {
            sqlx::query(
                "INSERT INTO tickets (id, qr_code, order_id, event_id, ticket_type, price, status,
                                      checked_in_time, checked_in_by, created_at)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
            )
            .bind(ticket.id)
            .bind(&ticket.qr_code)
            .bind(&ticket.order_id)
            .bind(ticket.event_id)
            .bind(&ticket.ticket_type)
            .bind(ticket.price)
            .bind(ticket.status.as_str())
            .bind(ticket.checked_in_time)
            .bind(ticket.checked_in_by)
            .bind(ticket.created_at)
            .execute(&mut *tx)
            .await?;
        }

        let updated = sqlx::query(
            "UPDATE events
                SET tickets_sold = tickets_sold + $2, revenue = revenue + $3
              WHERE id = $1",
        )
        .bind(order.event_id)
        .bind(tickets.len() as i64)
        .bind(order.total_amount)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(AppError::NotFound("Event not found".to_string()));
        }

        tx.commit().await?;

        Ok(MaterializedOrder {
            order,
            tickets,
            created: true,
        })
    }

    async fn find_by_order_id(&self, order_id: &str) -> Result<Option<Order>, AppError> {
        sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE order_id = $1"
        ))
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await?
        .map(Order::try_from)
        .transpose()
    }

    async fn find_by_checkout(&self, checkout_id: Uuid) -> Result<Option<Order>, AppError> {
        sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE checkout_id = $1"
        ))
        .bind(checkout_id)
        .fetch_optional(&self.pool)
        .await?
        .map(Order::try_from)
        .transpose()
    }

    async fn list_by_event(&self, event_id: Uuid) -> Result<Vec<Order>, AppError> {
        sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE event_id = $1 ORDER BY created_at DESC"
        ))
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(Order::try_from)
        .collect()
    }
}
