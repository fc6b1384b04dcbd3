use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::db::CheckoutRepository;
use crate::models::{AppliedCoupon, CartItem, Checkout, CustomerInfo, PendingPayment};
use crate::utils::error::AppError;

#[derive(FromRow)]
struct CheckoutRow {
    id: Uuid,
    buyer_id: Uuid,
    event_id: Uuid,
    cart: Json<Vec<CartItem>>,
    customer: Json<CustomerInfo>,
    applied_coupon: Option<String>,
    discount_amount: Option<Decimal>,
    final_amount: Option<Decimal>,
    gateway_order_id: Option<String>,
    payment_amount: Option<Decimal>,
    payment_currency: Option<String>,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl From<CheckoutRow> for Checkout {
    fn from(row: CheckoutRow) -> Self {
        Checkout {
            id: row.id,
            buyer_id: row.buyer_id,
            event_id: row.event_id,
            cart: row.cart.0,
            customer: row.customer.0,
            applied_coupon: row.applied_coupon,
            discount_amount: row.discount_amount,
            final_amount: row.final_amount,
            gateway_order_id: row.gateway_order_id,
            payment_amount: row.payment_amount,
            payment_currency: row.payment_currency,
            created_at: row.created_at,
            expires_at: row.expires_at,
        }
    }
}

pub struct PgCheckoutRepository {
    pool: PgPool,
}

impl PgCheckoutRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CheckoutRepository for PgCheckoutRepository {
    async fn insert(&self, checkout: &Checkout) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO checkouts (id, buyer_id, event_id, cart, customer, applied_coupon,
                                    discount_amount, final_amount, gateway_order_id, payment_amount,
                                    payment_currency, created_at, expires_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)",
        )
        .bind(checkout.id)
        .bind(checkout.buyer_id)
        .bind(checkout.event_id)
        .bind(Json(&checkout.cart))
        .bind(Json(&checkout.customer))
        .bind(&checkout.applied_coupon)
        .bind(checkout.discount_amount)
        .bind(checkout.final_amount)
        .bind(&checkout.gateway_order_id)
        .bind(checkout.payment_amount)
        .bind(&checkout.payment_currency)
        .bind(checkout.created_at)
        .bind(checkout.expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find(&self, id: Uuid) -> Result<Option<Checkout>, AppError> {
        let row = sqlx::query_as::<_, CheckoutRow>(
            "SELECT id, buyer_id, event_id, cart, customer, applied_coupon, discount_amount,
                    final_amount, gateway_order_id, payment_amount, payment_currency,
                    created_at, expires_at
               FROM checkouts WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Checkout::from))
    }

    async fn apply_coupon(&self, id: Uuid, coupon: &AppliedCoupon) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE checkouts
                SET applied_coupon = $2, discount_amount = $3, final_amount = $4
              WHERE id = $1 AND gateway_order_id IS NULL",
        )
        .bind(id)
        .bind(&coupon.code)
        .bind(coupon.discount_amount)
        .bind(coupon.final_amount)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_pending_payment(
        &self,
        id: Uuid,
        payment: &PendingPayment,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE checkouts
                SET gateway_order_id = $2, payment_amount = $3, payment_currency = $4
              WHERE id = $1 AND gateway_order_id IS NULL",
        )
        .bind(id)
        .bind(&payment.gateway_order_id)
        .bind(payment.amount)
        .bind(&payment.currency)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
