//! One repository trait per collection. Handlers only see the traits; `main`
//! wires the Postgres implementations and the tests wire [`MemoryStore`].

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use crate::models::{
    AppliedCoupon, Attendee, Checkout, Event, Order, PaymentConfig, PendingPayment, Ticket, User,
    Venue,
};
use crate::services::dashboard::Period;
use crate::services::materializer::{MaterializedOrder, OrderDraft};
use crate::utils::error::AppError;

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find(&self, id: Uuid) -> Result<Option<User>, AppError>;
    async fn upsert(&self, user: &User) -> Result<User, AppError>;
}

#[async_trait]
pub trait VenueRepository: Send + Sync {
    async fn insert(&self, venue: &Venue) -> Result<(), AppError>;
    async fn find(&self, id: Uuid) -> Result<Option<Venue>, AppError>;
    async fn list_by_organizer(&self, organizer_id: Uuid) -> Result<Vec<Venue>, AppError>;
    /// Returns `false` when no venue with that id is owned by `venue.organizer_id`.
    async fn update(&self, venue: &Venue) -> Result<bool, AppError>;
    async fn delete(&self, id: Uuid, organizer_id: Uuid) -> Result<bool, AppError>;
}

#[async_trait]
pub trait EventRepository: Send + Sync {
    async fn insert(&self, event: &Event) -> Result<(), AppError>;
    async fn find(&self, id: Uuid) -> Result<Option<Event>, AppError>;
    async fn list_by_organizer(&self, organizer_id: Uuid) -> Result<Vec<Event>, AppError>;
    /// Writes the editable fields; counters are only moved by order materialization.
    async fn update(&self, event: &Event) -> Result<bool, AppError>;
    async fn delete(&self, id: Uuid, organizer_id: Uuid) -> Result<bool, AppError>;
}

#[async_trait]
pub trait CheckoutRepository: Send + Sync {
    async fn insert(&self, checkout: &Checkout) -> Result<(), AppError>;
    async fn find(&self, id: Uuid) -> Result<Option<Checkout>, AppError>;
    /// Returns `false` once a gateway order has been opened for the checkout.
    async fn apply_coupon(&self, id: Uuid, coupon: &AppliedCoupon) -> Result<bool, AppError>;
    /// Records the gateway order only if the checkout has none yet.
    async fn set_pending_payment(&self, id: Uuid, payment: &PendingPayment)
        -> Result<bool, AppError>;
}

#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Atomically stores the order, its tickets and the event counter increments.
    /// Idempotent per checkout id.
    async fn materialize(&self, draft: OrderDraft) -> Result<MaterializedOrder, AppError>;
    async fn find_by_order_id(&self, order_id: &str) -> Result<Option<Order>, AppError>;
    async fn find_by_checkout(&self, checkout_id: Uuid) -> Result<Option<Order>, AppError>;
    async fn list_by_event(&self, event_id: Uuid) -> Result<Vec<Order>, AppError>;
}

#[async_trait]
pub trait TicketRepository: Send + Sync {
    async fn find_by_code(&self, qr_code: &str) -> Result<Option<Ticket>, AppError>;
    async fn list_by_order(&self, order_id: &str) -> Result<Vec<Ticket>, AppError>;
    async fn count_sold_by_type(&self, event_id: Uuid, ticket_type: &str)
        -> Result<i64, AppError>;
    async fn list_attendees(&self, event_id: Uuid) -> Result<Vec<Attendee>, AppError>;
    /// Marks the ticket used only if it has no check-in yet; `None` otherwise.
    async fn check_in_by_code(
        &self,
        qr_code: &str,
        operator_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<Option<Ticket>, AppError>;
    /// Marks every unused ticket of the order; returns only the tickets it flipped.
    async fn check_in_by_order(
        &self,
        order_id: &str,
        operator_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<Vec<Ticket>, AppError>;
}

#[async_trait]
pub trait PaymentConfigRepository: Send + Sync {
    async fn find(&self, organizer_id: Uuid) -> Result<Option<PaymentConfig>, AppError>;
    async fn upsert(&self, config: &PaymentConfig) -> Result<(), AppError>;
    async fn delete(&self, organizer_id: Uuid) -> Result<bool, AppError>;
}

/// Read-side aggregates for the organizer dashboard. Revenue only counts
/// orders whose payment completed.
#[async_trait]
pub trait DashboardRepository: Send + Sync {
    async fn revenue_between(&self, organizer_id: Uuid, period: Period)
        -> Result<Decimal, AppError>;
    async fn tickets_sold_between(&self, organizer_id: Uuid, period: Period)
        -> Result<i64, AppError>;
    async fn events_created_between(&self, organizer_id: Uuid, period: Period)
        -> Result<i64, AppError>;
    /// Revenue per calendar month (keyed by the month's first day) within `period`.
    async fn monthly_revenue(
        &self,
        organizer_id: Uuid,
        period: Period,
    ) -> Result<Vec<(NaiveDate, Decimal)>, AppError>;
}

#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub venues: Arc<dyn VenueRepository>,
    pub events: Arc<dyn EventRepository>,
    pub checkouts: Arc<dyn CheckoutRepository>,
    pub orders: Arc<dyn OrderRepository>,
    pub tickets: Arc<dyn TicketRepository>,
    pub payment_configs: Arc<dyn PaymentConfigRepository>,
    pub dashboard: Arc<dyn DashboardRepository>,
}

impl Repositories {
    pub fn postgres(pool: PgPool) -> Self {
        use postgres::*;

        Self {
            users: Arc::new(PgUserRepository::new(pool.clone())),
            venues: Arc::new(PgVenueRepository::new(pool.clone())),
            events: Arc::new(PgEventRepository::new(pool.clone())),
            checkouts: Arc::new(PgCheckoutRepository::new(pool.clone())),
            orders: Arc::new(PgOrderRepository::new(pool.clone())),
            tickets: Arc::new(PgTicketRepository::new(pool.clone())),
            payment_configs: Arc::new(PgPaymentConfigRepository::new(pool.clone())),
            dashboard: Arc::new(PgDashboardRepository::new(pool)),
        }
    }

    pub fn in_memory() -> Self {
        Self::from_store(Arc::new(MemoryStore::default()))
    }

    pub fn from_store(store: Arc<MemoryStore>) -> Self {
        Self {
            users: store.clone(),
            venues: store.clone(),
            events: store.clone(),
            checkouts: store.clone(),
            orders: store.clone(),
            tickets: store.clone(),
            payment_configs: store.clone(),
            dashboard: store,
        }
    }
}
