use async_trait::async_trait;
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{
    CheckoutRepository, DashboardRepository, EventRepository, OrderRepository,
    PaymentConfigRepository, TicketRepository, UserRepository, VenueRepository,
};
use crate::models::{
    AppliedCoupon, Attendee, Checkout, Event, Order, PaymentConfig, PaymentStatus, PendingPayment,
    Ticket, TicketStatus, User, Venue,
};
use crate::services::dashboard::Period;
use crate::services::materializer::{MaterializedOrder, OrderDraft};
use crate::utils::error::AppError;

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    venues: HashMap<Uuid, Venue>,
    events: HashMap<Uuid, Event>,
    checkouts: HashMap<Uuid, Checkout>,
    orders: Vec<Order>,
    tickets: Vec<Ticket>,
    payment_configs: HashMap<Uuid, PaymentConfig>,
}

impl Tables {
    fn completed_orders(&self, organizer_id: Uuid) -> impl Iterator<Item = &Order> {
        self.orders.iter().filter(move |o| {
            o.organizer_id == organizer_id && o.payment_status == PaymentStatus::Completed
        })
    }
}

/// Process-local store behind every repository trait. A single lock makes each
/// call atomic, which matches the guarantees of the Postgres implementation.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

fn sorted_newest_first<T: Clone>(items: Vec<&T>, created_at: impl Fn(&T) -> DateTime<Utc>) -> Vec<T> {
    let mut items: Vec<T> = items.into_iter().cloned().collect();
    items.sort_by_key(|item| std::cmp::Reverse(created_at(item)));
    items
}

fn mark_used(ticket: &mut Ticket, operator_id: Uuid, at: DateTime<Utc>) -> Ticket {
    ticket.status = TicketStatus::Used;
    ticket.checked_in_time = Some(at);
    ticket.checked_in_by = Some(operator_id);
    ticket.clone()
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.tables.lock().await.users.get(&id).cloned())
    }

    async fn upsert(&self, user: &User) -> Result<User, AppError> {
        let mut tables = self.tables.lock().await;
        let stored = match tables.users.get(&user.id) {
            Some(existing) => User {
                created_at: existing.created_at,
                ..user.clone()
            },
            None => user.clone(),
        };
        tables.users.insert(user.id, stored.clone());
        Ok(stored)
    }
}

#[async_trait]
impl VenueRepository for MemoryStore {
    async fn insert(&self, venue: &Venue) -> Result<(), AppError> {
        self.tables.lock().await.venues.insert(venue.id, venue.clone());
        Ok(())
    }

    async fn find(&self, id: Uuid) -> Result<Option<Venue>, AppError> {
        Ok(self.tables.lock().await.venues.get(&id).cloned())
    }

    async fn list_by_organizer(&self, organizer_id: Uuid) -> Result<Vec<Venue>, AppError> {
        let tables = self.tables.lock().await;
        let venues = tables
            .venues
            .values()
            .filter(|v| v.organizer_id == organizer_id)
            .collect();
        Ok(sorted_newest_first(venues, |v| v.created_at))
    }

    async fn update(&self, venue: &Venue) -> Result<bool, AppError> {
        let mut tables = self.tables.lock().await;
        match tables.venues.get_mut(&venue.id) {
            Some(stored) if stored.organizer_id == venue.organizer_id => {
                *stored = venue.clone();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete(&self, id: Uuid, organizer_id: Uuid) -> Result<bool, AppError> {
        let mut tables = self.tables.lock().await;
        let owned = tables
            .venues
            .get(&id)
            .is_some_and(|v| v.organizer_id == organizer_id);
        if owned {
            tables.venues.remove(&id);
            for event in tables.events.values_mut().filter(|e| e.venue_id == Some(id)) {
                event.venue_id = None;
            }
        }
        Ok(owned)
    }
}

#[async_trait]
impl EventRepository for MemoryStore {
    async fn insert(&self, event: &Event) -> Result<(), AppError> {
        self.tables.lock().await.events.insert(event.id, event.clone());
        Ok(())
    }

    async fn find(&self, id: Uuid) -> Result<Option<Event>, AppError> {
        Ok(self.tables.lock().await.events.get(&id).cloned())
    }

    async fn list_by_organizer(&self, organizer_id: Uuid) -> Result<Vec<Event>, AppError> {
        let tables = self.tables.lock().await;
        let events = tables
            .events
            .values()
            .filter(|e| e.organizer_id == organizer_id)
            .collect();
        Ok(sorted_newest_first(events, |e| e.created_at))
    }

    async fn update(&self, event: &Event) -> Result<bool, AppError> {
        let mut tables = self.tables.lock().await;
        match tables.events.get_mut(&event.id) {
            Some(stored) if stored.organizer_id == event.organizer_id => {
                *stored = Event {
                    tickets_sold: stored.tickets_sold,
                    revenue: stored.revenue,
                    created_at: stored.created_at,
                    ..event.clone()
                };
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete(&self, id: Uuid, organizer_id: Uuid) -> Result<bool, AppError> {
        let mut tables = self.tables.lock().await;
        let owned = tables
            .events
            .get(&id)
            .is_some_and(|e| e.organizer_id == organizer_id);
        if owned {
            tables.events.remove(&id);
        }
        Ok(owned)
    }
}

#[async_trait]
impl CheckoutRepository for MemoryStore {
    async fn insert(&self, checkout: &Checkout) -> Result<(), AppError> {
        self.tables
            .lock()
            .await
            .checkouts
            .insert(checkout.id, checkout.clone());
        Ok(())
    }

    async fn find(&self, id: Uuid) -> Result<Option<Checkout>, AppError> {
        Ok(self.tables.lock().await.checkouts.get(&id).cloned())
    }

    async fn apply_coupon(&self, id: Uuid, coupon: &AppliedCoupon) -> Result<bool, AppError> {
        let mut tables = self.tables.lock().await;
        let Some(checkout) = tables.checkouts.get_mut(&id) else {
            return Ok(false);
        };
        if checkout.gateway_order_id.is_some() {
            return Ok(false);
        }
        checkout.applied_coupon = Some(coupon.code.clone());
        checkout.discount_amount = Some(coupon.discount_amount);
        checkout.final_amount = Some(coupon.final_amount);
        Ok(true)
    }

    async fn set_pending_payment(
        &self,
        id: Uuid,
        payment: &PendingPayment,
    ) -> Result<bool, AppError> {
        let mut tables = self.tables.lock().await;
        let Some(checkout) = tables.checkouts.get_mut(&id) else {
            return Ok(false);
        };
        if checkout.gateway_order_id.is_some() {
            return Ok(false);
        }
        checkout.gateway_order_id = Some(payment.gateway_order_id.clone());
        checkout.payment_amount = Some(payment.amount);
        checkout.payment_currency = Some(payment.currency.clone());
        Ok(true)
    }
}

#[async_trait]
impl OrderRepository for MemoryStore {
    async fn materialize(&self, draft: OrderDraft) -> Result<MaterializedOrder, AppError> {
        let mut tables = self.tables.lock().await;

        if let Some(existing) = tables
            .orders
            .iter()
            .find(|o| o.checkout_id == draft.order.checkout_id)
            .cloned()
        {
            let tickets = tables
                .tickets
                .iter()
                .filter(|t| t.order_id == existing.order_id)
                .cloned()
                .collect();
            return Ok(MaterializedOrder {
                order: existing,
                tickets,
                created: false,
            });
        }

        let OrderDraft { order, tickets } = draft;
        let event = tables
            .events
            .get_mut(&order.event_id)
            .ok_or_else(|| AppError::NotFound("Event not found".to_string()))?;
        event.tickets_sold += tickets.len() as i64;
        event.revenue += order.total_amount;

        tables.orders.push(order.clone());
        tables.tickets.extend(tickets.iter().cloned());

        Ok(MaterializedOrder {
            order,
            tickets,
            created: true,
        })
    }

    async fn find_by_order_id(&self, order_id: &str) -> Result<Option<Order>, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables.orders.iter().find(|o| o.order_id == order_id).cloned())
    }

    async fn find_by_checkout(&self, checkout_id: Uuid) -> Result<Option<Order>, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .orders
            .iter()
            .find(|o| o.checkout_id == checkout_id)
            .cloned())
    }

    async fn list_by_event(&self, event_id: Uuid) -> Result<Vec<Order>, AppError> {
        let tables = self.tables.lock().await;
        let orders = tables
            .orders
            .iter()
            .filter(|o| o.event_id == event_id)
            .collect();
        Ok(sorted_newest_first(orders, |o| o.created_at))
    }
}

#[async_trait]
impl TicketRepository for MemoryStore {
    async fn find_by_code(&self, qr_code: &str) -> Result<Option<Ticket>, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables.tickets.iter().find(|t| t.qr_code == qr_code).cloned())
    }

    async fn list_by_order(&self, order_id: &str) -> Result<Vec<Ticket>, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .tickets
            .iter()
            .filter(|t| t.order_id == order_id)
            .cloned()
            .collect())
    }

    async fn count_sold_by_type(
        &self,
        event_id: Uuid,
        ticket_type: &str,
    ) -> Result<i64, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .tickets
            .iter()
            .filter(|t| t.event_id == event_id && t.ticket_type == ticket_type)
            .count() as i64)
    }

    async fn list_attendees(&self, event_id: Uuid) -> Result<Vec<Attendee>, AppError> {
        let tables = self.tables.lock().await;
        let attendees = tables
            .tickets
            .iter()
            .filter(|t| t.event_id == event_id)
            .filter_map(|t| {
                let order = tables.orders.iter().find(|o| o.order_id == t.order_id)?;
                Some(Attendee {
                    qr_code: t.qr_code.clone(),
                    order_id: t.order_id.clone(),
                    ticket_type: t.ticket_type.clone(),
                    status: t.status,
                    checked_in_time: t.checked_in_time,
                    customer_name: order.customer.name.clone(),
                    customer_email: order.customer.email.clone(),
                })
            })
            .collect();
        Ok(attendees)
    }

    async fn check_in_by_code(
        &self,
        qr_code: &str,
        operator_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<Option<Ticket>, AppError> {
        let mut tables = self.tables.lock().await;
        Ok(tables
            .tickets
            .iter_mut()
            .find(|t| t.qr_code == qr_code && t.checked_in_time.is_none())
            .map(|t| mark_used(t, operator_id, at)))
    }

    async fn check_in_by_order(
        &self,
        order_id: &str,
        operator_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<Vec<Ticket>, AppError> {
        let mut tables = self.tables.lock().await;
        Ok(tables
            .tickets
            .iter_mut()
            .filter(|t| t.order_id == order_id && t.checked_in_time.is_none())
            .map(|t| mark_used(t, operator_id, at))
            .collect())
    }
}

#[async_trait]
impl PaymentConfigRepository for MemoryStore {
    async fn find(&self, organizer_id: Uuid) -> Result<Option<PaymentConfig>, AppError> {
        Ok(self
            .tables
            .lock()
            .await
            .payment_configs
            .get(&organizer_id)
            .cloned())
    }

    async fn upsert(&self, config: &PaymentConfig) -> Result<(), AppError> {
        let mut tables = self.tables.lock().await;
        let created_at = tables
            .payment_configs
            .get(&config.organizer_id)
            .map_or(config.created_at, |existing| existing.created_at);
        tables.payment_configs.insert(
            config.organizer_id,
            PaymentConfig {
                created_at,
                ..config.clone()
            },
        );
        Ok(())
    }

    async fn delete(&self, organizer_id: Uuid) -> Result<bool, AppError> {
        Ok(self
            .tables
            .lock()
            .await
            .payment_configs
            .remove(&organizer_id)
            .is_some())
    }
}

#[async_trait]
impl DashboardRepository for MemoryStore {
    async fn revenue_between(
        &self,
        organizer_id: Uuid,
        period: Period,
    ) -> Result<Decimal, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .completed_orders(organizer_id)
            .filter(|o| period.contains(o.created_at))
            .map(|o| o.total_amount)
            .sum())
    }

    async fn tickets_sold_between(
        &self,
        organizer_id: Uuid,
        period: Period,
    ) -> Result<i64, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .completed_orders(organizer_id)
            .filter(|o| period.contains(o.created_at))
            .map(Order::ticket_count)
            .sum())
    }

    async fn events_created_between(
        &self,
        organizer_id: Uuid,
        period: Period,
    ) -> Result<i64, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .events
            .values()
            .filter(|e| e.organizer_id == organizer_id && period.contains(e.created_at))
            .count() as i64)
    }

    async fn monthly_revenue(
        &self,
        organizer_id: Uuid,
        period: Period,
    ) -> Result<Vec<(NaiveDate, Decimal)>, AppError> {
        let tables = self.tables.lock().await;
        let mut buckets: HashMap<NaiveDate, Decimal> = HashMap::new();
        for order in tables
            .completed_orders(organizer_id)
            .filter(|o| period.contains(o.created_at))
        {
            let day = order.created_at.date_naive();
            if let Some(month) = NaiveDate::from_ymd_opt(day.year(), day.month(), 1) {
                *buckets.entry(month).or_default() += order.total_amount;
            }
        }
        let mut months: Vec<_> = buckets.into_iter().collect();
        months.sort_by_key(|(month, _)| *month);
        Ok(months)
    }
}
