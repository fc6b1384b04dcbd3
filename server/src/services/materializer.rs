use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::db::Repositories;
use crate::models::{
    Checkout, Event, EventSnapshot, Order, OrderStatus, PaymentStatus, PayoutStatus, Ticket,
    TicketStatus, Venue,
};
use crate::services::pricing::{round_money, PriceBreakdown};
use crate::utils::error::AppError;
use crate::utils::ids;

/// A verified payment: the gateway identifiers and what the gateway order charged.
#[derive(Debug, Clone)]
pub struct PaymentConfirmation {
    pub gateway_order_id: String,
    pub gateway_payment_id: String,
    pub amount: Decimal,
    pub currency: String,
}

/// An order and its tickets, built but not yet stored.
#[derive(Debug, Clone)]
pub struct OrderDraft {
    pub order: Order,
    pub tickets: Vec<Ticket>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterializedOrder {
    pub order: Order,
    pub tickets: Vec<Ticket>,
    /// `false` when the checkout had already been turned into an order.
    #[serde(skip)]
    pub created: bool,
}

/// Expands a paid checkout into one order and one ticket per purchased seat.
/// The order total is the amount the gateway charged.
pub fn draft_order(
    checkout: &Checkout,
    event: &Event,
    venue: Option<&Venue>,
    confirmation: PaymentConfirmation,
    now: DateTime<Utc>,
) -> Result<OrderDraft, AppError> {
    let breakdown = PriceBreakdown::for_cart(&checkout.cart)?;
    let discount_amount = round_money(checkout.discount());
    let total_amount = confirmation.amount;
    let order_id = ids::order_reference(now);

    let tickets = checkout
        .cart
        .iter()
        .flat_map(|item| (0..item.quantity.max(0)).map(move |_| item))
        .map(|item| Ticket {
            id: Uuid::new_v4(),
            qr_code: ids::ticket_code(now),
            order_id: order_id.clone(),
            event_id: event.id,
            ticket_type: item.ticket_type.clone(),
            price: item.price,
            status: TicketStatus::Active,
            checked_in_time: None,
            checked_in_by: None,
            created_at: now,
        })
        .collect();

    let order = Order {
        id: Uuid::new_v4(),
        order_id,
        checkout_id: checkout.id,
        event_id: event.id,
        organizer_id: event.organizer_id,
        buyer_id: checkout.buyer_id,
        customer: checkout.customer.clone(),
        items: checkout.cart.clone(),
        subtotal: breakdown.subtotal,
        platform_fee: breakdown.platform_fee,
        payment_gateway_fee: breakdown.payment_gateway_fee,
        discount_amount,
        total_amount,
        payout_amount: breakdown.payout(total_amount),
        applied_coupon: checkout.applied_coupon.clone(),
        currency: confirmation.currency,
        gateway_order_id: confirmation.gateway_order_id,
        gateway_payment_id: confirmation.gateway_payment_id,
        payment_status: PaymentStatus::Completed,
        order_status: OrderStatus::Confirmed,
        payout_status: PayoutStatus::Pending,
        event_snapshot: EventSnapshot {
            name: event.name.clone(),
            date: event.earliest_timing().map(|t| t.date),
            venue_name: venue.map(|v| v.name.clone()),
            platform_fee_payer: event.platform_fee,
            gateway_fee_payer: event.payment_gateway_fee,
        },
        created_at: now,
    };

    Ok(OrderDraft { order, tickets })
}

/// Stores the draft. The order, its tickets and the event counters are written
/// atomically, keyed by checkout id: a second call for the same checkout returns
/// the stored order untouched.
pub async fn materialize(
    repos: &Repositories,
    draft: OrderDraft,
) -> Result<MaterializedOrder, AppError> {
    let materialized = repos.orders.materialize(draft).await?;

    if materialized.created {
        info!(
            order_id = %materialized.order.order_id,
            event_id = %materialized.order.event_id,
            tickets = materialized.tickets.len(),
            total = %materialized.order.total_amount,
            "Order materialized"
        );
    } else {
        info!(
            order_id = %materialized.order.order_id,
            checkout_id = %materialized.order.checkout_id,
            "Checkout already materialized, returning existing order"
        );
    }

    Ok(materialized)
}
