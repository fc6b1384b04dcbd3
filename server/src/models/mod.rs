pub mod checkout;
pub mod event;
pub mod order;
pub mod payment_config;
pub mod ticket;
pub mod user;
pub mod venue;

pub use checkout::{AppliedCoupon, CartItem, Checkout, CustomerInfo, PendingPayment};
pub use event::{
    DiscountType, Event, EventStatus, EventTiming, FeeAllocation, FeePayer, PromoCode,
    TicketVariant,
};
pub use order::{EventSnapshot, Order, OrderStatus, PaymentStatus, PayoutStatus};
pub use payment_config::PaymentConfig;
pub use ticket::{Attendee, Ticket, TicketStatus};
pub use user::User;
pub use venue::Venue;

use crate::utils::error::AppError;

/// Text columns that hold enum values must always round-trip; anything else is corrupt data.
pub(crate) fn unknown_variant(kind: &str, value: &str) -> AppError {
    AppError::InternalServerError(format!("unknown {kind} '{value}' in storage"))
}
