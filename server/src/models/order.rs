use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use super::{unknown_variant, CartItem, CustomerInfo, FeePayer};
use crate::utils::error::AppError;

macro_rules! text_enum {
    ($name:ident, $kind:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(rename_all = "lowercase")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl FromStr for $name {
            type Err = AppError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(unknown_variant($kind, other)),
                }
            }
        }
    };
}

text_enum!(PaymentStatus, "payment status", {
    Pending => "pending",
    Completed => "completed",
    Failed => "failed",
});

text_enum!(OrderStatus, "order status", {
    Confirmed => "confirmed",
    Cancelled => "cancelled",
    Pending => "pending",
});

text_enum!(PayoutStatus, "payout status", {
    Pending => "pending",
    Completed => "completed",
    Failed => "failed",
});

/// Event details frozen into the order at purchase time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSnapshot {
    pub name: String,
    pub date: Option<NaiveDate>,
    pub venue_name: Option<String>,
    pub platform_fee_payer: FeePayer,
    pub gateway_fee_payer: FeePayer,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub order_id: String,
    pub checkout_id: Uuid,
    pub event_id: Uuid,
    pub organizer_id: Uuid,
    pub buyer_id: Uuid,
    pub customer: CustomerInfo,
    pub items: Vec<CartItem>,
    pub subtotal: Decimal,
    pub platform_fee: Decimal,
    pub payment_gateway_fee: Decimal,
    pub discount_amount: Decimal,
    pub total_amount: Decimal,
    pub payout_amount: Decimal,
    pub applied_coupon: Option<String>,
    pub currency: String,
    pub gateway_order_id: String,
    pub gateway_payment_id: String,
    pub payment_status: PaymentStatus,
    pub order_status: OrderStatus,
    pub payout_status: PayoutStatus,
    pub event_snapshot: EventSnapshot,
    pub created_at: DateTime<Utc>,
}

impl Order {
    pub fn ticket_count(&self) -> i64 {
        self.items.iter().map(|item| i64::from(item.quantity)).sum()
    }
}
