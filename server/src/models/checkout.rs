use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One cart line, priced from the event at checkout time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    #[serde(rename = "type")]
    pub ticket_type: String,
    pub price: Decimal,
    pub quantity: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerInfo {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}

/// Coupon result persisted onto a checkout. Re-applying replaces it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedCoupon {
    pub code: String,
    pub discount_amount: Decimal,
    pub final_amount: Decimal,
}

/// Gateway order opened for a checkout. Once it exists the checkout's price
/// is frozen and the order is recorded at `amount`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingPayment {
    pub gateway_order_id: String,
    pub amount: Decimal,
    pub currency: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Checkout {
    pub id: Uuid,
    pub buyer_id: Uuid,
    pub event_id: Uuid,
    pub cart: Vec<CartItem>,
    pub customer: CustomerInfo,
    pub applied_coupon: Option<String>,
    pub discount_amount: Option<Decimal>,
    pub final_amount: Option<Decimal>,
    pub gateway_order_id: Option<String>,
    pub payment_amount: Option<Decimal>,
    pub payment_currency: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Checkout {
    /// Expiry is advisory: nothing sweeps or rejects an expired checkout.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn ticket_count(&self) -> i64 {
        self.cart.iter().map(|item| i64::from(item.quantity)).sum()
    }

    pub fn discount(&self) -> Decimal {
        self.discount_amount.unwrap_or(Decimal::ZERO)
    }

    pub fn pending_payment(&self) -> Option<PendingPayment> {
        match (&self.gateway_order_id, self.payment_amount, &self.payment_currency) {
            (Some(gateway_order_id), Some(amount), Some(currency)) => Some(PendingPayment {
                gateway_order_id: gateway_order_id.clone(),
                amount,
                currency: currency.clone(),
            }),
            _ => None,
        }
    }
}
