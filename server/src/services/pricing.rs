use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::models::{CartItem, FeeAllocation, FeePayer};
use crate::utils::error::AppError;

/// 5% of the subtotal.
pub fn platform_fee_rate() -> Decimal {
    Decimal::new(5, 2)
}

/// 3% of subtotal plus platform fee.
pub fn gateway_fee_rate() -> Decimal {
    Decimal::new(3, 2)
}

/// Largest amount a `NUMERIC(14, 2)` money column holds.
pub fn max_money() -> Decimal {
    Decimal::new(99_999_999_999_999, 2)
}

fn too_large() -> AppError {
    AppError::ValidationError("Order amount is too large".to_string())
}

/// Rounds to cents, half away from zero, always carrying two decimal places.
pub fn round_money(amount: Decimal) -> Decimal {
    let mut rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded
}

/// Integer minor units (cents/paise) as expected by payment gateways.
pub fn to_minor_units(amount: Decimal) -> Option<i64> {
    use rust_decimal::prelude::ToPrimitive;
    round_money(amount)
        .checked_mul(Decimal::ONE_HUNDRED)?
        .to_i64()
}

pub fn subtotal(cart: &[CartItem]) -> Result<Decimal, AppError> {
    let mut sum = Decimal::ZERO;
    for item in cart {
        let line = item
            .price
            .checked_mul(Decimal::from(item.quantity))
            .ok_or_else(too_large)?;
        sum = sum.checked_add(line).ok_or_else(too_large)?;
    }
    Ok(round_money(sum))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceBreakdown {
    pub subtotal: Decimal,
    pub platform_fee: Decimal,
    pub payment_gateway_fee: Decimal,
    pub total: Decimal,
}

impl PriceBreakdown {
    /// The gateway fee compounds on top of the platform fee; each step is
    /// rounded before it feeds the next.
    pub fn for_cart(cart: &[CartItem]) -> Result<Self, AppError> {
        let subtotal = subtotal(cart)?;
        let platform_fee = round_money(
            subtotal
                .checked_mul(platform_fee_rate())
                .ok_or_else(too_large)?,
        );
        let payment_gateway_fee = round_money(
            subtotal
                .checked_add(platform_fee)
                .and_then(|base| base.checked_mul(gateway_fee_rate()))
                .ok_or_else(too_large)?,
        );
        let total = subtotal
            .checked_add(platform_fee)
            .and_then(|sum| sum.checked_add(payment_gateway_fee))
            .ok_or_else(too_large)?;

        Ok(Self {
            subtotal,
            platform_fee,
            payment_gateway_fee,
            total,
        })
    }

    /// What the buyer is charged: the discounted subtotal plus every fee the
    /// event puts on the buyer. Organizer-borne fees come out of the payout.
    pub fn amount_due(
        &self,
        allocation: FeeAllocation,
        discount: Decimal,
    ) -> Result<Decimal, AppError> {
        let mut due = self.subtotal.checked_sub(discount).ok_or_else(too_large)?;
        if allocation.platform_fee == FeePayer::User {
            due = due.checked_add(self.platform_fee).ok_or_else(too_large)?;
        }
        if allocation.payment_gateway_fee == FeePayer::User {
            due = due.checked_add(self.payment_gateway_fee).ok_or_else(too_large)?;
        }
        Ok(round_money(due))
    }

    /// Organizer payout for an order that collected `total_amount`.
    pub fn payout(&self, total_amount: Decimal) -> Decimal {
        round_money(total_amount - self.payment_gateway_fee)
    }
}
