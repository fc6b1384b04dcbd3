use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::db::Repositories;
use crate::models::{AppliedCoupon, CartItem, Checkout, DiscountType, Event};
use crate::services::pricing::{round_money, subtotal};
use crate::utils::error::AppError;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponEvaluation {
    pub code: String,
    pub discount_type: DiscountType,
    pub subtotal: Decimal,
    pub discount_amount: Decimal,
    /// Not floored at zero: a flat discount larger than the subtotal goes negative.
    pub final_amount: Decimal,
}

impl CouponEvaluation {
    pub fn applied(&self) -> AppliedCoupon {
        AppliedCoupon {
            code: self.code.clone(),
            discount_amount: self.discount_amount,
            final_amount: self.final_amount,
        }
    }
}

fn coupon_locked() -> AppError {
    AppError::ValidationError("Coupons cannot be changed after payment has started".to_string())
}

/// Prices `code` against the fee-free subtotal of `cart`.
///
/// Percent values above 100 are accepted as configured.
pub fn evaluate(event: &Event, code: &str, cart: &[CartItem]) -> Result<CouponEvaluation, AppError> {
    let subtotal = subtotal(cart)?;

    let promo = event
        .promo_code(code)
        .ok_or_else(|| AppError::NotFound("Invalid coupon code".to_string()))?;

    if subtotal < promo.min_order_value {
        return Err(AppError::CouponBelowMinimum {
            min_order_value: promo.min_order_value,
            subtotal,
        });
    }

    let discount_amount = match promo.discount_type {
        DiscountType::Flat => round_money(promo.discount_value),
        DiscountType::Percent => round_money(
            subtotal
                .checked_mul(promo.discount_value)
                .map(|amount| amount / Decimal::ONE_HUNDRED)
                .ok_or_else(|| {
                    AppError::ValidationError("Discount amount is too large".to_string())
                })?,
        ),
    };

    Ok(CouponEvaluation {
        code: promo.code.clone(),
        discount_type: promo.discount_type,
        subtotal,
        discount_amount,
        final_amount: subtotal - discount_amount,
    })
}

/// Validates `code` for the buyer's checkout and records it on the checkout,
/// replacing any coupon applied earlier. The coupon is fixed once a payment
/// order has been opened for the checkout.
pub async fn apply_coupon(
    repos: &Repositories,
    buyer_id: Uuid,
    checkout_id: Uuid,
    event_id: Uuid,
    code: &str,
) -> Result<(Checkout, CouponEvaluation), AppError> {
    if code.trim().is_empty() {
        return Err(AppError::ValidationError(
            "Coupon code is required".to_string(),
        ));
    }

    let mut checkout = repos
        .checkouts
        .find(checkout_id)
        .await?
        .filter(|c| c.buyer_id == buyer_id)
        .ok_or_else(|| AppError::NotFound("Checkout not found".to_string()))?;

    if checkout.gateway_order_id.is_some() {
        return Err(coupon_locked());
    }

    if checkout.event_id != event_id {
        return Err(AppError::ValidationError(
            "Checkout does not belong to this event".to_string(),
        ));
    }

    let event = repos
        .events
        .find(event_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Event not found".to_string()))?;

    let evaluation = evaluate(&event, code, &checkout.cart)?;
    let applied = evaluation.applied();

    if !repos.checkouts.apply_coupon(checkout.id, &applied).await? {
        return Err(coupon_locked());
    }

    info!(
        checkout_id = %checkout.id,
        event_id = %event.id,
        code = %applied.code,
        discount = %applied.discount_amount,
        "Coupon applied"
    );

    checkout.applied_coupon = Some(applied.code);
    checkout.discount_amount = Some(applied.discount_amount);
    checkout.final_amount = Some(applied.final_amount);

    Ok((checkout, evaluation))
}
