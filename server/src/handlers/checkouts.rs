use axum::{
    extract::{Path, State},
    response::Response,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::AuthenticatedPrincipal;
use crate::models::Checkout;
use crate::services::checkout::{self, CreateCheckoutRequest};
use crate::services::coupon::{self, CouponEvaluation};
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::extract::AppJson;
use crate::utils::response::{created, success};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyCouponRequest {
    pub event_id: Uuid,
    pub code: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CouponApplied {
    checkout: Checkout,
    #[serde(flatten)]
    evaluation: CouponEvaluation,
}

pub async fn create_checkout(
    State(state): State<AppState>,
    principal: AuthenticatedPrincipal,
    AppJson(body): AppJson<CreateCheckoutRequest>,
) -> Result<Response, AppError> {
    let quote = checkout::create_checkout(
        &state.repos,
        principal.id,
        body,
        state.settings.checkout_ttl,
        Utc::now(),
    )
    .await?;

    Ok(created(quote, "Checkout created"))
}

pub async fn get_checkout(
    State(state): State<AppState>,
    principal: AuthenticatedPrincipal,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let quote = checkout::get_checkout(&state.repos, principal.id, id, Utc::now()).await?;
    Ok(success(quote, "Checkout retrieved"))
}

pub async fn apply_coupon(
    State(state): State<AppState>,
    principal: AuthenticatedPrincipal,
    Path(id): Path<Uuid>,
    AppJson(body): AppJson<ApplyCouponRequest>,
) -> Result<Response, AppError> {
    let (checkout, evaluation) =
        coupon::apply_coupon(&state.repos, principal.id, id, body.event_id, &body.code).await?;

    Ok(success(
        CouponApplied {
            checkout,
            evaluation,
        },
        "Coupon applied",
    ))
}

pub async fn create_payment_order(
    State(state): State<AppState>,
    principal: AuthenticatedPrincipal,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let currency = state.settings.currency_for(&principal);
    let order = checkout::create_payment_order(
        &state.repos,
        state.gateway_access(),
        principal.id,
        id,
        &currency,
    )
    .await?;

    Ok(success(order, "Payment order created"))
}
