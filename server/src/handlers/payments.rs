use axum::{extract::State, response::Response};
use chrono::Utc;

use crate::auth::AuthenticatedPrincipal;
use crate::services::checkout::{self, PaymentVerification};
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::extract::AppJson;
use crate::utils::response::{created, success};

/// Called by the buyer's client after the gateway widget reports success.
pub async fn verify_payment(
    State(state): State<AppState>,
    principal: AuthenticatedPrincipal,
    AppJson(body): AppJson<PaymentVerification>,
) -> Result<Response, AppError> {
    let materialized = checkout::confirm_payment(
        &state.repos,
        state.gateway_access(),
        principal.id,
        body,
        Utc::now(),
    )
    .await?;

    if materialized.created {
        Ok(created(materialized, "Payment verified"))
    } else {
        Ok(success(materialized, "Payment already verified"))
    }
}
