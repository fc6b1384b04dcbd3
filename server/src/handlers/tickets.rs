use axum::{extract::State, response::Response};
use chrono::Utc;
use serde::Deserialize;

use crate::auth::AuthenticatedPrincipal;
use crate::services::checkin::{self, CheckInTarget};
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::extract::AppJson;
use crate::utils::response::success;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckInRequest {
    pub ticket_code: Option<String>,
    pub order_id: Option<String>,
}

impl CheckInRequest {
    /// A ticket code wins when both are given.
    fn target(self) -> Result<CheckInTarget, AppError> {
        let non_empty = |value: Option<String>| {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        match (non_empty(self.ticket_code), non_empty(self.order_id)) {
            (Some(code), _) => Ok(CheckInTarget::TicketCode(code)),
            (None, Some(order_id)) => Ok(CheckInTarget::OrderId(order_id)),
            (None, None) => Err(AppError::ValidationError(
                "ticketCode or orderId is required".to_string(),
            )),
        }
    }
}

pub async fn check_in(
    State(state): State<AppState>,
    principal: AuthenticatedPrincipal,
    AppJson(body): AppJson<CheckInRequest>,
) -> Result<Response, AppError> {
    let target = body.target()?;
    let result = checkin::check_in(&state.repos, principal.id, target, Utc::now()).await?;
    let message = result.message.clone();
    Ok(success(result, message))
}
