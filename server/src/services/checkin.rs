use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::db::Repositories;
use crate::models::Ticket;
use crate::utils::error::AppError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckInTarget {
    TicketCode(String),
    /// Every not-yet-used ticket of the order.
    OrderId(String),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckInResult {
    pub is_valid: bool,
    pub message: String,
    pub tickets: Vec<Ticket>,
}

/// Flips the target's tickets from unused to used on behalf of `operator_id`.
///
/// The update only touches tickets whose `checked_in_time` is still empty, so of
/// two simultaneous scans exactly one reports success.
pub async fn check_in(
    repos: &Repositories,
    operator_id: Uuid,
    target: CheckInTarget,
    now: DateTime<Utc>,
) -> Result<CheckInResult, AppError> {
    let existing: Vec<Ticket> = match &target {
        CheckInTarget::TicketCode(code) => {
            repos.tickets.find_by_code(code).await?.into_iter().collect()
        }
        CheckInTarget::OrderId(order_id) => repos.tickets.list_by_order(order_id).await?,
    };

    let Some(event_id) = existing.first().map(|t| t.event_id) else {
        return Err(AppError::NotFound("Ticket not found".to_string()));
    };

    let event = repos
        .events
        .find(event_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Event not found".to_string()))?;

    if !event.is_owned_by(operator_id) {
        return Err(AppError::Forbidden(
            "Only the event organizer can check in tickets".to_string(),
        ));
    }

    let checked_in = match &target {
        CheckInTarget::TicketCode(code) => repos
            .tickets
            .check_in_by_code(code, operator_id, now)
            .await?
            .into_iter()
            .collect::<Vec<_>>(),
        CheckInTarget::OrderId(order_id) => {
            repos
                .tickets
                .check_in_by_order(order_id, operator_id, now)
                .await?
        }
    };

    if checked_in.is_empty() {
        warn!(target = ?target, event_id = %event_id, "Check-in rejected, ticket already used");
        return Ok(CheckInResult {
            is_valid: false,
            message: "Ticket already used".to_string(),
            tickets: existing,
        });
    }

    info!(
        target = ?target,
        event_id = %event_id,
        operator_id = %operator_id,
        checked_in = checked_in.len(),
        "Tickets checked in"
    );

    let message = if checked_in.len() == 1 {
        "Ticket checked in".to_string()
    } else {
        format!("{} tickets checked in", checked_in.len())
    };

    Ok(CheckInResult {
        is_valid: true,
        message,
        tickets: checked_in,
    })
}
