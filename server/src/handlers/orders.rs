use axum::{
    extract::{Path, State},
    response::Response,
};
use serde::Serialize;
use uuid::Uuid;

use crate::auth::AuthenticatedPrincipal;
use crate::models::{Event, Order, Ticket};
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::success;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OrderDetails {
    order: Order,
    tickets: Vec<Ticket>,
}

/// Loads the event if the caller organizes it, 403 otherwise.
pub(crate) async fn organized_event(
    state: &AppState,
    event_id: Uuid,
    organizer_id: Uuid,
) -> Result<Event, AppError> {
    let event = state
        .repos
        .events
        .find(event_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Event not found".to_string()))?;

    if !event.is_owned_by(organizer_id) {
        return Err(AppError::Forbidden(
            "Only the event organizer can view this".to_string(),
        ));
    }
    Ok(event)
}

pub async fn get_order(
    State(state): State<AppState>,
    principal: AuthenticatedPrincipal,
    Path(order_id): Path<String>,
) -> Result<Response, AppError> {
    let order = state
        .repos
        .orders
        .find_by_order_id(&order_id)
        .await?
        .filter(|o| o.buyer_id == principal.id || o.organizer_id == principal.id)
        .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;

    let tickets = state.repos.tickets.list_by_order(&order.order_id).await?;
    Ok(success(OrderDetails { order, tickets }, "Order retrieved"))
}

pub async fn list_event_orders(
    State(state): State<AppState>,
    principal: AuthenticatedPrincipal,
    Path(event_id): Path<Uuid>,
) -> Result<Response, AppError> {
    let event = organized_event(&state, event_id, principal.id).await?;
    let orders = state.repos.orders.list_by_event(event.id).await?;
    Ok(success(orders, "Orders retrieved"))
}

pub async fn list_attendees(
    State(state): State<AppState>,
    principal: AuthenticatedPrincipal,
    Path(event_id): Path<Uuid>,
) -> Result<Response, AppError> {
    let event = organized_event(&state, event_id, principal.id).await?;
    let attendees = state.repos.tickets.list_attendees(event.id).await?;
    Ok(success(attendees, "Attendees retrieved"))
}
