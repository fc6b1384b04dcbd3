use axum::response::Response;
use serde::Serialize;

use crate::utils::response::success;

pub mod checkouts;
pub mod dashboard;
pub mod events;
pub mod orders;
pub mod payment_config;
pub mod payments;
pub mod tickets;
pub mod users;
pub mod venues;

#[derive(Serialize)]
struct HealthPayload {
    status: &'static str,
    service: &'static str,
}

pub async fn health_check() -> Response {
    let payload = HealthPayload {
        status: "ok",
        service: "ticketdesk-api",
    };

    success(payload, "Health check successful")
}
