use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::config::{create_cors_layer, create_security_headers_layer};
use crate::handlers::{
    checkouts, dashboard, events, health_check, orders, payment_config, payments, tickets, users,
    venues,
};
use crate::state::AppState;

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/me", get(users::get_me).put(users::update_me))
        .route("/venues", post(venues::create_venue).get(venues::list_venues))
        .route(
            "/venues/:id",
            get(venues::get_venue)
                .put(venues::update_venue)
                .delete(venues::delete_venue),
        )
        .route("/events", post(events::create_event).get(events::list_events))
        .route(
            "/events/:id",
            get(events::get_event)
                .put(events::update_event)
                .delete(events::delete_event),
        )
        .route("/events/:id/publish", post(events::publish_event))
        .route("/events/:id/orders", get(orders::list_event_orders))
        .route("/events/:id/attendees", get(orders::list_attendees))
        .route(
            "/payment-config",
            get(payment_config::get_payment_config)
                .put(payment_config::upsert_payment_config)
                .delete(payment_config::delete_payment_config),
        )
        .route("/checkouts", post(checkouts::create_checkout))
        .route("/checkouts/:id", get(checkouts::get_checkout))
        .route("/checkouts/:id/coupon", post(checkouts::apply_coupon))
        .route(
            "/checkouts/:id/payment-order",
            post(checkouts::create_payment_order),
        )
        .route("/payments/verify", post(payments::verify_payment))
        .route("/orders/:order_id", get(orders::get_order))
        .route("/tickets/check-in", post(tickets::check_in))
        .route("/dashboard", get(dashboard::get_dashboard))
}

pub fn create_routes(state: AppState) -> Router {
    let cors = create_cors_layer(state.settings.allowed_origins.as_deref());
    let security_headers = create_security_headers_layer(state.settings.include_hsts);

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(security_headers)
        .layer(cors)
}
