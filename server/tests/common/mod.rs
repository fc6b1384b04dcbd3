#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

use ticketdesk_server::auth::{HmacSessionVerifier, SessionClaims};
use ticketdesk_server::db::Repositories;
use ticketdesk_server::payments::signature::payment_signature;
use ticketdesk_server::payments::{CredentialCipher, GatewayCredentials, MockPaymentGateway};
use ticketdesk_server::routes::create_routes;
use ticketdesk_server::state::{AppSettings, AppState};

pub const GATEWAY_SECRET: &str = "platform_gateway_secret";

pub struct TestApp {
    pub app: Router,
    pub repos: Repositories,
    pub gateway: Arc<MockPaymentGateway>,
    sessions: Arc<HmacSessionVerifier>,
}

impl TestApp {
    pub fn new() -> Self {
        let repos = Repositories::in_memory();
        let sessions = Arc::new(HmacSessionVerifier::new("test-session-secret"));
        let gateway = Arc::new(MockPaymentGateway::new());

        let state = AppState {
            repos: repos.clone(),
            sessions: sessions.clone(),
            gateway: gateway.clone(),
            cipher: Arc::new(CredentialCipher::new(&[42u8; 32]).unwrap()),
            settings: Arc::new(AppSettings {
                platform_credentials: Some(GatewayCredentials {
                    key_id: "rzp_test_platform".to_string(),
                    key_secret: GATEWAY_SECRET.to_string(),
                }),
                default_currency: "INR".to_string(),
                checkout_ttl: Duration::minutes(10),
                allowed_origins: None,
                include_hsts: false,
            }),
        };

        Self {
            app: create_routes(state),
            repos,
            gateway,
            sessions,
        }
    }

    pub fn token(&self, user_id: Uuid) -> String {
        self.sessions
            .issue(&SessionClaims {
                sub: user_id,
                email: format!("{}@example.com", user_id.simple()),
                currency: None,
                exp: (Utc::now() + Duration::hours(1)).timestamp(),
            })
            .unwrap()
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    /// Creates and publishes an event with a `GA` variant at 10.00 and the
    /// `SAVE10` promo (flat 10 off, minimum order 50).
    pub async fn published_event(&self, organizer_token: &str) -> String {
        let (status, body) = self
            .request(
                Method::POST,
                "/api/events",
                Some(organizer_token),
                Some(event_body()),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        let event_id = body["data"]["id"].as_str().unwrap().to_string();

        let (status, body) = self
            .request(
                Method::POST,
                &format!("/api/events/{event_id}/publish"),
                Some(organizer_token),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        event_id
    }

    pub async fn checkout(&self, buyer_token: &str, event_id: &str, quantity: i32) -> Value {
        let (status, body) = self
            .request(
                Method::POST,
                "/api/checkouts",
                Some(buyer_token),
                Some(json!({
                    "eventId": event_id,
                    "items": [{ "type": "GA", "quantity": quantity }],
                    "customer": { "name": "Ada Lovelace", "email": "ada@example.com" }
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["data"].clone()
    }

    pub async fn payment_order(&self, buyer_token: &str, checkout_id: &str) -> String {
        let (status, body) = self
            .request(
                Method::POST,
                &format!("/api/checkouts/{checkout_id}/payment-order"),
                Some(buyer_token),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["data"]["gatewayOrderId"].as_str().unwrap().to_string()
    }

    /// Runs payment-order and verify for a checkout; returns the verify response.
    pub async fn pay(&self, buyer_token: &str, checkout_id: &str) -> (StatusCode, Value) {
        let gateway_order_id = self.payment_order(buyer_token, checkout_id).await;
        self.verify(buyer_token, checkout_id, &gateway_order_id).await
    }

    /// Posts a correctly signed verification for `gateway_order_id`.
    pub async fn verify(
        &self,
        buyer_token: &str,
        checkout_id: &str,
        gateway_order_id: &str,
    ) -> (StatusCode, Value) {
        self.request(
            Method::POST,
            "/api/payments/verify",
            Some(buyer_token),
            Some(json!({
                "checkoutId": checkout_id,
                "gatewayOrderId": gateway_order_id,
                "paymentId": "pay_test_1",
                "signature": payment_signature(GATEWAY_SECRET, gateway_order_id, "pay_test_1").unwrap(),
            })),
        )
        .await
    }
}

pub fn event_body() -> Value {
    json!({
        "name": "Rooftop Sessions",
        "description": "Live sets at sunset",
        "timings": [{ "date": "2031-06-01", "startTime": "19:00:00", "endTime": "23:00:00" }],
        "ticketVariants": [{ "type": "GA", "price": "10.00", "quantity": 100 }],
        "promoCodes": [{
            "code": "SAVE10",
            "discountType": "flat",
            "discountValue": "10",
            "minOrderValue": "50"
        }],
        "platformFee": "user",
        "paymentGatewayFee": "user"
    })
}
