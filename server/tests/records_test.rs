mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;
use uuid::Uuid;

use common::{event_body, TestApp};

#[tokio::test]
async fn test_health_check_is_public() {
    let app = TestApp::new();
    let (status, body) = app.request(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["service"], "ticketdesk-api");
}

#[tokio::test]
async fn test_missing_or_bad_session_is_forbidden() {
    let app = TestApp::new();

    let (status, body) = app
        .request(Method::GET, "/api/dashboard", None, None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "AUTH_ERROR");

    let (status, _) = app
        .request(Method::POST, "/api/checkouts", Some("garbage.token"), Some(json!({})))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_profile_upsert() {
    let app = TestApp::new();
    let token = app.token(Uuid::new_v4());

    let (status, _) = app.request(Method::GET, "/api/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app
        .request(
            Method::PUT,
            "/api/me",
            Some(&token),
            Some(json!({ "name": "Grace Hopper", "currency": "usd" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["currency"], "USD");

    let (_, body) = app.request(Method::GET, "/api/me", Some(&token), None).await;
    assert_eq!(body["data"]["name"], "Grace Hopper");
}

#[tokio::test]
async fn test_event_lifecycle_and_visibility() {
    let app = TestApp::new();
    let organizer = app.token(Uuid::new_v4());
    let stranger = app.token(Uuid::new_v4());

    let (status, body) = app
        .request(Method::POST, "/api/events", Some(&organizer), Some(event_body()))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["status"], "draft");
    let event_id = body["data"]["id"].as_str().unwrap().to_string();
    let path = format!("/api/events/{event_id}");

    // drafts are invisible to everyone but the organizer
    let (status, _) = app.request(Method::GET, &path, Some(&stranger), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.request(Method::GET, &path, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let mut update = event_body();
    update["name"] = json!("Rooftop Sessions Vol. 2");
    let (status, body) = app
        .request(Method::PUT, &path, Some(&organizer), Some(update))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["name"], "Rooftop Sessions Vol. 2");

    let (status, _) = app
        .request(Method::PUT, &path, Some(&stranger), Some(event_body()))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let publish = format!("{path}/publish");
    let (status, body) = app.request(Method::POST, &publish, Some(&organizer), None).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["status"], "active");

    let (status, _) = app.request(Method::POST, &publish, Some(&organizer), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // public readers see the event without its promo codes
    let (status, body) = app.request(Method::GET, &path, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["promoCodes"].as_array().unwrap().len(), 0);

    let (_, body) = app.request(Method::GET, &path, Some(&organizer), None).await;
    assert_eq!(body["data"]["promoCodes"].as_array().unwrap().len(), 1);

    let (_, body) = app.request(Method::GET, "/api/events", Some(&organizer), None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (status, _) = app.request(Method::DELETE, &path, Some(&organizer), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.request(Method::GET, &path, Some(&organizer), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_event_is_rejected() {
    let app = TestApp::new();
    let organizer = app.token(Uuid::new_v4());

    let mut body = event_body();
    body["ticketVariants"] = json!([]);
    let (status, response) = app
        .request(Method::POST, "/api/events", Some(&organizer), Some(body))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response["error"]["code"], "VALIDATION_ERROR");

    let (status, _) = app
        .request(
            Method::POST,
            "/api/events",
            Some(&organizer),
            Some(json!({ "name": "missing everything" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_sold_event_cannot_be_deleted_and_is_organizer_only() {
    let app = TestApp::new();
    let organizer = app.token(Uuid::new_v4());
    let buyer = app.token(Uuid::new_v4());
    let event_id = app.published_event(&organizer).await;

    let quote = app.checkout(&buyer, &event_id, 1).await;
    let checkout_id = quote["checkout"]["id"].as_str().unwrap();
    let (status, body) = app.pay(&buyer, checkout_id).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let code = body["data"]["tickets"][0]["qrCode"].as_str().unwrap().to_string();
    let order_id = body["data"]["order"]["orderId"].as_str().unwrap().to_string();

    let (status, _) = app
        .request(
            Method::DELETE,
            &format!("/api/events/{event_id}"),
            Some(&organizer),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    for path in [
        format!("/api/events/{event_id}/orders"),
        format!("/api/events/{event_id}/attendees"),
    ] {
        let (status, _) = app.request(Method::GET, &path, Some(&buyer), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{path}");
        let (status, _) = app.request(Method::GET, &path, Some(&organizer), None).await;
        assert_eq!(status, StatusCode::OK, "{path}");
    }

    let (status, _) = app
        .request(
            Method::POST,
            "/api/tickets/check-in",
            Some(&buyer),
            Some(json!({ "ticketCode": code })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .request(
            Method::POST,
            "/api/tickets/check-in",
            Some(&organizer),
            Some(json!({ "ticketCode": "TKT-1-UNKNOWN" })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app
        .request(
            Method::POST,
            "/api/tickets/check-in",
            Some(&organizer),
            Some(json!({ "orderId": order_id })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["isValid"], true);

    let stranger = app.token(Uuid::new_v4());
    let (status, _) = app
        .request(Method::GET, &format!("/api/orders/{order_id}"), Some(&stranger), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app
        .request(Method::GET, &format!("/api/orders/{order_id}"), Some(&organizer), None)
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_venues_are_owner_scoped() {
    let app = TestApp::new();
    let owner = app.token(Uuid::new_v4());
    let other = app.token(Uuid::new_v4());

    let (status, body) = app
        .request(
            Method::POST,
            "/api/venues",
            Some(&owner),
            Some(json!({ "name": "The Loft", "address": "1 Main St", "city": "Pune", "capacity": 300 })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let venue_id = body["data"]["id"].as_str().unwrap().to_string();
    let path = format!("/api/venues/{venue_id}");

    let (status, _) = app.request(Method::GET, &path, Some(&other), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // an event cannot point at someone else's venue
    let mut event = event_body();
    event["venueId"] = json!(venue_id);
    let (status, _) = app
        .request(Method::POST, "/api/events", Some(&other), Some(event.clone()))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = app
        .request(Method::POST, "/api/events", Some(&owner), Some(event))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app
        .request(
            Method::PUT,
            &path,
            Some(&owner),
            Some(json!({ "name": "The Loft", "address": "2 Main St", "city": "Pune" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["address"], "2 Main St");

    let (status, _) = app.request(Method::DELETE, &path, Some(&other), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.request(Method::DELETE, &path, Some(&owner), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_payment_config_secret_is_masked() {
    let app = TestApp::new();
    let organizer = app.token(Uuid::new_v4());

    let (status, body) = app
        .request(
            Method::PUT,
            "/api/payment-config",
            Some(&organizer),
            Some(json!({ "keyId": "rzp_live_org", "keySecret": "super_secret_9876" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let (status, body) = app
        .request(Method::GET, "/api/payment-config", Some(&organizer), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["keyId"], "rzp_live_org");
    assert_eq!(body["data"]["maskedSecret"], "****9876");
    assert!(!body.to_string().contains("super_secret"));

    // the organizer's own key is now used for their events
    let buyer = app.token(Uuid::new_v4());
    let event_id = app.published_event(&organizer).await;
    let quote = app.checkout(&buyer, &event_id, 1).await;
    let checkout_id = quote["checkout"]["id"].as_str().unwrap();
    let (_, body) = app
        .request(
            Method::POST,
            &format!("/api/checkouts/{checkout_id}/payment-order"),
            Some(&buyer),
            None,
        )
        .await;
    assert_eq!(body["data"]["keyId"], "rzp_live_org");

    let (status, _) = app
        .request(Method::DELETE, "/api/payment-config", Some(&organizer), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app
        .request(Method::GET, "/api/payment-config", Some(&organizer), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
