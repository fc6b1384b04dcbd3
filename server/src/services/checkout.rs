use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{info, warn};
use uuid::Uuid;

use crate::db::Repositories;
use crate::models::{CartItem, Checkout, CustomerInfo, Event, EventStatus, PendingPayment};
use crate::payments::credentials::resolve_credentials;
use crate::payments::signature::verify_payment_signature;
use crate::payments::{CreateGatewayOrder, CredentialCipher, GatewayCredentials, PaymentGateway};
use crate::services::materializer::{self, MaterializedOrder, PaymentConfirmation};
use crate::services::pricing::{max_money, to_minor_units, PriceBreakdown};
use crate::utils::error::AppError;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutItemRequest {
    #[serde(rename = "type")]
    pub ticket_type: String,
    pub quantity: i32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCheckoutRequest {
    pub event_id: Uuid,
    pub items: Vec<CheckoutItemRequest>,
    pub customer: CustomerInfo,
}

impl CreateCheckoutRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.items.is_empty() {
            return Err(AppError::ValidationError(
                "At least one ticket must be selected".to_string(),
            ));
        }
        if let Some(item) = self.items.iter().find(|i| i.quantity < 1) {
            return Err(AppError::ValidationError(format!(
                "Quantity for '{}' must be at least 1",
                item.ticket_type
            )));
        }
        if self.customer.name.trim().is_empty() {
            return Err(AppError::ValidationError(
                "Customer name is required".to_string(),
            ));
        }
        if !self.customer.email.contains('@') {
            return Err(AppError::ValidationError(
                "A valid customer email is required".to_string(),
            ));
        }
        Ok(())
    }

    /// Requested quantity per ticket type; repeated lines are summed.
    fn quantities(&self) -> Result<BTreeMap<&str, i32>, AppError> {
        let mut quantities = BTreeMap::new();
        for item in &self.items {
            let entry = quantities.entry(item.ticket_type.as_str()).or_insert(0i32);
            *entry = entry.checked_add(item.quantity).ok_or_else(|| {
                AppError::ValidationError(format!(
                    "Too many '{}' tickets requested",
                    item.ticket_type
                ))
            })?;
        }
        Ok(quantities)
    }
}

/// A checkout with its computed prices, as shown to the buyer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutQuote {
    pub checkout: Checkout,
    pub pricing: PriceBreakdown,
    pub amount_due: Decimal,
    pub expired: bool,
}

impl CheckoutQuote {
    /// Once a payment order is open the amount due is the amount it charges.
    pub fn new(checkout: Checkout, event: &Event, now: DateTime<Utc>) -> Result<Self, AppError> {
        let pricing = PriceBreakdown::for_cart(&checkout.cart)?;
        let amount_due = match checkout.payment_amount {
            Some(amount) => amount,
            None => pricing.amount_due(event.fee_allocation(), checkout.discount())?,
        };
        let expired = checkout.is_expired(now);
        Ok(Self {
            checkout,
            pricing,
            amount_due,
            expired,
        })
    }
}

async fn find_event(repos: &Repositories, event_id: Uuid) -> Result<Event, AppError> {
    repos
        .events
        .find(event_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Event not found".to_string()))
}

async fn find_own_checkout(
    repos: &Repositories,
    buyer_id: Uuid,
    checkout_id: Uuid,
) -> Result<Checkout, AppError> {
    repos
        .checkouts
        .find(checkout_id)
        .await?
        .filter(|c| c.buyer_id == buyer_id)
        .ok_or_else(|| AppError::NotFound("Checkout not found".to_string()))
}

/// Prices the requested tickets from the event and stores a checkout that
/// expires `ttl` after `now`.
pub async fn create_checkout(
    repos: &Repositories,
    buyer_id: Uuid,
    request: CreateCheckoutRequest,
    ttl: Duration,
    now: DateTime<Utc>,
) -> Result<CheckoutQuote, AppError> {
    request.validate()?;

    let event = find_event(repos, request.event_id).await?;
    match event.effective_status(now) {
        EventStatus::Active => {}
        EventStatus::Draft => {
            return Err(AppError::NotFound("Event not found".to_string()));
        }
        EventStatus::Completed => {
            return Err(AppError::ValidationError(
                "Ticket sales for this event have ended".to_string(),
            ));
        }
    }

    let mut cart = Vec::new();
    for (ticket_type, quantity) in request.quantities()? {
        let variant = event.variant(ticket_type).ok_or_else(|| {
            AppError::ValidationError(format!("Unknown ticket type '{ticket_type}'"))
        })?;

        let sold = repos.tickets.count_sold_by_type(event.id, ticket_type).await?;
        let remaining = (i64::from(variant.quantity) - sold).max(0);
        if i64::from(quantity) > remaining {
            return Err(AppError::ValidationError(format!(
                "Only {remaining} '{ticket_type}' tickets remaining"
            )));
        }

        cart.push(CartItem {
            ticket_type: variant.ticket_type.clone(),
            price: variant.price,
            quantity,
        });
    }

    if PriceBreakdown::for_cart(&cart)?.total > max_money() {
        return Err(AppError::ValidationError(
            "Order amount is too large".to_string(),
        ));
    }

    let checkout = Checkout {
        id: Uuid::new_v4(),
        buyer_id,
        event_id: event.id,
        cart,
        customer: request.customer,
        applied_coupon: None,
        discount_amount: None,
        final_amount: None,
        gateway_order_id: None,
        payment_amount: None,
        payment_currency: None,
        created_at: now,
        expires_at: now + ttl,
    };
    repos.checkouts.insert(&checkout).await?;

    info!(
        checkout_id = %checkout.id,
        event_id = %event.id,
        tickets = checkout.ticket_count(),
        "Checkout created"
    );

    CheckoutQuote::new(checkout, &event, now)
}

pub async fn get_checkout(
    repos: &Repositories,
    buyer_id: Uuid,
    checkout_id: Uuid,
    now: DateTime<Utc>,
) -> Result<CheckoutQuote, AppError> {
    let checkout = find_own_checkout(repos, buyer_id, checkout_id).await?;
    let event = find_event(repos, checkout.event_id).await?;
    CheckoutQuote::new(checkout, &event, now)
}

/// What the gateway needs to talk to an event organizer's account.
#[derive(Clone, Copy)]
pub struct GatewayAccess<'a> {
    pub gateway: &'a dyn PaymentGateway,
    pub cipher: &'a CredentialCipher,
    pub platform: Option<&'a GatewayCredentials>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentOrder {
    pub gateway_order_id: String,
    pub amount: Decimal,
    pub amount_minor: i64,
    pub currency: String,
    /// Public key the buyer's payment widget is opened with.
    pub key_id: String,
}

impl PaymentOrder {
    fn new(payment: PendingPayment, key_id: String) -> Result<Self, AppError> {
        let amount_minor = to_minor_units(payment.amount)
            .ok_or_else(|| AppError::ValidationError("Amount due is too large".to_string()))?;
        Ok(Self {
            gateway_order_id: payment.gateway_order_id,
            amount: payment.amount,
            amount_minor,
            currency: payment.currency,
            key_id,
        })
    }
}

/// Opens a gateway order for the checkout's amount due and records it on the
/// checkout, fixing the price. Asking again returns the order already opened.
pub async fn create_payment_order(
    repos: &Repositories,
    access: GatewayAccess<'_>,
    buyer_id: Uuid,
    checkout_id: Uuid,
    currency: &str,
) -> Result<PaymentOrder, AppError> {
    let checkout = find_own_checkout(repos, buyer_id, checkout_id).await?;
    if let Some(order) = repos.orders.find_by_checkout(checkout.id).await? {
        return Err(AppError::ValidationError(format!(
            "Checkout has already been paid as order {}",
            order.order_id
        )));
    }
    let event = find_event(repos, checkout.event_id).await?;
    let credentials =
        resolve_credentials(repos, access.cipher, access.platform, event.organizer_id).await?;

    if let Some(payment) = checkout.pending_payment() {
        info!(
            checkout_id = %checkout.id,
            gateway_order_id = %payment.gateway_order_id,
            "Returning open payment order"
        );
        return PaymentOrder::new(payment, credentials.key_id);
    }

    let amount = PriceBreakdown::for_cart(&checkout.cart)?
        .amount_due(event.fee_allocation(), checkout.discount())?;
    if amount <= Decimal::ZERO {
        return Err(AppError::ValidationError(
            "Amount due must be greater than zero".to_string(),
        ));
    }
    let amount_minor = to_minor_units(amount)
        .ok_or_else(|| AppError::ValidationError("Amount due is too large".to_string()))?;

    let gateway_order = access
        .gateway
        .create_order(
            &credentials,
            &CreateGatewayOrder {
                amount: amount_minor,
                currency: currency.to_string(),
                receipt: checkout.id.to_string(),
            },
        )
        .await?;

    let payment = PendingPayment {
        gateway_order_id: gateway_order.id,
        amount,
        currency: gateway_order.currency,
    };

    if !repos
        .checkouts
        .set_pending_payment(checkout.id, &payment)
        .await?
    {
        // a concurrent request opened its order first
        let winner = find_own_checkout(repos, buyer_id, checkout_id)
            .await?
            .pending_payment()
            .ok_or_else(|| AppError::NotFound("Checkout not found".to_string()))?;
        warn!(
            checkout_id = %checkout.id,
            discarded = %payment.gateway_order_id,
            gateway_order_id = %winner.gateway_order_id,
            "Payment order already opened"
        );
        return PaymentOrder::new(winner, credentials.key_id);
    }

    info!(
        checkout_id = %checkout.id,
        gateway_order_id = %payment.gateway_order_id,
        amount = %amount,
        "Payment order created"
    );

    PaymentOrder::new(payment, credentials.key_id)
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentVerification {
    pub checkout_id: Uuid,
    pub gateway_order_id: String,
    pub payment_id: String,
    pub signature: String,
}

/// Checks the gateway's signature for a paid checkout and turns it into an
/// order with tickets, recorded at the amount the gateway order charged.
/// Confirming the same checkout twice returns the order created the first time.
pub async fn confirm_payment(
    repos: &Repositories,
    access: GatewayAccess<'_>,
    buyer_id: Uuid,
    verification: PaymentVerification,
    now: DateTime<Utc>,
) -> Result<MaterializedOrder, AppError> {
    let checkout = find_own_checkout(repos, buyer_id, verification.checkout_id).await?;
    let event = find_event(repos, checkout.event_id).await?;

    let credentials =
        resolve_credentials(repos, access.cipher, access.platform, event.organizer_id).await?;

    if !verify_payment_signature(
        &credentials.key_secret,
        &verification.gateway_order_id,
        &verification.payment_id,
        &verification.signature,
    ) {
        warn!(checkout_id = %checkout.id, "Payment signature mismatch");
        return Err(AppError::ValidationError(
            "Invalid payment signature".to_string(),
        ));
    }

    let payment = checkout
        .pending_payment()
        .filter(|p| p.gateway_order_id == verification.gateway_order_id)
        .ok_or_else(|| {
            warn!(
                checkout_id = %checkout.id,
                gateway_order_id = %verification.gateway_order_id,
                "Payment does not belong to this checkout"
            );
            AppError::ValidationError("Payment order does not match this checkout".to_string())
        })?;

    let venue = match event.venue_id {
        Some(venue_id) => repos.venues.find(venue_id).await?,
        None => None,
    };

    let draft = materializer::draft_order(
        &checkout,
        &event,
        venue.as_ref(),
        PaymentConfirmation {
            gateway_order_id: payment.gateway_order_id,
            gateway_payment_id: verification.payment_id,
            amount: payment.amount,
            currency: payment.currency,
        },
        now,
    )?;

    materializer::materialize(repos, draft).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::event::tests::sample_event;
    use crate::models::TicketVariant;
    use crate::payments::signature::payment_signature;
    use crate::payments::MockPaymentGateway;
    use crate::services::coupon;

    const SECRET: &str = "platform_secret";

    fn platform() -> GatewayCredentials {
        GatewayCredentials {
            key_id: "rzp_test_platform".to_string(),
            key_secret: SECRET.to_string(),
        }
    }

    fn request(event_id: Uuid, lines: &[(&str, i32)]) -> CreateCheckoutRequest {
        CreateCheckoutRequest {
            event_id,
            items: lines
                .iter()
                .map(|(ticket_type, quantity)| CheckoutItemRequest {
                    ticket_type: ticket_type.to_string(),
                    quantity: *quantity,
                })
                .collect(),
            customer: CustomerInfo {
                name: "Grace".to_string(),
                email: "grace@example.com".to_string(),
                phone: None,
            },
        }
    }

    async fn seeded(event: Event) -> Repositories {
        let repos = Repositories::in_memory();
        repos.events.insert(&event).await.unwrap();
        repos
    }

    #[tokio::test]
    async fn test_checkout_prices_from_event() {
        let event = sample_event(Uuid::new_v4());
        let repos = seeded(event.clone()).await;
        let buyer = Uuid::new_v4();

        let quote = create_checkout(
            &repos,
            buyer,
            request(event.id, &[("GA", 2), ("GA", 1)]),
            Duration::minutes(10),
            Utc::now(),
        )
        .await
        .unwrap();

        assert_eq!(quote.checkout.cart.len(), 1);
        assert_eq!(quote.checkout.cart[0].quantity, 3);
        assert_eq!(quote.checkout.cart[0].price, Decimal::new(10, 0));
        assert_eq!(quote.pricing.subtotal, Decimal::new(30, 0));
        assert_eq!(quote.amount_due, quote.pricing.total);
        assert!(!quote.expired);
    }

    #[tokio::test]
    async fn test_checkout_rejects_oversell_and_unknown_types() {
        let mut event = sample_event(Uuid::new_v4());
        event.ticket_variants = vec![TicketVariant {
            ticket_type: "GA".to_string(),
            price: Decimal::new(10, 0),
            quantity: 2,
        }];
        let repos = seeded(event.clone()).await;
        let buyer = Uuid::new_v4();
        let ttl = Duration::minutes(10);

        let err = create_checkout(&repos, buyer, request(event.id, &[("GA", 3)]), ttl, Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));

        let err = create_checkout(&repos, buyer, request(event.id, &[("VIP", 1)]), ttl, Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(msg) if msg.contains("VIP")));

        let err = create_checkout(&repos, buyer, request(event.id, &[("GA", 0)]), ttl, Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_checkout_requires_active_event() {
        let mut event = sample_event(Uuid::new_v4());
        event.status = EventStatus::Draft;
        let repos = seeded(event.clone()).await;

        let err = create_checkout(
            &repos,
            Uuid::new_v4(),
            request(event.id, &[("GA", 1)]),
            Duration::minutes(10),
            Utc::now(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_pay_and_confirm_materializes_once() {
        let event = sample_event(Uuid::new_v4());
        let repos = seeded(event.clone()).await;
        let buyer = Uuid::new_v4();
        let gateway = MockPaymentGateway::new();
        let cipher = CredentialCipher::new(&[9u8; 32]).unwrap();
        let platform = platform();
        let access = GatewayAccess {
            gateway: &gateway,
            cipher: &cipher,
            platform: Some(&platform),
        };

        let quote = create_checkout(
            &repos,
            buyer,
            request(event.id, &[("GA", 10)]),
            Duration::minutes(10),
            Utc::now(),
        )
        .await
        .unwrap();
        let checkout_id = quote.checkout.id;

        let payment = create_payment_order(&repos, access, buyer, checkout_id, "INR")
            .await
            .unwrap();
        assert_eq!(payment.amount, Decimal::new(10815, 2));
        assert_eq!(payment.amount_minor, 10815);
        assert_eq!(payment.key_id, "rzp_test_platform");

        let verification = PaymentVerification {
            checkout_id,
            gateway_order_id: payment.gateway_order_id.clone(),
            payment_id: "pay_1".to_string(),
            signature: payment_signature(SECRET, &payment.gateway_order_id, "pay_1").unwrap(),
        };

        let first = confirm_payment(&repos, access, buyer, verification.clone(), Utc::now())
            .await
            .unwrap();
        assert!(first.created);
        assert_eq!(first.tickets.len(), 10);

        let second = confirm_payment(&repos, access, buyer, verification, Utc::now())
            .await
            .unwrap();
        assert!(!second.created);
        assert_eq!(second.order.order_id, first.order.order_id);

        let stored = repos.events.find(event.id).await.unwrap().unwrap();
        assert_eq!(stored.tickets_sold, 10);
        assert_eq!(stored.revenue, Decimal::new(10815, 2));

        let err = create_payment_order(&repos, access, buyer, checkout_id, "INR")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(msg) if msg.contains("already been paid")));
    }

    #[tokio::test]
    async fn test_confirm_rejects_bad_signature() {
        let event = sample_event(Uuid::new_v4());
        let repos = seeded(event.clone()).await;
        let buyer = Uuid::new_v4();
        let gateway = MockPaymentGateway::new();
        let cipher = CredentialCipher::new(&[9u8; 32]).unwrap();
        let platform = platform();
        let access = GatewayAccess {
            gateway: &gateway,
            cipher: &cipher,
            platform: Some(&platform),
        };

        let quote = create_checkout(
            &repos,
            buyer,
            request(event.id, &[("GA", 1)]),
            Duration::minutes(10),
            Utc::now(),
        )
        .await
        .unwrap();
        let payment = create_payment_order(&repos, access, buyer, quote.checkout.id, "INR")
            .await
            .unwrap();

        let forged = PaymentVerification {
            checkout_id: quote.checkout.id,
            gateway_order_id: payment.gateway_order_id.clone(),
            payment_id: "pay_1".to_string(),
            signature: payment_signature("wrong", &payment.gateway_order_id, "pay_1").unwrap(),
        };
        let err = confirm_payment(&repos, access, buyer, forged, Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(msg) if msg == "Invalid payment signature"));

        let other_order = PaymentVerification {
            checkout_id: quote.checkout.id,
            gateway_order_id: "order_other".to_string(),
            payment_id: "pay_1".to_string(),
            signature: payment_signature(SECRET, "order_other", "pay_1").unwrap(),
        };
        let err = confirm_payment(&repos, access, buyer, other_order, Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));

        let stored = repos.events.find(event.id).await.unwrap().unwrap();
        assert_eq!(stored.tickets_sold, 0);
    }

    #[tokio::test]
    async fn test_overflowing_quantities_are_rejected() {
        let event = sample_event(Uuid::new_v4());
        let repos = seeded(event.clone()).await;

        let err = create_checkout(
            &repos,
            Uuid::new_v4(),
            request(event.id, &[("GA", i32::MAX), ("GA", i32::MAX)]),
            Duration::minutes(10),
            Utc::now(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(msg) if msg.contains("Too many")));
    }

    #[tokio::test]
    async fn test_unpayable_price_is_rejected() {
        let mut event = sample_event(Uuid::new_v4());
        event.ticket_variants = vec![TicketVariant {
            ticket_type: "GA".to_string(),
            price: Decimal::from_str_exact("70000000000000000000000000000").unwrap(),
            quantity: 10,
        }];
        let repos = seeded(event.clone()).await;

        let err = create_checkout(
            &repos,
            Uuid::new_v4(),
            request(event.id, &[("GA", 2)]),
            Duration::minutes(10),
            Utc::now(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));

        event.ticket_variants[0].price = Decimal::new(999_999_999_999, 0);
        let repos = seeded(event.clone()).await;
        let err = create_checkout(
            &repos,
            Uuid::new_v4(),
            request(event.id, &[("GA", 1)]),
            Duration::minutes(10),
            Utc::now(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(msg) if msg.contains("too large")));
    }

    #[tokio::test]
    async fn test_open_payment_order_fixes_the_price() {
        let event = sample_event(Uuid::new_v4());
        let repos = seeded(event.clone()).await;
        let buyer = Uuid::new_v4();
        let gateway = MockPaymentGateway::new();
        let cipher = CredentialCipher::new(&[9u8; 32]).unwrap();
        let platform = platform();
        let access = GatewayAccess {
            gateway: &gateway,
            cipher: &cipher,
            platform: Some(&platform),
        };

        let quote = create_checkout(
            &repos,
            buyer,
            request(event.id, &[("GA", 10)]),
            Duration::minutes(10),
            Utc::now(),
        )
        .await
        .unwrap();
        let checkout_id = quote.checkout.id;

        let payment = create_payment_order(&repos, access, buyer, checkout_id, "INR")
            .await
            .unwrap();
        assert_eq!(payment.amount, Decimal::new(10815, 2));

        let err = coupon::apply_coupon(&repos, buyer, checkout_id, event.id, "SAVE10")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));

        let again = create_payment_order(&repos, access, buyer, checkout_id, "INR")
            .await
            .unwrap();
        assert_eq!(again.gateway_order_id, payment.gateway_order_id);
        assert_eq!(again.amount_minor, 10815);

        let verification = PaymentVerification {
            checkout_id,
            gateway_order_id: payment.gateway_order_id.clone(),
            payment_id: "pay_1".to_string(),
            signature: payment_signature(SECRET, &payment.gateway_order_id, "pay_1").unwrap(),
        };
        let confirmed = confirm_payment(&repos, access, buyer, verification, Utc::now())
            .await
            .unwrap();
        assert_eq!(confirmed.order.total_amount, Decimal::new(10815, 2));
        assert_eq!(confirmed.order.discount_amount, Decimal::ZERO);
        assert_eq!(confirmed.order.currency, "INR");

        let stored = repos.events.find(event.id).await.unwrap().unwrap();
        assert_eq!(stored.revenue, Decimal::new(10815, 2));
    }

    #[tokio::test]
    async fn test_payment_order_needs_credentials() {
        let event = sample_event(Uuid::new_v4());
        let repos = seeded(event.clone()).await;
        let buyer = Uuid::new_v4();
        let gateway = MockPaymentGateway::new();
        let cipher = CredentialCipher::new(&[9u8; 32]).unwrap();
        let access = GatewayAccess {
            gateway: &gateway,
            cipher: &cipher,
            platform: None,
        };

        let quote = create_checkout(
            &repos,
            buyer,
            request(event.id, &[("GA", 1)]),
            Duration::minutes(10),
            Utc::now(),
        )
        .await
        .unwrap();

        let err = create_payment_order(&repos, access, buyer, quote.checkout.id, "INR")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::GatewayError(_)));
    }
}
