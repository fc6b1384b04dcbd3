use axum::{
    extract::{Path, State},
    response::Response,
};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashSet;
use uuid::Uuid;

use crate::auth::AuthenticatedPrincipal;
use crate::models::{Event, EventStatus, EventTiming, FeePayer, PromoCode, TicketVariant};
use crate::services::pricing::max_money;
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::extract::AppJson;
use crate::utils::response::{created, empty_success, success};

/// Editable part of an event, shared by create and update.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRequest {
    pub name: String,
    pub description: Option<String>,
    pub venue_id: Option<Uuid>,
    pub timings: Vec<EventTiming>,
    pub ticket_variants: Vec<TicketVariant>,
    #[serde(default)]
    pub promo_codes: Vec<PromoCode>,
    #[serde(default)]
    pub platform_fee: FeePayer,
    #[serde(default)]
    pub payment_gateway_fee: FeePayer,
}

fn invalid(message: impl Into<String>) -> AppError {
    AppError::ValidationError(message.into())
}

impl EventRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.name.trim().is_empty() {
            return Err(invalid("Event name is required"));
        }
        if self.timings.is_empty() {
            return Err(invalid("At least one event timing is required"));
        }
        if self.timings.iter().any(|t| t.end_time <= t.start_time) {
            return Err(invalid("Event timings must end after they start"));
        }
        if self.ticket_variants.is_empty() {
            return Err(invalid("At least one ticket variant is required"));
        }

        let mut types = HashSet::new();
        for variant in &self.ticket_variants {
            let ticket_type = variant.ticket_type.trim();
            if ticket_type.is_empty() {
                return Err(invalid("Ticket type is required"));
            }
            if !types.insert(ticket_type) {
                return Err(invalid(format!("Duplicate ticket type '{ticket_type}'")));
            }
            if variant.price < Decimal::ZERO {
                return Err(invalid(format!("Price of '{ticket_type}' cannot be negative")));
            }
            if variant.price > max_money() {
                return Err(invalid(format!("Price of '{ticket_type}' is too large")));
            }
            if variant.quantity <= 0 {
                return Err(invalid(format!("Quantity of '{ticket_type}' must be positive")));
            }
        }

        let mut codes = HashSet::new();
        for promo in &self.promo_codes {
            let code = promo.code.trim().to_uppercase();
            if code.is_empty() {
                return Err(invalid("Promo code is required"));
            }
            if promo.discount_value < Decimal::ZERO {
                return Err(invalid(format!("Discount of '{code}' cannot be negative")));
            }
            if promo.min_order_value < Decimal::ZERO {
                return Err(invalid(format!("Minimum order of '{code}' cannot be negative")));
            }
            if promo.discount_value > max_money() || promo.min_order_value > max_money() {
                return Err(invalid(format!("Amounts of '{code}' are too large")));
            }
            if !codes.insert(code.clone()) {
                return Err(invalid(format!("Duplicate promo code '{code}'")));
            }
        }
        Ok(())
    }

    fn apply_to(self, event: &mut Event) {
        event.name = self.name.trim().to_string();
        event.description = self.description;
        event.venue_id = self.venue_id;
        event.timings = self.timings;
        event.ticket_variants = self
            .ticket_variants
            .into_iter()
            .map(|v| TicketVariant {
                ticket_type: v.ticket_type.trim().to_string(),
                ..v
            })
            .collect();
        event.promo_codes = self
            .promo_codes
            .into_iter()
            .map(|p| PromoCode {
                code: p.code.trim().to_string(),
                ..p
            })
            .collect();
        event.platform_fee = self.platform_fee;
        event.payment_gateway_fee = self.payment_gateway_fee;
    }
}

fn event_not_found() -> AppError {
    AppError::NotFound("Event not found".to_string())
}

async fn check_venue(state: &AppState, venue_id: Option<Uuid>, organizer_id: Uuid) -> Result<(), AppError> {
    let Some(venue_id) = venue_id else {
        return Ok(());
    };
    match state.repos.venues.find(venue_id).await? {
        Some(venue) if venue.organizer_id == organizer_id => Ok(()),
        _ => Err(invalid("Venue not found")),
    }
}

async fn owned_event(state: &AppState, id: Uuid, organizer_id: Uuid) -> Result<Event, AppError> {
    state
        .repos
        .events
        .find(id)
        .await?
        .filter(|e| e.is_owned_by(organizer_id))
        .ok_or_else(event_not_found)
}

pub async fn create_event(
    State(state): State<AppState>,
    principal: AuthenticatedPrincipal,
    AppJson(body): AppJson<EventRequest>,
) -> Result<Response, AppError> {
    body.validate()?;
    check_venue(&state, body.venue_id, principal.id).await?;

    let now = Utc::now();
    let mut event = Event {
        id: Uuid::new_v4(),
        organizer_id: principal.id,
        venue_id: None,
        name: String::new(),
        description: None,
        status: EventStatus::Draft,
        timings: Vec::new(),
        ticket_variants: Vec::new(),
        promo_codes: Vec::new(),
        platform_fee: FeePayer::default(),
        payment_gateway_fee: FeePayer::default(),
        tickets_sold: 0,
        revenue: Decimal::ZERO,
        created_at: now,
        updated_at: now,
    };
    body.apply_to(&mut event);
    state.repos.events.insert(&event).await?;

    tracing::info!(event_id = %event.id, organizer_id = %principal.id, "Event created");
    Ok(created(event.owner_view(now), "Event created"))
}

pub async fn list_events(
    State(state): State<AppState>,
    principal: AuthenticatedPrincipal,
) -> Result<Response, AppError> {
    let now = Utc::now();
    let events: Vec<Event> = state
        .repos
        .events
        .list_by_organizer(principal.id)
        .await?
        .iter()
        .map(|e| e.owner_view(now))
        .collect();
    Ok(success(events, "Events retrieved"))
}

/// Published events are public; drafts are visible to their organizer only.
pub async fn get_event(
    State(state): State<AppState>,
    principal: Option<AuthenticatedPrincipal>,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let event = state.repos.events.find(id).await?.ok_or_else(event_not_found)?;
    let now = Utc::now();

    let is_owner = principal.is_some_and(|p| event.is_owned_by(p.id));
    if is_owner {
        return Ok(success(event.owner_view(now), "Event retrieved"));
    }
    if event.status == EventStatus::Draft {
        return Err(event_not_found());
    }
    Ok(success(event.public_view(now), "Event retrieved"))
}

pub async fn update_event(
    State(state): State<AppState>,
    principal: AuthenticatedPrincipal,
    Path(id): Path<Uuid>,
    AppJson(body): AppJson<EventRequest>,
) -> Result<Response, AppError> {
    body.validate()?;
    check_venue(&state, body.venue_id, principal.id).await?;

    let mut event = owned_event(&state, id, principal.id).await?;
    body.apply_to(&mut event);
    event.updated_at = Utc::now();

    if !state.repos.events.update(&event).await? {
        return Err(event_not_found());
    }

    tracing::info!(event_id = %event.id, "Event updated");
    Ok(success(event.owner_view(event.updated_at), "Event updated"))
}

pub async fn publish_event(
    State(state): State<AppState>,
    principal: AuthenticatedPrincipal,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let mut event = owned_event(&state, id, principal.id).await?;
    if event.status != EventStatus::Draft {
        return Err(invalid("Only draft events can be published"));
    }

    event.status = EventStatus::Active;
    event.updated_at = Utc::now();
    if !state.repos.events.update(&event).await? {
        return Err(event_not_found());
    }

    tracing::info!(event_id = %event.id, "Event published");
    Ok(success(event.owner_view(event.updated_at), "Event published"))
}

pub async fn delete_event(
    State(state): State<AppState>,
    principal: AuthenticatedPrincipal,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let event = owned_event(&state, id, principal.id).await?;
    if event.tickets_sold > 0 {
        return Err(invalid("Events with sold tickets cannot be deleted"));
    }

    if !state.repos.events.delete(id, principal.id).await? {
        return Err(event_not_found());
    }

    tracing::info!(event_id = %id, "Event deleted");
    Ok(empty_success("Event deleted"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DiscountType;
    use chrono::{NaiveDate, NaiveTime};

    fn request() -> EventRequest {
        EventRequest {
            name: "Jazz Night".to_string(),
            description: None,
            venue_id: None,
            timings: vec![EventTiming {
                date: NaiveDate::from_ymd_opt(2030, 3, 14).unwrap(),
                start_time: NaiveTime::from_hms_opt(20, 0, 0).unwrap(),
                end_time: NaiveTime::from_hms_opt(23, 30, 0).unwrap(),
            }],
            ticket_variants: vec![TicketVariant {
                ticket_type: "GA".to_string(),
                price: Decimal::new(25, 0),
                quantity: 200,
            }],
            promo_codes: vec![PromoCode {
                code: "EARLY".to_string(),
                discount_type: DiscountType::Percent,
                discount_value: Decimal::new(10, 0),
                min_order_value: Decimal::ZERO,
            }],
            platform_fee: FeePayer::User,
            payment_gateway_fee: FeePayer::Organizer,
        }
    }

    #[test]
    fn test_valid_request() {
        assert!(request().validate().is_ok());
    }

    #[test]
    fn test_rejects_structural_problems() {
        let mut no_timings = request();
        no_timings.timings.clear();
        assert!(no_timings.validate().is_err());

        let mut duplicate_type = request();
        duplicate_type.ticket_variants.push(duplicate_type.ticket_variants[0].clone());
        assert!(duplicate_type.validate().is_err());

        let mut zero_quantity = request();
        zero_quantity.ticket_variants[0].quantity = 0;
        assert!(zero_quantity.validate().is_err());

        let mut negative_price = request();
        negative_price.ticket_variants[0].price = Decimal::new(-1, 0);
        assert!(negative_price.validate().is_err());
    }

    #[test]
    fn test_rejects_amounts_beyond_money_columns() {
        let mut huge_price = request();
        huge_price.ticket_variants[0].price =
            Decimal::from_str_exact("70000000000000000000000000000").unwrap();
        assert!(matches!(
            huge_price.validate(),
            Err(AppError::ValidationError(msg)) if msg.contains("too large")
        ));

        let mut largest = request();
        largest.ticket_variants[0].price = max_money();
        assert!(largest.validate().is_ok());

        let mut huge_discount = request();
        huge_discount.promo_codes[0].discount_value = Decimal::MAX;
        assert!(huge_discount.validate().is_err());
    }

    #[test]
    fn test_promo_codes_unique_ignoring_case() {
        let mut req = request();
        let mut clash = req.promo_codes[0].clone();
        clash.code = "early".to_string();
        req.promo_codes.push(clash);
        assert!(matches!(req.validate(), Err(AppError::ValidationError(msg)) if msg.contains("Duplicate")));
    }
}
