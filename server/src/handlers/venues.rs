use axum::{
    extract::{Path, State},
    response::Response,
};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::AuthenticatedPrincipal;
use crate::models::Venue;
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::extract::AppJson;
use crate::utils::response::{created, empty_success, success};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VenueRequest {
    pub name: String,
    pub address: String,
    pub city: String,
    pub capacity: Option<i32>,
}

impl VenueRequest {
    fn validate(&self) -> Result<(), AppError> {
        if self.name.trim().is_empty() {
            return Err(AppError::ValidationError("Venue name is required".to_string()));
        }
        if self.address.trim().is_empty() || self.city.trim().is_empty() {
            return Err(AppError::ValidationError(
                "Venue address and city are required".to_string(),
            ));
        }
        if self.capacity.is_some_and(|c| c <= 0) {
            return Err(AppError::ValidationError(
                "Capacity must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

fn venue_not_found() -> AppError {
    AppError::NotFound("Venue not found".to_string())
}

async fn owned_venue(state: &AppState, id: Uuid, organizer_id: Uuid) -> Result<Venue, AppError> {
    state
        .repos
        .venues
        .find(id)
        .await?
        .filter(|v| v.organizer_id == organizer_id)
        .ok_or_else(venue_not_found)
}

pub async fn create_venue(
    State(state): State<AppState>,
    principal: AuthenticatedPrincipal,
    AppJson(body): AppJson<VenueRequest>,
) -> Result<Response, AppError> {
    body.validate()?;

    let now = Utc::now();
    let venue = Venue {
        id: Uuid::new_v4(),
        organizer_id: principal.id,
        name: body.name.trim().to_string(),
        address: body.address.trim().to_string(),
        city: body.city.trim().to_string(),
        capacity: body.capacity,
        created_at: now,
        updated_at: now,
    };
    state.repos.venues.insert(&venue).await?;

    Ok(created(venue, "Venue created"))
}

pub async fn list_venues(
    State(state): State<AppState>,
    principal: AuthenticatedPrincipal,
) -> Result<Response, AppError> {
    let venues = state.repos.venues.list_by_organizer(principal.id).await?;
    Ok(success(venues, "Venues retrieved"))
}

pub async fn get_venue(
    State(state): State<AppState>,
    principal: AuthenticatedPrincipal,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let venue = owned_venue(&state, id, principal.id).await?;
    Ok(success(venue, "Venue retrieved"))
}

pub async fn update_venue(
    State(state): State<AppState>,
    principal: AuthenticatedPrincipal,
    Path(id): Path<Uuid>,
    AppJson(body): AppJson<VenueRequest>,
) -> Result<Response, AppError> {
    body.validate()?;
    let existing = owned_venue(&state, id, principal.id).await?;

    let venue = Venue {
        name: body.name.trim().to_string(),
        address: body.address.trim().to_string(),
        city: body.city.trim().to_string(),
        capacity: body.capacity,
        updated_at: Utc::now(),
        ..existing
    };
    if !state.repos.venues.update(&venue).await? {
        return Err(venue_not_found());
    }

    Ok(success(venue, "Venue updated"))
}

pub async fn delete_venue(
    State(state): State<AppState>,
    principal: AuthenticatedPrincipal,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    if !state.repos.venues.delete(id, principal.id).await? {
        return Err(venue_not_found());
    }
    Ok(empty_success("Venue deleted"))
}
