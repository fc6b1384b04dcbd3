use axum::{extract::State, response::Response};
use chrono::Utc;
use serde::Deserialize;

use crate::auth::AuthenticatedPrincipal;
use crate::models::User;
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::extract::AppJson;
use crate::utils::response::success;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub name: String,
    pub email: Option<String>,
    pub currency: Option<String>,
}

pub async fn get_me(
    State(state): State<AppState>,
    principal: AuthenticatedPrincipal,
) -> Result<Response, AppError> {
    let user = state
        .repos
        .users
        .find(principal.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))?;

    Ok(success(user, "Profile retrieved"))
}

/// Creates the profile on first call. Email and currency default to the session's.
pub async fn update_me(
    State(state): State<AppState>,
    principal: AuthenticatedPrincipal,
    AppJson(body): AppJson<UpdateProfileRequest>,
) -> Result<Response, AppError> {
    let name = body.name.trim();
    if name.is_empty() {
        return Err(AppError::ValidationError("Name is required".to_string()));
    }

    let currency = body
        .currency
        .map(|c| c.trim().to_uppercase())
        .unwrap_or_else(|| state.settings.currency_for(&principal));
    if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(AppError::ValidationError(
            "Currency must be a three-letter ISO code".to_string(),
        ));
    }

    let now = Utc::now();
    let user = User {
        id: principal.id,
        name: name.to_string(),
        email: body.email.unwrap_or(principal.email),
        currency,
        created_at: now,
        updated_at: now,
    };

    let stored = state.repos.users.upsert(&user).await?;
    tracing::info!(user_id = %stored.id, "Profile updated");

    Ok(success(stored, "Profile updated"))
}
