//! Request identity. Sessions are minted by the external identity provider;
//! this service only verifies the bearer token and reads who the caller is.

pub mod session;

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use session::{HmacSessionVerifier, SessionClaims, SessionVerifier};

use crate::state::AppState;
use crate::utils::error::AppError;

/// The caller behind a verified session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatedPrincipal {
    pub id: Uuid,
    pub email: String,
    pub currency: Option<String>,
}

fn bearer_token(parts: &Parts) -> Result<&str, AppError> {
    let header = parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::AuthError("Missing authorization header".to_string()))?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| {
            AppError::AuthError("Invalid authorization format. Expected 'Bearer <token>'".to_string())
        })?
        .trim();

    if token.is_empty() {
        return Err(AppError::AuthError("Empty bearer token".to_string()));
    }
    Ok(token)
}

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedPrincipal {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        state.sessions.verify(token)
    }
}
