use axum::{extract::State, response::Response};
use chrono::Utc;

use crate::auth::AuthenticatedPrincipal;
use crate::services::dashboard::organizer_dashboard;
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::success;

pub async fn get_dashboard(
    State(state): State<AppState>,
    principal: AuthenticatedPrincipal,
) -> Result<Response, AppError> {
    let stats =
        organizer_dashboard(state.repos.dashboard.as_ref(), principal.id, Utc::now()).await?;
    Ok(success(stats, "Dashboard retrieved"))
}
