use axum::{extract::State, response::Response};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::auth::AuthenticatedPrincipal;
use crate::models::PaymentConfig;
use crate::payments::GatewayCredentials;
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::extract::AppJson;
use crate::utils::response::{empty_success, success};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentConfigRequest {
    pub key_id: String,
    pub key_secret: String,
}

/// Stored config as shown back to its owner. The secret never leaves the server.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentConfigView {
    pub key_id: String,
    pub masked_secret: String,
    pub updated_at: chrono::DateTime<Utc>,
}

fn view(config: &PaymentConfig, secret: &str) -> PaymentConfigView {
    PaymentConfigView {
        key_id: config.key_id.clone(),
        masked_secret: GatewayCredentials::masked_secret(secret),
        updated_at: config.updated_at,
    }
}

pub async fn upsert_payment_config(
    State(state): State<AppState>,
    principal: AuthenticatedPrincipal,
    AppJson(body): AppJson<PaymentConfigRequest>,
) -> Result<Response, AppError> {
    let key_id = body.key_id.trim();
    let key_secret = body.key_secret.trim();
    if key_id.is_empty() || key_secret.is_empty() {
        return Err(AppError::ValidationError(
            "keyId and keySecret are required".to_string(),
        ));
    }

    let now = Utc::now();
    let config = PaymentConfig {
        organizer_id: principal.id,
        key_id: key_id.to_string(),
        encrypted_secret: state.cipher.encrypt(key_secret)?,
        created_at: now,
        updated_at: now,
    };
    state.repos.payment_configs.upsert(&config).await?;

    tracing::info!(organizer_id = %principal.id, key_id = %config.key_id, "Payment config saved");
    Ok(success(view(&config, key_secret), "Payment config saved"))
}

pub async fn get_payment_config(
    State(state): State<AppState>,
    principal: AuthenticatedPrincipal,
) -> Result<Response, AppError> {
    let config = state
        .repos
        .payment_configs
        .find(principal.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Payment config not found".to_string()))?;

    let secret = state.cipher.decrypt(&config.encrypted_secret)?;
    Ok(success(view(&config, &secret), "Payment config retrieved"))
}

pub async fn delete_payment_config(
    State(state): State<AppState>,
    principal: AuthenticatedPrincipal,
) -> Result<Response, AppError> {
    if !state.repos.payment_configs.delete(principal.id).await? {
        return Err(AppError::NotFound("Payment config not found".to_string()));
    }

    tracing::info!(organizer_id = %principal.id, "Payment config deleted");
    Ok(empty_success("Payment config deleted"))
}
