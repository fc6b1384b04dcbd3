use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Gateway credentials of an organizer. `encrypted_secret` is
/// `base64(nonce || AES-256-GCM ciphertext)` and is never serialized.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PaymentConfig {
    pub organizer_id: Uuid,
    pub key_id: String,
    #[serde(skip_serializing)]
    pub encrypted_secret: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
