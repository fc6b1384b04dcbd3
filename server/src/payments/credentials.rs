use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use std::fmt;
use uuid::Uuid;

use crate::db::Repositories;
use crate::utils::error::AppError;

const NONCE_LEN: usize = 12;

/// Key pair used to talk to the payment gateway and to verify its signatures.
#[derive(Clone, PartialEq, Eq)]
pub struct GatewayCredentials {
    pub key_id: String,
    pub key_secret: String,
}

impl GatewayCredentials {
    /// Secret with everything but the last four characters hidden.
    pub fn masked_secret(secret: &str) -> String {
        let visible: String = secret
            .chars()
            .rev()
            .take(4)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        format!("****{visible}")
    }
}

impl fmt::Debug for GatewayCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayCredentials")
            .field("key_id", &self.key_id)
            .field("key_secret", &"<redacted>")
            .finish()
    }
}

/// AES-256-GCM encryption of stored gateway secrets. Output is
/// `base64(nonce || ciphertext)` with a fresh random nonce per call.
pub struct CredentialCipher {
    cipher: Aes256Gcm,
}

impl CredentialCipher {
    pub fn new(key: &[u8; 32]) -> Result<Self, AppError> {
        let cipher = Aes256Gcm::new_from_slice(key).map_err(|e| {
            AppError::InternalServerError(format!("Failed to initialize AES-256-GCM cipher: {e}"))
        })?;
        Ok(Self { cipher })
    }

    pub fn encrypt(&self, plaintext: &str) -> Result<String, AppError> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|e| AppError::InternalServerError(format!("Encryption failed: {e}")))?;

        let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(&nonce);
        sealed.extend_from_slice(&ciphertext);
        Ok(BASE64.encode(sealed))
    }

    pub fn decrypt(&self, sealed: &str) -> Result<String, AppError> {
        let bytes = BASE64.decode(sealed).map_err(|e| {
            AppError::InternalServerError(format!("Stored secret is not valid base64: {e}"))
        })?;

        if bytes.len() <= NONCE_LEN {
            return Err(AppError::InternalServerError(
                "Stored secret is too short".to_string(),
            ));
        }

        let (nonce, ciphertext) = bytes.split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|e| AppError::InternalServerError(format!("Decryption failed: {e}")))?;

        String::from_utf8(plaintext).map_err(|e| {
            AppError::InternalServerError(format!("Decrypted secret is not UTF-8: {e}"))
        })
    }
}

/// Credentials used for an organizer's events: their own stored config, else the
/// platform account.
pub async fn resolve_credentials(
    repos: &Repositories,
    cipher: &CredentialCipher,
    platform: Option<&GatewayCredentials>,
    organizer_id: Uuid,
) -> Result<GatewayCredentials, AppError> {
    if let Some(config) = repos.payment_configs.find(organizer_id).await? {
        return Ok(GatewayCredentials {
            key_id: config.key_id,
            key_secret: cipher.decrypt(&config.encrypted_secret)?,
        });
    }

    platform.cloned().ok_or_else(|| {
        AppError::GatewayError("Payments are not configured for this event".to_string())
    })
}
