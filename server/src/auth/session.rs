use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use uuid::Uuid;

use super::AuthenticatedPrincipal;
use crate::utils::error::AppError;

type HmacSha256 = Hmac<Sha256>;

/// Resolves a bearer token into the caller it was issued for.
pub trait SessionVerifier: Send + Sync {
    fn verify(&self, token: &str) -> Result<AuthenticatedPrincipal, AppError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: Uuid,
    pub email: String,
    #[serde(default)]
    pub currency: Option<String>,
    /// Unix seconds.
    pub exp: i64,
}

/// Tokens of the form `base64url(claims json).hex(hmac-sha256(payload))`.
pub struct HmacSessionVerifier {
    secret: Vec<u8>,
}

impl HmacSessionVerifier {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            secret: secret.as_ref().to_vec(),
        }
    }

    fn mac(&self, payload: &str) -> Result<HmacSha256, AppError> {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| AppError::InternalServerError(format!("Invalid session secret: {e}")))?;
        mac.update(payload.as_bytes());
        Ok(mac)
    }

    pub fn issue(&self, claims: &SessionClaims) -> Result<String, AppError> {
        let json = serde_json::to_vec(claims)
            .map_err(|e| AppError::InternalServerError(format!("Failed to encode claims: {e}")))?;
        let payload = URL_SAFE_NO_PAD.encode(json);
        let signature = hex::encode(self.mac(&payload)?.finalize().into_bytes());
        Ok(format!("{payload}.{signature}"))
    }
}

fn invalid() -> AppError {
    AppError::AuthError("Invalid session token".to_string())
}

impl SessionVerifier for HmacSessionVerifier {
    fn verify(&self, token: &str) -> Result<AuthenticatedPrincipal, AppError> {
        let (payload, signature) = token.split_once('.').ok_or_else(invalid)?;
        let signature = hex::decode(signature).map_err(|_| invalid())?;

        self.mac(payload)?
            .verify_slice(&signature)
            .map_err(|_| invalid())?;

        let json = URL_SAFE_NO_PAD.decode(payload).map_err(|_| invalid())?;
        let claims: SessionClaims = serde_json::from_slice(&json).map_err(|_| invalid())?;

        if claims.exp <= Utc::now().timestamp() {
            return Err(AppError::AuthError("Session expired".to_string()));
        }

        Ok(AuthenticatedPrincipal {
            id: claims.sub,
            email: claims.email,
            currency: claims.currency,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(exp_offset: i64) -> SessionClaims {
        SessionClaims {
            sub: Uuid::new_v4(),
            email: "organizer@example.com".to_string(),
            currency: Some("INR".to_string()),
            exp: Utc::now().timestamp() + exp_offset,
        }
    }

    #[test]
    fn test_issued_token_verifies() {
        let verifier = HmacSessionVerifier::new("session-secret");
        let claims = claims(3600);
        let token = verifier.issue(&claims).unwrap();

        let principal = verifier.verify(&token).unwrap();
        assert_eq!(principal.id, claims.sub);
        assert_eq!(principal.email, claims.email);
        assert_eq!(principal.currency.as_deref(), Some("INR"));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let verifier = HmacSessionVerifier::new("session-secret");
        let token = verifier.issue(&claims(-5)).unwrap();
        assert!(matches!(verifier.verify(&token), Err(AppError::AuthError(msg)) if msg == "Session expired"));
    }

    #[test]
    fn test_foreign_or_tampered_tokens_are_rejected() {
        let verifier = HmacSessionVerifier::new("session-secret");
        let foreign = HmacSessionVerifier::new("other").issue(&claims(3600)).unwrap();
        assert!(verifier.verify(&foreign).is_err());

        let token = verifier.issue(&claims(3600)).unwrap();
        let (_, signature) = token.split_once('.').unwrap();
        let forged_payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims(3600)).unwrap());
        assert!(verifier.verify(&format!("{forged_payload}.{signature}")).is_err());

        assert!(verifier.verify("not-a-token").is_err());
    }
}
