use chrono::Duration;
use std::sync::Arc;

use crate::auth::{AuthenticatedPrincipal, SessionVerifier};
use crate::db::Repositories;
use crate::payments::{CredentialCipher, GatewayCredentials, PaymentGateway};
use crate::services::checkout::GatewayAccess;

/// Deployment-wide settings the handlers read.
#[derive(Debug, Clone)]
pub struct AppSettings {
    /// Fallback account for organizers without their own payment config.
    pub platform_credentials: Option<GatewayCredentials>,
    pub default_currency: String,
    pub checkout_ttl: Duration,
    /// Comma-separated CORS origins; local frontends when unset.
    pub allowed_origins: Option<String>,
    pub include_hsts: bool,
}

impl AppSettings {
    /// Session currency when the principal carries one, else the deployment default.
    pub fn currency_for(&self, principal: &AuthenticatedPrincipal) -> String {
        principal
            .currency
            .clone()
            .unwrap_or_else(|| self.default_currency.clone())
    }
}

#[derive(Clone)]
pub struct AppState {
    pub repos: Repositories,
    pub sessions: Arc<dyn SessionVerifier>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub cipher: Arc<CredentialCipher>,
    pub settings: Arc<AppSettings>,
}

impl AppState {
    pub fn gateway_access(&self) -> GatewayAccess<'_> {
        GatewayAccess {
            gateway: self.gateway.as_ref(),
            cipher: &self.cipher,
            platform: self.settings.platform_credentials.as_ref(),
        }
    }
}
