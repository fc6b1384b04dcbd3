use std::env;
use std::fmt::Display;
use std::str::FromStr;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use thiserror::Error;
use tracing::{info, warn};

pub mod cors;
pub mod security;

pub use cors::create_cors_layer;
pub use security::create_security_headers_layer;

const DEFAULT_DATABASE_URL: &str = "postgres://localhost/ticketdesk";
const DEFAULT_GATEWAY_BASE_URL: &str = "https://api.razorpay.com/v1";
const DEV_SESSION_SECRET: &str = "ticketdesk-dev-session-secret";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub host: String,
    pub port: u16,
    pub session_secret: String,
    pub payment_config_key: [u8; 32],
    pub gateway_base_url: String,
    pub gateway_key_id: Option<String>,
    pub gateway_key_secret: Option<String>,
    pub default_currency: String,
    pub checkout_ttl_minutes: i64,
    pub cors_allowed_origins: Option<String>,
    /// `RUST_ENV=production`; enables HSTS.
    pub production: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
            database_max_connections: parse_or("DATABASE_MAX_CONNECTIONS", 5)?,
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: parse_or("PORT", 3001)?,
            session_secret: env::var("SESSION_SECRET").unwrap_or_else(|_| {
                warn!("SESSION_SECRET not set, using the development secret");
                DEV_SESSION_SECRET.to_string()
            }),
            payment_config_key: payment_config_key()?,
            gateway_base_url: env::var("GATEWAY_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_GATEWAY_BASE_URL.to_string()),
            gateway_key_id: env::var("GATEWAY_KEY_ID").ok(),
            gateway_key_secret: env::var("GATEWAY_KEY_SECRET").ok(),
            default_currency: env::var("DEFAULT_CURRENCY").unwrap_or_else(|_| "INR".to_string()),
            checkout_ttl_minutes: parse_or("CHECKOUT_TTL_MINUTES", 10)?,
            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS").ok(),
            production: env::var("RUST_ENV")
                .map(|v| v.eq_ignore_ascii_case("production"))
                .unwrap_or(false),
        })
    }
}

fn parse_or<T>(key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr + Display,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            reason: e.to_string(),
        }),
        Err(_) => {
            info!("{key} not set, using default: {default}");
            Ok(default)
        }
    }
}

fn payment_config_key() -> Result<[u8; 32], ConfigError> {
    let Ok(encoded) = env::var("PAYMENT_CONFIG_KEY") else {
        warn!("PAYMENT_CONFIG_KEY not set, stored gateway secrets use an all-zero development key");
        return Ok([0u8; 32]);
    };

    let bytes = BASE64
        .decode(encoded.trim())
        .map_err(|e| ConfigError::Invalid {
            key: "PAYMENT_CONFIG_KEY",
            reason: e.to_string(),
        })?;

    bytes.try_into().map_err(|b: Vec<u8>| ConfigError::Invalid {
        key: "PAYMENT_CONFIG_KEY",
        reason: format!("expected 32 bytes, got {}", b.len()),
    })
}
