use chrono::Duration;
use dotenvy::dotenv;
use sqlx::postgres::PgPoolOptions;
use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use ticketdesk_server::auth::HmacSessionVerifier;
use ticketdesk_server::config::Config;
use ticketdesk_server::db::Repositories;
use ticketdesk_server::payments::{CredentialCipher, GatewayCredentials, RazorpayGateway};
use ticketdesk_server::routes::create_routes;
use ticketdesk_server::state::{AppSettings, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,ticketdesk_server=debug")),
        )
        .init();

    let config = Config::from_env()?;

    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await?;

    tracing::info!("Successfully connected to database");

    sqlx::migrate!().run(&pool).await?;

    tracing::info!("Migrations run successfully");

    let platform_credentials = match (config.gateway_key_id, config.gateway_key_secret) {
        (Some(key_id), Some(key_secret)) => Some(GatewayCredentials { key_id, key_secret }),
        _ => {
            tracing::warn!("GATEWAY_KEY_ID/GATEWAY_KEY_SECRET not set, only organizers with their own payment config can sell");
            None
        }
    };

    let state = AppState {
        repos: Repositories::postgres(pool),
        sessions: Arc::new(HmacSessionVerifier::new(&config.session_secret)),
        gateway: Arc::new(RazorpayGateway::new(&config.gateway_base_url)?),
        cipher: Arc::new(CredentialCipher::new(&config.payment_config_key)?),
        settings: Arc::new(AppSettings {
            platform_credentials,
            default_currency: config.default_currency,
            checkout_ttl: Duration::minutes(config.checkout_ttl_minutes),
            allowed_origins: config.cors_allowed_origins,
            include_hsts: config.production,
        }),
    };

    let app = create_routes(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    tracing::info!("Server running at http://{}", addr);

    let listener = TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
