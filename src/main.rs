//! National Nines API server binary.

use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use nines_api::adapters::http::{api_router, AppState};
use nines_api::adapters::notify::StubNotifier;
use nines_api::adapters::postgres::{PostgresEntryRepository, PostgresOrderRepository};
use nines_api::adapters::stripe::{StripeCheckoutGateway, StripeGatewayConfig};
use nines_api::config::AppConfig;
use nines_api::domain::pricing::Pricing;
use nines_api::domain::webhook::WebhookSignatureVerifier;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::load()?;
    config.validate()?;

    if config.payment.is_test_mode() {
        tracing::warn!("Stripe is running in test mode");
    }

    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(&config.database.url)
        .await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let gateway_config = StripeGatewayConfig::new(SecretString::new(
        config.payment.stripe_api_key.clone(),
    ))
    .with_base_url(config.payment.stripe_api_base_url.clone())
    .with_timeout(Duration::from_secs(config.payment.request_timeout_secs));

    let state = AppState {
        entries: Arc::new(PostgresEntryRepository::new(pool.clone())),
        orders: Arc::new(PostgresOrderRepository::new(pool)),
        gateway: Arc::new(StripeCheckoutGateway::new(gateway_config)),
        notifier: Arc::new(StubNotifier),
        verifier: WebhookSignatureVerifier::new(SecretString::new(
            config.payment.stripe_webhook_secret.clone(),
        )),
        pricing: Pricing::new(config.pricing.clone()),
        frontend_url: config.payment.frontend_url.clone(),
    };

    let app = api_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = config.server.socket_addr();
    tracing::info!(%addr, "starting server");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
