//! Webhook ingestion service entry point.
//!
//! Brings up tracing, configuration and the database, builds the provider
//! registry from the configured credentials and serves the webhook routes.
//! The chat side of the system is a library surface: a deployment embeds
//! [`cashly_bot::bot::router::handle_event`] behind its concrete transport
//! and drives [`cashly_bot::core::reminder::run_reminder_sweep`] on its own
//! schedule.

use cashly_bot::config::database::{create_connection, create_tables};
use cashly_bot::config::load_app_configuration;
use cashly_bot::errors::Result;
use cashly_bot::webhook::{self, WebhookState};
use dotenvy::dotenv;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env, non-fatal since env vars can be set externally
    dotenv().ok();

    // 3. Load the application configuration
    let config = load_app_configuration()?;

    // 4. Initialize the database
    let db = create_connection(&config.database_url).await?;
    create_tables(&db).await?;
    info!("Database initialized");

    // 5. Serve the webhook routes
    let app = webhook::router(WebhookState {
        db,
        stripe_webhook_secret: config.stripe_webhook_secret.clone(),
        square_signature_key: config.square_webhook_signature_key.clone(),
    });
    let listener =
        tokio::net::TcpListener::bind(("0.0.0.0", config.webhook_port)).await?;
    info!(port = config.webhook_port, "Webhook server listening");
    axum::serve(listener, app).await?;

    Ok(())
}
