//! Application settings loaded from environment variables.
//!
//! Mirrors the deploy environment: provider credentials, webhook secrets,
//! the outbound-call server URL and the comma-separated admin allow-list.
//! Only the database URL and webhook port have defaults; provider secrets
//! default to empty strings so a deployment can run with a subset of
//! platforms configured.

use crate::errors::Result;
use tracing::info;

/// Everything the process needs from its environment, in one place.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// `SeaORM` database URL
    pub database_url: String,
    /// Chat ids that are always treated as admins, in addition to DB rows
    pub admin_ids: Vec<String>,
    /// Port the webhook HTTP server listens on
    pub webhook_port: u16,
    /// Outbound-call server endpoint
    pub outbound_call_url: String,

    /// Stripe API secret key
    pub stripe_secret_key: String,
    /// Stripe webhook signing secret
    pub stripe_webhook_secret: String,

    /// PayPal REST client id
    pub paypal_client_id: String,
    /// PayPal REST client secret
    pub paypal_client_secret: String,
    /// "live" for production, anything else selects the sandbox
    pub paypal_env: String,

    /// "production" for live Square, anything else selects the sandbox
    pub square_env: String,
    /// Square access token
    pub square_access_token: String,
    /// Square location id used when creating invoices
    pub square_location_id: String,
    /// Square webhook signature key
    pub square_webhook_signature_key: String,
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

/// Loads the application configuration from the environment.
///
/// Never fails on missing provider credentials - an unconfigured platform
/// simply fails at call time with a provider error. The admin list accepts
/// the `ADMINS` variable as a comma-separated list of chat ids.
pub fn load_app_configuration() -> Result<AppConfig> {
    let admin_ids: Vec<String> = env_or("ADMINS", "")
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect();

    let webhook_port = env_or("WEBHOOK_PORT", "3000").parse().unwrap_or(3000);

    let config = AppConfig {
        database_url: env_or("DATABASE_URL", "sqlite://data/cashly.sqlite?mode=rwc"),
        admin_ids,
        webhook_port,
        outbound_call_url: env_or("API_URL", "http://localhost:8000/outbound-call"),
        stripe_secret_key: env_or("STRIPE_SECRET_KEY", ""),
        stripe_webhook_secret: env_or("WEBHOOK_SECRET", ""),
        paypal_client_id: env_or("PAYPAL_CLIENT_ID", ""),
        paypal_client_secret: env_or("PAYPAL_CLIENT_SECRET", ""),
        paypal_env: env_or("PAYPAL_ENV", "sandbox"),
        square_env: env_or("SQUARE_ENV", "sandbox"),
        square_access_token: env_or("SQUARE_ACCESS_TOKEN", ""),
        square_location_id: env_or("SQUARE_LOCATION_ID", ""),
        square_webhook_signature_key: env_or("SQUARE_WEBHOOK_SIGNATURE_KEY", ""),
    };

    info!(
        admins = config.admin_ids.len(),
        webhook_port = config.webhook_port,
        "Loaded application configuration"
    );
    Ok(config)
}
