//! HTTP webhook ingestion.
//!
//! One POST route per payment platform. Each handler authenticates the
//! delivery its platform's way, maps the payload onto
//! [`crate::core::invoices::InvoiceUpdate`] and merges it into the canonical
//! record. Authentication failures are rejected with 400; once a delivery is
//! authenticated the platform always gets 200 back, even when the internal
//! merge fails, so providers do not retry events we have already judged.

use axum::{Router, routing::post};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

/// PayPal lifecycle events
pub mod paypal;
/// Square lifecycle events
pub mod square;
/// Stripe lifecycle events
pub mod stripe;

/// Shared state for all webhook handlers.
#[derive(Clone)]
pub struct WebhookState {
    /// Database connection for invoice reconciliation
    pub db: DatabaseConnection,
    /// Stripe webhook signing secret
    pub stripe_webhook_secret: String,
    /// Square webhook signature key
    pub square_signature_key: String,
}

/// Builds the webhook router with one route per platform.
pub fn router(state: WebhookState) -> Router {
    Router::new()
        .route("/webhook/stripe", post(stripe::handle))
        .route("/webhook/paypal", post(paypal::handle))
        .route("/webhook/square", post(square::handle))
        .with_state(Arc::new(state))
}

/// Constant-time byte comparison for signature checks.
pub(crate) fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

/// Reads a string at a JSON path, defaulting to empty. Providers omit
/// optional fields freely, and an absent value maps to the empty string the
/// same way a missing field did upstream.
pub(crate) fn string_at(value: &serde_json::Value, path: &[&str]) -> String {
    let mut current = value;
    for key in path {
        match current.get(key) {
            Some(next) => current = next,
            None => return String::new(),
        }
    }
    current.as_str().unwrap_or_default().to_string()
}
