//! Stripe webhook handler.
//!
//! Verifies the `stripe-signature` header (HMAC-SHA256 over
//! `"{timestamp}.{raw body}"`, hex-encoded, with a 5 minute freshness
//! window) before touching the payload, so the raw request body must reach
//! the handler unparsed.

use crate::core::invoices::{self, InvoiceUpdate};
use crate::errors::{Error, Result};
use crate::providers::Platform;
use crate::webhook::{WebhookState, constant_time_eq, string_at};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::sync::Arc;
use tracing::{info, warn};

/// Maximum accepted age of a signed timestamp, in seconds.
const TOLERANCE_SECS: i64 = 300;

const HANDLED_EVENTS: [&str; 3] = [
    "invoice.paid",
    "invoice.payment_failed",
    "invoice.finalized",
];

/// POST `/webhook/stripe`
pub async fn handle(
    State(state): State<Arc<WebhookState>>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, &'static str) {
    let Some(signature) = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok())
    else {
        warn!("Missing stripe-signature header");
        return (StatusCode::BAD_REQUEST, "Missing signature");
    };

    if let Err(e) = verify_signature(&body, signature, &state.stripe_webhook_secret) {
        warn!(error = %e, "Stripe signature verification failed");
        return (StatusCode::BAD_REQUEST, "Invalid signature");
    }

    // Authenticated from here on: always 200 so Stripe stops redelivering
    let Ok(event) = serde_json::from_slice::<serde_json::Value>(&body) else {
        warn!("Stripe webhook body is not valid JSON");
        return (StatusCode::OK, "OK");
    };

    let event_type = string_at(&event, &["type"]);
    if !HANDLED_EVENTS.contains(&event_type.as_str()) {
        return (StatusCode::OK, "OK");
    }

    let object = &event["data"]["object"];
    let update = InvoiceUpdate {
        customer_email: string_at(object, &["customer_email"]),
        amount: object["amount_due"].as_f64().unwrap_or(0.0) / 100.0,
        currency: string_at(object, &["currency"]),
        description: string_at(object, &["description"]),
        status: string_at(object, &["status"]),
        platform: Platform::Stripe,
        transaction_id: string_at(object, &["id"]),
        notified: true,
    };

    match invoices::apply_webhook_update(&state.db, &update).await {
        Ok(row) => {
            info!(event = %event_type, invoice = %row.transaction_id, "Stripe invoice event applied");
        }
        Err(e) => warn!(error = %e, "Failed to apply Stripe invoice event"),
    }
    (StatusCode::OK, "OK")
}

/// Checks the `t=<ts>,v1=<hex>` signature scheme against the raw body.
fn verify_signature(payload: &[u8], signature: &str, secret: &str) -> Result<()> {
    let mut timestamp: Option<&str> = None;
    let mut sig_v1: Option<&str> = None;
    for part in signature.split(',') {
        if let Some((key, value)) = part.split_once('=') {
            match key {
                "t" => timestamp = Some(value),
                "v1" => sig_v1 = Some(value),
                _ => {}
            }
        }
    }
    let timestamp = timestamp.ok_or_else(|| Error::webhook_auth("missing timestamp"))?;
    let sig_v1 = sig_v1.ok_or_else(|| Error::webhook_auth("missing v1 signature"))?;

    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .map_err(|_| Error::webhook_auth("invalid signing secret"))?;
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(payload);
    let expected = hex::encode(mac.finalize().into_bytes());

    if !constant_time_eq(sig_v1.as_bytes(), expected.as_bytes()) {
        return Err(Error::webhook_auth("signature mismatch"));
    }

    let ts: i64 = timestamp
        .parse()
        .map_err(|_| Error::webhook_auth("invalid timestamp"))?;
    let now = chrono::Utc::now().timestamp();
    if (now - ts).abs() > TOLERANCE_SECS {
        return Err(Error::webhook_auth("timestamp outside tolerance"));
    }
    Ok(())
}
