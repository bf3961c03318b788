//! Square webhook handler.
//!
//! Square signs deliveries with HMAC-SHA1 over the raw body, base64-encoded
//! in the `x-square-signature` header. Verification runs on the raw bytes
//! before any JSON parsing.

use crate::core::invoices::{self, InvoiceUpdate};
use crate::errors::{Error, Result};
use crate::providers::Platform;
use crate::webhook::{WebhookState, constant_time_eq, string_at};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use hmac::{Hmac, Mac};
use sha1::Sha1;
use std::sync::Arc;
use tracing::{info, warn};

const HANDLED_EVENTS: [&str; 3] = ["invoice.paid", "invoice.payment_failed", "invoice.canceled"];

/// POST `/webhook/square`
pub async fn handle(
    State(state): State<Arc<WebhookState>>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, &'static str) {
    let Some(signature) = headers
        .get("x-square-signature")
        .and_then(|v| v.to_str().ok())
    else {
        warn!("Missing x-square-signature header");
        return (StatusCode::BAD_REQUEST, "Invalid signature");
    };
    if let Err(e) = verify_signature(&body, signature, &state.square_signature_key) {
        warn!(error = %e, "Square signature verification failed");
        return (StatusCode::BAD_REQUEST, "Invalid signature");
    }

    let Ok(event) = serde_json::from_slice::<serde_json::Value>(&body) else {
        warn!("Square webhook body is not valid JSON");
        return (StatusCode::OK, "OK");
    };

    let event_type = string_at(&event, &["type"]);
    if !HANDLED_EVENTS.contains(&event_type.as_str()) {
        return (StatusCode::OK, "OK");
    }

    let invoice = &event["data"]["object"]["invoice"];
    let update = InvoiceUpdate {
        customer_email: string_at(invoice, &["primary_recipient", "customer_email"]),
        amount: invoice["amount_money"]["amount"].as_f64().unwrap_or(0.0) / 100.0,
        currency: string_at(invoice, &["amount_money", "currency"]),
        description: string_at(invoice, &["description"]),
        status: string_at(invoice, &["status"]),
        platform: Platform::Square,
        transaction_id: string_at(invoice, &["id"]),
        notified: true,
    };

    match invoices::apply_webhook_update(&state.db, &update).await {
        Ok(row) => {
            info!(event = %event_type, invoice = %row.transaction_id, "Square invoice event applied");
        }
        Err(e) => warn!(error = %e, "Failed to apply Square invoice event"),
    }
    (StatusCode::OK, "OK")
}

fn verify_signature(payload: &[u8], signature: &str, key: &str) -> Result<()> {
    let mut mac = Hmac::<Sha1>::new_from_slice(key.as_bytes())
        .map_err(|_| Error::webhook_auth("invalid signature key"))?;
    mac.update(payload);
    let expected = BASE64.encode(mac.finalize().into_bytes());
    if !constant_time_eq(signature.as_bytes(), expected.as_bytes()) {
        return Err(Error::webhook_auth("signature mismatch"));
    }
    Ok(())
}
