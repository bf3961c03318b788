//! PayPal webhook handler.
//!
//! Deliveries are accepted without signature verification; PayPal's
//! verification requires a round trip to their verify-webhook-signature API
//! and is not wired up yet. Anyone who can reach this endpoint can therefore
//! mutate invoice status.
//! TODO: verify deliveries against /v1/notifications/verify-webhook-signature
//! before trusting the payload.

use crate::core::invoices::{self, InvoiceUpdate};
use crate::providers::Platform;
use crate::webhook::{WebhookState, string_at};
use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use std::sync::Arc;
use tracing::{info, warn};

const HANDLED_EVENTS: [&str; 3] = [
    "INVOICING.INVOICE.PAID",
    "INVOICING.INVOICE.CANCELLED",
    "INVOICING.INVOICE.REFUNDED",
];

/// POST `/webhook/paypal`
pub async fn handle(
    State(state): State<Arc<WebhookState>>,
    Json(event): Json<serde_json::Value>,
) -> (StatusCode, &'static str) {
    let event_type = string_at(&event, &["event_type"]);
    if !HANDLED_EVENTS.contains(&event_type.as_str()) {
        return (StatusCode::OK, "OK");
    }

    let resource = &event["resource"];
    let amount = string_at(resource, &["amount", "value"])
        .parse::<f64>()
        .unwrap_or(0.0);
    let customer_email = resource["primary_recipients"]
        .get(0)
        .map(|r| string_at(r, &["billing_info", "email_address"]))
        .unwrap_or_default();

    let update = InvoiceUpdate {
        customer_email,
        amount,
        currency: string_at(resource, &["amount", "currency_code"]),
        description: string_at(resource, &["note"]),
        status: string_at(resource, &["status"]),
        platform: Platform::Paypal,
        transaction_id: string_at(resource, &["id"]),
        notified: true,
    };

    match invoices::apply_webhook_update(&state.db, &update).await {
        Ok(row) => {
            info!(event = %event_type, invoice = %row.transaction_id, "PayPal invoice event applied");
        }
        Err(e) => warn!(error = %e, "Failed to apply PayPal invoice event"),
    }
    (StatusCode::OK, "OK")
}
