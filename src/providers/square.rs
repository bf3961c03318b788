//! Square adapter.
//!
//! Like Stripe, the whole sequence is synchronous: search-or-create the
//! customer, create the invoice, then publish it (which triggers Square's
//! invoice email).

use crate::errors::{Error, Result};
use crate::providers::{InvoiceProvider, InvoiceRequest, Platform, SentInvoice};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, error};

const SQUARE_API_BASE: &str = "https://connect.squareup.com";
const SQUARE_SANDBOX_API_BASE: &str = "https://connect.squareupsandbox.com";

/// Square invoice provider
#[derive(Clone)]
pub struct SquareProvider {
    client: Client,
    access_token: String,
    location_id: String,
    api_base: String,
}

impl SquareProvider {
    /// Creates an adapter; any `env` other than "production" selects the
    /// sandbox.
    #[must_use]
    pub fn new(
        access_token: impl Into<String>,
        location_id: impl Into<String>,
        env: &str,
    ) -> Self {
        let api_base = if env == "production" {
            SQUARE_API_BASE
        } else {
            SQUARE_SANDBOX_API_BASE
        };
        Self {
            client: Client::new(),
            access_token: access_token.into(),
            location_id: location_id.into(),
            api_base: api_base.to_string(),
        }
    }

    async fn square_request<T: for<'de> Deserialize<'de>>(
        &self,
        method: reqwest::Method,
        endpoint: &str,
        body: Option<serde_json::Value>,
    ) -> Result<T> {
        let url = format!("{}{endpoint}", self.api_base);

        let mut request = self
            .client
            .request(method, &url)
            .bearer_auth(&self.access_token);
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await.map_err(|e| {
            error!(error = %e, "Square API request failed");
            Error::provider("square", e.to_string())
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, "Square API error");
            return Err(Error::provider(
                "square",
                format!("Square API error: {status}"),
            ));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| Error::provider("square", format!("unexpected response shape: {e}")))
    }
}

#[async_trait]
impl InvoiceProvider for SquareProvider {
    fn platform(&self) -> Platform {
        Platform::Square
    }

    async fn create_or_find_customer(&self, name: &str, email: &str) -> Result<String> {
        debug!(email = %email, "Searching Square customers");
        let search: CustomerSearchResponse = self
            .square_request(
                reqwest::Method::POST,
                "/v2/customers/search",
                Some(json!({
                    "query": { "filter": { "email_address": { "exact": email } } }
                })),
            )
            .await?;
        if let Some(customer) = search.customers.into_iter().next() {
            return Ok(customer.id);
        }

        debug!(email = %email, "Creating Square customer");
        let created: CustomerResponse = self
            .square_request(
                reqwest::Method::POST,
                "/v2/customers",
                Some(json!({ "given_name": name, "email_address": email })),
            )
            .await?;
        Ok(created.customer.id)
    }

    async fn create_and_send_invoice(&self, request: &InvoiceRequest) -> Result<SentInvoice> {
        let customer_id = match &request.customer_id {
            Some(id) => id.clone(),
            None => {
                self.create_or_find_customer(&request.name, &request.email)
                    .await?
            }
        };

        #[allow(clippy::cast_possible_truncation)] // amounts stay far below 2^52 cents
        let cents = (request.amount * 100.0).round() as i64;
        let due_date = (Utc::now() + Duration::days(7)).format("%Y-%m-%d").to_string();

        let created: InvoiceResponse = self
            .square_request(
                reqwest::Method::POST,
                "/v2/invoices",
                Some(json!({
                    "invoice": {
                        "location_id": self.location_id,
                        "primary_recipient": { "customer_id": customer_id },
                        "payment_requests": [{
                            "request_type": "BALANCE",
                            "due_date": due_date,
                            "fixed_amount_requested_money": {
                                "amount": cents,
                                "currency": "USD",
                            },
                        }],
                        "title": request.description,
                        "delivery_method": "EMAIL",
                    }
                })),
            )
            .await?;

        // Publish triggers Square's invoice email
        let published: InvoiceResponse = self
            .square_request(
                reqwest::Method::POST,
                &format!("/v2/invoices/{}/publish", created.invoice.id),
                Some(json!({ "version": created.invoice.version })),
            )
            .await?;

        Ok(SentInvoice {
            url: published.invoice.public_url.unwrap_or_default(),
            status: published
                .invoice
                .status
                .unwrap_or_else(|| "sent".to_string()),
            provider_invoice_id: published.invoice.id,
            amount: request.amount,
        })
    }

    async fn invoice_status(&self, provider_invoice_id: &str) -> Result<String> {
        let response: InvoiceResponse = self
            .square_request(
                reqwest::Method::GET,
                &format!("/v2/invoices/{provider_invoice_id}"),
                None,
            )
            .await?;
        Ok(response.invoice.status.unwrap_or_default())
    }
}

#[derive(Debug, Deserialize)]
struct SquareCustomer {
    id: String,
}

#[derive(Debug, Deserialize)]
struct CustomerSearchResponse {
    #[serde(default)]
    customers: Vec<SquareCustomer>,
}

#[derive(Debug, Deserialize)]
struct CustomerResponse {
    customer: SquareCustomer,
}

#[derive(Debug, Deserialize)]
struct SquareInvoice {
    id: String,
    #[serde(default)]
    version: i64,
    status: Option<String>,
    public_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct InvoiceResponse {
    invoice: SquareInvoice,
}
