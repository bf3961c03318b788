//! Stripe adapter.
//!
//! Creation and send are synchronous on Stripe's side: the sequence
//! customer → invoice item → invoice → finalize → send either fully
//! succeeds or surfaces a provider error with nothing persisted locally.

use crate::errors::{Error, Result};
use crate::providers::{InvoiceProvider, InvoiceRequest, Platform, SentInvoice};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, error};

const STRIPE_API_BASE: &str = "https://api.stripe.com/v1";

/// Stripe invoice provider
#[derive(Clone)]
pub struct StripeProvider {
    client: Client,
    secret_key: String,
    api_base: String,
}

impl StripeProvider {
    /// Creates an adapter using the live Stripe API base.
    #[must_use]
    pub fn new(secret_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            secret_key: secret_key.into(),
            api_base: STRIPE_API_BASE.to_string(),
        }
    }

    /// Makes an authenticated form request to Stripe.
    async fn stripe_request<T: for<'de> Deserialize<'de>>(
        &self,
        method: reqwest::Method,
        endpoint: &str,
        form: Option<&[(&str, &str)]>,
    ) -> Result<T> {
        let url = format!("{}{endpoint}", self.api_base);

        let mut request = self
            .client
            .request(method, &url)
            .basic_auth(&self.secret_key, Option::<&str>::None);
        if let Some(form_data) = form {
            request = request.form(form_data);
        }

        let response = request.send().await.map_err(|e| {
            error!(error = %e, "Stripe API request failed");
            Error::provider("stripe", e.to_string())
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, "Stripe API error");
            return Err(Error::provider(
                "stripe",
                format!("Stripe API error: {status}"),
            ));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| Error::provider("stripe", format!("unexpected response shape: {e}")))
    }
}

#[async_trait]
impl InvoiceProvider for StripeProvider {
    fn platform(&self) -> Platform {
        Platform::Stripe
    }

    async fn create_or_find_customer(&self, name: &str, email: &str) -> Result<String> {
        debug!(email = %email, "Looking up Stripe customer");
        let existing: StripeCustomerList = self
            .stripe_request(
                reqwest::Method::GET,
                &format!("/customers?email={email}&limit=1"),
                None,
            )
            .await?;
        if let Some(customer) = existing.data.into_iter().next() {
            return Ok(customer.id);
        }

        debug!(email = %email, "Creating Stripe customer");
        let created: StripeCustomer = self
            .stripe_request(
                reqwest::Method::POST,
                "/customers",
                Some(&[("name", name), ("email", email)]),
            )
            .await?;
        Ok(created.id)
    }

    async fn create_and_send_invoice(&self, request: &InvoiceRequest) -> Result<SentInvoice> {
        let customer_id = match &request.customer_id {
            Some(id) => id.clone(),
            None => {
                self.create_or_find_customer(&request.name, &request.email)
                    .await?
            }
        };

        // Pending invoice items are swept into the next invoice for the customer
        let cents = (request.amount * 100.0).round().to_string();
        let _: serde_json::Value = self
            .stripe_request(
                reqwest::Method::POST,
                "/invoiceitems",
                Some(&[
                    ("customer", customer_id.as_str()),
                    ("amount", cents.as_str()),
                    ("currency", "usd"),
                    ("description", request.description.as_str()),
                ]),
            )
            .await?;

        let invoice: StripeInvoice = self
            .stripe_request(
                reqwest::Method::POST,
                "/invoices",
                Some(&[
                    ("customer", customer_id.as_str()),
                    ("collection_method", "send_invoice"),
                    ("days_until_due", "30"),
                ]),
            )
            .await?;

        let _: StripeInvoice = self
            .stripe_request(
                reqwest::Method::POST,
                &format!("/invoices/{}/finalize", invoice.id),
                None,
            )
            .await?;

        // Send triggers Stripe's invoice email
        let sent: StripeInvoice = self
            .stripe_request(
                reqwest::Method::POST,
                &format!("/invoices/{}/send", invoice.id),
                None,
            )
            .await?;

        #[allow(clippy::cast_precision_loss)] // invoice amounts stay far below 2^52 cents
        Ok(SentInvoice {
            url: sent.hosted_invoice_url.unwrap_or_default(),
            status: sent.status.unwrap_or_else(|| "sent".to_string()),
            provider_invoice_id: sent.id,
            amount: sent.amount_due as f64 / 100.0,
        })
    }

    async fn invoice_status(&self, provider_invoice_id: &str) -> Result<String> {
        let invoice: StripeInvoice = self
            .stripe_request(
                reqwest::Method::GET,
                &format!("/invoices/{provider_invoice_id}"),
                None,
            )
            .await?;
        Ok(invoice.status.unwrap_or_default())
    }
}

#[derive(Debug, Deserialize)]
struct StripeCustomer {
    id: String,
}

#[derive(Debug, Deserialize)]
struct StripeCustomerList {
    #[serde(default)]
    data: Vec<StripeCustomer>,
}

#[derive(Debug, Deserialize)]
struct StripeInvoice {
    id: String,
    status: Option<String>,
    hosted_invoice_url: Option<String>,
    #[serde(default)]
    amount_due: i64,
}
