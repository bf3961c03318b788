//! PayPal adapter.
//!
//! Creation is asynchronous on PayPal's side: the create call can return
//! before the invoice is readable, so the adapter polls the retrieval
//! endpoint (up to 10 attempts, one second apart) and then attempts the send
//! operation (up to 5 attempts, one second apart). Exhausting either budget
//! is a terminal provider error. When the send budget runs out, the invoice
//! PayPal already created stays behind unsent - the adapter performs no
//! compensating cancellation, matching the source system.

use crate::errors::{Error, Result};
use crate::providers::retry::RetryPolicy;
use crate::providers::{InvoiceProvider, InvoiceRequest, Platform, SentInvoice};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, error, info};

const LIVE_API_BASE: &str = "https://api.paypal.com";
const SANDBOX_API_BASE: &str = "https://api.sandbox.paypal.com";

/// PayPal invoice provider
#[derive(Clone)]
pub struct PaypalProvider {
    client: Client,
    client_id: String,
    client_secret: String,
    api_base: String,
    poll_policy: RetryPolicy,
    send_policy: RetryPolicy,
}

impl PaypalProvider {
    /// Creates an adapter; any `env` other than "live" selects the sandbox.
    #[must_use]
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        env: &str,
    ) -> Self {
        let api_base = if env == "live" {
            LIVE_API_BASE
        } else {
            SANDBOX_API_BASE
        };
        Self {
            client: Client::new(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            api_base: api_base.to_string(),
            poll_policy: RetryPolicy::every_second(10),
            send_policy: RetryPolicy::every_second(5),
        }
    }

    async fn access_token(&self) -> Result<String> {
        debug!("Requesting PayPal access token");
        let response = self
            .client
            .post(format!("{}/v1/oauth2/token", self.api_base))
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| Error::provider("paypal", e.to_string()))?;

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(body = %body, "PayPal authentication failed");
            return Err(Error::provider(
                "paypal",
                format!("failed to authenticate with PayPal: {body}"),
            ));
        }

        let token: AccessToken = response
            .json()
            .await
            .map_err(|e| Error::provider("paypal", e.to_string()))?;
        Ok(token.access_token)
    }

    /// Polls the retrieval URL until the freshly created invoice is readable.
    async fn wait_until_readable(
        &self,
        token: &str,
        invoice_url: &str,
    ) -> Result<PaypalInvoice> {
        self.poll_policy
            .run(|attempt| async move {
                debug!(attempt, "Checking PayPal invoice availability");
                let response = self
                    .client
                    .get(invoice_url)
                    .bearer_auth(token)
                    .send()
                    .await
                    .map_err(|e| Error::provider("paypal", e.to_string()))?;
                if !response.status().is_success() {
                    return Err(Error::provider(
                        "paypal",
                        "invoice not available after creation".to_string(),
                    ));
                }
                response
                    .json::<PaypalInvoice>()
                    .await
                    .map_err(|e| Error::provider("paypal", e.to_string()))
            })
            .await
    }

    /// Sends the invoice, retrying transient failures within the budget.
    async fn send_with_retries(&self, token: &str, invoice_id: &str) -> Result<()> {
        self.send_policy
            .run(|attempt| async move {
                debug!(attempt, invoice_id, "Attempting to send PayPal invoice");
                let response = self
                    .client
                    .post(format!(
                        "{}/v2/invoicing/invoices/{invoice_id}/send",
                        self.api_base
                    ))
                    .bearer_auth(token)
                    .send()
                    .await
                    .map_err(|e| Error::provider("paypal", e.to_string()))?;
                if response.status().is_success() {
                    Ok(())
                } else {
                    let body = response.text().await.unwrap_or_default();
                    Err(Error::provider(
                        "paypal",
                        format!("invoice send failed: {body}"),
                    ))
                }
            })
            .await
    }
}

#[async_trait]
impl InvoiceProvider for PaypalProvider {
    fn platform(&self) -> Platform {
        Platform::Paypal
    }

    /// PayPal has no standalone customer object; the email is the identity.
    async fn create_or_find_customer(&self, _name: &str, email: &str) -> Result<String> {
        Ok(email.to_string())
    }

    async fn create_and_send_invoice(&self, request: &InvoiceRequest) -> Result<SentInvoice> {
        let token = self.access_token().await?;

        let body = json!({
            "detail": {
                "currency_code": "USD",
                "note": request.description,
                "terms_and_conditions": "Thank you for your business.",
            },
            "invoicer": { "name": { "given_name": request.name } },
            "primary_recipients": [
                { "billing_info": { "email_address": request.email } }
            ],
            "items": [{
                "name": request.description,
                "quantity": "1",
                "unit_amount": {
                    "currency_code": "USD",
                    "value": format!("{:.2}", request.amount),
                },
            }],
        });

        debug!(email = %request.email, "Creating PayPal invoice");
        let response = self
            .client
            .post(format!("{}/v2/invoicing/invoices", self.api_base))
            .bearer_auth(&token)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::provider("paypal", e.to_string()))?;

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(body = %body, "PayPal invoice creation failed");
            return Err(Error::provider(
                "paypal",
                format!("invoice creation failed: {body}"),
            ));
        }

        // The id is sometimes only present in the Location header, not the body
        let location = response
            .headers()
            .get(reqwest::header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string);
        let created: PaypalInvoice = response.json().await.unwrap_or_default();
        let invoice_id = created
            .id
            .or_else(|| {
                location
                    .as_deref()
                    .and_then(|l| l.rsplit('/').next())
                    .map(ToString::to_string)
            })
            .ok_or_else(|| {
                Error::provider(
                    "paypal",
                    "could not determine invoice id after creation".to_string(),
                )
            })?;

        let retrieval_url = location.unwrap_or_else(|| {
            format!("{}/v2/invoicing/invoices/{invoice_id}", self.api_base)
        });
        let fetched = self.wait_until_readable(&token, &retrieval_url).await?;
        self.send_with_retries(&token, &invoice_id).await?;

        info!(invoice_id = %invoice_id, "PayPal invoice created and sent");
        Ok(SentInvoice {
            url: format!("https://www.paypal.com/invoice/payerView/details/{invoice_id}"),
            status: fetched.status.unwrap_or_else(|| "SENT".to_string()),
            provider_invoice_id: invoice_id,
            amount: request.amount,
        })
    }

    async fn invoice_status(&self, provider_invoice_id: &str) -> Result<String> {
        let token = self.access_token().await?;
        let response = self
            .client
            .get(format!(
                "{}/v2/invoicing/invoices/{provider_invoice_id}",
                self.api_base
            ))
            .bearer_auth(&token)
            .send()
            .await
            .map_err(|e| Error::provider("paypal", e.to_string()))?;

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::provider(
                "paypal",
                format!("get invoice failed: {body}"),
            ));
        }

        let invoice: PaypalInvoice = response
            .json()
            .await
            .map_err(|e| Error::provider("paypal", e.to_string()))?;
        Ok(invoice.status.unwrap_or_default())
    }
}

#[derive(Debug, Deserialize)]
struct AccessToken {
    access_token: String,
}

#[derive(Debug, Default, Deserialize)]
struct PaypalInvoice {
    id: Option<String>,
    status: Option<String>,
}
