//! Payment-platform adapters.
//!
//! Each platform exposes the same capability set through [`InvoiceProvider`]:
//! find-or-create a customer by email, create and send an invoice, and fetch
//! an invoice's current status. Anything provider-specific - response field
//! names, auth schemes, PayPal's asynchronous creation - stays inside the
//! concrete adapter.

/// PayPal adapter - asynchronous creation with bounded poll-then-send
pub mod paypal;
/// Named retry policy for bounded provider loops
pub mod retry;
/// Square adapter
pub mod square;
/// Stripe adapter
pub mod stripe;

use crate::errors::{Error, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

/// The payment platforms an invoice can live on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    /// Stripe invoicing
    Stripe,
    /// PayPal invoicing
    Paypal,
    /// Square invoicing
    Square,
}

impl Platform {
    /// The string stored in the `invoices.platform` column and used in
    /// callback data.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stripe => "stripe",
            Self::Paypal => "paypal",
            Self::Square => "square",
        }
    }

    /// Display name shown to users.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Stripe => "Stripe",
            Self::Paypal => "PayPal",
            Self::Square => "Square",
        }
    }

    /// Parses the lowercase platform tag.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "stripe" => Some(Self::Stripe),
            "paypal" => Some(Self::Paypal),
            "square" => Some(Self::Square),
            _ => None,
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything an adapter needs to create and send one invoice.
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceRequest {
    /// Customer display name
    pub name: String,
    /// Customer email the invoice is delivered to
    pub email: String,
    /// Provider-side customer id, when the caller already resolved one;
    /// adapters fall back to resolving by email
    pub customer_id: Option<String>,
    /// Line-item description
    pub description: String,
    /// Amount in decimal currency units
    pub amount: f64,
}

/// Uniform result of a successful create-and-send, regardless of what the
/// provider's native response called these fields.
#[derive(Debug, Clone, PartialEq)]
pub struct SentInvoice {
    /// Hosted invoice URL the customer can pay at
    pub url: String,
    /// Provider-native status string
    pub status: String,
    /// Provider-native invoice identifier
    pub provider_invoice_id: String,
    /// Amount the provider actually billed
    pub amount: f64,
}

/// Capability-uniform contract over one payment platform.
///
/// `create_or_find_customer` must be idempotent by email - calling it twice
/// with the same email never creates a duplicate provider-side customer.
/// `create_and_send_invoice` always results in a *sent* invoice; there is no
/// draft-only success the caller has to track. Callers must not persist an
/// invoice row unless the call returned `Ok`.
#[async_trait]
pub trait InvoiceProvider: Send + Sync {
    /// Which platform this adapter talks to.
    fn platform(&self) -> Platform;

    /// Finds the provider-side customer for an email, creating one if absent.
    async fn create_or_find_customer(&self, name: &str, email: &str) -> Result<String>;

    /// Creates an invoice and sends it to the customer, returning the
    /// unified result shape.
    async fn create_and_send_invoice(&self, request: &InvoiceRequest) -> Result<SentInvoice>;

    /// Fetches the provider's current status string for an invoice.
    async fn invoice_status(&self, provider_invoice_id: &str) -> Result<String>;
}

/// Lookup table from platform to its adapter.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: HashMap<Platform, Arc<dyn InvoiceProvider>>,
}

impl ProviderRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an adapter under its own platform tag.
    pub fn register(&mut self, provider: Arc<dyn InvoiceProvider>) {
        self.providers.insert(provider.platform(), provider);
    }

    /// Returns the adapter for a platform, or a provider error when that
    /// platform was never configured.
    pub fn get(&self, platform: Platform) -> Result<Arc<dyn InvoiceProvider>> {
        self.providers.get(&platform).cloned().ok_or_else(|| {
            Error::provider(platform.as_str(), "platform is not configured".to_string())
        })
    }
}

/// Builds a registry with all three platform adapters from configuration.
#[must_use]
pub fn registry_from_config(config: &crate::config::AppConfig) -> ProviderRegistry {
    let mut registry = ProviderRegistry::new();
    registry.register(Arc::new(stripe::StripeProvider::new(
        &config.stripe_secret_key,
    )));
    registry.register(Arc::new(paypal::PaypalProvider::new(
        &config.paypal_client_id,
        &config.paypal_client_secret,
        &config.paypal_env,
    )));
    registry.register(Arc::new(square::SquareProvider::new(
        &config.square_access_token,
        &config.square_location_id,
        &config.square_env,
    )));
    registry
}
