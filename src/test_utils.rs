//! Shared test fixtures: in-memory database, recording doubles for the chat
//! transport, dialer and provider seams, and payload builders.

#![allow(clippy::unwrap_used)]

use crate::bot::BotContext;
use crate::bot::outbound::{CallReceipt, CallRequest, OutboundDialer};
use crate::bot::transport::{ChatTransport, Keyboard, PdfRenderer};
use crate::config::database::create_tables;
use crate::core::invoices::{InvoiceSummary, InvoiceUpdate};
use crate::entities::invoice;
use crate::errors::{Error, Result};
use crate::providers::{
    InvoiceProvider, InvoiceRequest, Platform, ProviderRegistry, SentInvoice,
};
use async_trait::async_trait;
use sea_orm::{Database, DatabaseConnection};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Fresh in-memory database with all tables created.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = Database::connect("sqlite::memory:").await?;
    create_tables(&db).await?;
    Ok(db)
}

/// Adapter result as a provider would report it after a successful send.
pub fn sent_invoice(transaction_id: &str, status: &str, amount: f64) -> SentInvoice {
    SentInvoice {
        url: format!("https://pay.example.com/{transaction_id}"),
        status: status.to_string(),
        provider_invoice_id: transaction_id.to_string(),
        amount,
    }
}

/// Normalized webhook event for a `(platform, transaction_id)` pair.
pub fn webhook_update(
    platform: Platform,
    transaction_id: &str,
    status: &str,
    amount: f64,
) -> InvoiceUpdate {
    InvoiceUpdate {
        customer_email: "billed@example.com".to_string(),
        amount,
        currency: "USD".to_string(),
        description: "Consulting".to_string(),
        status: status.to_string(),
        platform,
        transaction_id: transaction_id.to_string(),
        notified: true,
    }
}

/// Chat transport double that records everything sent through it.
#[derive(Default)]
pub struct RecordingTransport {
    /// `(chat_id, text)` pairs in send order, keyboards included
    pub messages: Mutex<Vec<(String, String)>>,
    /// `(chat_id, filename)` pairs for sent documents
    pub documents: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl ChatTransport for RecordingTransport {
    async fn send_text(&self, chat_id: &str, text: &str) -> Result<()> {
        self.messages
            .lock()
            .unwrap()
            .push((chat_id.to_string(), text.to_string()));
        Ok(())
    }

    async fn send_keyboard(&self, chat_id: &str, text: &str, _keyboard: Keyboard) -> Result<()> {
        self.messages
            .lock()
            .unwrap()
            .push((chat_id.to_string(), text.to_string()));
        Ok(())
    }

    async fn send_document(
        &self,
        chat_id: &str,
        filename: &str,
        _caption: &str,
        _content: Vec<u8>,
    ) -> Result<()> {
        self.documents
            .lock()
            .unwrap()
            .push((chat_id.to_string(), filename.to_string()));
        Ok(())
    }

    async fn ack_callback(&self, _callback_id: &str) -> Result<()> {
        Ok(())
    }
}

/// Text of the most recent message the transport sent.
pub fn last_reply(transport: &RecordingTransport) -> String {
    transport
        .messages
        .lock()
        .unwrap()
        .last()
        .map(|(_, text)| text.clone())
        .unwrap_or_default()
}

/// Dialer double recording call requests, with an arm-able failure.
#[derive(Default)]
pub struct ScriptedDialer {
    /// Every request handed to `place_call`
    pub calls: Mutex<Vec<CallRequest>>,
    fail_next: AtomicBool,
}

impl ScriptedDialer {
    /// Makes the next `place_call` fail.
    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl OutboundDialer for ScriptedDialer {
    async fn place_call(&self, request: &CallRequest) -> Result<CallReceipt> {
        self.calls.lock().unwrap().push(request.clone());
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(Error::Transport {
                message: "call server unavailable".to_string(),
            });
        }
        Ok(CallReceipt {
            call_sid: "CA_test".to_string(),
        })
    }
}

/// Shared script backing the provider doubles for all platforms.
#[derive(Default)]
pub struct ProviderScript {
    requests: Mutex<Vec<InvoiceRequest>>,
    status: Mutex<Option<String>>,
    customer_lookups: AtomicUsize,
    fail_next: AtomicBool,
}

impl ProviderScript {
    /// Every request passed to `create_and_send_invoice`, across platforms.
    pub fn sent_requests(&self) -> Vec<InvoiceRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// How many times `create_or_find_customer` ran, across platforms.
    pub fn customer_lookups(&self) -> usize {
        self.customer_lookups.load(Ordering::SeqCst)
    }

    /// Makes the next provider call fail.
    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    /// Sets the status `invoice_status` reports.
    pub fn set_status(&self, status: &str) {
        *self.status.lock().unwrap() = Some(status.to_string());
    }

    fn take_failure(&self, platform: Platform) -> Result<()> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(Error::provider(
                platform.as_str(),
                "scripted failure".to_string(),
            ));
        }
        Ok(())
    }
}

struct ScriptedProvider {
    platform: Platform,
    script: Arc<ProviderScript>,
}

#[async_trait]
impl InvoiceProvider for ScriptedProvider {
    fn platform(&self) -> Platform {
        self.platform
    }

    async fn create_or_find_customer(&self, _name: &str, email: &str) -> Result<String> {
        self.script.take_failure(self.platform)?;
        self.script.customer_lookups.fetch_add(1, Ordering::SeqCst);
        Ok(format!("cust_{email}"))
    }

    async fn create_and_send_invoice(&self, request: &InvoiceRequest) -> Result<SentInvoice> {
        self.script.take_failure(self.platform)?;
        let mut requests = self.script.requests.lock().unwrap();
        requests.push(request.clone());
        let id = format!("in_test_{}", requests.len());
        drop(requests);
        Ok(sent_invoice(&id, "sent", request.amount))
    }

    async fn invoice_status(&self, _provider_invoice_id: &str) -> Result<String> {
        self.script.take_failure(self.platform)?;
        let status = self.script.status.lock().unwrap().clone();
        Ok(status.unwrap_or_else(|| "sent".to_string()))
    }
}

struct NoopPdf;

impl PdfRenderer for NoopPdf {
    fn render_invoice(&self, _invoice: &invoice::Model) -> Result<Vec<u8>> {
        Ok(b"%PDF-test".to_vec())
    }

    fn render_summary(&self, _summary: &InvoiceSummary) -> Result<Vec<u8>> {
        Ok(b"%PDF-test".to_vec())
    }
}

/// Fully wired [`BotContext`] over test doubles. User id `"1"` is configured
/// as an env admin.
pub struct TestHarness {
    /// Context handed to handlers under test
    pub ctx: BotContext,
    /// The recording transport behind `ctx.transport`
    pub transport: Arc<RecordingTransport>,
    /// The scripted dialer behind `ctx.dialer`
    pub dialer: Arc<ScriptedDialer>,
    /// Script shared by all three registered provider doubles
    pub provider: Arc<ProviderScript>,
}

impl TestHarness {
    /// Builds a harness around a fresh in-memory database.
    pub async fn new() -> Result<Self> {
        let db = setup_test_db().await?;
        let transport = Arc::new(RecordingTransport::default());
        let dialer = Arc::new(ScriptedDialer::default());
        let script = Arc::new(ProviderScript::default());

        let mut providers = ProviderRegistry::new();
        for platform in [Platform::Stripe, Platform::Paypal, Platform::Square] {
            providers.register(Arc::new(ScriptedProvider {
                platform,
                script: Arc::clone(&script),
            }));
        }

        let ctx = BotContext {
            db,
            transport: Arc::clone(&transport) as Arc<dyn ChatTransport>,
            providers,
            dialer: Arc::clone(&dialer) as Arc<dyn OutboundDialer>,
            pdf: Arc::new(NoopPdf),
            admin_ids: vec!["1".to_string()],
        };

        Ok(Self {
            ctx,
            transport,
            dialer,
            provider: script,
        })
    }

    /// Seeds one customer row owned by chat id `"42"`.
    pub async fn seed_customer(&self, email: &str, name: &str) -> Result<()> {
        crate::core::customers::ensure_customer(&self.ctx.db, "42", name, email).await?;
        Ok(())
    }
}
