//! Chat transport seam.
//!
//! The chat platform itself (message delivery, inline keyboards, document
//! uploads, callback acknowledgment) is an external collaborator. The bot
//! layer only needs the small surface defined here; a concrete transport
//! implements it against the real messaging API.

use crate::core::invoices::InvoiceSummary;
use crate::entities::invoice;
use crate::errors::Result;
use async_trait::async_trait;

/// One inline button: a label and the callback data sent back on press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    /// Text shown on the button
    pub label: String,
    /// Callback data delivered when pressed
    pub data: String,
}

/// An inline keyboard as rows of buttons. Built in the fluent style of the
/// messaging API: `text` appends to the current row, `row` starts a new one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Keyboard {
    /// Button rows, top to bottom
    pub rows: Vec<Vec<Button>>,
}

impl Keyboard {
    /// Creates an empty keyboard.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a button to the current row.
    #[must_use]
    pub fn text(mut self, label: impl Into<String>, data: impl Into<String>) -> Self {
        if self.rows.is_empty() {
            self.rows.push(Vec::new());
        }
        if let Some(last) = self.rows.last_mut() {
            last.push(Button {
                label: label.into(),
                data: data.into(),
            });
        }
        self
    }

    /// Starts a new row.
    #[must_use]
    pub fn row(mut self) -> Self {
        self.rows.push(Vec::new());
        self
    }
}

/// Outgoing half of the chat platform.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Sends a plain text message to a chat.
    async fn send_text(&self, chat_id: &str, text: &str) -> Result<()>;

    /// Sends a text message with an inline keyboard attached.
    async fn send_keyboard(&self, chat_id: &str, text: &str, keyboard: Keyboard) -> Result<()>;

    /// Sends a document (report download, invoice PDF).
    async fn send_document(
        &self,
        chat_id: &str,
        filename: &str,
        caption: &str,
        content: Vec<u8>,
    ) -> Result<()>;

    /// Acknowledges a button press so the client stops showing its
    /// processing indicator.
    async fn ack_callback(&self, callback_id: &str) -> Result<()>;
}

/// PDF rendering collaborator. Layout and drawing live outside the core; the
/// bot only needs bytes it can hand to [`ChatTransport::send_document`].
pub trait PdfRenderer: Send + Sync {
    /// Renders a single invoice.
    fn render_invoice(&self, invoice: &invoice::Model) -> Result<Vec<u8>>;

    /// Renders the aggregate summary report.
    fn render_summary(&self, summary: &InvoiceSummary) -> Result<Vec<u8>>;
}
