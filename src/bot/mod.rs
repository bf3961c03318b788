//! Chat-facing layer - session store, dialog router, wizards and commands.
//!
//! Everything here consumes already-validated chat events and talks to the
//! outside world only through the seams in [`transport`], [`outbound`] and
//! the provider registry.

/// Role gate for restricted commands
pub mod access;
/// Plain command handlers and menus
pub mod commands;
/// Outbound-call collaborator
pub mod outbound;
/// Dialog router and typed callback parsing
pub mod router;
/// Per-user session store
pub mod session;
/// Chat transport and PDF renderer seams
pub mod transport;
/// Wizard state machines
pub mod wizards;

use crate::providers::ProviderRegistry;
use outbound::OutboundDialer;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use transport::{ChatTransport, PdfRenderer};

/// Shared dependencies available to every handler.
#[derive(Clone)]
pub struct BotContext {
    /// Database connection for all persistence
    pub db: DatabaseConnection,
    /// Outgoing chat transport
    pub transport: Arc<dyn ChatTransport>,
    /// Payment-platform adapters
    pub providers: ProviderRegistry,
    /// Outbound-call server client
    pub dialer: Arc<dyn OutboundDialer>,
    /// PDF rendering collaborator
    pub pdf: Arc<dyn PdfRenderer>,
    /// Env-configured admin chat ids
    pub admin_ids: Vec<String>,
}
