//! Session Store - ephemeral per-user conversational state.
//!
//! One state object per user identity, living only for the process lifetime.
//! The state is a tagged union with one variant per wizard kind, so an
//! invoice-create step can never coexist with an admin action. At most one
//! wizard is active per session; starting another wizard replaces the prior
//! state outright.
//!
//! Each identity's state sits behind its own async mutex and the router
//! holds that lock for the whole handling of an event, serializing a user's
//! rapid successive inputs instead of letting two of them race on the same
//! pre-update state.

use crate::providers::Platform;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// The active wizard (if any) for one user identity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionState {
    /// No wizard in progress
    #[default]
    Idle,
    /// Call wizard, collecting outbound-call parameters
    Call(CallStep),
    /// Invoice wizard, either a single-step action or the create flow
    Invoice(InvoiceFlow),
    /// Admin wizard, mutating user rows
    Admin(AdminFlow),
}

/// Call wizard steps. Each variant carries exactly the fields collected so
/// far, so a validation failure cannot corrupt earlier answers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallStep {
    /// Waiting for the phone number
    Phone,
    /// Waiting for the customer name
    Name {
        /// Validated phone number
        phone: String,
    },
    /// Waiting for the agent prompt
    Prompt {
        /// Validated phone number
        phone: String,
        /// Customer name
        name: String,
    },
    /// Waiting for the agent's first message
    FirstMessage {
        /// Validated phone number
        phone: String,
        /// Customer name
        name: String,
        /// Agent prompt, empty when "default" was chosen
        prompt: String,
    },
}

/// Invoice wizard: two independent sub-flows sharing one session slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvoiceFlow {
    /// A single-step action waiting for its parameter in the next message
    Awaiting(SimpleInvoiceAction),
    /// The multi-step create flow for a chosen platform
    Create {
        /// Platform the invoice will be created on
        platform: Platform,
        /// Current step of the create flow
        step: CreateStep,
    },
}

/// Single-step invoice actions; the next text message is the parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimpleInvoiceAction {
    /// List invoices for a customer email
    List,
    /// View one invoice by id
    View,
    /// Poll the provider for an invoice's current status
    Status,
    /// Render and send an invoice PDF
    Pdf,
}

/// Create-flow steps with their accumulated fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateStep {
    /// Waiting for a customer to be selected from the keyboard
    SelectCustomer,
    /// Waiting for the free-text description
    Description {
        /// Selected customer email
        email: String,
    },
    /// Waiting for the amount
    Amount {
        /// Selected customer email
        email: String,
        /// Collected description
        description: String,
    },
}

/// Admin wizard steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminFlow {
    /// adduser step 1: waiting for the new user's chat id
    AddUserId,
    /// adduser step 2: waiting for the new user's name
    AddUserName {
        /// Captured chat id
        id: String,
    },
    /// deleteuser: waiting for the chat id to soft-delete
    DeleteUser,
    /// promote: waiting for the chat id to promote to admin
    Promote,
}

/// In-memory store of one [`SessionState`] per user identity.
///
/// `get` creates an idle state on first access. Each state is handed out as
/// a shared mutex so callers can serialize processing per identity.
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<Mutex<HashMap<String, Arc<Mutex<SessionState>>>>>,
}

impl SessionStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the session handle for a user identity, creating an idle one
    /// on first access.
    pub async fn get(&self, user_id: &str) -> Arc<Mutex<SessionState>> {
        let mut sessions = self.sessions.lock().await;
        Arc::clone(
            sessions
                .entry(user_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(SessionState::Idle))),
        )
    }

    /// Replaces the state for a user identity.
    pub async fn set(&self, user_id: &str, state: SessionState) {
        let handle = self.get(user_id).await;
        *handle.lock().await = state;
    }

    /// Resets a user's session to idle.
    pub async fn clear(&self, user_id: &str) {
        self.set(user_id, SessionState::Idle).await;
    }
}
