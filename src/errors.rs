//! Unified error types for the whole crate.
//!
//! Every failure path maps onto one variant here so that wizard handlers,
//! provider adapters and webhook ingestion can share a single `Result` alias.

use thiserror::Error;

/// Crate-wide error type.
#[derive(Debug, Error)]
pub enum Error {
    /// A payment-provider call failed; no invoice row may be persisted.
    #[error("Provider error ({platform}): {message}")]
    Provider {
        /// Which platform the adapter was talking to
        platform: String,
        /// Human-readable failure description
        message: String,
    },

    /// The role check rejected the sender before the handler was entered.
    #[error("Access denied: this command requires one of the roles {required:?}")]
    AccessDenied {
        /// Roles that would have been accepted
        required: Vec<String>,
    },

    /// A webhook delivery failed signature verification.
    #[error("Webhook authentication failed: {message}")]
    WebhookAuth {
        /// Why verification failed
        message: String,
    },

    /// Sending a reply or document through the chat transport failed, or the
    /// call server rejected an outbound call.
    #[error("Transport error: {message}")]
    Transport {
        /// Underlying transport failure
        message: String,
    },

    /// Database error from `SeaORM`.
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Shorthand for a provider failure.
    pub fn provider(platform: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            platform: platform.into(),
            message: message.into(),
        }
    }

    /// Shorthand for a webhook authentication failure.
    pub fn webhook_auth(message: impl Into<String>) -> Self {
        Self::WebhookAuth {
            message: message.into(),
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
