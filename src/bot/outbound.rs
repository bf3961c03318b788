//! Outbound-call collaborator.
//!
//! The call wizard hands its collected parameters to a separate call server
//! which drives the actual AI-powered phone call. Only the request/receipt
//! seam lives here.

use crate::errors::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::error;

/// Parameters for one outbound call, exactly as collected by the wizard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallRequest {
    /// Phone number to dial, digits only
    pub number: String,
    /// Customer name the agent addresses
    pub name: String,
    /// Agent prompt, empty string for the server default
    pub prompt: String,
    /// Agent's opening line, empty string for the server default
    pub first_message: String,
}

/// Confirmation returned by the call server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallReceipt {
    /// Provider-side call identifier
    pub call_sid: String,
}

/// Seam over the call server.
#[async_trait]
pub trait OutboundDialer: Send + Sync {
    /// Initiates an outbound call, returning the call identifier on success.
    async fn place_call(&self, request: &CallRequest) -> Result<CallReceipt>;
}

/// HTTP implementation posting to the call server endpoint.
#[derive(Clone)]
pub struct HttpDialer {
    client: Client,
    url: String,
}

impl HttpDialer {
    /// Creates a dialer for the given endpoint URL.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CallResponse {
    #[serde(default)]
    success: bool,
    #[serde(rename = "callSid")]
    call_sid: Option<String>,
    error: Option<String>,
}

#[async_trait]
impl OutboundDialer for HttpDialer {
    async fn place_call(&self, request: &CallRequest) -> Result<CallReceipt> {
        let response = self
            .client
            .post(&self.url)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Outbound call request failed");
                Error::Transport {
                    message: e.to_string(),
                }
            })?;

        let body: CallResponse = response.json().await.map_err(|e| Error::Transport {
            message: e.to_string(),
        })?;

        if body.success {
            Ok(CallReceipt {
                call_sid: body.call_sid.unwrap_or_default(),
            })
        } else {
            Err(Error::Transport {
                message: body.error.unwrap_or_else(|| "Unknown error".to_string()),
            })
        }
    }
}
