//! @acp:module "Provider Clients"
//! @acp:summary "Client trait and provider error model"
//! @acp:domain cli
//! @acp:layer service
//!
//! Provider clients
//!
//! The invoker talks to the provider only through the `ProviderClient`
//! trait. Signing, retries and transport concerns belong to the client
//! implementation, not to the command layer.

#[cfg(feature = "http")]
pub mod http;
pub mod replay;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::request::Request;

#[cfg(feature = "http")]
pub use http::HttpClient;
pub use replay::{ReplayClient, ReplayEntry};

/// A provider response payload
pub type Response = Value;

/// Error reported by the provider (or by the transport reaching it)
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{code}: {message}")]
#[serde(rename_all = "camelCase")]
pub struct ProviderError {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl ProviderError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            status: None,
            request_id: None,
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    /// Dry-run probes report success as an error with this code
    pub fn is_dry_run_success(&self) -> bool {
        self.code == "DryRunOperation"
    }
}

/// Client handle injected into the invoker
pub trait ProviderClient: Send + Sync {
    /// Human-readable name used in logs
    fn name(&self) -> &str;

    /// Send one request and wait for its response
    fn send(&self, request: &Request) -> Result<Response, ProviderError>;
}

/// Extract a provider error from a JSON error body
///
/// Accepts `{"Error": {"Code", "Message"}}`, `{"Errors": [{...}]}` and
/// `{"code", "message"}` shapes.
pub fn parse_error_body(body: &Value) -> Option<ProviderError> {
    let error = body
        .get("Error")
        .or_else(|| body.get("Errors").and_then(|e| e.get(0)))
        .unwrap_or(body);

    let field = |upper: &str, lower: &str| {
        error
            .get(upper)
            .or_else(|| error.get(lower))
            .and_then(Value::as_str)
            .map(str::to_string)
    };

    let code = field("Code", "code")?;
    let message = field("Message", "message").unwrap_or_default();
    let mut parsed = ProviderError::new(code, message);
    if let Some(request_id) = body
        .get("RequestId")
        .or_else(|| body.get("requestId"))
        .and_then(Value::as_str)
    {
        parsed = parsed.with_request_id(request_id);
    }
    Some(parsed)
}
