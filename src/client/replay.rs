//! @acp:module "Replay Client"
//! @acp:summary "Recorded-response client for offline runs and tests"
//! @acp:domain cli
//! @acp:layer service
//!
//! Replay client
//!
//! Serves pre-recorded responses in order instead of calling the provider,
//! and records every request it receives. Used for offline runs
//! (`--replay FILE`) and by the test suite.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{ProviderClient, ProviderError, Response};
use crate::request::Request;

/// One recorded exchange
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayEntry {
    /// Only answer requests for this action (any action when absent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ProviderError>,
}

impl ReplayEntry {
    pub fn ok(response: Value) -> Self {
        Self {
            action: None,
            response: Some(response),
            error: None,
        }
    }

    pub fn err(error: ProviderError) -> Self {
        Self {
            action: None,
            response: None,
            error: Some(error),
        }
    }

    pub fn for_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    fn matches(&self, action: &str) -> bool {
        self.action.as_deref().map_or(true, |a| a == action)
    }
}

/// Client answering from a queue of recorded exchanges
#[derive(Debug, Default)]
pub struct ReplayClient {
    entries: Mutex<VecDeque<ReplayEntry>>,
    sent: Mutex<Vec<Request>>,
}

impl ReplayClient {
    pub fn new(entries: impl IntoIterator<Item = ReplayEntry>) -> Self {
        Self {
            entries: Mutex::new(entries.into_iter().collect()),
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Load entries from a JSON file holding an array of entries
    pub fn from_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let entries: Vec<ReplayEntry> = serde_json::from_str(&content)?;
        Ok(Self::new(entries))
    }

    /// Requests received so far, in order
    pub fn requests(&self) -> Vec<Request> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn request_count(&self) -> usize {
        self.sent.lock().map(|s| s.len()).unwrap_or_default()
    }

    /// Entries not yet consumed
    pub fn remaining(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or_default()
    }
}

impl ProviderClient for ReplayClient {
    fn name(&self) -> &str {
        "replay"
    }

    fn send(&self, request: &Request) -> Result<Response, ProviderError> {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(request.clone());
        }

        let entry = {
            let mut entries = self
                .entries
                .lock()
                .map_err(|_| ProviderError::new("ReplayPoisoned", "replay queue lock poisoned"))?;
            let index = entries.iter().position(|e| e.matches(&request.action));
            index.and_then(|i| entries.remove(i))
        };

        match entry {
            Some(ReplayEntry { error: Some(error), .. }) => Err(error),
            Some(ReplayEntry { response, .. }) => {
                Ok(response.unwrap_or_else(|| Value::Object(Default::default())))
            }
            None => Err(ProviderError::new(
                "ReplayExhausted",
                format!("no recorded response left for {}", request.action),
            )),
        }
    }
}
