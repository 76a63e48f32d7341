//! @acp:module "HTTP Client"
//! @acp:summary "JSON-over-HTTPS provider client"
//! @acp:domain cli
//! @acp:layer io
//!
//! JSON-over-HTTPS provider client
//!
//! Each request is a POST of `{"Action", "Version", ...fields}` to the
//! configured endpoint. Non-2xx responses are decoded into `ProviderError`.

use std::time::Duration;

use serde_json::{Map, Value};

use super::{parse_error_body, ProviderClient, ProviderError, Response};
use crate::config::Config;
use crate::request::Request;

/// Blocking HTTP client for the provider API
pub struct HttpClient {
    agent: ureq::Agent,
    endpoint: String,
    region: Option<String>,
    api_version: String,
}

impl HttpClient {
    /// Build a client from configuration; fails if no endpoint is set
    pub fn from_config(config: &Config) -> crate::Result<Self> {
        let endpoint = config
            .endpoint
            .clone()
            .ok_or_else(|| crate::CmdletError::config("no provider endpoint configured (use --endpoint or set \"endpoint\" in the config file)"))?;

        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("computectl/", env!("CARGO_PKG_VERSION")))
            .build();

        Ok(Self {
            agent,
            endpoint,
            region: config.region.clone(),
            api_version: config.api_version.clone(),
        })
    }

    fn body(&self, request: &Request) -> Value {
        let mut body = Map::new();
        body.insert("Action".into(), Value::String(request.action.clone()));
        body.insert("Version".into(), Value::String(self.api_version.clone()));
        for (key, value) in &request.fields {
            body.insert(key.clone(), value.clone());
        }
        Value::Object(body)
    }
}

impl ProviderClient for HttpClient {
    fn name(&self) -> &str {
        &self.endpoint
    }

    fn send(&self, request: &Request) -> Result<Response, ProviderError> {
        let request_id = uuid::Uuid::new_v4().to_string();
        tracing::debug!(action = %request.action, %request_id, "POST {}", self.endpoint);

        let mut call = self
            .agent
            .post(&self.endpoint)
            .set("Content-Type", "application/json")
            .set("X-Request-Id", &request_id);
        if let Some(region) = &self.region {
            call = call.set("X-Region", region);
        }

        match call.send_json(self.body(request)) {
            Ok(response) => response.into_json::<Value>().map_err(|e| {
                ProviderError::new("MalformedResponse", e.to_string()).with_request_id(&request_id)
            }),
            Err(ureq::Error::Status(status, response)) => {
                let fallback = format!("HTTP {} from {}", status, self.endpoint);
                let error = response
                    .into_json::<Value>()
                    .ok()
                    .and_then(|body| parse_error_body(&body))
                    .unwrap_or_else(|| ProviderError::new("HttpError", fallback));
                let error = match error.request_id {
                    Some(_) => error,
                    None => error.with_request_id(&request_id),
                };
                Err(error.with_status(status))
            }
            Err(ureq::Error::Transport(transport)) => Err(ProviderError::new(
                "TransportError",
                transport.to_string(),
            )
            .with_request_id(request_id)),
        }
    }
}
