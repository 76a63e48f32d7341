//! @acp:module "Configuration"
//! @acp:summary "Endpoint, output and confirmation settings with file fallbacks"
//! @acp:domain cli
//! @acp:layer config
//!
//! Configuration
//!
//! Loaded from `.computectl.config.json` in the working directory, falling
//! back to `~/.computectl/config.json`, then to built-in defaults. Values only
//! steer the client layer and output defaults; nothing is persisted between
//! invocations.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::operation::PassThruPolicy;
use crate::output::OutputFormat;

/// Project-local config file name
pub const CONFIG_FILE: &str = ".computectl.config.json";

fn default_api_version() -> String {
    "2016-11-15".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Provider endpoint URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    /// API version sent with every request
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Output format used when `--output` is not given
    #[serde(default)]
    pub output: OutputFormat,

    /// Page size used when `--page-size` is not given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_page_size: Option<u32>,

    #[serde(default)]
    pub confirm: ConfirmConfig,

    /// Pass-through conflict policy for descriptors that do not set one
    #[serde(default)]
    pub pass_thru_policy: PassThruPolicy,

    /// Extra catalog files layered over the built-in operations
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub catalogs: Vec<PathBuf>,
}

/// Confirmation prompt behavior
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmConfig {
    /// Accept every confirmation without prompting
    #[serde(default)]
    pub assume_yes: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: None,
            region: None,
            api_version: default_api_version(),
            timeout_secs: default_timeout_secs(),
            output: OutputFormat::default(),
            default_page_size: None,
            confirm: ConfirmConfig::default(),
            pass_thru_policy: PassThruPolicy::default(),
            catalogs: Vec::new(),
        }
    }
}

impl Config {
    /// Load config from a file
    pub fn load<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save config to a file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> crate::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load from the first default location that exists, or use defaults
    pub fn load_or_default() -> crate::Result<Self> {
        match Self::default_paths().into_iter().find(|p| p.exists()) {
            Some(path) => {
                tracing::debug!("loading config from {}", path.display());
                Self::load(path)
            }
            None => Ok(Self::default()),
        }
    }

    /// Candidate config locations, most specific first
    pub fn default_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(CONFIG_FILE)];
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".computectl").join("config.json"));
        }
        paths
    }

    fn validate(&self) -> crate::Result<()> {
        if self.timeout_secs == 0 {
            return Err(crate::CmdletError::config("timeoutSecs must be at least 1"));
        }
        if self.default_page_size == Some(0) {
            return Err(crate::CmdletError::config("defaultPageSize must be at least 1"));
        }
        if let Some(endpoint) = &self.endpoint {
            if !(endpoint.starts_with("https://") || endpoint.starts_with("http://")) {
                return Err(crate::CmdletError::config(format!(
                    "endpoint must be an http(s) URL, got '{}'",
                    endpoint
                )));
            }
        }
        Ok(())
    }
}
