//! @acp:module "Errors"
//! @acp:summary "Error taxonomy and process exit codes"
//! @acp:domain cli
//! @acp:layer types
//!
//! Error types
//!
//! Local validation failures are raised before any request leaves the
//! process; provider failures wrap the client's error verbatim.

use thiserror::Error;

use crate::client::ProviderError;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, CmdletError>;

/// Errors surfaced by a command invocation
#[derive(Error, Debug)]
pub enum CmdletError {
    #[error("Missing required parameter '{parameter}' for {operation}")]
    MissingRequiredParameter { operation: String, parameter: String },

    #[error("Invalid selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("Cannot combine --select '{selector}' with --pass-thru for {operation}")]
    ConflictingSelection { operation: String, selector: String },

    #[error("Invalid value for parameter '{parameter}': {reason}")]
    InvalidParameter { parameter: String, reason: String },

    #[error("Unknown operation: {0}")]
    UnknownOperation(String),

    #[error("{operation} failed: {source}")]
    Provider {
        operation: String,
        #[source]
        source: ProviderError,
    },

    #[error("{operation} returned the continuation token '{cursor}' twice; stopping")]
    PaginationStalled { operation: String, cursor: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Template error: {0}")]
    Template(String),

    #[error("Prompt error: {0}")]
    Prompt(String),
}

impl CmdletError {
    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new invalid-parameter error
    pub fn invalid_parameter(parameter: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            parameter: parameter.into(),
            reason: reason.into(),
        }
    }

    /// Create a new invalid-selector error
    pub fn invalid_selector(selector: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidSelector {
            selector: selector.into(),
            reason: reason.into(),
        }
    }

    /// True for failures detected before any request was sent
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            Self::MissingRequiredParameter { .. }
                | Self::InvalidSelector { .. }
                | Self::ConflictingSelection { .. }
                | Self::InvalidParameter { .. }
                | Self::UnknownOperation(_)
        )
    }

    /// Process exit code for this failure
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Provider { .. } | Self::PaginationStalled { .. } => 1,
            e if e.is_local() => 2,
            _ => 3,
        }
    }
}

impl From<handlebars::RenderError> for CmdletError {
    fn from(e: handlebars::RenderError) -> Self {
        Self::Template(e.to_string())
    }
}

impl From<dialoguer::Error> for CmdletError {
    fn from(e: dialoguer::Error) -> Self {
        Self::Prompt(e.to_string())
    }
}
