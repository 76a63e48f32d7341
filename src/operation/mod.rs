//! @acp:module "Operation Descriptors"
//! @acp:summary "Data model describing each remote operation"
//! @acp:domain cli
//! @acp:layer model
//!
//! Operation descriptors
//!
//! One `OperationDescriptor` configures the generic executor for a single
//! remote operation: its parameters, how they map onto request fields, the
//! default output selector, and whether it paginates or mutates state.

use serde::{Deserialize, Serialize};

/// Long flags shared by every command; parameters may not reuse them
pub const RESERVED_FLAGS: &[&str] = &[
    "select",
    "force",
    "pass-thru",
    "page-size",
    "next-token",
    "no-auto-iteration",
    "pipeline-input",
    "output",
    "config",
    "endpoint",
    "region",
    "replay",
    "verbose",
    "quiet",
    "help",
    "version",
];

/// Typed kind of a parameter value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ParamKind {
    String,
    Boolean,
    Integer,
    StringList,
    Object,
}

impl ParamKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamKind::String => "string",
            ParamKind::Boolean => "boolean",
            ParamKind::Integer => "integer",
            ParamKind::StringList => "string-list",
            ParamKind::Object => "object",
        }
    }
}

/// How a parameter may be bound from pipeline input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PipelineBinding {
    #[default]
    None,
    /// A bare pipeline value binds to this parameter
    ByValue,
    /// A pipeline object binds a property with the same name (or alias)
    ByPropertyName,
}

/// Declaration of a single command parameter
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParamSpec {
    /// Canonical parameter name (PascalCase, e.g. `VolumeId`)
    pub name: String,

    pub kind: ParamKind,

    #[serde(default)]
    pub required: bool,

    /// Zero-based positional index on the command line
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<usize>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,

    #[serde(default)]
    pub pipeline: PipelineBinding,

    /// Request field path; dotted segments nest (defaults to `name`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,

    /// Regex the string form of each value must match
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
}

impl ParamSpec {
    /// Request field path for this parameter
    pub fn field_path(&self) -> &str {
        self.field.as_deref().unwrap_or(&self.name)
    }

    /// True if `name` is the canonical name or an alias (case-insensitive)
    pub fn answers_to(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
            || self.aliases.iter().any(|a| a.eq_ignore_ascii_case(name))
    }

    /// Long CLI flag for the parameter (`VolumeId` -> `volume-id`)
    pub fn flag(&self) -> String {
        to_kebab_case(&self.name)
    }
}

/// Pagination capability of a list/describe operation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    /// Request field carrying the continuation token
    #[serde(default = "default_token_field")]
    pub input_token: String,

    /// Response field carrying the next continuation token
    #[serde(default = "default_token_field")]
    pub output_token: String,

    /// Request field carrying the page size, when the API supports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size_field: Option<String>,
}

fn default_token_field() -> String {
    "NextToken".to_string()
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            input_token: default_token_field(),
            output_token: default_token_field(),
            page_size_field: Some("MaxResults".to_string()),
        }
    }
}

/// Confirmation settings of a mutating operation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Confirmation {
    /// Parameter naming the primary target resource
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,

    /// Handlebars template describing the action, rendered over bound parameters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// What happens when `--pass-thru` and an explicit `--select` are both given
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PassThruPolicy {
    /// The combination is an error
    #[default]
    Reject,
    /// Pass-through silently replaces the explicit selector
    Override,
}

/// Legacy pass-through flag: echo an input parameter as output
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PassThru {
    pub parameter: String,

    /// Falls back to the configured default when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<PassThruPolicy>,
}

/// Complete description of one remote operation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationDescriptor {
    /// Command name (e.g. `attach-volume`)
    pub name: String,

    /// Provider action name (e.g. `AttachVolume`)
    pub action: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    #[serde(default)]
    pub parameters: Vec<ParamSpec>,

    /// Selector applied when the caller gives none (`*` for whole response)
    #[serde(default = "default_selector")]
    pub default_selector: String,

    /// Top-level response members, used to validate selectors up front
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub response_fields: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,

    /// Mutating operations pass through the confirmation gate
    #[serde(default)]
    pub mutating: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirmation: Option<Confirmation>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pass_thru: Option<PassThru>,
}

fn default_selector() -> String {
    "*".to_string()
}

impl OperationDescriptor {
    pub fn is_paginated(&self) -> bool {
        self.pagination.is_some()
    }

    /// Look up a parameter by name or alias
    pub fn param(&self, name: &str) -> Option<&ParamSpec> {
        self.parameters.iter().find(|p| p.answers_to(name))
    }

    /// Parameters that may be bound from pipeline input
    pub fn pipeline_params(&self) -> impl Iterator<Item = &ParamSpec> {
        self.parameters
            .iter()
            .filter(|p| p.pipeline != PipelineBinding::None)
    }

    /// Check internal consistency of a descriptor loaded from a catalog
    pub fn validate(&self) -> crate::Result<()> {
        let invalid = |reason: String| {
            crate::CmdletError::config(format!("operation '{}': {}", self.name, reason))
        };

        if self.name.is_empty() || self.action.is_empty() {
            return Err(invalid("name and action are required".into()));
        }

        let mut seen: Vec<&str> = Vec::new();
        for param in &self.parameters {
            let flag = param.flag();
            if RESERVED_FLAGS.contains(&flag.as_str()) {
                return Err(invalid(format!(
                    "parameter '{}' collides with the common flag --{}",
                    param.name, flag
                )));
            }
            for name in std::iter::once(&param.name).chain(&param.aliases) {
                if seen.iter().any(|s| s.eq_ignore_ascii_case(name)) {
                    return Err(invalid(format!("duplicate parameter name '{}'", name)));
                }
                seen.push(name);
            }
            if let Some(pattern) = &param.pattern {
                regex::Regex::new(pattern).map_err(|e| {
                    invalid(format!("parameter '{}' has a bad pattern: {}", param.name, e))
                })?;
            }
        }

        let mut positions: Vec<usize> = self.parameters.iter().filter_map(|p| p.position).collect();
        positions.sort_unstable();
        if positions.iter().enumerate().any(|(i, p)| i != *p) {
            return Err(invalid("positional indexes must be contiguous from 0".into()));
        }

        let mut paths: Vec<(&str, &str)> = Vec::new();
        for param in &self.parameters {
            let path = param.field_path();
            if path.split('.').any(str::is_empty) {
                return Err(invalid(format!(
                    "parameter '{}' has an empty segment in field '{}'",
                    param.name, path
                )));
            }
            paths.push((param.name.as_str(), path));
        }
        if let Some(pagination) = &self.pagination {
            paths.push(("pagination token", pagination.input_token.as_str()));
            if let Some(field) = &pagination.page_size_field {
                paths.push(("page size", field.as_str()));
            }
        }
        for (i, (owner, path)) in paths.iter().enumerate() {
            for (other_owner, other) in &paths[i + 1..] {
                if paths_overlap(path, other) {
                    return Err(invalid(format!(
                        "request field '{}' of {} overlaps '{}' of {}",
                        path, owner, other, other_owner
                    )));
                }
            }
        }

        if let Some(pass_thru) = &self.pass_thru {
            if self.param(&pass_thru.parameter).is_none() {
                return Err(invalid(format!(
                    "pass-thru names unknown parameter '{}'",
                    pass_thru.parameter
                )));
            }
        }

        if let Some(target) = self.confirmation.as_ref().and_then(|c| c.target.as_ref()) {
            if self.param(target).is_none() {
                return Err(invalid(format!(
                    "confirmation target names unknown parameter '{}'",
                    target
                )));
            }
        }

        Ok(())
    }
}

/// True when one dotted path equals the other or is an ancestor of it
fn paths_overlap(a: &str, b: &str) -> bool {
    let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    long == short || (long.starts_with(short) && long[short.len()..].starts_with('.'))
}

/// Convert a PascalCase/camelCase identifier to kebab-case
pub fn to_kebab_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c.is_ascii_uppercase() {
            let prev_lower = i > 0 && (chars[i - 1].is_ascii_lowercase() || chars[i - 1].is_ascii_digit());
            let next_lower = chars.get(i + 1).is_some_and(|n| n.is_ascii_lowercase());
            let prev_upper = i > 0 && chars[i - 1].is_ascii_uppercase();
            if i > 0 && (prev_lower || (prev_upper && next_lower)) {
                out.push('-');
            }
            out.push(c.to_ascii_lowercase());
        } else if c == '_' {
            out.push('-');
        } else {
            out.push(c);
        }
    }
    out
}
