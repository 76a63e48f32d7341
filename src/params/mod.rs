//! @acp:module "Parameters"
//! @acp:summary "Typed parameter binding and pipeline input"
//! @acp:domain cli
//! @acp:layer model
//!
//! Parameter binding
//!
//! A `ParameterSet` holds the raw values bound for one invocation, keyed by
//! canonical parameter name. Values arrive from CLI flags or from pipeline
//! input and are coerced to the kind the descriptor declares.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::{CmdletError, Result};
use crate::operation::{OperationDescriptor, ParamKind, ParamSpec, PipelineBinding};

/// A typed parameter value
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    String(String),
    Boolean(bool),
    Integer(i64),
    StringList(Vec<String>),
    Object(Value),
}

impl ParamValue {
    pub fn kind(&self) -> ParamKind {
        match self {
            ParamValue::String(_) => ParamKind::String,
            ParamValue::Boolean(_) => ParamKind::Boolean,
            ParamValue::Integer(_) => ParamKind::Integer,
            ParamValue::StringList(_) => ParamKind::StringList,
            ParamValue::Object(_) => ParamKind::Object,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            ParamValue::String(s) => Value::String(s.clone()),
            ParamValue::Boolean(b) => Value::Bool(*b),
            ParamValue::Integer(i) => Value::from(*i),
            ParamValue::StringList(items) => {
                Value::Array(items.iter().cloned().map(Value::String).collect())
            }
            ParamValue::Object(v) => v.clone(),
        }
    }

    /// Coerce a JSON value into the given kind
    pub fn from_json(spec: &ParamSpec, value: &Value) -> Result<Self> {
        let mismatch = || {
            CmdletError::invalid_parameter(
                &spec.name,
                format!("expected {}, got {}", spec.kind.as_str(), value),
            )
        };

        Ok(match spec.kind {
            ParamKind::String => match value {
                Value::String(s) => ParamValue::String(s.clone()),
                Value::Number(n) => ParamValue::String(n.to_string()),
                Value::Bool(b) => ParamValue::String(b.to_string()),
                _ => return Err(mismatch()),
            },
            ParamKind::Boolean => match value {
                Value::Bool(b) => ParamValue::Boolean(*b),
                Value::String(s) => ParamValue::Boolean(parse_bool(s).ok_or_else(mismatch)?),
                _ => return Err(mismatch()),
            },
            ParamKind::Integer => match value {
                Value::Number(n) => ParamValue::Integer(n.as_i64().ok_or_else(mismatch)?),
                Value::String(s) => ParamValue::Integer(s.trim().parse().map_err(|_| mismatch())?),
                _ => return Err(mismatch()),
            },
            ParamKind::StringList => match value {
                Value::String(s) => ParamValue::StringList(vec![s.clone()]),
                Value::Array(items) => ParamValue::StringList(
                    items
                        .iter()
                        .map(|item| match item {
                            Value::String(s) => Ok(s.clone()),
                            Value::Number(n) => Ok(n.to_string()),
                            _ => Err(mismatch()),
                        })
                        .collect::<Result<Vec<_>>>()?,
                ),
                _ => return Err(mismatch()),
            },
            ParamKind::Object => match value {
                Value::Object(_) | Value::Array(_) => ParamValue::Object(value.clone()),
                Value::String(s) => ParamValue::Object(
                    serde_json::from_str(s).map_err(|e| {
                        CmdletError::invalid_parameter(&spec.name, format!("invalid JSON: {}", e))
                    })?,
                ),
                _ => return Err(mismatch()),
            },
        })
    }

    /// Parse command-line text into the given kind
    pub fn parse(spec: &ParamSpec, raw: &[String]) -> Result<Self> {
        match spec.kind {
            ParamKind::StringList => Ok(ParamValue::StringList(raw.to_vec())),
            _ => {
                let text = raw.last().ok_or_else(|| {
                    CmdletError::invalid_parameter(&spec.name, "no value given")
                })?;
                Self::from_json(spec, &Value::String(text.clone()))
            }
        }
    }

    /// String forms checked against a parameter's validation pattern
    fn pattern_subjects(&self) -> Vec<String> {
        match self {
            ParamValue::String(s) => vec![s.clone()],
            ParamValue::StringList(items) => items.clone(),
            ParamValue::Integer(i) => vec![i.to_string()],
            ParamValue::Boolean(_) | ParamValue::Object(_) => vec![],
        }
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Some(true),
        "false" | "no" | "0" => Some(false),
        _ => None,
    }
}

/// Raw values bound for one invocation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterSet {
    values: BTreeMap<String, ParamValue>,
}

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a value under the parameter's canonical name
    ///
    /// Rejects names the descriptor does not declare and values whose kind
    /// or pattern do not match.
    pub fn bind(
        mut self,
        descriptor: &OperationDescriptor,
        name: &str,
        value: ParamValue,
    ) -> Result<Self> {
        let spec = descriptor.param(name).ok_or_else(|| {
            CmdletError::invalid_parameter(
                name,
                format!("{} has no such parameter", descriptor.name),
            )
        })?;
        validate_value(spec, &value)?;
        self.values.insert(spec.name.clone(), value);
        Ok(self)
    }

    /// Bind one pipeline value according to each parameter's pipeline mode
    ///
    /// Values already bound explicitly win over pipeline input.
    pub fn bind_pipeline(mut self, descriptor: &OperationDescriptor, input: &Value) -> Result<Self> {
        let mut bound_any = false;

        for spec in descriptor.pipeline_params() {
            if self.values.contains_key(&spec.name) {
                continue;
            }
            let candidate = match (spec.pipeline, input) {
                (PipelineBinding::ByPropertyName, Value::Object(map)) => map
                    .iter()
                    .find(|(key, _)| spec.answers_to(key))
                    .map(|(_, v)| v),
                (PipelineBinding::ByValue, Value::Object(_)) if spec.kind != ParamKind::Object => None,
                (PipelineBinding::ByValue, v) => Some(v),
                _ => None,
            };
            if let Some(value) = candidate {
                let value = ParamValue::from_json(spec, value)?;
                validate_value(spec, &value)?;
                self.values.insert(spec.name.clone(), value);
                bound_any = true;
            }
        }

        if !bound_any {
            tracing::debug!(
                operation = %descriptor.name,
                "pipeline input bound no parameters: {}",
                input
            );
        }
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ParamValue)> {
        self.values.iter()
    }
}

fn validate_value(spec: &ParamSpec, value: &ParamValue) -> Result<()> {
    if value.kind() != spec.kind {
        return Err(CmdletError::invalid_parameter(
            &spec.name,
            format!("expected {}, got {}", spec.kind.as_str(), value.kind().as_str()),
        ));
    }

    if let Some(pattern) = &spec.pattern {
        let re = regex::Regex::new(pattern)
            .map_err(|e| CmdletError::invalid_parameter(&spec.name, e.to_string()))?;
        if let Some(bad) = value.pattern_subjects().into_iter().find(|s| !re.is_match(s)) {
            return Err(CmdletError::invalid_parameter(
                &spec.name,
                format!("'{}' does not match {}", bad, pattern),
            ));
        }
    }

    Ok(())
}
