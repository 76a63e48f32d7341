//! @acp:module "Selectors"
//! @acp:summary "Output selector parsing and resolution"
//! @acp:domain cli
//! @acp:layer model
//!
//! Output selectors
//!
//! A selector chooses which part of a response (or which input parameter)
//! becomes the command's output.

use std::fmt;

use serde_json::Value;

use crate::error::{CmdletError, Result};
use crate::operation::{OperationDescriptor, PassThruPolicy};

/// Marker prefix that selects an input parameter instead of a response field
pub const ECHO_PREFIX: char = '^';

/// Wildcard selecting the entire response
pub const WHOLE_RESPONSE: &str = "*";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// The descriptor's primary response field
    Default,
    WholeResponse,
    NamedField(String),
    EchoParameter(String),
}

impl Selector {
    /// Parse the textual form (`*`, `^Param`, `Field`)
    pub fn parse(text: &str) -> Result<Self> {
        let text = text.trim();
        if text.is_empty() {
            return Err(CmdletError::invalid_selector(text, "selector is empty"));
        }
        if text == WHOLE_RESPONSE {
            return Ok(Selector::WholeResponse);
        }
        if let Some(param) = text.strip_prefix(ECHO_PREFIX) {
            if param.is_empty() {
                return Err(CmdletError::invalid_selector(
                    text,
                    "missing parameter name after '^'",
                ));
            }
            return Ok(Selector::EchoParameter(param.to_string()));
        }
        if text.split('.').any(str::is_empty) {
            return Err(CmdletError::invalid_selector(text, "empty field path segment"));
        }
        Ok(Selector::NamedField(text.to_string()))
    }

    /// Replace `Default` with the descriptor's default selector
    pub fn resolve(self, descriptor: &OperationDescriptor) -> Result<Self> {
        let resolved = match self {
            Selector::Default => Selector::parse(&descriptor.default_selector)?,
            other => other,
        };
        resolved.check(descriptor)?;
        Ok(resolved)
    }

    /// Validate a resolved selector against what the descriptor declares
    fn check(&self, descriptor: &OperationDescriptor) -> Result<()> {
        match self {
            Selector::EchoParameter(name) if descriptor.param(name).is_none() => {
                Err(CmdletError::invalid_selector(
                    self.to_string(),
                    format!("{} has no parameter named '{}'", descriptor.name, name),
                ))
            }
            Selector::NamedField(name) if !descriptor.response_fields.is_empty() => {
                let head = name.split('.').next().unwrap_or(name);
                if descriptor
                    .response_fields
                    .iter()
                    .any(|f| f.eq_ignore_ascii_case(head))
                {
                    Ok(())
                } else {
                    Err(CmdletError::invalid_selector(
                        self.to_string(),
                        format!(
                            "{} responses have no field '{}' (known: {})",
                            descriptor.name,
                            head,
                            descriptor.response_fields.join(", ")
                        ),
                    ))
                }
            }
            _ => Ok(()),
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Default => write!(f, "(default)"),
            Selector::WholeResponse => write!(f, "{}", WHOLE_RESPONSE),
            Selector::NamedField(name) => write!(f, "{}", name),
            Selector::EchoParameter(name) => write!(f, "{}{}", ECHO_PREFIX, name),
        }
    }
}

/// Decide the effective selector from `--select` and `--pass-thru`
///
/// When both are given the descriptor's policy (or the configured fallback)
/// decides between rejecting the call and letting pass-through win.
pub fn resolve_output(
    descriptor: &OperationDescriptor,
    explicit: Option<&str>,
    pass_thru: bool,
    fallback_policy: PassThruPolicy,
) -> Result<Selector> {
    let selector = match (explicit, pass_thru) {
        (_, true) => {
            let spec = descriptor.pass_thru.as_ref().ok_or_else(|| {
                CmdletError::invalid_parameter(
                    "PassThru",
                    format!("{} does not support --pass-thru", descriptor.name),
                )
            })?;
            if let Some(text) = explicit {
                match spec.policy.unwrap_or(fallback_policy) {
                    PassThruPolicy::Reject => {
                        return Err(CmdletError::ConflictingSelection {
                            operation: descriptor.name.clone(),
                            selector: text.to_string(),
                        });
                    }
                    PassThruPolicy::Override => {
                        tracing::debug!(
                            operation = %descriptor.name,
                            "--pass-thru overrides --select '{}'",
                            text
                        );
                    }
                }
            }
            Selector::EchoParameter(spec.parameter.clone())
        }
        (Some(text), false) => Selector::parse(text)?,
        (None, false) => Selector::Default,
    };
    selector.resolve(descriptor)
}

/// Look up a field by exact name, then ASCII case-insensitively
pub fn lookup_field<'a>(object: &'a Value, name: &str) -> Option<&'a Value> {
    let map = object.as_object()?;
    map.get(name).or_else(|| {
        map.iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    })
}

/// Walk a dotted field path
pub fn lookup_path<'a>(object: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(object, |current, segment| lookup_field(current, segment))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn descriptor() -> OperationDescriptor {
        serde_json::from_value(json!({
            "name": "attach-volume",
            "action": "AttachVolume",
            "defaultSelector": "Attachment",
            "responseFields": ["Attachment"],
            "mutating": true,
            "parameters": [
                {"name": "VolumeId", "kind": "string"},
                {"name": "InstanceId", "kind": "string"}
            ],
            "passThru": {"parameter": "VolumeId"}
        }))
        .unwrap()
    }

    #[test]
    fn test_parse_forms() {
        assert_eq!(Selector::parse("*").unwrap(), Selector::WholeResponse);
        assert_eq!(
            Selector::parse("^VolumeId").unwrap(),
            Selector::EchoParameter("VolumeId".into())
        );
        assert_eq!(
            Selector::parse("Attachment.State").unwrap(),
            Selector::NamedField("Attachment.State".into())
        );
        assert!(Selector::parse("^").is_err());
        assert!(Selector::parse("").is_err());
        assert!(Selector::parse("a..b").is_err());
    }

    #[test]
    fn test_default_resolves_to_descriptor_field() {
        let op = descriptor();
        assert_eq!(
            Selector::Default.resolve(&op).unwrap(),
            Selector::NamedField("Attachment".into())
        );
    }

    #[test]
    fn test_unknown_field_rejected_up_front() {
        let op = descriptor();
        let err = Selector::parse("Volumes").unwrap().resolve(&op).unwrap_err();
        assert!(matches!(err, CmdletError::InvalidSelector { .. }));
    }

    #[test]
    fn test_unknown_echo_parameter_rejected() {
        let op = descriptor();
        let err = Selector::parse("^Device").unwrap().resolve(&op).unwrap_err();
        assert!(matches!(err, CmdletError::InvalidSelector { .. }));
    }

    #[test]
    fn test_pass_thru_alone_echoes_parameter() {
        let op = descriptor();
        assert_eq!(
            resolve_output(&op, None, true, PassThruPolicy::Reject).unwrap(),
            Selector::EchoParameter("VolumeId".into())
        );
    }

    // The two pass-through precedence behaviors are deliberately both kept;
    // each descriptor (or the config fallback) picks one.
    #[test]
    fn test_pass_thru_conflict_rejected_under_reject_policy() {
        let op = descriptor();
        let err = resolve_output(&op, Some("*"), true, PassThruPolicy::Reject).unwrap_err();
        assert!(matches!(err, CmdletError::ConflictingSelection { .. }));
    }

    #[test]
    fn test_pass_thru_conflict_overrides_under_override_policy() {
        let op = descriptor();
        assert_eq!(
            resolve_output(&op, Some("*"), true, PassThruPolicy::Override).unwrap(),
            Selector::EchoParameter("VolumeId".into())
        );
    }

    #[test]
    fn test_descriptor_policy_beats_fallback() {
        let mut op = descriptor();
        op.pass_thru.as_mut().unwrap().policy = Some(PassThruPolicy::Override);
        assert!(resolve_output(&op, Some("*"), true, PassThruPolicy::Reject).is_ok());
    }

    #[test]
    fn test_lookup_is_case_insensitive_fallback() {
        let response = json!({"attachment": {"State": "attaching"}});
        assert_eq!(
            lookup_path(&response, "Attachment.state"),
            Some(&json!("attaching"))
        );
        assert!(lookup_path(&response, "Volume").is_none());
    }
}
