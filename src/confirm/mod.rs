//! @acp:module "Confirmation Gate"
//! @acp:summary "Interactive confirmation before mutating calls"
//! @acp:domain cli
//! @acp:layer logic
//!
//! Confirmation gate
//!
//! Mutating operations must be confirmed interactively or forced before any
//! request is sent. Declining is a normal outcome, not an error.

use console::Term;
use dialoguer::{theme::ColorfulTheme, Confirm};
use handlebars::Handlebars;
use serde_json::{Map, Value};

use crate::context::ExecutionContext;
use crate::error::Result;
use crate::operation::OperationDescriptor;

/// What the user is asked to approve
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmPrompt {
    pub operation: String,
    pub target: Option<String>,
    pub description: String,
}

/// Result of passing through the gate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Proceed,
    Declined,
}

/// Source of yes/no answers
pub trait Confirmer {
    fn confirm(&self, prompt: &ConfirmPrompt) -> Result<bool>;
}

/// Prompts on the terminal; declines when stderr is not interactive
#[derive(Debug, Default)]
pub struct TerminalConfirmer {
    /// Accept without prompting
    pub assume_yes: bool,
}

impl Confirmer for TerminalConfirmer {
    fn confirm(&self, prompt: &ConfirmPrompt) -> Result<bool> {
        if self.assume_yes {
            return Ok(true);
        }
        if !Term::stderr().is_term() {
            tracing::warn!(
                operation = %prompt.operation,
                "not a terminal; declining (use --force to skip confirmation)"
            );
            return Ok(false);
        }

        let answer = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(format!("{} Are you sure you want to proceed?", prompt.description))
            .default(false)
            .interact_on(&Term::stderr())?;
        Ok(answer)
    }
}

/// Always answers the same way
#[derive(Debug, Clone, Copy)]
pub struct FixedAnswer(pub bool);

impl Confirmer for FixedAnswer {
    fn confirm(&self, _prompt: &ConfirmPrompt) -> Result<bool> {
        Ok(self.0)
    }
}

/// Build the human-readable description of a pending mutating call
pub fn describe(descriptor: &OperationDescriptor, ctx: &ExecutionContext) -> Result<ConfirmPrompt> {
    let confirmation = descriptor.confirmation.clone().unwrap_or_default();

    let target = confirmation
        .target
        .as_deref()
        .and_then(|name| descriptor.param(name))
        .and_then(|spec| ctx.get(&spec.name))
        .map(|value| match value.to_json() {
            Value::String(s) => s,
            Value::Array(items) => items
                .iter()
                .map(|i| i.as_str().map(str::to_string).unwrap_or_else(|| i.to_string()))
                .collect::<Vec<_>>()
                .join(", "),
            other => other.to_string(),
        });

    let description = match &confirmation.message {
        Some(template) => {
            let data: Map<String, Value> = ctx
                .values()
                .iter()
                .map(|(name, value)| (name.clone(), value.to_json()))
                .collect();
            let mut handlebars = Handlebars::new();
            handlebars.register_escape_fn(handlebars::no_escape);
            handlebars.render_template(template, &Value::Object(data))?
        }
        None => match &target {
            Some(target) => format!("Performing {} ({}) on \"{}\".", descriptor.name, descriptor.action, target),
            None => format!("Performing {} ({}).", descriptor.name, descriptor.action),
        },
    };

    Ok(ConfirmPrompt {
        operation: descriptor.name.clone(),
        target,
        description,
    })
}

/// Decide whether the invocation may proceed
///
/// Read-only operations and forced invocations never prompt.
pub fn gate(
    descriptor: &OperationDescriptor,
    ctx: &ExecutionContext,
    confirmer: &dyn Confirmer,
) -> Result<GateDecision> {
    if !descriptor.mutating || ctx.force() {
        return Ok(GateDecision::Proceed);
    }

    let prompt = describe(descriptor, ctx)?;
    if confirmer.confirm(&prompt)? {
        Ok(GateDecision::Proceed)
    } else {
        tracing::info!(operation = %descriptor.name, "confirmation declined; nothing sent");
        Ok(GateDecision::Declined)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::InvocationOptions;
    use crate::operation::PassThruPolicy;
    use crate::params::{ParamValue, ParameterSet};
    use serde_json::json;
    use std::cell::Cell;

    struct Counting {
        asked: Cell<usize>,
        answer: bool,
    }

    impl Confirmer for Counting {
        fn confirm(&self, _prompt: &ConfirmPrompt) -> Result<bool> {
            self.asked.set(self.asked.get() + 1);
            Ok(self.answer)
        }
    }

    fn delete_volume(message: Option<&str>) -> OperationDescriptor {
        let mut op: OperationDescriptor = serde_json::from_value(json!({
            "name": "delete-volume",
            "action": "DeleteVolume",
            "mutating": true,
            "confirmation": {"target": "VolumeId"},
            "parameters": [{"name": "VolumeId", "kind": "string", "required": true}]
        }))
        .unwrap();
        if let Some(message) = message {
            op.confirmation.as_mut().unwrap().message = Some(message.to_string());
        }
        op
    }

    fn ctx(op: &OperationDescriptor, force: bool) -> ExecutionContext {
        let params = ParameterSet::new()
            .bind(op, "VolumeId", ParamValue::String("vol-1".into()))
            .unwrap();
        let options = InvocationOptions {
            force,
            ..Default::default()
        };
        ExecutionContext::build(op, params, &options, PassThruPolicy::Reject, None).unwrap()
    }

    #[test]
    fn test_force_skips_prompt() {
        let op = delete_volume(None);
        let confirmer = Counting { asked: Cell::new(0), answer: false };
        assert_eq!(gate(&op, &ctx(&op, true), &confirmer).unwrap(), GateDecision::Proceed);
        assert_eq!(confirmer.asked.get(), 0);
    }

    #[test]
    fn test_decline_is_not_an_error() {
        let op = delete_volume(None);
        let confirmer = Counting { asked: Cell::new(0), answer: false };
        assert_eq!(gate(&op, &ctx(&op, false), &confirmer).unwrap(), GateDecision::Declined);
        assert_eq!(confirmer.asked.get(), 1);
    }

    #[test]
    fn test_read_only_never_prompts() {
        let mut op = delete_volume(None);
        op.mutating = false;
        let confirmer = Counting { asked: Cell::new(0), answer: false };
        assert_eq!(gate(&op, &ctx(&op, false), &confirmer).unwrap(), GateDecision::Proceed);
        assert_eq!(confirmer.asked.get(), 0);
    }

    #[test]
    fn test_default_description_names_target() {
        let op = delete_volume(None);
        let prompt = describe(&op, &ctx(&op, false)).unwrap();
        assert_eq!(prompt.target.as_deref(), Some("vol-1"));
        assert_eq!(
            prompt.description,
            "Performing delete-volume (DeleteVolume) on \"vol-1\"."
        );
    }

    #[test]
    fn test_template_description() {
        let op = delete_volume(Some("Delete volume {{VolumeId}} permanently."));
        let prompt = describe(&op, &ctx(&op, false)).unwrap();
        assert_eq!(prompt.description, "Delete volume vol-1 permanently.");
    }
}
