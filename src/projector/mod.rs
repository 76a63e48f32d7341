//! @acp:module "Response Projector"
//! @acp:summary "Selects the output value from a response or input"
//! @acp:domain cli
//! @acp:layer logic
//!
//! Response projection
//!
//! Applies the resolved selector to a response (or to the invocation's
//! input, for echo selectors) and produces the values to emit.

use serde_json::Value;

use crate::client::Response;
use crate::context::ExecutionContext;
use crate::error::{CmdletError, Result};
use crate::operation::OperationDescriptor;
use crate::selector::{lookup_path, Selector};

/// Project one response into zero or more output values
///
/// `response` is `None` when nothing was fetched (an echo selection after a
/// call with an empty body behaves the same way). For paginated operations an
/// array-valued field is flattened so pages concatenate item by item.
pub fn project(
    descriptor: &OperationDescriptor,
    ctx: &ExecutionContext,
    response: Option<&Response>,
) -> Result<Vec<Value>> {
    match ctx.selector() {
        Selector::Default => Err(CmdletError::invalid_selector(
            "(default)",
            "selector was not resolved against the operation",
        )),
        Selector::EchoParameter(name) => {
            let spec = descriptor.param(name).ok_or_else(|| {
                CmdletError::invalid_selector(
                    format!("^{}", name),
                    format!("{} has no parameter named '{}'", descriptor.name, name),
                )
            })?;
            Ok(ctx
                .get(&spec.name)
                .map(|value| vec![value.to_json()])
                .unwrap_or_default())
        }
        Selector::WholeResponse => Ok(response.cloned().into_iter().collect()),
        Selector::NamedField(path) => {
            let Some(response) = response else {
                return Ok(Vec::new());
            };
            match lookup_path(response, path) {
                Some(Value::Null) => Ok(Vec::new()),
                Some(Value::Array(items)) if descriptor.is_paginated() => Ok(items.clone()),
                Some(value) => Ok(vec![value.clone()]),
                None if declares_field(descriptor, path) => Ok(Vec::new()),
                None => Err(CmdletError::invalid_selector(
                    path,
                    format!("{} response has no field '{}'", descriptor.name, path),
                )),
            }
        }
    }
}

fn declares_field(descriptor: &OperationDescriptor, path: &str) -> bool {
    let head = path.split('.').next().unwrap_or(path);
    descriptor
        .response_fields
        .iter()
        .any(|f| f.eq_ignore_ascii_case(head))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::InvocationOptions;
    use crate::operation::PassThruPolicy;
    use crate::params::{ParamValue, ParameterSet};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn attach_volume() -> OperationDescriptor {
        serde_json::from_value(json!({
            "name": "attach-volume",
            "action": "AttachVolume",
            "defaultSelector": "Attachment",
            "mutating": true,
            "parameters": [
                {"name": "Device", "kind": "string", "required": true},
                {"name": "InstanceId", "kind": "string", "required": true},
                {"name": "VolumeId", "kind": "string", "required": true}
            ]
        }))
        .unwrap()
    }

    fn context(op: &OperationDescriptor, select: Option<&str>) -> ExecutionContext {
        let params = ParameterSet::new()
            .bind(op, "Device", ParamValue::String("/dev/sdh".into()))
            .unwrap()
            .bind(op, "InstanceId", ParamValue::String("i-1234".into()))
            .unwrap()
            .bind(op, "VolumeId", ParamValue::String("vol-5678".into()))
            .unwrap();
        let options = InvocationOptions {
            select: select.map(str::to_string),
            force: true,
            ..Default::default()
        };
        ExecutionContext::build(op, params, &options, PassThruPolicy::Reject, None).unwrap()
    }

    fn response() -> Value {
        json!({"attachment": {"State": "attaching", "VolumeId": "vol-5678"}, "RequestId": "r-1"})
    }

    #[test]
    fn test_default_selects_primary_field() {
        let op = attach_volume();
        let out = project(&op, &context(&op, None), Some(&response())).unwrap();
        assert_eq!(out, vec![json!({"State": "attaching", "VolumeId": "vol-5678"})]);
    }

    #[test]
    fn test_wildcard_returns_whole_response() {
        let op = attach_volume();
        let out = project(&op, &context(&op, Some("*")), Some(&response())).unwrap();
        assert_eq!(out, vec![response()]);
    }

    #[test]
    fn test_named_nested_field() {
        let op = attach_volume();
        let out = project(&op, &context(&op, Some("Attachment.State")), Some(&response())).unwrap();
        assert_eq!(out, vec![json!("attaching")]);
    }

    #[test]
    fn test_unknown_field_is_invalid_selector() {
        let op = attach_volume();
        let err = project(&op, &context(&op, Some("Volumes")), Some(&response())).unwrap_err();
        assert!(matches!(err, CmdletError::InvalidSelector { .. }));
    }

    #[test]
    fn test_echo_parameter_ignores_response() {
        let op = attach_volume();
        let out = project(&op, &context(&op, Some("^VolumeId")), None).unwrap();
        assert_eq!(out, vec![json!("vol-5678")]);
    }

    #[test]
    fn test_unpaginated_array_not_flattened() {
        let op = attach_volume();
        let body = json!({"Tags": [{"Key": "a"}, {"Key": "b"}]});
        let out = project(&op, &context(&op, Some("Tags")), Some(&body)).unwrap();
        assert_eq!(out, vec![json!([{"Key": "a"}, {"Key": "b"}])]);
    }
}
