//! @acp:module "Request Translator"
//! @acp:summary "Maps an execution context onto provider request fields"
//! @acp:domain cli
//! @acp:layer logic
//!
//! Request translation
//!
//! Maps an execution context onto the provider payload. The mapping is pure
//! and reversible: `bound_fields` recovers exactly the parameters that went
//! in.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::context::ExecutionContext;
use crate::operation::OperationDescriptor;
use crate::params::ParamValue;

/// A provider request: the action name plus its field payload
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Request {
    pub action: String,
    pub fields: Map<String, Value>,
}

impl Request {
    /// Build the first request for an invocation
    ///
    /// Unset context values are omitted. Pagination fields come from the
    /// context's paging controls, never from parameters.
    pub fn from_context(descriptor: &OperationDescriptor, ctx: &ExecutionContext) -> Self {
        let mut fields = Map::new();

        for spec in &descriptor.parameters {
            if let Some(value) = ctx.get(&spec.name) {
                insert_path(&mut fields, spec.field_path(), value.to_json());
            }
        }

        let mut request = Self {
            action: descriptor.action.clone(),
            fields,
        };

        if let (Some(pagination), Some(paging)) = (&descriptor.pagination, ctx.paging()) {
            if let (Some(field), Some(size)) = (&pagination.page_size_field, paging.page_size) {
                request.fields.insert(field.clone(), Value::from(size));
            }
            if let Some(token) = &paging.start_token {
                request = request.with_cursor(descriptor, token);
            }
        }

        request
    }

    /// Copy of this request carrying a continuation token
    pub fn with_cursor(&self, descriptor: &OperationDescriptor, cursor: &str) -> Self {
        let mut next = self.clone();
        if let Some(pagination) = &descriptor.pagination {
            next.fields
                .insert(pagination.input_token.clone(), Value::String(cursor.to_string()));
        }
        next
    }

    /// Continuation token carried by this request, if any
    pub fn cursor(&self, descriptor: &OperationDescriptor) -> Option<&str> {
        let pagination = descriptor.pagination.as_ref()?;
        self.fields.get(&pagination.input_token)?.as_str()
    }

    /// Re-derive the parameter values that produced this request
    pub fn bound_fields(&self, descriptor: &OperationDescriptor) -> BTreeMap<String, ParamValue> {
        let root = Value::Object(self.fields.clone());
        descriptor
            .parameters
            .iter()
            .filter_map(|spec| {
                let raw = lookup_exact(&root, spec.field_path())?;
                ParamValue::from_json(spec, raw)
                    .ok()
                    .map(|value| (spec.name.clone(), value))
            })
            .collect()
    }
}

/// Insert at a dotted path, creating intermediate objects
fn insert_path(fields: &mut Map<String, Value>, path: &str, value: Value) {
    let mut segments = path.split('.').peekable();
    let mut current = fields;
    while let Some(segment) = segments.next() {
        if segments.peek().is_none() {
            current.insert(segment.to_string(), value);
            return;
        }
        let entry = current
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        current = match entry.as_object_mut() {
            Some(map) => map,
            None => return,
        };
    }
}

fn lookup_exact<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(root, |node, segment| node.get(segment))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::InvocationOptions;
    use crate::operation::PassThruPolicy;
    use crate::params::ParameterSet;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn modify_vpc_attribute() -> OperationDescriptor {
        serde_json::from_value(json!({
            "name": "modify-vpc-attribute",
            "action": "ModifyVpcAttribute",
            "mutating": true,
            "parameters": [
                {"name": "VpcId", "kind": "string", "required": true},
                {"name": "EnableDnsSupport", "kind": "boolean", "field": "EnableDnsSupport.Value"},
                {"name": "EnableDnsHostnames", "kind": "boolean", "field": "EnableDnsHostnames.Value"}
            ]
        }))
        .unwrap()
    }

    fn describe_volumes() -> OperationDescriptor {
        serde_json::from_value(json!({
            "name": "describe-volumes",
            "action": "DescribeVolumes",
            "defaultSelector": "Volumes",
            "pagination": {"pageSizeField": "MaxResults"},
            "parameters": [
                {"name": "VolumeId", "kind": "string-list"}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_nested_field_paths() {
        let op = modify_vpc_attribute();
        let params = ParameterSet::new()
            .bind(&op, "VpcId", ParamValue::String("vpc-1".into()))
            .unwrap()
            .bind(&op, "EnableDnsSupport", ParamValue::Boolean(true))
            .unwrap();
        let ctx = ExecutionContext::build(
            &op,
            params,
            &InvocationOptions::default(),
            PassThruPolicy::Reject,
            None,
        )
        .unwrap();

        let request = Request::from_context(&op, &ctx);
        assert_eq!(request.action, "ModifyVpcAttribute");
        assert_eq!(
            Value::Object(request.fields.clone()),
            json!({"VpcId": "vpc-1", "EnableDnsSupport": {"Value": true}})
        );
        assert_eq!(request.bound_fields(&op), ctx.values().clone());
    }

    #[test]
    fn test_pagination_fields_kept_out_of_bound_fields() {
        let op = describe_volumes();
        let params = ParameterSet::new()
            .bind(&op, "VolumeId", ParamValue::StringList(vec!["vol-1".into()]))
            .unwrap();
        let options = InvocationOptions {
            page_size: Some(5),
            next_token: Some("tok".into()),
            ..Default::default()
        };
        let ctx = ExecutionContext::build(&op, params, &options, PassThruPolicy::Reject, None)
            .unwrap();

        let request = Request::from_context(&op, &ctx);
        assert_eq!(
            Value::Object(request.fields.clone()),
            json!({"VolumeId": ["vol-1"], "MaxResults": 5, "NextToken": "tok"})
        );
        assert_eq!(request.cursor(&op), Some("tok"));
        assert_eq!(request.bound_fields(&op), ctx.values().clone());
    }

    #[test]
    fn test_with_cursor_replaces_token() {
        let op = describe_volumes();
        let ctx = ExecutionContext::build(
            &op,
            ParameterSet::new(),
            &InvocationOptions::default(),
            PassThruPolicy::Reject,
            None,
        )
        .unwrap();
        let first = Request::from_context(&op, &ctx);
        assert_eq!(first.cursor(&op), None);
        assert!(first.fields.is_empty());

        let second = first.with_cursor(&op, "A").with_cursor(&op, "B");
        assert_eq!(second.cursor(&op), Some("B"));
        assert_eq!(first.cursor(&op), None);
    }
}
