//! @acp:module "Context Builder"
//! @acp:summary "Validated execution context for one invocation"
//! @acp:domain cli
//! @acp:layer logic
//!
//! Execution context
//!
//! The context builder turns bound parameters plus common command options
//! into the immutable state one invocation runs from. All local validation
//! happens here, before any request is built.

use std::collections::BTreeMap;

use crate::cancel::CancelSignal;
use crate::error::{CmdletError, Result};
use crate::operation::{OperationDescriptor, PassThruPolicy};
use crate::params::{ParamValue, ParameterSet};
use crate::selector::{resolve_output, Selector};

/// Common options every command accepts
#[derive(Debug, Clone, Default)]
pub struct InvocationOptions {
    /// Output selector text (`*`, `^Param`, `Field`)
    pub select: Option<String>,
    /// Legacy flag echoing the descriptor's pass-through parameter
    pub pass_thru: bool,
    /// Skip the confirmation prompt
    pub force: bool,
    pub page_size: Option<u32>,
    /// Continuation token to start from
    pub next_token: Option<String>,
    /// Fetch exactly one page
    pub no_auto_iteration: bool,
}

/// Pagination controls resolved for one invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paging {
    pub page_size: Option<u32>,
    pub start_token: Option<String>,
    pub auto_iterate: bool,
}

/// Validated state for one invocation
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    operation: String,
    values: BTreeMap<String, ParamValue>,
    selector: Selector,
    paging: Option<Paging>,
    force: bool,
    cancel: Option<CancelSignal>,
}

impl ExecutionContext {
    /// Validate bound parameters and options against a descriptor
    pub fn build(
        descriptor: &OperationDescriptor,
        params: ParameterSet,
        options: &InvocationOptions,
        pass_thru_policy: PassThruPolicy,
        cancel: Option<CancelSignal>,
    ) -> Result<Self> {
        let mut values: BTreeMap<String, ParamValue> = params
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();

        for spec in &descriptor.parameters {
            if values.contains_key(&spec.name) {
                continue;
            }
            if let Some(default) = &spec.default {
                values.insert(spec.name.clone(), ParamValue::from_json(spec, default)?);
            }
        }

        let missing: Vec<&str> = descriptor
            .parameters
            .iter()
            .filter(|p| p.required && !values.contains_key(&p.name))
            .map(|p| p.name.as_str())
            .collect();
        for name in &missing {
            tracing::warn!(operation = %descriptor.name, "missing required parameter {}", name);
        }
        if let Some(first) = missing.first() {
            return Err(CmdletError::MissingRequiredParameter {
                operation: descriptor.name.clone(),
                parameter: (*first).to_string(),
            });
        }

        let selector = resolve_output(
            descriptor,
            options.select.as_deref(),
            options.pass_thru,
            pass_thru_policy,
        )?;

        let paging = resolve_paging(descriptor, options)?;

        if options.force && !descriptor.mutating {
            tracing::debug!(operation = %descriptor.name, "--force has no effect on read-only operations");
        }

        Ok(Self {
            operation: descriptor.name.clone(),
            values,
            selector,
            paging,
            force: options.force,
            cancel,
        })
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.values.get(name)
    }

    /// Bound and defaulted values, keyed by canonical parameter name
    pub fn values(&self) -> &BTreeMap<String, ParamValue> {
        &self.values
    }

    pub fn selector(&self) -> &Selector {
        &self.selector
    }

    /// Pagination controls; `None` for operations that do not paginate
    pub fn paging(&self) -> Option<&Paging> {
        self.paging.as_ref()
    }

    pub fn force(&self) -> bool {
        self.force
    }

    pub fn cancel_signal(&self) -> Option<&CancelSignal> {
        self.cancel.as_ref()
    }
}

fn resolve_paging(
    descriptor: &OperationDescriptor,
    options: &InvocationOptions,
) -> Result<Option<Paging>> {
    let Some(pagination) = &descriptor.pagination else {
        let flag = if options.page_size.is_some() {
            Some("page-size")
        } else if options.next_token.is_some() {
            Some("next-token")
        } else if options.no_auto_iteration {
            Some("no-auto-iteration")
        } else {
            None
        };
        return match flag {
            Some(flag) => Err(CmdletError::invalid_parameter(
                flag,
                format!("{} does not paginate", descriptor.name),
            )),
            None => Ok(None),
        };
    };

    if let Some(size) = options.page_size {
        if size == 0 {
            return Err(CmdletError::invalid_parameter("page-size", "must be at least 1"));
        }
        if pagination.page_size_field.is_none() {
            return Err(CmdletError::invalid_parameter(
                "page-size",
                format!("{} does not accept a page size", descriptor.name),
            ));
        }
    }

    Ok(Some(Paging {
        page_size: options.page_size,
        start_token: options.next_token.clone().filter(|t| !t.is_empty()),
        auto_iterate: !options.no_auto_iteration,
    }))
}
