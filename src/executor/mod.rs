//! @acp:module "Command Executor"
//! @acp:summary "Generic context-gate-request-invoke-project pipeline"
//! @acp:domain cli
//! @acp:layer service
//!
//! Generic command executor
//!
//! Runs one invocation of any catalog operation:
//! context -> confirmation gate -> request -> invoker -> projector -> sink.

use crate::cancel::CancelSignal;
use crate::client::ProviderClient;
use crate::confirm::{gate, Confirmer, GateDecision};
use crate::context::{ExecutionContext, InvocationOptions};
use crate::error::Result;
use crate::invoker::Invoker;
use crate::operation::{OperationDescriptor, PassThruPolicy};
use crate::output::OutputSink;
use crate::params::ParameterSet;
use crate::projector::project;
use crate::request::Request;
use crate::selector::Selector;

/// How an invocation ended, when it did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionStatus {
    Completed,
    /// The user declined the confirmation prompt; nothing was sent
    Declined,
    /// Interrupted between pages; earlier output stands
    Cancelled,
}

/// Summary returned to the caller after a successful invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionReport {
    pub status: ExecutionStatus,
    pub pages: usize,
    pub emitted: usize,
    /// Token to resume from, when more results remain
    pub next_cursor: Option<String>,
}

impl ExecutionReport {
    fn declined() -> Self {
        Self {
            status: ExecutionStatus::Declined,
            pages: 0,
            emitted: 0,
            next_cursor: None,
        }
    }
}

/// Executes catalog operations against an injected client
pub struct CommandExecutor<'a> {
    client: &'a dyn ProviderClient,
    confirmer: &'a dyn Confirmer,
    pass_thru_policy: PassThruPolicy,
    cancel: Option<CancelSignal>,
}

impl<'a> CommandExecutor<'a> {
    pub fn new(client: &'a dyn ProviderClient, confirmer: &'a dyn Confirmer) -> Self {
        Self {
            client,
            confirmer,
            pass_thru_policy: PassThruPolicy::default(),
            cancel: None,
        }
    }

    /// Fallback policy for descriptors that do not set their own
    pub fn with_pass_thru_policy(mut self, policy: PassThruPolicy) -> Self {
        self.pass_thru_policy = policy;
        self
    }

    pub fn with_cancel(mut self, signal: CancelSignal) -> Self {
        self.cancel = Some(signal);
        self
    }

    /// Run one invocation, writing projected values to `sink` as they arrive
    ///
    /// Local validation errors are returned before the client is touched.
    /// On a provider error, values already emitted stay emitted.
    pub fn execute(
        &self,
        descriptor: &OperationDescriptor,
        params: ParameterSet,
        options: &InvocationOptions,
        sink: &mut dyn OutputSink,
    ) -> Result<ExecutionReport> {
        let span = tracing::info_span!(
            "invoke",
            operation = %descriptor.name,
            invocation = %uuid::Uuid::new_v4()
        );
        let _enter = span.enter();

        let ctx = ExecutionContext::build(
            descriptor,
            params,
            options,
            self.pass_thru_policy,
            self.cancel.clone(),
        )?;

        if gate(descriptor, &ctx, self.confirmer)? == GateDecision::Declined {
            return Ok(ExecutionReport::declined());
        }

        let request = Request::from_context(descriptor, &ctx);
        tracing::debug!(action = %request.action, fields = request.fields.len(), "request built");

        let echo = matches!(ctx.selector(), Selector::EchoParameter(_));
        let mut emitted = 0;
        let outcome = Invoker::new(self.client).run(descriptor, &ctx, request, |response| {
            if echo {
                return Ok(());
            }
            for value in project(descriptor, &ctx, Some(response))? {
                sink.emit(&value)?;
                emitted += 1;
            }
            Ok(())
        })?;

        if echo {
            for value in project(descriptor, &ctx, None)? {
                sink.emit(&value)?;
                emitted += 1;
            }
        }

        let status = if outcome.cancelled {
            ExecutionStatus::Cancelled
        } else {
            ExecutionStatus::Completed
        };
        tracing::info!(pages = outcome.pages, emitted, "invocation finished");

        Ok(ExecutionReport {
            status,
            pages: outcome.pages,
            emitted,
            next_cursor: outcome.next_cursor,
        })
    }
}
