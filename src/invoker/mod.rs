//! @acp:module "Invoker"
//! @acp:summary "Request sending and pagination loop"
//! @acp:domain cli
//! @acp:layer service
//!
//! Invoker and pagination loop
//!
//! Sends requests through an injected provider client. Paginated operations
//! walk Start -> HasMore(cursor) -> ... -> Done, one request in flight at a
//! time. Each page is handed to the caller before the next is requested, so
//! a later failure or cancellation never retracts earlier output.

use serde_json::Value;

use crate::client::{ProviderClient, Response};
use crate::context::ExecutionContext;
use crate::error::{CmdletError, Result};
use crate::operation::OperationDescriptor;
use crate::request::Request;
use crate::selector::lookup_field;

/// Summary of a finished invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvocationOutcome {
    /// Number of requests that returned successfully
    pub pages: usize,
    /// Cursor for manual continuation (single-page mode or cancellation)
    pub next_cursor: Option<String>,
    pub cancelled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PageState {
    Start,
    HasMore(String),
    Done,
}

/// Sends requests for one invocation
pub struct Invoker<'c> {
    client: &'c dyn ProviderClient,
}

impl<'c> Invoker<'c> {
    pub fn new(client: &'c dyn ProviderClient) -> Self {
        Self { client }
    }

    /// Run the request, calling `on_page` with every successful response
    pub fn run<F>(
        &self,
        descriptor: &OperationDescriptor,
        ctx: &ExecutionContext,
        request: Request,
        mut on_page: F,
    ) -> Result<InvocationOutcome>
    where
        F: FnMut(&Response) -> Result<()>,
    {
        let Some(paging) = ctx.paging() else {
            let response = self.send(descriptor, &request)?;
            on_page(&response)?;
            return Ok(InvocationOutcome {
                pages: 1,
                ..Default::default()
            });
        };

        let mut outcome = InvocationOutcome::default();
        let mut state = PageState::Start;

        loop {
            let current = match &state {
                PageState::Start => request.clone(),
                PageState::HasMore(cursor) => {
                    if ctx.cancel_signal().is_some_and(|s| s.is_cancelled()) {
                        tracing::warn!(
                            operation = %descriptor.name,
                            pages = outcome.pages,
                            "cancelled before requesting the next page"
                        );
                        outcome.cancelled = true;
                        outcome.next_cursor = Some(cursor.clone());
                        break;
                    }
                    request.with_cursor(descriptor, cursor)
                }
                PageState::Done => break,
            };

            let response = self.send(descriptor, &current)?;
            outcome.pages += 1;
            on_page(&response)?;

            let cursor = next_cursor(descriptor, &response);
            tracing::debug!(
                operation = %descriptor.name,
                page = outcome.pages,
                has_more = cursor.is_some(),
                "page received"
            );

            if !paging.auto_iterate {
                outcome.next_cursor = cursor;
                break;
            }

            state = match cursor {
                None => PageState::Done,
                Some(cursor) if current.cursor(descriptor) == Some(cursor.as_str()) => {
                    return Err(CmdletError::PaginationStalled {
                        operation: descriptor.name.clone(),
                        cursor,
                    });
                }
                Some(cursor) => PageState::HasMore(cursor),
            };
        }

        tracing::info!(
            operation = %descriptor.name,
            pages = outcome.pages,
            cancelled = outcome.cancelled,
            "pagination finished"
        );
        Ok(outcome)
    }

    fn send(&self, descriptor: &OperationDescriptor, request: &Request) -> Result<Response> {
        tracing::debug!(client = self.client.name(), action = %request.action, "sending request");
        self.client
            .send(request)
            .map_err(|source| CmdletError::Provider {
                operation: descriptor.name.clone(),
                source,
            })
    }
}

/// Continuation token of a response; empty or absent ends the loop
fn next_cursor(descriptor: &OperationDescriptor, response: &Response) -> Option<String> {
    let pagination = descriptor.pagination.as_ref()?;
    match lookup_field(response, &pagination.output_token)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel;
    use crate::client::{ProviderError, ReplayClient, ReplayEntry};
    use crate::context::InvocationOptions;
    use crate::operation::PassThruPolicy;
    use crate::params::ParameterSet;
    use serde_json::json;

    fn describe_zones() -> OperationDescriptor {
        serde_json::from_value(json!({
            "name": "describe-availability-zones",
            "action": "DescribeAvailabilityZones",
            "defaultSelector": "AvailabilityZones",
            "pagination": {}
        }))
        .unwrap()
    }

    fn build_ctx(
        op: &OperationDescriptor,
        options: InvocationOptions,
        cancel: Option<cancel::CancelSignal>,
    ) -> ExecutionContext {
        ExecutionContext::build(op, ParameterSet::new(), &options, PassThruPolicy::Reject, cancel)
            .unwrap()
    }

    fn page(zone: &str, token: &str) -> ReplayEntry {
        ReplayEntry::ok(json!({"AvailabilityZones": [{"ZoneName": zone}], "NextToken": token}))
    }

    #[test]
    fn test_follows_cursors_until_empty() {
        let op = describe_zones();
        let client = ReplayClient::new([page("a", "A"), page("b", "B"), page("c", "")]);
        let ctx = build_ctx(&op, InvocationOptions::default(), None);
        let mut seen = Vec::new();

        let outcome = Invoker::new(&client)
            .run(&op, &ctx, Request::from_context(&op, &ctx), |r| {
                seen.push(r.clone());
                Ok(())
            })
            .unwrap();

        assert_eq!(outcome.pages, 3);
        assert_eq!(outcome.next_cursor, None);
        assert_eq!(seen.len(), 3);
        let cursors: Vec<Option<String>> = client
            .requests()
            .iter()
            .map(|r| r.cursor(&op).map(str::to_string))
            .collect();
        assert_eq!(cursors, vec![None, Some("A".into()), Some("B".into())]);
    }

    #[test]
    fn test_single_page_surfaces_cursor() {
        let op = describe_zones();
        let client = ReplayClient::new([page("a", "A"), page("b", "")]);
        let options = InvocationOptions {
            no_auto_iteration: true,
            ..Default::default()
        };
        let ctx = build_ctx(&op, options, None);

        let outcome = Invoker::new(&client)
            .run(&op, &ctx, Request::from_context(&op, &ctx), |_| Ok(()))
            .unwrap();

        assert_eq!(outcome.pages, 1);
        assert_eq!(outcome.next_cursor.as_deref(), Some("A"));
        assert_eq!(client.request_count(), 1);
    }

    #[test]
    fn test_cancellation_stops_between_pages() {
        let op = describe_zones();
        let client = ReplayClient::new([page("a", "A"), page("b", "B"), page("c", "")]);
        let (trigger, signal) = cancel::channel();
        let ctx = build_ctx(&op, InvocationOptions::default(), Some(signal));

        let outcome = Invoker::new(&client)
            .run(&op, &ctx, Request::from_context(&op, &ctx), |_| {
                trigger.cancel();
                Ok(())
            })
            .unwrap();

        assert!(outcome.cancelled);
        assert_eq!(outcome.pages, 1);
        assert_eq!(outcome.next_cursor.as_deref(), Some("A"));
        assert_eq!(client.request_count(), 1);
    }

    #[test]
    fn test_provider_error_keeps_earlier_pages() {
        let op = describe_zones();
        let client = ReplayClient::new([
            page("a", "A"),
            ReplayEntry::err(ProviderError::new("RequestLimitExceeded", "slow down")),
        ]);
        let ctx = build_ctx(&op, InvocationOptions::default(), None);
        let mut seen = 0;

        let err = Invoker::new(&client)
            .run(&op, &ctx, Request::from_context(&op, &ctx), |_| {
                seen += 1;
                Ok(())
            })
            .unwrap_err();

        assert_eq!(seen, 1);
        match err {
            CmdletError::Provider { operation, source } => {
                assert_eq!(operation, "describe-availability-zones");
                assert_eq!(source.code, "RequestLimitExceeded");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_repeated_cursor_stalls() {
        let op = describe_zones();
        let client = ReplayClient::new([page("a", "A"), page("b", "A")]);
        let ctx = build_ctx(&op, InvocationOptions::default(), None);

        let err = Invoker::new(&client)
            .run(&op, &ctx, Request::from_context(&op, &ctx), |_| Ok(()))
            .unwrap_err();
        assert!(matches!(err, CmdletError::PaginationStalled { .. }));
        assert_eq!(client.request_count(), 2);
    }
}
