//! @acp:module "Run Command"
//! @acp:summary "Run one catalog operation, once per pipeline value"
//! @acp:domain cli
//! @acp:layer handler
//!
//! Run one catalog operation from the command line
//!
//! Binds pipeline input (if any), drives the executor once per input value
//! and reports declined, cancelled and truncated runs on stderr.

use std::fs::File;
use std::io::{self, BufReader, Read, Write};
use std::time::Duration;

use anyhow::{Context, Result};
use console::{style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::Value;

use crate::cancel::CancelSignal;
use crate::cli::BoundInvocation;
use crate::client::ProviderClient;
use crate::confirm::{Confirmer, TerminalConfirmer};
use crate::executor::{CommandExecutor, ExecutionReport, ExecutionStatus};
use crate::operation::{OperationDescriptor, PassThruPolicy};
use crate::output::{OutputFormat, OutputSink, WriterSink};

/// Options for the run command
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Output format for projected values
    pub format: OutputFormat,
    /// Pass-through policy for descriptors that do not declare one
    pub pass_thru_policy: PassThruPolicy,
    /// Answer every confirmation with yes
    pub assume_yes: bool,
    /// Page size applied when the invocation does not set one
    pub default_page_size: Option<u32>,
}

/// Totals across every invocation of one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub invocations: usize,
    pub emitted: usize,
    pub declined: usize,
    pub cancelled: bool,
}

/// Execute the run command against stdout and the terminal prompt
pub fn execute_run(
    options: RunOptions,
    descriptor: &OperationDescriptor,
    bound: BoundInvocation,
    client: &dyn ProviderClient,
    cancel: Option<CancelSignal>,
) -> Result<RunSummary> {
    let confirmer = TerminalConfirmer {
        assume_yes: options.assume_yes,
    };
    let stdout = io::stdout();
    let mut sink = WriterSink::new(stdout.lock(), options.format);

    let show_spinner =
        descriptor.is_paginated() && Term::stderr().is_term() && !Term::stdout().is_term();
    let summary = if show_spinner {
        let mut sink = SpinnerSink::new(&mut sink, &descriptor.name);
        let summary = run_invocations(&options, descriptor, bound, client, &confirmer, cancel, &mut sink);
        sink.finish();
        summary
    } else {
        run_invocations(&options, descriptor, bound, client, &confirmer, cancel, &mut sink)
    }?;

    sink.into_inner().flush()?;
    Ok(summary)
}

/// Drive the executor once per pipeline value, or once when there is no input
pub fn run_invocations(
    options: &RunOptions,
    descriptor: &OperationDescriptor,
    bound: BoundInvocation,
    client: &dyn ProviderClient,
    confirmer: &dyn Confirmer,
    cancel: Option<CancelSignal>,
    sink: &mut dyn OutputSink,
) -> Result<RunSummary> {
    let interrupted = {
        let signal = cancel.clone();
        move || signal.as_ref().is_some_and(|s| s.is_cancelled())
    };
    let mut executor =
        CommandExecutor::new(client, confirmer).with_pass_thru_policy(options.pass_thru_policy);
    if let Some(signal) = cancel {
        executor = executor.with_cancel(signal);
    }

    let mut invocation_options = bound.options.clone();
    if invocation_options.page_size.is_none() {
        let accepts_page_size = descriptor
            .pagination
            .as_ref()
            .is_some_and(|p| p.page_size_field.is_some());
        if accepts_page_size {
            invocation_options.page_size = options.default_page_size;
        }
    }

    let mut summary = RunSummary::default();

    let Some(source) = &bound.pipeline_input else {
        if interrupted() {
            stop_before_next(&mut summary);
            return Ok(summary);
        }
        let report = executor.execute(descriptor, bound.params, &invocation_options, sink)?;
        record(&mut summary, descriptor, &report);
        return Ok(summary);
    };

    let reader = open_input(source)?;
    let stream = serde_json::Deserializer::from_reader(reader).into_iter::<Value>();
    for (index, item) in stream.enumerate() {
        let item = item.with_context(|| format!("reading pipeline input item {}", index + 1))?;
        if interrupted() {
            stop_before_next(&mut summary);
            break;
        }
        let params = bound.params.clone().bind_pipeline(descriptor, &item)?;
        tracing::debug!(item = index + 1, "pipeline invocation");

        let report = executor.execute(descriptor, params, &invocation_options, sink)?;
        record(&mut summary, descriptor, &report);
        if summary.cancelled {
            break;
        }
    }

    if summary.invocations == 0 && !summary.cancelled {
        tracing::warn!("pipeline input was empty; nothing to do");
    }
    Ok(summary)
}

fn open_input(source: &str) -> Result<Box<dyn Read>> {
    if source == "-" {
        return Ok(Box::new(BufReader::new(io::stdin())));
    }
    let file = File::open(source).with_context(|| format!("opening pipeline input {}", source))?;
    Ok(Box::new(BufReader::new(file)))
}

fn stop_before_next(summary: &mut RunSummary) {
    summary.cancelled = true;
    eprintln!(
        "{} Cancelled after {} invocation(s); no further requests sent",
        style("!").yellow(),
        summary.invocations
    );
}

fn record(summary: &mut RunSummary, descriptor: &OperationDescriptor, report: &ExecutionReport) {
    summary.invocations += 1;
    summary.emitted += report.emitted;

    match report.status {
        ExecutionStatus::Completed => {}
        ExecutionStatus::Declined => {
            summary.declined += 1;
            eprintln!(
                "{} Skipped {}: confirmation declined",
                style("!").yellow(),
                descriptor.name
            );
        }
        ExecutionStatus::Cancelled => {
            summary.cancelled = true;
            eprintln!(
                "{} Cancelled after {} page(s)",
                style("!").yellow(),
                report.pages
            );
        }
    }

    if let Some(cursor) = &report.next_cursor {
        eprintln!(
            "{} More results available; resume with --next-token {}",
            style("→").cyan(),
            cursor
        );
    }
}

/// Sink that keeps a spinner ticking on stderr while values stream out
struct SpinnerSink<'s> {
    inner: &'s mut dyn OutputSink,
    bar: ProgressBar,
    label: String,
    count: usize,
}

impl<'s> SpinnerSink<'s> {
    fn new(inner: &'s mut dyn OutputSink, label: &str) -> Self {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::default_spinner()
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        bar.set_style(style);
        bar.set_message(label.to_string());
        bar.enable_steady_tick(Duration::from_millis(80));
        Self {
            inner,
            bar,
            label: label.to_string(),
            count: 0,
        }
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl OutputSink for SpinnerSink<'_> {
    fn emit(&mut self, value: &Value) -> crate::Result<()> {
        self.inner.emit(value)?;
        self.count += 1;
        self.bar
            .set_message(format!("{}: {} item(s)", self.label, self.count));
        Ok(())
    }
}
