#![forbid(unsafe_code)]
//! @acp:module "computectl Library"
//! @acp:summary "Descriptor-driven executor for cloud compute API operations"
//! @acp:domain cli
//! @acp:layer api
//! @acp:stability stable
//!
//! # computectl
//!
//! Descriptor-driven executor for cloud compute API operations.
//!
//! Each operation is described by data (an [`OperationDescriptor`]): its
//! parameters, how they map onto the provider request, whether it mutates
//! state, whether it paginates and what it outputs by default. One generic
//! pipeline runs all of them:
//!
//! parameters -> context -> confirmation -> request -> invoker -> projector
//!
//! ## Example
//!
//! ```rust,no_run
//! use computectl::{
//!     CommandExecutor, FixedAnswer, InvocationOptions, OperationCatalog, ParamValue,
//!     ParameterSet, ReplayClient, ReplayEntry, CollectSink,
//! };
//! use serde_json::json;
//!
//! fn main() -> computectl::Result<()> {
//!     let catalog = OperationCatalog::builtin()?;
//!     let op = catalog.find("delete-volume")?;
//!     let params = ParameterSet::new()
//!         .bind(op, "VolumeId", ParamValue::String("vol-1234".into()))?;
//!
//!     let client = ReplayClient::new([ReplayEntry::ok(json!({"Return": true}))]);
//!     let mut sink = CollectSink::new();
//!     CommandExecutor::new(&client, &FixedAnswer(true))
//!         .execute(op, params, &InvocationOptions::default(), &mut sink)?;
//!     Ok(())
//! }
//! ```

pub mod cancel;
pub mod catalog;
pub mod cli;
pub mod client;
pub mod commands;
pub mod config;
pub mod confirm;
pub mod context;
pub mod error;
pub mod executor;
pub mod invoker;
pub mod logging;
pub mod operation;
pub mod output;
pub mod params;
pub mod projector;
pub mod request;
pub mod selector;

pub use cancel::{CancelSignal, CancelTrigger};
pub use catalog::OperationCatalog;
pub use client::{ProviderClient, ProviderError, ReplayClient, ReplayEntry, Response};
#[cfg(feature = "http")]
pub use client::HttpClient;
pub use config::Config;
pub use confirm::{Confirmer, FixedAnswer, GateDecision, TerminalConfirmer};
pub use context::{ExecutionContext, InvocationOptions};
pub use error::{CmdletError, Result};
pub use executor::{CommandExecutor, ExecutionReport, ExecutionStatus};
pub use invoker::{InvocationOutcome, Invoker};
pub use operation::{OperationDescriptor, ParamKind, ParamSpec, PassThruPolicy};
pub use output::{CollectSink, OutputFormat, OutputSink, WriterSink};
pub use params::{ParamValue, ParameterSet};
pub use projector::project;
pub use request::Request;
pub use selector::Selector;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
