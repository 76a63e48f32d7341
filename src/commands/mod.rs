//! @acp:module "Commands"
//! @acp:summary "CLI command implementations"
//! @acp:domain cli
//! @acp:layer handler
//!
//! CLI command implementations
//!
//! Every catalog operation goes through `run`; `operations` inspects the
//! catalog itself.

pub mod operations;
pub mod run;

pub use operations::{execute_operations, OperationsOptions};
pub use run::{execute_run, run_invocations, RunOptions, RunSummary};
