//! @acp:module "Logging"
//! @acp:summary "Tracing subscriber setup on stderr"
//! @acp:domain cli
//! @acp:layer config
//!
//! Logger initialization
//!
//! Diagnostics go to stderr so stdout carries only projected output.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::{CmdletError, Result};

/// Level directive used when neither flag nor `RUST_LOG` says otherwise
fn default_directive(verbose: bool, quiet: bool) -> &'static str {
    if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    }
}

/// Initialize the logging system
///
/// `-v`/`-q` win over `RUST_LOG`; without either flag the environment filter
/// applies when set.
pub fn init_logger(verbose: bool, quiet: bool) -> Result<()> {
    let directive = default_directive(verbose, quiet);
    let filter = if verbose || quiet {
        EnvFilter::new(directive)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .try_init()
        .map_err(|e| CmdletError::config(format!("failed to initialize logger: {}", e)))?;

    Ok(())
}
