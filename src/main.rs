#![forbid(unsafe_code)]
//! @acp:module "computectl CLI"
//! @acp:summary "Binary entry point: config, catalog, dynamic commands, Ctrl-C wiring"
//! @acp:domain cli
//! @acp:layer handler
//!
//! computectl command line interface

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{CommandFactory, FromArgMatches, Parser};
use console::style;

use computectl::cli::{self, OPERATIONS_COMMAND};
use computectl::commands::{execute_operations, execute_run, OperationsOptions, RunOptions};
use computectl::{
    cancel, logging, CmdletError, Config, OperationCatalog, OutputFormat, ProviderClient,
    ReplayClient,
};

#[derive(Parser, Debug)]
#[command(name = "computectl")]
#[command(about = "Run cloud compute API operations described by a catalog")]
#[command(version)]
struct Cli {
    /// Config file path [default: .computectl.config.json, then ~/.computectl/config.json]
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Provider endpoint URL
    #[arg(long, global = true, env = "COMPUTECTL_ENDPOINT")]
    endpoint: Option<String>,

    /// Provider region
    #[arg(long, global = true, env = "COMPUTECTL_REGION")]
    region: Option<String>,

    /// Serve responses from a recorded JSON file instead of the network
    #[arg(long, global = true, value_name = "FILE")]
    replay: Option<PathBuf>,

    /// Output format: json, jsonl, yaml or text
    #[arg(short, long, global = true)]
    output: Option<OutputFormat>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only print errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => {
            if is_dry_run(&err) {
                eprintln!("{} {:#}", style("!").yellow(), err);
            } else {
                eprintln!("{} {:#}", style("✗").red(), err);
            }
            ExitCode::from(exit_code_for(&err))
        }
    }
}

async fn run() -> anyhow::Result<ExitCode> {
    // Config and catalog shape the command tree, so read the globals first.
    let early = preparse_globals();
    logging::init_logger(early.verbose, early.quiet)?;

    let mut config = match &early.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => Config::load_or_default()?,
    };

    let mut catalog = OperationCatalog::builtin()?;
    for path in &config.catalogs {
        let extra = OperationCatalog::load(path)
            .with_context(|| format!("loading catalog {}", path.display()))?;
        catalog.extend(extra)?;
    }
    tracing::debug!(operations = catalog.len(), "catalog loaded");

    let matches = cli::with_operations(Cli::command(), &catalog).get_matches();
    let args = Cli::from_arg_matches(&matches)?;

    if let Some(endpoint) = args.endpoint {
        config.endpoint = Some(endpoint);
    }
    if let Some(region) = args.region {
        config.region = Some(region);
    }
    if let Some(output) = args.output {
        config.output = output;
    }

    let Some((name, sub)) = matches.subcommand() else {
        return Ok(ExitCode::SUCCESS);
    };

    if name == OPERATIONS_COMMAND {
        let options = OperationsOptions {
            name: sub.get_one::<String>("name").cloned(),
            json: sub.get_flag("json"),
        };
        execute_operations(options, &catalog)?;
        return Ok(ExitCode::SUCCESS);
    }

    let descriptor = catalog.find(name)?.clone();
    let bound = cli::bind(&descriptor, sub)?;
    let client = make_client(args.replay.as_deref(), &config)?;

    let options = RunOptions {
        format: config.output,
        pass_thru_policy: config.pass_thru_policy,
        assume_yes: config.confirm.assume_yes,
        default_page_size: config.default_page_size,
    };

    let (trigger, signal) = cancel::channel();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received; stopping before the next request");
            trigger.cancel();
            if tokio::signal::ctrl_c().await.is_ok() {
                std::process::exit(130);
            }
        }
    });

    let summary = tokio::task::spawn_blocking(move || {
        execute_run(options, &descriptor, bound, client.as_ref(), Some(signal))
    })
    .await??;
    tracing::debug!(?summary, "run finished");

    Ok(ExitCode::SUCCESS)
}

/// Globals needed before the full command tree exists
struct EarlyGlobals {
    config: Option<PathBuf>,
    verbose: bool,
    quiet: bool,
}

fn preparse_globals() -> EarlyGlobals {
    let matches = Cli::command()
        .ignore_errors(true)
        .allow_external_subcommands(true)
        .disable_help_flag(true)
        .disable_version_flag(true)
        .try_get_matches_from(std::env::args_os());

    match matches {
        Ok(m) => EarlyGlobals {
            config: m.get_one::<PathBuf>("config").cloned(),
            verbose: m.get_flag("verbose"),
            quiet: m.get_flag("quiet"),
        },
        Err(_) => EarlyGlobals {
            config: None,
            verbose: false,
            quiet: false,
        },
    }
}

fn make_client(replay: Option<&Path>, config: &Config) -> computectl::Result<Box<dyn ProviderClient>> {
    match replay {
        Some(path) => {
            tracing::info!("replaying responses from {}", path.display());
            Ok(Box::new(ReplayClient::from_file(path)?))
        }
        None => live_client(config),
    }
}

#[cfg(feature = "http")]
fn live_client(config: &Config) -> computectl::Result<Box<dyn ProviderClient>> {
    Ok(Box::new(computectl::HttpClient::from_config(config)?))
}

#[cfg(not(feature = "http"))]
fn live_client(_config: &Config) -> computectl::Result<Box<dyn ProviderClient>> {
    Err(CmdletError::config(
        "built without the http feature; use --replay to serve recorded responses",
    ))
}

/// A dry run that would have succeeded still comes back as a provider error
fn is_dry_run(err: &anyhow::Error) -> bool {
    matches!(
        err.chain().find_map(|e| e.downcast_ref::<CmdletError>()),
        Some(CmdletError::Provider { source, .. }) if source.is_dry_run_success()
    )
}

/// 1 provider, 2 local validation, 3 everything else
fn exit_code_for(err: &anyhow::Error) -> u8 {
    if let Some(cmdlet) = err.chain().find_map(|e| e.downcast_ref::<CmdletError>()) {
        return cmdlet.exit_code() as u8;
    }
    if err.downcast_ref::<clap::Error>().is_some() {
        return 2;
    }
    3
}
