//! @acp:module "Dynamic CLI"
//! @acp:summary "Clap subcommands built from operation descriptors"
//! @acp:domain cli
//! @acp:layer handler
//!
//! Dynamic command-line surface
//!
//! Builds one clap subcommand per catalog operation and binds the parsed
//! matches back into a `ParameterSet` plus common invocation options.

use clap::{Arg, ArgAction, ArgMatches, Command};

use crate::catalog::OperationCatalog;
use crate::context::InvocationOptions;
use crate::error::Result;
use crate::operation::{to_kebab_case, OperationDescriptor, ParamKind, ParamSpec, PipelineBinding};
use crate::params::{ParamValue, ParameterSet};

/// Name of the built-in catalog listing subcommand
pub const OPERATIONS_COMMAND: &str = "operations";

const ARG_SELECT: &str = "select";
const ARG_FORCE: &str = "force";
const ARG_PASS_THRU: &str = "pass-thru";
const ARG_PAGE_SIZE: &str = "page-size";
const ARG_NEXT_TOKEN: &str = "next-token";
const ARG_NO_AUTO_ITERATION: &str = "no-auto-iteration";
const ARG_PIPELINE_INPUT: &str = "pipeline-input";

/// Suffix distinguishing the positional form of a parameter from its flag
const POSITIONAL_SUFFIX: &str = "@positional";

/// Everything bound from one operation subcommand
#[derive(Debug, Clone, Default)]
pub struct BoundInvocation {
    pub params: ParameterSet,
    pub options: InvocationOptions,
    /// `-` for stdin, otherwise a file path
    pub pipeline_input: Option<String>,
}

/// Add the catalog's operations and the `operations` listing to `root`
pub fn with_operations(root: Command, catalog: &OperationCatalog) -> Command {
    let mut root = root.subcommand_required(true).subcommand(
        Command::new(OPERATIONS_COMMAND)
            .about("List available operations, or describe one")
            .arg(Arg::new("name").help("Operation to describe"))
            .arg(
                Arg::new("json")
                    .long("json")
                    .action(ArgAction::SetTrue)
                    .help("Print descriptors as JSON"),
            ),
    );

    for descriptor in catalog.iter() {
        if descriptor.name == OPERATIONS_COMMAND {
            tracing::warn!("skipping catalog operation named '{}'", OPERATIONS_COMMAND);
            continue;
        }
        root = root.subcommand(operation_command(descriptor));
    }
    root
}

/// Build the clap subcommand for one operation
pub fn operation_command(descriptor: &OperationDescriptor) -> Command {
    let mut cmd = Command::new(descriptor.name.clone()).long_about(format!(
        "{}\n\nProvider action: {}",
        descriptor.summary.as_deref().unwrap_or(&descriptor.name),
        descriptor.action
    ));
    if let Some(summary) = &descriptor.summary {
        cmd = cmd.about(summary.clone());
    }

    let mut positionals: Vec<&ParamSpec> = descriptor
        .parameters
        .iter()
        .filter(|p| p.position.is_some())
        .collect();
    positionals.sort_by_key(|p| p.position);

    for spec in &descriptor.parameters {
        cmd = cmd.arg(flag_arg(spec));
    }
    for (index, spec) in positionals.into_iter().enumerate() {
        cmd = cmd.arg(positional_arg(spec, index + 1));
    }

    cmd = cmd.arg(
        Arg::new(ARG_SELECT)
            .long(ARG_SELECT)
            .value_name("SELECTOR")
            .help(format!(
                "Output selector: '*' for the whole response, '^Param' to echo a parameter, or a field name [default: {}]",
                descriptor.default_selector
            )),
    );

    if descriptor.mutating {
        cmd = cmd.arg(
            Arg::new(ARG_FORCE)
                .long(ARG_FORCE)
                .short('f')
                .action(ArgAction::SetTrue)
                .help("Skip the confirmation prompt"),
        );
        if let Some(pass_thru) = &descriptor.pass_thru {
            cmd = cmd.arg(
                Arg::new(ARG_PASS_THRU)
                    .long(ARG_PASS_THRU)
                    .action(ArgAction::SetTrue)
                    .help(format!("Output the {} parameter instead of the response", pass_thru.parameter)),
            );
        }
    }

    if let Some(pagination) = &descriptor.pagination {
        if pagination.page_size_field.is_some() {
            cmd = cmd.arg(
                Arg::new(ARG_PAGE_SIZE)
                    .long(ARG_PAGE_SIZE)
                    .value_name("N")
                    .value_parser(clap::value_parser!(u32))
                    .help("Items requested per page"),
            );
        }
        cmd = cmd
            .arg(
                Arg::new(ARG_NEXT_TOKEN)
                    .long(ARG_NEXT_TOKEN)
                    .value_name("TOKEN")
                    .help("Continuation token to resume from"),
            )
            .arg(
                Arg::new(ARG_NO_AUTO_ITERATION)
                    .long(ARG_NO_AUTO_ITERATION)
                    .action(ArgAction::SetTrue)
                    .help("Fetch a single page and print the continuation token"),
            );
    }

    if descriptor.pipeline_params().next().is_some() {
        cmd = cmd.arg(
            Arg::new(ARG_PIPELINE_INPUT)
                .long(ARG_PIPELINE_INPUT)
                .value_name("FILE")
                .help("Stream of JSON values bound to pipeline parameters ('-' for stdin); runs once per value"),
        );
    }

    cmd
}

fn flag_arg(spec: &ParamSpec) -> Arg {
    let mut arg = Arg::new(spec.name.clone())
        .long(spec.flag())
        .value_name(value_name(spec.kind));

    let aliases: Vec<String> = spec.aliases.iter().map(|a| to_kebab_case(a)).collect();
    if !aliases.is_empty() {
        arg = arg.visible_aliases(aliases);
    }

    let mut help = spec.help.clone().unwrap_or_default();
    if spec.required {
        help = format!("{} (required)", help).trim().to_string();
    }
    if spec.pipeline != PipelineBinding::None {
        help = format!("{} [pipeline]", help).trim().to_string();
    }
    if !help.is_empty() {
        arg = arg.help(help);
    }
    if let Some(position) = spec.position {
        arg = arg.conflicts_with(positional_id(spec)).display_order(position);
    }

    configure_kind(arg, spec.kind)
}

fn positional_arg(spec: &ParamSpec, index: usize) -> Arg {
    let arg = Arg::new(positional_id(spec))
        .index(index)
        .value_name(spec.flag().to_uppercase())
        .help(format!("Same as --{}", spec.flag()));
    match spec.kind {
        ParamKind::StringList => arg.action(ArgAction::Append).num_args(1..),
        _ => arg,
    }
}

fn positional_id(spec: &ParamSpec) -> String {
    format!("{}{}", spec.name, POSITIONAL_SUFFIX)
}

fn configure_kind(arg: Arg, kind: ParamKind) -> Arg {
    match kind {
        ParamKind::Boolean => arg
            .num_args(0..=1)
            .require_equals(true)
            .default_missing_value("true"),
        ParamKind::StringList => arg.action(ArgAction::Append).value_delimiter(','),
        ParamKind::Integer => arg.allow_negative_numbers(true),
        ParamKind::String | ParamKind::Object => arg,
    }
}

fn value_name(kind: ParamKind) -> &'static str {
    match kind {
        ParamKind::String => "TEXT",
        ParamKind::Boolean => "BOOL",
        ParamKind::Integer => "NUMBER",
        ParamKind::StringList => "VALUE",
        ParamKind::Object => "JSON",
    }
}

/// Bind parsed subcommand matches for one operation
pub fn bind(descriptor: &OperationDescriptor, matches: &ArgMatches) -> Result<BoundInvocation> {
    let mut params = ParameterSet::new();

    for spec in &descriptor.parameters {
        let raw = raw_values(matches, &spec.name).or_else(|| {
            spec.position
                .and_then(|_| raw_values(matches, &positional_id(spec)))
        });
        if let Some(raw) = raw {
            let value = ParamValue::parse(spec, &raw)?;
            params = params.bind(descriptor, &spec.name, value)?;
        }
    }

    let options = InvocationOptions {
        select: string_value(matches, ARG_SELECT),
        pass_thru: flag_value(matches, ARG_PASS_THRU),
        force: flag_value(matches, ARG_FORCE),
        page_size: matches
            .try_get_one::<u32>(ARG_PAGE_SIZE)
            .ok()
            .flatten()
            .copied(),
        next_token: string_value(matches, ARG_NEXT_TOKEN),
        no_auto_iteration: flag_value(matches, ARG_NO_AUTO_ITERATION),
    };

    Ok(BoundInvocation {
        params,
        options,
        pipeline_input: string_value(matches, ARG_PIPELINE_INPUT),
    })
}

fn raw_values(matches: &ArgMatches, id: &str) -> Option<Vec<String>> {
    matches
        .try_get_many::<String>(id)
        .ok()
        .flatten()
        .map(|values| values.cloned().collect())
}

fn string_value(matches: &ArgMatches, id: &str) -> Option<String> {
    matches.try_get_one::<String>(id).ok().flatten().cloned()
}

fn flag_value(matches: &ArgMatches, id: &str) -> bool {
    matches
        .try_get_one::<bool>(id)
        .ok()
        .flatten()
        .copied()
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> OperationCatalog {
        OperationCatalog::builtin().unwrap()
    }

    fn parse(args: &[&str]) -> (OperationDescriptor, BoundInvocation) {
        let catalog = catalog();
        let root = with_operations(Command::new("computectl"), &catalog);
        let matches = root
            .try_get_matches_from(std::iter::once("computectl").chain(args.iter().copied()))
            .unwrap();
        let (name, sub) = matches.subcommand().unwrap();
        let descriptor = catalog.get(name).unwrap().clone();
        let bound = bind(&descriptor, sub).unwrap();
        (descriptor, bound)
    }

    #[test]
    fn test_debug_assert_commands() {
        with_operations(Command::new("computectl"), &catalog()).debug_assert();
    }

    #[test]
    fn test_flags_bind_canonical_names() {
        let (_, bound) = parse(&[
            "attach-volume",
            "--volume-id",
            "vol-5678",
            "--instance-id",
            "i-1234",
            "--device",
            "/dev/sdh",
            "--force",
        ]);
        assert_eq!(bound.params.len(), 3);
        assert_eq!(
            bound.params.get("Device"),
            Some(&ParamValue::String("/dev/sdh".into()))
        );
        assert!(bound.options.force);
        assert!(!bound.options.pass_thru);
    }

    #[test]
    fn test_positional_binding() {
        let (_, bound) = parse(&["attach-volume", "vol-1", "i-2", "/dev/sdf"]);
        assert_eq!(
            bound.params.get("VolumeId"),
            Some(&ParamValue::String("vol-1".into()))
        );
        assert_eq!(
            bound.params.get("InstanceId"),
            Some(&ParamValue::String("i-2".into()))
        );
        assert_eq!(
            bound.params.get("Device"),
            Some(&ParamValue::String("/dev/sdf".into()))
        );
    }

    #[test]
    fn test_missing_required_is_left_to_context_builder() {
        let (_, bound) = parse(&["attach-volume", "--volume-id", "vol-1"]);
        assert_eq!(bound.params.len(), 1);
    }

    #[test]
    fn test_boolean_and_list_flags() {
        let (_, bound) = parse(&[
            "modify-vpc-attribute",
            "vpc-1",
            "--enable-dns-support=false",
            "--enable-dns-hostnames",
        ]);
        assert_eq!(
            bound.params.get("EnableDnsSupport"),
            Some(&ParamValue::Boolean(false))
        );
        assert_eq!(
            bound.params.get("EnableDnsHostnames"),
            Some(&ParamValue::Boolean(true))
        );

        let (_, bound) = parse(&["describe-volumes", "--volume-id", "vol-1,vol-2", "--volume-id", "vol-3"]);
        assert_eq!(
            bound.params.get("VolumeId"),
            Some(&ParamValue::StringList(vec![
                "vol-1".into(),
                "vol-2".into(),
                "vol-3".into()
            ]))
        );
    }

    #[test]
    fn test_bare_boolean_leaves_positionals_alone() {
        let (_, bound) = parse(&["attach-volume", "--dry-run", "vol-1", "i-2", "/dev/sdh"]);
        assert_eq!(bound.params.get("DryRun"), Some(&ParamValue::Boolean(true)));
        assert_eq!(
            bound.params.get("VolumeId"),
            Some(&ParamValue::String("vol-1".into()))
        );
        assert_eq!(
            bound.params.get("Device"),
            Some(&ParamValue::String("/dev/sdh".into()))
        );
    }

    #[test]
    fn test_paging_flags() {
        let (_, bound) = parse(&[
            "describe-availability-zones",
            "--page-size",
            "10",
            "--next-token",
            "abc",
            "--no-auto-iteration",
        ]);
        assert_eq!(bound.options.page_size, Some(10));
        assert_eq!(bound.options.next_token.as_deref(), Some("abc"));
        assert!(bound.options.no_auto_iteration);
    }

    #[test]
    fn test_alias_flag() {
        let (_, bound) = parse(&["create-tags", "--resource-id", "vol-1", "--tags", r#"[{"Key":"a","Value":"b"}]"#]);
        assert!(bound.params.contains("Resource"));
        assert!(bound.params.contains("Tag"));
    }

    #[test]
    fn test_read_only_commands_have_no_force_flag() {
        let catalog = catalog();
        let root = with_operations(Command::new("computectl"), &catalog);
        assert!(root
            .try_get_matches_from(["computectl", "describe-volumes", "--force"])
            .is_err());
    }
}
