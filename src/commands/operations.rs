//! @acp:module "Operations Command"
//! @acp:summary "List or describe catalog operations"
//! @acp:domain cli
//! @acp:layer handler
//!
//! List catalog operations, or describe one

use anyhow::Result;
use console::style;

use crate::catalog::OperationCatalog;
use crate::operation::{OperationDescriptor, PassThruPolicy, PipelineBinding};

/// Options for the operations command
#[derive(Debug, Clone, Default)]
pub struct OperationsOptions {
    /// Operation to describe; lists everything when absent
    pub name: Option<String>,
    /// Print descriptors as JSON
    pub json: bool,
}

/// Execute the operations command
pub fn execute_operations(options: OperationsOptions, catalog: &OperationCatalog) -> Result<()> {
    match &options.name {
        Some(name) => {
            let descriptor = catalog.find(name)?;
            if options.json {
                println!("{}", serde_json::to_string_pretty(descriptor)?);
            } else {
                print!("{}", render_descriptor(descriptor));
            }
        }
        None if options.json => {
            let all: Vec<&OperationDescriptor> = catalog.iter().collect();
            println!("{}", serde_json::to_string_pretty(&all)?);
        }
        None => {
            let width = catalog.iter().map(|op| op.name.len()).max().unwrap_or(0);
            for op in catalog.iter() {
                let marker = if op.mutating { "!" } else { " " };
                println!(
                    "{} {:<width$}  {}",
                    style(marker).yellow(),
                    style(&op.name).bold(),
                    op.summary.as_deref().unwrap_or(&op.action),
                    width = width
                );
            }
        }
    }
    Ok(())
}

fn render_descriptor(op: &OperationDescriptor) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n", style(&op.name).bold()));
    out.push_str(&format!("{}\n", "=".repeat(60)));
    if let Some(summary) = &op.summary {
        out.push_str(&format!("{}\n\n", summary));
    }
    out.push_str(&format!("Action:    {}\n", op.action));
    out.push_str(&format!("Selector:  {}\n", op.default_selector));
    out.push_str(&format!(
        "Mutating:  {}\n",
        if op.mutating { "yes (confirmation required)" } else { "no" }
    ));
    if let Some(pagination) = &op.pagination {
        out.push_str(&format!(
            "Paginated: {} -> {}",
            pagination.output_token, pagination.input_token
        ));
        if let Some(field) = &pagination.page_size_field {
            out.push_str(&format!(" (page size: {})", field));
        }
        out.push('\n');
    }
    if let Some(pass_thru) = &op.pass_thru {
        let policy = match pass_thru.policy {
            Some(PassThruPolicy::Override) => "override",
            Some(PassThruPolicy::Reject) => "reject",
            None => "configured",
        };
        out.push_str(&format!("Pass-thru: {} ({})\n", pass_thru.parameter, policy));
    }

    if !op.parameters.is_empty() {
        out.push_str("\nParameters:\n");
        for p in &op.parameters {
            let mut notes = vec![p.kind.as_str().to_string()];
            if p.required {
                notes.push("required".into());
            }
            if let Some(position) = p.position {
                notes.push(format!("position {}", position));
            }
            match p.pipeline {
                PipelineBinding::ByValue => notes.push("pipeline by value".into()),
                PipelineBinding::ByPropertyName => notes.push("pipeline by name".into()),
                PipelineBinding::None => {}
            }
            out.push_str(&format!("  --{:<28} {}\n", p.flag(), notes.join(", ")));
            if let Some(help) = &p.help {
                out.push_str(&format!("      {}\n", help));
            }
        }
    }
    out
}
