//! `stw generate`: Generate per-component configuration.

use std::path::{Path, PathBuf};

use clap::Args;
use stackweave_common::manifest::StackManifest;
use stackweave_sdk::batch::{BatchReport, Outcome};
use stackweave_sdk::builder::StackComposerBuilder;
use stackweave_sdk::cancel::CancelToken;

use crate::commands::GlobalOptions;
use crate::output::Palette;

/// Arguments for the `generate` command.
#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Path to the stack manifest (JSON or YAML).
    #[arg(default_value = "stack.yaml")]
    pub manifest: String,

    /// Only generate these components (repeatable).
    #[arg(long = "component", value_name = "NAME")]
    pub components: Vec<String>,

    /// Resolve module contracts from a local catalog file.
    #[arg(long)]
    pub catalog: Option<PathBuf>,

    /// Number of generation workers (0 = one per CPU).
    #[arg(long)]
    pub workers: Option<usize>,

    /// Print the report as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Executes the `generate` command.
///
/// Generates every selected component on a worker pool. Ctrl+C stops
/// components that have not started yet; finished ones are still reported.
///
/// # Errors
///
/// Returns an error if the manifest cannot be loaded, the stack is cyclic,
/// or any component fails.
pub fn execute(args: GenerateArgs, ctx: GlobalOptions) -> anyhow::Result<()> {
    tracing::info!(manifest = %args.manifest, "generating stack configuration");
    let manifest = StackManifest::load(Path::new(&args.manifest))?;

    let mut builder = StackComposerBuilder::new().config(ctx.config).offline(ctx.offline);
    if let Some(catalog) = &args.catalog {
        builder = builder.catalog(catalog.clone());
    }
    if let Some(workers) = args.workers {
        builder = builder.workers(workers);
    }
    let composer = builder.build()?;

    let cancel = CancelToken::new();
    let handler_token = cancel.clone();
    ctrlc::set_handler(move || handler_token.cancel())
        .map_err(|e| anyhow::anyhow!("failed to set Ctrl+C handler: {e}"))?;

    let report = composer.generate_selected(manifest.components, &args.components, &cancel)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report_json(&report))?);
    } else {
        print_report(&report);
    }

    if report.summary().failed > 0 {
        return Err(anyhow::anyhow!("{} component(s) failed", report.summary().failed));
    }
    Ok(())
}

fn report_json(report: &BatchReport) -> serde_json::Value {
    let items: Vec<serde_json::Value> = report
        .items
        .iter()
        .map(|item| match &item.outcome {
            Outcome::Generated(config) => serde_json::json!({
                "component": item.component,
                "status": item.outcome.label(),
                "config": config,
            }),
            Outcome::Failed(error) => serde_json::json!({
                "component": item.component,
                "status": item.outcome.label(),
                "error": error.to_string(),
            }),
            Outcome::Skipped(reason) => serde_json::json!({
                "component": item.component,
                "status": item.outcome.label(),
                "reason": reason,
            }),
        })
        .collect();
    serde_json::json!({ "items": items, "summary": report.summary() })
}

fn print_report(report: &BatchReport) {
    let Palette {
        bold,
        dim,
        green,
        yellow,
        red,
        reset,
    } = Palette::detect();
    for item in &report.items {
        match &item.outcome {
            Outcome::Generated(config) => {
                println!("{green}\u{25cf}{reset} {bold}{}{reset}", item.component);
                for rename in &config.renames {
                    println!(
                        "    {dim}{} bound as {} ({}){reset}",
                        rename.declared_input, rename.bound_input, rename.source
                    );
                }
                if config.declared_only {
                    println!("    {yellow}module contract unavailable, declared names kept{reset}");
                }
                println!();
                for line in config.text.lines() {
                    println!("    {line}");
                }
                println!();
            }
            Outcome::Failed(error) => {
                println!("{red}\u{2717}{reset} {bold}{}{reset}: {error}", item.component);
            }
            Outcome::Skipped(reason) => {
                println!("{dim}- {} ({reason}){reset}", item.component);
            }
        }
    }
    println!();
    println!("  {}", report.summary());
}
