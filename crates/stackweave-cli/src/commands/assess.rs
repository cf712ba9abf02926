//! `stw assess`: Assess the blast radius of a change set.

use std::path::{Path, PathBuf};

use clap::Args;
use stackweave_common::config::{EdgeView, PropagationMode};
use stackweave_common::types::ChangeSet;
use stackweave_risk::assessment::BlastRadiusAssessment;
use stackweave_sdk::assess;
use stackweave_sdk::graph_resolver::GraphResolver;

use crate::commands::GlobalOptions;
use crate::output::{self, Palette};

/// Arguments for the `assess` command.
#[derive(Args, Debug)]
pub struct AssessArgs {
    /// Path to the stack manifest (JSON or YAML).
    pub manifest: String,

    /// Path to the change set (JSON or YAML).
    pub changeset: String,

    /// Propagation mode: single-hop, transitive, or hops:N.
    #[arg(long)]
    pub mode: Option<PropagationMode>,

    /// Edges used for propagation: all or last-declared.
    #[arg(long)]
    pub edge_view: Option<EdgeView>,

    /// Git repository used for change history.
    #[arg(long, value_name = "DIR")]
    pub repo: Option<PathBuf>,

    /// Print the assessment as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Executes the `assess` command.
///
/// # Errors
///
/// Returns an error if the inputs cannot be loaded or the graph is cyclic.
pub fn execute(args: AssessArgs, ctx: GlobalOptions) -> anyhow::Result<()> {
    tracing::info!(manifest = %args.manifest, changeset = %args.changeset, "assessing blast radius");
    let mut resolver = GraphResolver::new();
    resolver.load_manifest(Path::new(&args.manifest))?;
    let changes = ChangeSet::load(Path::new(&args.changeset))?;

    let mut config = ctx.config.risk;
    if let Some(mode) = args.mode {
        config.propagation = mode;
    }
    if let Some(view) = args.edge_view {
        config.edge_view = view;
    }

    let history = assess::history_source(args.repo.as_deref());
    let result = assess::assess_blocking(resolver.graph(), &changes, history, config)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_assessment(&result);
    }
    Ok(())
}

fn print_list(title: &str, lines: &[String], numbered: bool) {
    let Palette { bold, reset, .. } = Palette::detect();
    println!();
    println!("  {bold}{title}{reset}");
    for (i, line) in lines.iter().enumerate() {
        if numbered {
            println!("    {}. {line}", i + 1);
        } else {
            println!("    - {line}");
        }
    }
}

fn print_assessment(result: &BlastRadiusAssessment) {
    let palette = Palette::detect();
    let Palette { bold, dim, reset, .. } = palette;
    output::heading("Blast radius assessment");
    let color = palette.risk(result.risk_level);
    println!("  Risk level:   {color}{bold}{}{reset}", result.risk_level);
    println!("  Change type:  {}", result.change_type);
    println!("  Confidence:   {}", result.confidence);
    println!(
        "  {dim}propagation {} over {} edges, average risk {}{reset}",
        result.propagation,
        result.edge_view,
        output::format_percentage(result.average_risk() * 100.0)
    );

    println!();
    println!("  {:<24} {:<10} {:<9} {:<9} {:>7}", "COMPONENT", "ACTION", "DIRECT", "TAG", "RISK");
    for c in &result.affected {
        println!(
            "  {:<24} {:<10} {:<9} {:<9} {:>7}",
            c.address,
            c.action.to_string(),
            if c.direct { "yes" } else { "no" },
            c.criticality.to_string(),
            output::format_percentage(c.risk_percentage)
        );
    }

    print_list("Recommendations", &result.recommendations, false);
    print_list("Mitigation steps", &result.mitigation_steps, false);
    print_list("Rollback plan", &result.rollback_plan, true);
}
