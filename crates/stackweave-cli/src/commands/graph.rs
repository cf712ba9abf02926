//! `stw graph`: Build the dependency graph and print the deployment order.

use clap::Args;
use stackweave_sdk::graph_resolver::GraphResolver;

use crate::output::{self, Palette};

/// Arguments for the `graph` command.
#[derive(Args, Debug)]
pub struct GraphArgs {
    /// Path to the stack manifest (JSON or YAML).
    #[arg(default_value = "stack.yaml")]
    pub manifest: String,

    /// Print the graph as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Executes the `graph` command.
///
/// Loads the manifest, builds the dependency graph, checks it for cycles,
/// and displays the deployment order with every edge.
///
/// # Errors
///
/// Returns an error if the manifest cannot be loaded or the graph is cyclic.
pub fn execute(args: GraphArgs) -> anyhow::Result<()> {
    let mut resolver = GraphResolver::new();
    resolver.load_manifest(std::path::Path::new(&args.manifest))?;
    let order = resolver.deployment_order()?;

    if args.json {
        let failures: Vec<serde_json::Value> = resolver
            .failures()
            .iter()
            .map(|f| serde_json::json!({ "component": f.component, "error": f.error.to_string() }))
            .collect();
        let doc = serde_json::json!({
            "order": order,
            "edges": resolver.edges(),
            "failures": failures,
        });
        println!("{}", serde_json::to_string_pretty(&doc)?);
        return Ok(());
    }

    let Palette { dim, yellow, reset, .. } = Palette::detect();
    output::heading(&format!("Deployment order for: {}", args.manifest));
    for (i, address) in order.iter().enumerate() {
        let deps = resolver.graph().dependencies_of(address);
        if deps.is_empty() {
            println!("  {:>3}. {address}", i + 1);
        } else {
            println!("  {:>3}. {address} {dim}<- {}{reset}", i + 1, deps.join(", "));
        }
    }

    println!();
    println!("  {} component(s), {} edge(s).", order.len(), resolver.edges().len());

    if !resolver.failures().is_empty() {
        println!();
        println!("  {yellow}Rejected declarations:{reset}");
        for failure in resolver.failures() {
            println!("    {}: {}", failure.component, failure.error);
        }
    }

    Ok(())
}
