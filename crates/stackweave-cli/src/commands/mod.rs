//! CLI command definitions and dispatch.

pub mod assess;
pub mod generate;
pub mod graph;

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use stackweave_common::config::StackConfig;

/// Stackweave: stack composition and dependency resolution.
#[derive(Parser, Debug)]
#[command(name = stackweave_common::constants::BIN_NAME, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Disable remote registry access.
    #[arg(long, global = true, env = "STACKWEAVE_OFFLINE")]
    pub offline: bool,

    /// Path to a TOML configuration file.
    #[arg(long, global = true, env = "STACKWEAVE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Emit logs as JSON lines on stderr.
    #[arg(long, global = true)]
    pub log_json: bool,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build the dependency graph and print the deployment order.
    Graph(graph::GraphArgs),
    /// Generate per-component configuration.
    Generate(generate::GenerateArgs),
    /// Assess the blast radius of a change set.
    Assess(assess::AssessArgs),
}

/// Global options shared by all commands.
#[derive(Debug)]
pub struct GlobalOptions {
    /// Effective configuration.
    pub config: StackConfig,
    /// Whether remote registry access is disabled.
    pub offline: bool,
}

fn load_config(path: Option<&Path>) -> anyhow::Result<StackConfig> {
    let config = match path {
        Some(path) => StackConfig::load(path)
            .with_context(|| format!("failed to load configuration from {}", path.display()))?,
        None => StackConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn execute(cli: Cli) -> anyhow::Result<()> {
    let ctx = GlobalOptions {
        config: load_config(cli.config.as_deref())?,
        offline: cli.offline,
    };
    match cli.command {
        Command::Graph(args) => graph::execute(args),
        Command::Generate(args) => generate::execute(args, ctx),
        Command::Assess(args) => assess::execute(args, ctx),
    }
}
