//! Command-line interface definition.
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Top-level CLI entry point for the provisioning engine.
#[derive(Parser, Debug)]
#[command(
    name = "automac",
    about = "Declarative, idempotent macOS machine provisioning",
    version
)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Provision this machine from a manifest
    Apply(ApplyOpts),
    /// Load and validate a manifest without changing anything
    CheckConfig(ConfigOpts),
    /// Print version information
    Version,
}

/// Manifest location shared by the manifest-driven subcommands.
#[derive(Args, Debug, Clone)]
pub struct ConfigOpts {
    /// Path to the TOML manifest
    #[arg(short, long, env = "AUTOMAC_CONFIG")]
    pub config: PathBuf,
}

/// Options for the `apply` subcommand.
#[derive(Args, Debug, Clone)]
pub struct ApplyOpts {
    /// Manifest to apply.
    #[command(flatten)]
    pub manifest: ConfigOpts,

    /// Skip tasks whose name contains any of these words
    #[arg(long, value_delimiter = ',')]
    pub skip: Vec<String>,

    /// Run only tasks whose name contains any of these words
    #[arg(long, value_delimiter = ',')]
    pub only: Vec<String>,
}
