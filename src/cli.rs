use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Talos multi-state system reliability toolkit.
#[derive(Parser)]
#[command(
    name = "talos",
    version,
    about = "Multi-state system reliability and availability toolkit"
)]
pub struct Cli {
    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Subcommand)]
pub enum Command {
    /// Solve a scenario: component diagrams, then the network.
    Solve(SolveArgs),
    /// Validate a scenario file without solving it.
    Check(CheckArgs),
}

/// Arguments for the `solve` subcommand.
#[derive(clap::Args)]
pub struct SolveArgs {
    /// Path to TOML scenario file.
    #[arg(short, long, default_value = "talos.toml")]
    pub config: PathBuf,
}

/// Arguments for the `check` subcommand.
#[derive(clap::Args)]
pub struct CheckArgs {
    /// Path to TOML scenario file.
    #[arg(short, long, default_value = "talos.toml")]
    pub config: PathBuf,
}
