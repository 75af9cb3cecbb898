//! Command-line interface for the sonar node.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::{
    args::{LogArgs, MetricsArgs, NetworkArgs, PingArgs},
    version::SHORT_VERSION,
};

/// Sonar - Swarm pingpong latency probe
#[derive(Debug, Parser)]
#[command(author, version = SHORT_VERSION, about, long_about = None)]
pub struct Cli {
    /// Logging configuration
    #[command(flatten)]
    pub log_args: LogArgs,

    /// Path to a TOML config file. Created with defaults if missing.
    #[arg(long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Sonar commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Listen for connections and answer pings
    Listen(NodeArgs),

    /// Ping a peer and print the round-trip time
    Ping(PingCommandArgs),
}

/// Arguments shared by every command that runs a node
#[derive(Debug, Args, Clone, Default, PartialEq, Eq)]
pub struct NodeArgs {
    /// Network configuration
    #[command(flatten)]
    pub network: NetworkArgs,

    /// Metrics configuration
    #[command(flatten)]
    pub metrics: MetricsArgs,
}

/// Arguments for the 'ping' command
#[derive(Debug, Args)]
pub struct PingCommandArgs {
    #[command(flatten)]
    pub node: NodeArgs,

    #[command(flatten)]
    pub ping: PingArgs,
}
