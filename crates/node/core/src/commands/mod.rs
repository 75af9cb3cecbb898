//! Node commands
//!
//! Each command loads the node configuration, applies CLI overrides, starts
//! the libp2p node and then does its work until done or interrupted.

mod listen;
mod ping;

use std::path::Path;

use eyre::Result;
use tracing::info;

use crate::{
    cli::{Cli, Commands, NodeArgs},
    config::NodeConfig,
    metrics::install_metrics,
    version::P2P_CLIENT_VERSION,
};

/// Run the command selected on the command line.
pub async fn run(cli: Cli) -> Result<()> {
    info!(version = P2P_CLIENT_VERSION, "Starting sonar");

    match cli.command {
        Commands::Listen(args) => {
            let config = load_config(cli.config.as_deref(), &args)?;
            listen::run(config).await
        }
        Commands::Ping(args) => {
            let config = load_config(cli.config.as_deref(), &args.node)?;
            ping::run(config, args.ping).await
        }
    }
}

/// Load the config file, if any, apply CLI overrides and install metrics.
fn load_config(path: Option<&Path>, args: &NodeArgs) -> Result<NodeConfig> {
    let mut config = match path {
        Some(path) => {
            let config = NodeConfig::load_or_create(path)?;
            info!(path = %path.display(), "Configuration loaded");
            config
        }
        None => NodeConfig::default(),
    };
    config.apply_cli_args(&args.network, &args.metrics);

    install_metrics(&config.metrics)?;
    Ok(config)
}
