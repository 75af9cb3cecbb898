//! Sonar node binary.

use clap::Parser;
use sonar_node_core::{cli::Cli, commands, logging::init_logging};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_args)?;

    commands::run(cli).await
}
