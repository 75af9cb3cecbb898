use std::net::SocketAddr;

use clap::Args;

/// Metrics exporter arguments.
#[derive(Debug, Args, Clone, Default, PartialEq, Eq)]
#[command(next_help_heading = "Metrics")]
pub struct MetricsArgs {
    /// Serve Prometheus metrics on this address (e.g. 127.0.0.1:9090).
    #[arg(long = "metrics", value_name = "SOCKET")]
    pub addr: Option<SocketAddr>,
}
