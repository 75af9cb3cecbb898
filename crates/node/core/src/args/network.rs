use clap::Args;
use libp2p::Multiaddr;

/// Parameters for configuring the network
#[derive(Debug, Clone, Args, Default, PartialEq, Eq)]
#[command(next_help_heading = "Networking")]
pub struct NetworkArgs {
    /// Comma separated multiaddrs to listen on.
    ///
    /// --listen /ip4/0.0.0.0/tcp/1634,/ip6/::/tcp/1634
    #[arg(long = "listen", value_delimiter = ',', value_name = "MULTIADDR")]
    pub listen_addrs: Option<Vec<Multiaddr>>,

    /// Close connections idle for this many seconds.
    #[arg(long, value_name = "SECS")]
    pub idle_timeout: Option<u64>,
}
