//! Arguments for pinging a peer.

use std::time::Duration;

use clap::Args;
use libp2p::{Multiaddr, PeerId, multiaddr::Protocol};
use sonar_net_pingpong::DEFAULT_TOKENS;

/// Ping arguments.
#[derive(Debug, Clone, Args, PartialEq, Eq)]
#[command(next_help_heading = "Ping")]
pub struct PingArgs {
    /// Address of the peer, ending in its peer id.
    ///
    /// /ip4/127.0.0.1/tcp/1634/p2p/12D3KooW...
    #[arg(value_name = "MULTIADDR", value_parser = parse_peer_addr)]
    pub peer: Multiaddr,

    /// Token to send; repeat for a conversation. Defaults to a short greeting.
    #[arg(long = "token", value_name = "TOKEN")]
    pub tokens: Vec<String>,

    /// Deadline for each ping call in seconds.
    #[arg(long, default_value_t = 10, value_name = "SECS")]
    pub timeout: u64,

    /// Number of pings to send.
    #[arg(short = 'c', long, default_value_t = 1)]
    pub count: u32,

    /// Seconds to wait between pings.
    #[arg(long, default_value_t = 1, value_name = "SECS")]
    pub interval: u64,
}

impl PingArgs {
    /// Tokens to send, falling back to the default conversation.
    pub fn tokens(&self) -> Vec<String> {
        if self.tokens.is_empty() {
            DEFAULT_TOKENS.iter().map(|t| t.to_string()).collect()
        } else {
            self.tokens.clone()
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval)
    }

    /// Peer id carried by the address. Always present once parsed.
    pub fn peer_id(&self) -> Option<PeerId> {
        peer_id_from_multiaddr(&self.peer)
    }
}

/// Extract the trailing `/p2p/<peer id>` of a multiaddr.
pub fn peer_id_from_multiaddr(addr: &Multiaddr) -> Option<PeerId> {
    addr.iter().find_map(|protocol| match protocol {
        Protocol::P2p(peer) => Some(peer),
        _ => None,
    })
}

fn parse_peer_addr(s: &str) -> Result<Multiaddr, String> {
    let addr: Multiaddr = s.parse().map_err(|e| format!("invalid multiaddr: {e}"))?;
    if peer_id_from_multiaddr(&addr).is_none() {
        return Err("multiaddr must end with /p2p/<peer id>".to_string());
    }
    Ok(addr)
}
