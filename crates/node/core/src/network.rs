//! P2P networking for the sonar node.
//!
//! # Transport Stack
//!
//! ```text
//! DNS (resolves /dnsaddr/, /dns/, /dns4/, /dns6/)
//!   └── TCP
//!         └── Noise (encryption)
//!               └── Yamux (multiplexing)
//! ```
//!
//! The only behaviour is `libp2p_stream`, which hands raw protocol streams to
//! the pingpong service and responder through a [`libp2p_stream::Control`].

use std::time::Duration;

use eyre::{Result, bail, eyre};
use futures::StreamExt;
use libp2p::{Multiaddr, PeerId, Swarm, SwarmBuilder, noise, swarm::SwarmEvent, tcp, yamux};
use tracing::{debug, info, warn};

use crate::args::peer_id_from_multiaddr;

/// The network handle for managing the libp2p swarm.
pub struct Network {
    swarm: Swarm<libp2p_stream::Behaviour>,
}

impl Network {
    /// Create a new network instance with a fresh identity.
    pub fn new(idle_timeout: Duration) -> Result<Self> {
        let swarm = SwarmBuilder::with_new_identity()
            .with_tokio()
            .with_tcp(
                tcp::Config::default(),
                noise::Config::new,
                yamux::Config::default,
            )?
            .with_dns()?
            .with_behaviour(|_| libp2p_stream::Behaviour::new())?
            .with_swarm_config(|cfg| cfg.with_idle_connection_timeout(idle_timeout))
            .build();

        let local_peer_id = *swarm.local_peer_id();
        info!(%local_peer_id, "Local peer ID");

        Ok(Self { swarm })
    }

    /// Get the local peer ID.
    pub fn local_peer_id(&self) -> PeerId {
        *self.swarm.local_peer_id()
    }

    /// A handle for opening and accepting protocol streams.
    pub fn control(&self) -> libp2p_stream::Control {
        self.swarm.behaviour().new_control()
    }

    /// Start listening on the given addresses.
    ///
    /// Fails only if none of the addresses could be bound.
    pub fn start_listening(&mut self, addrs: &[Multiaddr]) -> Result<()> {
        let mut listening = 0;
        for addr in addrs {
            match self.swarm.listen_on(addr.clone()) {
                Ok(_) => listening += 1,
                Err(e) => warn!(%addr, %e, "Failed to listen on address"),
            }
        }

        if listening == 0 && !addrs.is_empty() {
            bail!("failed to listen on any configured address");
        }
        Ok(())
    }

    /// Dial `addr` and drive the swarm until a connection to its peer is up.
    pub async fn connect(&mut self, addr: Multiaddr, timeout: Duration) -> Result<PeerId> {
        let peer = peer_id_from_multiaddr(&addr)
            .ok_or_else(|| eyre!("address {addr} does not contain a peer id"))?;

        info!(%peer, %addr, "Dialing peer");
        self.swarm.dial(addr)?;

        tokio::time::timeout(timeout, self.wait_for_connection(peer))
            .await
            .map_err(|_| eyre!("timed out connecting to {peer}"))??;

        Ok(peer)
    }

    async fn wait_for_connection(&mut self, peer: PeerId) -> Result<()> {
        loop {
            match self.swarm.select_next_some().await {
                SwarmEvent::ConnectionEstablished { peer_id, .. } if peer_id == peer => {
                    info!(%peer, "Connected");
                    return Ok(());
                }
                SwarmEvent::OutgoingConnectionError {
                    peer_id: Some(peer_id),
                    error,
                    ..
                } if peer_id == peer => {
                    bail!("failed to connect to {peer}: {error}");
                }
                event => self.log_event(event),
            }
        }
    }

    /// Run the network event loop.
    ///
    /// This processes swarm events and should be run in a background task.
    pub async fn run(mut self) {
        debug!("Starting network event loop");
        loop {
            let event = self.swarm.select_next_some().await;
            self.log_event(event);
        }
    }

    fn log_event(&self, event: SwarmEvent<()>) {
        match event {
            SwarmEvent::NewListenAddr { address, .. } => {
                let address = address.with_p2p(self.local_peer_id()).unwrap_or_else(|a| a);
                info!(%address, "Listening on address");
            }
            SwarmEvent::ConnectionEstablished {
                peer_id,
                endpoint,
                num_established,
                ..
            } => {
                info!(
                    %peer_id,
                    endpoint = %endpoint.get_remote_address(),
                    num_established,
                    "Connection established"
                );
            }
            SwarmEvent::ConnectionClosed {
                peer_id,
                cause,
                num_established,
                ..
            } => {
                debug!(%peer_id, num_established, ?cause, "Connection closed");
            }
            SwarmEvent::IncomingConnection {
                local_addr,
                send_back_addr,
                ..
            } => {
                debug!(%local_addr, %send_back_addr, "Incoming connection");
            }
            SwarmEvent::OutgoingConnectionError { peer_id, error, .. } => {
                if let Some(peer_id) = peer_id {
                    warn!(%peer_id, %error, "Outgoing connection error");
                } else {
                    warn!(%error, "Outgoing connection error (unknown peer)");
                }
            }
            SwarmEvent::IncomingConnectionError { error, .. } => {
                debug!(%error, "Incoming connection error");
            }
            _ => {}
        }
    }
}
