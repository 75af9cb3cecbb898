//! Listen command - serve pingpong to any peer that connects.

use eyre::{Result, WrapErr};
use sonar_net_pingpong::{PingpongConfig, Responder};
use tracing::info;

use crate::{config::NodeConfig, network::Network};

pub(super) async fn run(config: NodeConfig) -> Result<()> {
    let mut network = Network::new(config.network.idle_timeout())?;
    network.start_listening(&config.network.listen_addrs()?)?;

    let responder = Responder::new(PingpongConfig::from(&config.pingpong));
    let serve = responder
        .register(&mut network.control())
        .wrap_err("pingpong protocol already registered")?;
    tokio::spawn(serve);

    info!(peer_id = %network.local_peer_id(), "Answering pings");

    tokio::select! {
        () = network.run() => {}
        result = tokio::signal::ctrl_c() => {
            result?;
            info!("Shutting down");
        }
    }

    Ok(())
}
