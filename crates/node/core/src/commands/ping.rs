//! Ping command - measure the round-trip time to one peer.

use std::time::Duration;

use eyre::{Result, bail};
use sonar_net_pingpong::{PingContext, Pingpong, PingpongConfig, PingpongError};
use tracing::{info, warn};

use crate::{
    args::PingArgs, config::NodeConfig, constants::DEFAULT_CONNECT_TIMEOUT_SECS,
    network::Network,
};

pub(super) async fn run(config: NodeConfig, args: PingArgs) -> Result<()> {
    let mut network = Network::new(config.network.idle_timeout())?;
    let peer = network
        .connect(
            args.peer.clone(),
            Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
        )
        .await?;

    let pingpong = Pingpong::new(network.control(), PingpongConfig::from(&config.pingpong));
    tokio::spawn(network.run());

    let tokens = args.tokens();
    let mut failures = 0;

    for round in 1..=args.count {
        let (cx, cancel) = PingContext::with_timeout(args.timeout()).cancellable();
        let interrupt = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        });

        let result = pingpong.ping(&cx, peer, &tokens).await;
        interrupt.abort();

        match result {
            Ok(rtt) => {
                info!(%peer, round, ?rtt, tokens = tokens.len(), "Pingpong succeeded");
                println!("{peer}: rtt={rtt:?}");
            }
            Err(PingpongError::Canceled) => {
                info!("Interrupted");
                break;
            }
            Err(e) => {
                warn!(%peer, round, error = %e, "Pingpong failed");
                failures += 1;
            }
        }

        if round < args.count {
            tokio::time::sleep(args.interval()).await;
        }
    }

    if failures > 0 && failures == args.count {
        bail!("all {failures} pings to {peer} failed");
    }
    Ok(())
}
