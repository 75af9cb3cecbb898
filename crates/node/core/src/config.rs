//! Node configuration handling.
//!
//! The config file holds three sections: `network`, `pingpong` and `metrics`.
//! Every field has a default, so a partial file is valid.

use std::{fs, net::SocketAddr, path::Path, time::Duration};

use eyre::{Result, WrapErr};
use libp2p::Multiaddr;
use serde::{Deserialize, Serialize};
use sonar_net_pingpong::{
    DEFAULT_CLOSE_TIMEOUT, DEFAULT_MAX_MESSAGE_SIZE, DEFAULT_MESSAGE_TIMEOUT, PingpongConfig,
};

use crate::{args::MetricsArgs, args::NetworkArgs, constants::*};

/// Configuration for the sonar node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Network configuration
    pub network: NetworkConfig,

    /// Pingpong protocol configuration
    pub pingpong: PingpongSection,

    /// Metrics exporter configuration
    pub metrics: MetricsConfig,
}

impl NodeConfig {
    /// Load the configuration from the given path, or create a default one if it doesn't exist.
    pub fn load_or_create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if path.exists() {
            Self::load(path)
        } else {
            let config = Self::default();
            config.save(path)?;
            Ok(config)
        }
    }

    /// Load the configuration from the given path.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .wrap_err_with(|| format!("failed to read config {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .wrap_err_with(|| format!("failed to parse config {}", path.display()))?;
        Ok(config)
    }

    /// Save the configuration to the given path.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;

        Ok(())
    }

    /// Apply command line arguments to override the configuration.
    pub fn apply_cli_args(&mut self, network_args: &NetworkArgs, metrics_args: &MetricsArgs) {
        if let Some(addrs) = &network_args.listen_addrs {
            self.network.listen_addrs = addrs.iter().map(ToString::to_string).collect();
        }
        if let Some(idle_timeout) = network_args.idle_timeout {
            self.network.idle_timeout_secs = idle_timeout;
        }

        if let Some(addr) = metrics_args.addr {
            self.metrics.enabled = true;
            self.metrics.addr = addr;
        }
    }
}

/// Network configuration (TOML-serializable).
///
/// Addresses are kept as strings and parsed when the node starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Listening addresses
    pub listen_addrs: Vec<String>,

    /// Seconds before an idle connection is closed
    pub idle_timeout_secs: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            listen_addrs: vec![
                format!("/ip4/{DEFAULT_LISTEN_ADDR}/tcp/{DEFAULT_P2P_PORT}"),
                format!("/ip6/{DEFAULT_LISTEN_ADDR_V6}/tcp/{DEFAULT_P2P_PORT}"),
            ],
            idle_timeout_secs: DEFAULT_IDLE_TIMEOUT_SECS,
        }
    }
}

impl NetworkConfig {
    pub fn listen_addrs(&self) -> Result<Vec<Multiaddr>> {
        self.listen_addrs
            .iter()
            .map(|addr| {
                addr.parse()
                    .wrap_err_with(|| format!("invalid listen address {addr}"))
            })
            .collect()
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }
}

/// Pingpong protocol tunables, in whole seconds for readability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PingpongSection {
    /// Maximum encoded size of one message in bytes
    pub max_message_size: usize,

    /// Seconds allowed for each read or write
    pub message_timeout_secs: u64,

    /// Seconds allowed to close a stream
    pub close_timeout_secs: u64,
}

impl Default for PingpongSection {
    fn default() -> Self {
        Self {
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            message_timeout_secs: DEFAULT_MESSAGE_TIMEOUT.as_secs(),
            close_timeout_secs: DEFAULT_CLOSE_TIMEOUT.as_secs(),
        }
    }
}

impl From<&PingpongSection> for PingpongConfig {
    fn from(section: &PingpongSection) -> Self {
        PingpongConfig::default()
            .with_max_message_size(section.max_message_size)
            .with_message_timeout(Duration::from_secs(section.message_timeout_secs))
            .with_close_timeout(Duration::from_secs(section.close_timeout_secs))
    }
}

/// Prometheus exporter configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Whether to serve metrics
    pub enabled: bool,

    /// Address of the metrics endpoint
    pub addr: SocketAddr,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            addr: SocketAddr::from(DEFAULT_METRICS_ADDR),
        }
    }
}
