//! CLI argument structs.
//!
//! Arguments that may also live in the config file are optional here, so an
//! unset flag leaves the file's value in place.

mod log;
mod metrics;
mod network;
mod ping;

pub use log::LogArgs;
pub use metrics::MetricsArgs;
pub use network::NetworkArgs;
pub use ping::{PingArgs, peer_id_from_multiaddr};
