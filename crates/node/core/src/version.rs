//! Version information for the sonar node.

/// The short version information for sonar.
pub const SHORT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// The client version reported in logs and to peers.
pub const P2P_CLIENT_VERSION: &str = concat!("sonar/v", env!("CARGO_PKG_VERSION"));
