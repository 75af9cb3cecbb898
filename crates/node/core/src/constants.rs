//! Constants used throughout the sonar node.

// =============================================================================
// Network
// =============================================================================

/// Default port for the Swarm network's TCP connections.
pub const DEFAULT_P2P_PORT: u16 = 1634;

/// Default IPv4 listen address for P2P connections (all interfaces).
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0";

/// Default IPv6 listen address for P2P connections (all interfaces).
pub const DEFAULT_LISTEN_ADDR_V6: &str = "::";

/// Default connection idle timeout in seconds.
pub const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 60;

/// Time allowed to establish a connection before pinging.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

// =============================================================================
// Metrics
// =============================================================================

/// Default bind address for the Prometheus endpoint (local only).
pub const DEFAULT_METRICS_ADDR: ([u8; 4], u16) = ([127, 0, 0, 1], 1637);
