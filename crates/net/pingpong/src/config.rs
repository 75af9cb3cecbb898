use std::time::Duration;

use crate::codec::DEFAULT_MAX_MESSAGE_SIZE;

/// Default bound on a single read or write.
pub const DEFAULT_MESSAGE_TIMEOUT: Duration = Duration::from_secs(30);

/// Default bound on the graceful close of a stream.
pub const DEFAULT_CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

/// Tunables shared by the initiator and the responder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PingpongConfig {
    /// Maximum encoded size of a single message, excluding the length prefix.
    pub max_message_size: usize,
    /// Bound on each individual read or write.
    pub message_timeout: Duration,
    /// Bound on closing a stream after the exchange.
    pub close_timeout: Duration,
}

impl Default for PingpongConfig {
    fn default() -> Self {
        Self {
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            message_timeout: DEFAULT_MESSAGE_TIMEOUT,
            close_timeout: DEFAULT_CLOSE_TIMEOUT,
        }
    }
}

impl PingpongConfig {
    pub fn with_max_message_size(mut self, max_message_size: usize) -> Self {
        self.max_message_size = max_message_size;
        self
    }

    pub fn with_message_timeout(mut self, message_timeout: Duration) -> Self {
        self.message_timeout = message_timeout;
        self
    }

    pub fn with_close_timeout(mut self, close_timeout: Duration) -> Self {
        self.close_timeout = close_timeout;
        self
    }
}
