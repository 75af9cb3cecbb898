//! Error types for the pingpong protocol.

use libp2p::PeerId;

use crate::codec::PingpongCodecError;

/// Error returned by [`Pingpong::ping`](crate::Pingpong::ping) and the responder.
#[derive(Debug, thiserror::Error, strum::IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum PingpongError {
    /// No tokens were supplied, or a token is too large to encode.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// The stream provider could not open a stream to the peer.
    #[error("peer {peer} unreachable: {source}")]
    PeerUnreachable {
        peer: PeerId,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// The peer violated the protocol.
    #[error(transparent)]
    Protocol(#[from] ProtocolViolation),
    /// The deadline or a message timeout expired before the exchange completed.
    #[error("pingpong timed out")]
    Timeout,
    /// The caller cancelled the exchange.
    #[error("pingpong canceled")]
    Canceled,
    /// The stream failed at the transport level.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PingpongError {
    /// Short label for the error kind, used as a metrics outcome.
    pub fn kind(&self) -> &'static str {
        self.into()
    }
}

impl From<PingpongCodecError> for PingpongError {
    fn from(error: PingpongCodecError) -> Self {
        match error {
            PingpongCodecError::MessageTooLarge { size, max } => PingpongError::InvalidArgument(
                format!("message of {size} bytes exceeds maximum of {max} bytes"),
            ),
            PingpongCodecError::Protocol(reason) => ProtocolViolation::Codec(reason).into(),
            PingpongCodecError::Io(e) => PingpongError::Io(e),
        }
    }
}

/// Non-retryable protocol violations by the remote peer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolViolation {
    /// The echo did not match the token sent. `index` is also the number of
    /// tokens verified before the mismatch.
    #[error("echo mismatch at token {index}: sent {sent:?}, received {received:?}")]
    EchoMismatch {
        index: usize,
        sent: String,
        received: String,
    },
    /// The peer sent a malformed frame.
    #[error("malformed message: {0}")]
    Codec(String),
}
