//! Pingpong protocol for measuring round-trip time to Swarm peers.
//!
//! Compatible with Bee's `/swarm/pingpong/1.0.0/pingpong` protocol.
//!
//! # Protocol
//!
//! - Path: `/swarm/pingpong/1.0.0/pingpong`
//! - Framing: unsigned-varint length prefix followed by a protobuf message
//! - Request: `Ping { greeting: String }`, one per token
//! - Response: `Pong { response: String }` where response is the greeting verbatim
//!
//! # Flow
//!
//! 1. The initiator opens a stream to the peer through a [`StreamProvider`]
//! 2. For each token it sends a `Ping` and waits for the matching `Pong`
//! 3. After the last echo is verified it closes the stream and reports the RTT
//!
//! The peer side is served by [`Responder`], which echoes every token until
//! the initiator closes its side.
//!
//! ```no_run
//! # async fn run(control: libp2p_stream::Control, peer: libp2p::PeerId) -> Result<(), sonar_net_pingpong::PingpongError> {
//! use std::time::Duration;
//! use sonar_net_pingpong::{PingContext, Pingpong, PingpongConfig};
//!
//! let pingpong = Pingpong::new(control, PingpongConfig::default());
//! let cx = PingContext::with_timeout(Duration::from_secs(10));
//! let rtt = pingpong.ping(&cx, peer, &["hey", "there"]).await?;
//! # let _ = rtt;
//! # Ok(())
//! # }
//! ```

use libp2p::StreamProtocol;

mod codec;
mod config;
mod context;
mod error;
mod metrics;
mod responder;
mod service;
mod stream;

#[allow(unreachable_pub)]
mod proto;

#[cfg(test)]
mod testing;

pub use codec::{DEFAULT_MAX_MESSAGE_SIZE, Ping, PingCodec, PingpongCodecError, Pong, PongCodec};
pub use config::{DEFAULT_CLOSE_TIMEOUT, DEFAULT_MESSAGE_TIMEOUT, PingpongConfig};
pub use context::{CancelHandle, PingContext};
pub use error::{PingpongError, ProtocolViolation};
pub use metrics::{PingpongMetrics, describe_metrics};
pub use responder::Responder;
pub use service::Pingpong;
pub use stream::{InboundStreams, ScopedStream, StreamProvider};

/// Protocol name for pingpong.
pub const PROTOCOL_NAME: &str = "/swarm/pingpong/1.0.0/pingpong";

/// Protocol id registered with the stream transport.
pub const PROTOCOL: StreamProtocol = StreamProtocol::new(PROTOCOL_NAME);

/// The conversation sent by default when no tokens are given.
pub const DEFAULT_TOKENS: [&str; 6] = ["hey", "there", ",", "how are", "you", "?"];
