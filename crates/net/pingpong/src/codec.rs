//! Codec for pingpong protocol messages.
//!
//! One token travels per frame: the initiator writes a [`Ping`] carrying the
//! token as its greeting and the responder answers with a [`Pong`] carrying
//! the same bytes back.

use quick_protobuf::MessageWrite;
use sonar_net_codec::{Codec, ProtoMessage, ProtocolCodecError};

use crate::proto;

/// Maximum encoded size of a single pingpong message.
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 4096;

/// Error type for pingpong codec operations.
pub type PingpongCodecError = ProtocolCodecError;

/// Initiator side: writes pings, reads pongs.
pub type PingCodec = Codec<Ping, Pong, PingpongCodecError>;

/// Responder side: writes pongs, reads pings.
pub type PongCodec = Codec<Pong, Ping, PingpongCodecError>;

/// A ping message carrying one token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ping {
    /// The token being sent.
    pub greeting: String,
}

impl Ping {
    /// Create a new ping with the given greeting.
    pub fn new(greeting: impl Into<String>) -> Self {
        Self {
            greeting: greeting.into(),
        }
    }

    /// Size of the encoded message, excluding the length prefix.
    pub fn encoded_len(&self) -> usize {
        proto::Ping {
            greeting: self.greeting.clone(),
        }
        .get_size()
    }
}

impl ProtoMessage for Ping {
    type Proto = proto::Ping;
    type DecodeError = PingpongCodecError;

    fn into_proto(self) -> Self::Proto {
        proto::Ping {
            greeting: self.greeting,
        }
    }

    fn from_proto(proto: Self::Proto) -> Result<Self, Self::DecodeError> {
        Ok(Self {
            greeting: proto.greeting,
        })
    }
}

/// A pong message echoing one token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pong {
    /// The echoed token.
    pub response: String,
}

impl Pong {
    /// Create a new pong with the given response.
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
        }
    }

    /// Echo a ping verbatim.
    pub fn echo(ping: Ping) -> Self {
        Self {
            response: ping.greeting,
        }
    }
}

impl ProtoMessage for Pong {
    type Proto = proto::Pong;
    type DecodeError = PingpongCodecError;

    fn into_proto(self) -> Self::Proto {
        proto::Pong {
            response: self.response,
        }
    }

    fn from_proto(proto: Self::Proto) -> Result<Self, Self::DecodeError> {
        Ok(Self {
            response: proto.response,
        })
    }
}
