//! Length-delimited protobuf framing shared by the Sonar wire protocols.
//!
//! Every message on a stream is an unsigned-varint length prefix followed by
//! exactly that many bytes of protobuf payload, so a reader never needs more
//! bytes than one message requires and never consumes bytes of the next one.
//!
//! Protocols describe their messages as domain types implementing
//! [`ProtoMessage`] and frame them with [`Codec`], which may write one message
//! type and read another (request/response protocols such as pingpong).

use std::marker::PhantomData;

use asynchronous_codec::{Decoder, Encoder};
use bytes::BytesMut;
use quick_protobuf::{MessageRead, MessageWrite};

/// Conversion between a domain message and its generated protobuf form.
pub trait ProtoMessage: Sized {
    /// The protobuf representation written to the wire.
    type Proto;
    /// Error raised when a decoded protobuf is not a valid domain message.
    type DecodeError;

    /// Convert into the wire representation.
    fn into_proto(self) -> Self::Proto;

    /// Validate and convert from the wire representation.
    fn from_proto(proto: Self::Proto) -> Result<Self, Self::DecodeError>;
}

/// Base error for protocol codecs.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolCodecError {
    /// The message is larger than the codec allows; nothing was written.
    #[error("message of {size} bytes exceeds maximum of {max} bytes")]
    MessageTooLarge { size: usize, max: usize },
    /// The peer sent an invalid frame (bad length prefix or payload).
    #[error("Protocol error: {0}")]
    Protocol(String),
    /// IO error during read/write.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<quick_protobuf_codec::Error> for ProtocolCodecError {
    fn from(error: quick_protobuf_codec::Error) -> Self {
        ProtocolCodecError::Protocol(error.to_string())
    }
}

/// Codec that writes `Out` messages and reads `In` messages.
///
/// The size limit is enforced in both directions: oversized outgoing messages
/// fail with [`ProtocolCodecError::MessageTooLarge`] before anything is
/// buffered, and incoming length prefixes above the limit are rejected before
/// the payload is read.
pub struct Codec<Out: ProtoMessage, In: ProtoMessage, E = ProtocolCodecError> {
    inner: quick_protobuf_codec::Codec<Out::Proto, In::Proto>,
    max_message_size: usize,
    _marker: PhantomData<fn() -> (Out, In, E)>,
}

impl<Out: ProtoMessage, In: ProtoMessage, E> Codec<Out, In, E> {
    pub fn new(max_message_size: usize) -> Self {
        Self {
            inner: quick_protobuf_codec::Codec::new(max_message_size),
            max_message_size,
            _marker: PhantomData,
        }
    }
}

impl<Out, In, E> Encoder for Codec<Out, In, E>
where
    Out: ProtoMessage,
    Out::Proto: MessageWrite,
    In: ProtoMessage,
    E: From<std::io::Error> + From<ProtocolCodecError>,
{
    type Item<'a> = Out;
    type Error = E;

    fn encode(&mut self, item: Self::Item<'_>, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let proto = item.into_proto();
        let size = proto.get_size();
        if size > self.max_message_size {
            return Err(ProtocolCodecError::MessageTooLarge {
                size,
                max: self.max_message_size,
            }
            .into());
        }

        self.inner
            .encode(proto, dst)
            .map_err(|e| ProtocolCodecError::from(e).into())
    }
}

impl<Out, In, E> Decoder for Codec<Out, In, E>
where
    Out: ProtoMessage,
    In: ProtoMessage,
    In::Proto: for<'a> MessageRead<'a>,
    In::DecodeError: Into<E>,
    E: From<std::io::Error> + From<ProtocolCodecError>,
{
    type Item = In;
    type Error = E;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self
            .inner
            .decode(src)
            .map_err(|e| E::from(ProtocolCodecError::from(e)))?
        {
            Some(proto) => In::from_proto(proto).map(Some).map_err(Into::into),
            None => Ok(None),
        }
    }
}
