//! Stream acquisition seams and the scoped stream guard.
//!
//! The transport is consumed through two narrow traits:
//! - [`StreamProvider`] opens an outbound stream to a peer for a protocol.
//! - [`InboundStreams`] registers a protocol and yields accepted inbound streams.
//!
//! Both are implemented for [`libp2p_stream::Control`].

use std::{
    io,
    pin::Pin,
    task::{Context, Poll},
    time::Duration,
};

use async_trait::async_trait;
use futures::{AsyncRead, AsyncWrite, AsyncWriteExt};
use libp2p::{PeerId, StreamProtocol};
use tracing::trace;

/// Opens logical streams to peers.
#[async_trait]
pub trait StreamProvider: Send + Sync {
    type Stream: AsyncRead + AsyncWrite + Unpin + Send + 'static;
    type Error: std::error::Error + Send + Sync + 'static;

    /// Open a new stream to `peer` speaking `protocol`.
    async fn open_stream(
        &self,
        peer: PeerId,
        protocol: StreamProtocol,
    ) -> Result<Self::Stream, Self::Error>;
}

/// Registers a protocol so the transport dispatches inbound streams for it.
pub trait InboundStreams {
    type Stream: AsyncRead + AsyncWrite + Unpin + Send + 'static;
    type Incoming: futures::Stream<Item = (PeerId, Self::Stream)> + Unpin + Send + 'static;
    type Error: std::error::Error + Send + Sync + 'static;

    fn accept(&mut self, protocol: StreamProtocol) -> Result<Self::Incoming, Self::Error>;
}

#[async_trait]
impl StreamProvider for libp2p_stream::Control {
    type Stream = libp2p::Stream;
    type Error = libp2p_stream::OpenStreamError;

    async fn open_stream(
        &self,
        peer: PeerId,
        protocol: StreamProtocol,
    ) -> Result<Self::Stream, Self::Error> {
        let mut control = self.clone();
        libp2p_stream::Control::open_stream(&mut control, peer, protocol).await
    }
}

impl InboundStreams for libp2p_stream::Control {
    type Stream = libp2p::Stream;
    type Incoming = libp2p_stream::IncomingStreams;
    type Error = libp2p_stream::AlreadyRegistered;

    fn accept(&mut self, protocol: StreamProtocol) -> Result<Self::Incoming, Self::Error> {
        libp2p_stream::Control::accept(self, protocol)
    }
}

/// Exclusive owner of a stream for the duration of one call.
///
/// [`close`](Self::close) consumes the guard, so a stream is closed at most
/// once. A guard dropped without closing (the owning future was dropped, or
/// the call context finished first) releases the stream by dropping it,
/// which resets it on the transport.
pub struct ScopedStream<S: AsyncWrite + Unpin> {
    peer: PeerId,
    inner: Option<S>,
}

impl<S: AsyncWrite + Unpin> ScopedStream<S> {
    pub fn new(peer: PeerId, stream: S) -> Self {
        Self {
            peer,
            inner: Some(stream),
        }
    }

    pub fn peer(&self) -> PeerId {
        self.peer
    }

    /// Gracefully close the stream, waiting at most `timeout`.
    pub async fn close(mut self, timeout: Duration) -> io::Result<()> {
        let Some(mut stream) = self.inner.take() else {
            return Ok(());
        };

        match tokio::time::timeout(timeout, stream.close()).await {
            Ok(result) => result,
            Err(_) => Err(io::Error::new(
                io::ErrorKind::TimedOut,
                "timed out closing stream",
            )),
        }
    }

    fn stream_mut(&mut self) -> io::Result<&mut S> {
        self.inner
            .as_mut()
            .ok_or_else(|| io::Error::from(io::ErrorKind::NotConnected))
    }
}

impl<S: AsyncWrite + Unpin> Drop for ScopedStream<S> {
    fn drop(&mut self) {
        if self.inner.take().is_some() {
            trace!(peer = %self.peer, "Pingpong: stream released without close");
        }
    }
}

impl<S: AsyncRead + AsyncWrite + Unpin> AsyncRead for ScopedStream<S> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut [u8],
    ) -> Poll<io::Result<usize>> {
        match self.get_mut().stream_mut() {
            Ok(stream) => Pin::new(stream).poll_read(cx, buf),
            Err(e) => Poll::Ready(Err(e)),
        }
    }
}

impl<S: AsyncWrite + Unpin> AsyncWrite for ScopedStream<S> {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match self.get_mut().stream_mut() {
            Ok(stream) => Pin::new(stream).poll_write(cx, buf),
            Err(e) => Poll::Ready(Err(e)),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut().stream_mut() {
            Ok(stream) => Pin::new(stream).poll_flush(cx),
            Err(e) => Poll::Ready(Err(e)),
        }
    }

    /// Shutting down happens only through [`ScopedStream::close`].
    fn poll_close(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        self.poll_flush(cx)
    }
}
