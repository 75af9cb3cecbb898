//! In-memory stream doubles.

use std::{
    collections::HashSet,
    io,
    pin::Pin,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    task::{Context, Poll},
};

use asynchronous_codec::Framed;
use async_trait::async_trait;
use futures::{
    AsyncRead, AsyncWrite, SinkExt, StreamExt, TryStreamExt,
    channel::mpsc,
    future::BoxFuture,
};
use libp2p::{PeerId, StreamProtocol};

use crate::{
    Responder,
    codec::{Pong, PongCodec},
    stream::StreamProvider,
};

/// Observations of one side of a [`MemoryStream`].
#[derive(Debug, Default)]
pub(crate) struct StreamCounters {
    writes: AtomicUsize,
    reads: AtomicUsize,
    closes: AtomicUsize,
    resets: AtomicUsize,
}

impl StreamCounters {
    pub(crate) fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Chunks received from the other end, one per remote write.
    pub(crate) fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub(crate) fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    /// Streams dropped while still open.
    pub(crate) fn resets(&self) -> usize {
        self.resets.load(Ordering::SeqCst)
    }
}

/// One end of an in-memory duplex byte stream.
///
/// Closing drops the write half, so the other end reads end of stream.
#[derive(Debug)]
pub(crate) struct MemoryStream {
    tx: Option<mpsc::UnboundedSender<Vec<u8>>>,
    rx: mpsc::UnboundedReceiver<Vec<u8>>,
    pending: Vec<u8>,
    counters: Arc<StreamCounters>,
    hang_on_close: bool,
}

pub(crate) fn memory_pair() -> (MemoryStream, MemoryStream) {
    let (a_tx, a_rx) = mpsc::unbounded();
    let (b_tx, b_rx) = mpsc::unbounded();
    let side = |tx, rx| MemoryStream {
        tx: Some(tx),
        rx,
        pending: Vec::new(),
        counters: Arc::default(),
        hang_on_close: false,
    };
    (side(a_tx, b_rx), side(b_tx, a_rx))
}

impl MemoryStream {
    pub(crate) fn counters(&self) -> Arc<StreamCounters> {
        self.counters.clone()
    }

    /// Make every close attempt stay pending forever.
    pub(crate) fn hang_on_close(mut self) -> Self {
        self.hang_on_close = true;
        self
    }
}

impl Drop for MemoryStream {
    fn drop(&mut self) {
        if self.tx.take().is_some() {
            self.counters.resets.fetch_add(1, Ordering::SeqCst);
        }
    }
}

impl AsyncRead for MemoryStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut [u8],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        while this.pending.is_empty() {
            match futures::ready!(this.rx.poll_next_unpin(cx)) {
                Some(chunk) => {
                    this.counters.reads.fetch_add(1, Ordering::SeqCst);
                    this.pending = chunk;
                }
                None => return Poll::Ready(Ok(0)),
            }
        }

        let n = buf.len().min(this.pending.len());
        for (dst, src) in buf.iter_mut().zip(this.pending.drain(..n)) {
            *dst = src;
        }
        Poll::Ready(Ok(n))
    }
}

impl AsyncWrite for MemoryStream {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        let tx = this
            .tx
            .as_ref()
            .ok_or_else(|| io::Error::from(io::ErrorKind::BrokenPipe))?;
        tx.unbounded_send(buf.to_vec())
            .map_err(|_| io::Error::from(io::ErrorKind::BrokenPipe))?;
        this.counters.writes.fetch_add(1, Ordering::SeqCst);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_close(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        if this.hang_on_close {
            return Poll::Pending;
        }
        if this.tx.take().is_some() {
            this.counters.closes.fetch_add(1, Ordering::SeqCst);
        }
        Poll::Ready(Ok(()))
    }
}

type PeerBehaviour = Arc<dyn Fn(MemoryStream) -> BoxFuture<'static, ()> + Send + Sync>;

/// Stream provider whose remote end runs a scripted peer on a spawned task.
pub(crate) struct MemoryStreamProvider {
    peer: PeerBehaviour,
    unreachable: HashSet<PeerId>,
    stall_open: bool,
    hang_on_close: bool,
    opened: Mutex<Vec<Arc<StreamCounters>>>,
}

impl MemoryStreamProvider {
    pub(crate) fn with_peer<F>(peer: F) -> Self
    where
        F: Fn(MemoryStream) -> BoxFuture<'static, ()> + Send + Sync + 'static,
    {
        Self {
            peer: Arc::new(peer),
            unreachable: HashSet::new(),
            stall_open: false,
            hang_on_close: false,
            opened: Mutex::default(),
        }
    }

    /// Remote end runs the real responder.
    pub(crate) fn echo() -> Self {
        Self::with_peer(|stream| {
            Box::pin(async move {
                let _ = Responder::default().handle(PeerId::random(), stream).await;
            })
        })
    }

    /// Remote end holds the stream open and never answers.
    pub(crate) fn silent() -> Self {
        Self::with_peer(|stream| {
            Box::pin(async move {
                let _stream = stream;
                std::future::pending::<()>().await;
            })
        })
    }

    pub(crate) fn unreachable(mut self, peer: PeerId) -> Self {
        self.unreachable.insert(peer);
        self
    }

    /// Opening a stream never completes.
    pub(crate) fn stall_open(mut self) -> Self {
        self.stall_open = true;
        self
    }

    /// Local ends of opened streams never finish closing.
    pub(crate) fn hang_on_close(mut self) -> Self {
        self.hang_on_close = true;
        self
    }

    pub(crate) fn opens(&self) -> usize {
        self.opened.lock().unwrap().len()
    }

    /// Counters of the local end of the most recently opened stream.
    pub(crate) fn last_stream(&self) -> Option<Arc<StreamCounters>> {
        self.opened.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl StreamProvider for MemoryStreamProvider {
    type Stream = MemoryStream;
    type Error = io::Error;

    async fn open_stream(
        &self,
        peer: PeerId,
        _protocol: StreamProtocol,
    ) -> Result<Self::Stream, Self::Error> {
        if self.unreachable.contains(&peer) {
            return Err(io::Error::from(io::ErrorKind::ConnectionRefused));
        }
        if self.stall_open {
            std::future::pending::<()>().await;
        }

        let (mut local, remote) = memory_pair();
        if self.hang_on_close {
            local = local.hang_on_close();
        }
        self.opened.lock().unwrap().push(local.counters());
        tokio::spawn((self.peer)(remote));
        Ok(local)
    }
}

/// Answers the first ping with the wrong token, then drains until close.
pub(crate) fn mismatching_peer(stream: MemoryStream) -> BoxFuture<'static, ()> {
    Box::pin(async move {
        let mut framed = Framed::new(stream, PongCodec::new(4096));
        if let Ok(Some(_)) = framed.try_next().await {
            let _ = framed.send(Pong::new("wrong")).await;
        }
        while let Ok(Some(_)) = framed.try_next().await {}
    })
}
