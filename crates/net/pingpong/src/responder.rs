//! Responder side: echoes every received token back verbatim.

use std::future::Future;

use asynchronous_codec::Framed;
use futures::{AsyncRead, AsyncWrite, SinkExt, StreamExt, TryStreamExt};
use libp2p::PeerId;
use tracing::{Instrument, debug, debug_span, trace};

use crate::{
    PROTOCOL, PingpongConfig, PingpongError,
    codec::{Pong, PongCodec},
    context::with_timeout,
    metrics::PingpongMetrics,
    stream::InboundStreams,
};

/// Stateless handler for inbound pingpong streams.
#[derive(Debug, Clone, Default)]
pub struct Responder {
    config: PingpongConfig,
    metrics: PingpongMetrics,
}

impl Responder {
    pub fn new(config: PingpongConfig) -> Self {
        Self {
            config,
            metrics: PingpongMetrics::default(),
        }
    }

    /// Register the protocol with `transport` and return the future serving
    /// its inbound streams.
    pub fn register<R: InboundStreams>(
        self,
        transport: &mut R,
    ) -> Result<impl Future<Output = ()> + Send + use<R>, R::Error> {
        let incoming = transport.accept(PROTOCOL)?;
        Ok(self.serve(incoming))
    }

    /// Handle every stream yielded by `incoming` on its own task.
    ///
    /// Returns once `incoming` ends. A failing stream never affects the others.
    pub async fn serve<I, S>(self, mut incoming: I)
    where
        I: futures::Stream<Item = (PeerId, S)> + Unpin,
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        while let Some((peer, stream)) = incoming.next().await {
            let responder = self.clone();
            tokio::spawn(
                async move {
                    match responder.handle(peer, stream).await {
                        Ok(echoed) => debug!(echoed, "Pingpong: inbound stream finished"),
                        Err(e) => debug!(error = %e, "Pingpong: inbound stream failed"),
                    }
                }
                .instrument(debug_span!("pingpong_inbound", %peer)),
            );
        }
        debug!("Pingpong: inbound streams ended");
    }

    /// Echo tokens until the remote closes its side, then close ours.
    ///
    /// Returns the number of tokens echoed.
    pub async fn handle<S>(&self, peer: PeerId, stream: S) -> Result<usize, PingpongError>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        self.metrics.inc_responder_streams();

        let mut framed = Framed::new(stream, PongCodec::new(self.config.max_message_size));
        let result = self.echo(&mut framed).await;

        if let Err(e) = with_timeout(self.config.close_timeout, framed.close()).await {
            trace!(%peer, error = %e, "Pingpong: failed to close inbound stream");
        }
        if result.is_err() {
            self.metrics.inc_responder_errors();
        }

        result
    }

    async fn echo<S>(&self, framed: &mut Framed<S, PongCodec>) -> Result<usize, PingpongError>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let timeout = self.config.message_timeout;
        let mut echoed = 0;

        while let Some(ping) = with_timeout(timeout, framed.try_next()).await? {
            with_timeout(timeout, framed.send(Pong::echo(ping))).await?;
            echoed += 1;
            self.metrics.inc_tokens_echoed();
        }

        Ok(echoed)
    }
}
