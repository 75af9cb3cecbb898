//! Initiator side of the pingpong exchange.

use std::{io, time::Duration};

use asynchronous_codec::Framed;
use futures::{AsyncRead, AsyncWrite, SinkExt, TryStreamExt};
use libp2p::PeerId;
use tracing::{debug, trace};

use crate::{
    PROTOCOL, PingContext, PingpongConfig, PingpongError, ProtocolViolation,
    codec::{Ping, PingCodec},
    context::with_timeout,
    metrics::{OUTCOME_SUCCESS, PingpongMetrics},
    stream::{ScopedStream, StreamProvider},
};

/// Measures round-trip time to peers by exchanging echoed tokens.
///
/// Every call opens its own stream, so a single `Pingpong` can serve any
/// number of concurrent calls.
#[derive(Debug)]
pub struct Pingpong<P> {
    provider: P,
    config: PingpongConfig,
    metrics: PingpongMetrics,
}

impl<P: StreamProvider> Pingpong<P> {
    pub fn new(provider: P, config: PingpongConfig) -> Self {
        Self {
            provider,
            config,
            metrics: PingpongMetrics::default(),
        }
    }

    /// Send `tokens` to `peer` one at a time, verifying each echo before the
    /// next is sent, and return the elapsed time of the whole exchange.
    ///
    /// The exchange is bounded by `cx` as a whole and by the configured
    /// message timeout per read or write. The stream is released on every
    /// return path: closed while `cx` allows it, reset otherwise.
    pub async fn ping<T: AsRef<str>>(
        &self,
        cx: &PingContext,
        peer: PeerId,
        tokens: &[T],
    ) -> Result<Duration, PingpongError> {
        let result = self.try_ping(cx, peer, tokens).await;

        match &result {
            Ok(rtt) => {
                debug!(%peer, ?rtt, tokens = tokens.len(), "Pingpong: exchange complete");
                self.metrics.record_ping(OUTCOME_SUCCESS, Some(*rtt));
            }
            Err(e) => {
                debug!(%peer, error = %e, "Pingpong: exchange failed");
                self.metrics.record_ping(e.kind(), None);
            }
        }

        result
    }

    async fn try_ping<T: AsRef<str>>(
        &self,
        cx: &PingContext,
        peer: PeerId,
        tokens: &[T],
    ) -> Result<Duration, PingpongError> {
        self.validate(tokens)?;

        let stream = cx
            .run(async {
                self.provider
                    .open_stream(peer, PROTOCOL)
                    .await
                    .map_err(|e| PingpongError::PeerUnreachable {
                        peer,
                        source: Box::new(e),
                    })
            })
            .await?;

        let mut stream = ScopedStream::new(peer, stream);
        let result = cx.run(self.exchange(&mut stream, tokens)).await;
        self.release(cx, stream).await;

        result
    }

    /// Close `stream` gracefully within what is left of `cx`.
    ///
    /// Once `cx` has finished the close future is dropped along with the
    /// stream, which resets it on the transport.
    async fn release<S: AsyncWrite + Unpin>(&self, cx: &PingContext, stream: ScopedStream<S>) {
        let peer = stream.peer();
        let close = async {
            stream
                .close(self.config.close_timeout)
                .await
                .map_err(PingpongError::from)
        };

        match cx.run(close).await {
            Ok(()) => {}
            Err(PingpongError::Timeout | PingpongError::Canceled) => {
                trace!(%peer, "Pingpong: stream reset, call context finished");
            }
            Err(e) => debug!(%peer, error = %e, "Pingpong: failed to close stream"),
        }
    }

    fn validate<T: AsRef<str>>(&self, tokens: &[T]) -> Result<(), PingpongError> {
        if tokens.is_empty() {
            return Err(PingpongError::InvalidArgument(
                "at least one token is required".to_string(),
            ));
        }

        let max = self.config.max_message_size;
        for (index, token) in tokens.iter().enumerate() {
            let size = Ping::new(token.as_ref()).encoded_len();
            if size > max {
                return Err(PingpongError::InvalidArgument(format!(
                    "token {index} encodes to {size} bytes, maximum is {max}"
                )));
            }
        }

        Ok(())
    }

    async fn exchange<S, T>(
        &self,
        stream: &mut ScopedStream<S>,
        tokens: &[T],
    ) -> Result<Duration, PingpongError>
    where
        S: AsyncRead + AsyncWrite + Unpin,
        T: AsRef<str>,
    {
        let peer = stream.peer();
        let timeout = self.config.message_timeout;
        let mut framed = Framed::new(stream, PingCodec::new(self.config.max_message_size));

        let started = std::time::Instant::now();
        for (index, token) in tokens.iter().enumerate() {
            let token = token.as_ref();

            with_timeout(timeout, framed.send(Ping::new(token))).await?;
            let pong = with_timeout(timeout, framed.try_next())
                .await?
                .ok_or_else(|| {
                    io::Error::new(io::ErrorKind::UnexpectedEof, "stream closed before echo")
                })?;

            if pong.response != token {
                return Err(ProtocolViolation::EchoMismatch {
                    index,
                    sent: token.to_string(),
                    received: pong.response,
                }
                .into());
            }
            trace!(%peer, index, "Pingpong: echo verified");
        }

        Ok(started.elapsed())
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use metrics_util::debugging::{DebugValue, DebuggingRecorder};

    use super::*;
    use crate::testing::{MemoryStreamProvider, mismatching_peer};

    const CONVERSATION: [&str; 6] = ["hey", "there", ",", "how are", "you", "?"];

    fn pingpong(provider: MemoryStreamProvider) -> Pingpong<MemoryStreamProvider> {
        Pingpong::new(provider, PingpongConfig::default())
    }

    #[tokio::test]
    async fn conversation_against_echo_responder() {
        let service = pingpong(MemoryStreamProvider::echo());
        let peer = PeerId::random();

        let rtt = service
            .ping(&PingContext::background(), peer, &CONVERSATION)
            .await
            .unwrap();

        assert!(rtt > Duration::ZERO);
        assert_eq!(service.provider.opens(), 1);
        let counters = service.provider.last_stream().unwrap();
        assert_eq!(counters.writes(), 6);
        assert_eq!(counters.reads(), 6);
        assert_eq!(counters.closes(), 1);
        assert_eq!(counters.resets(), 0);
    }

    #[tokio::test]
    async fn zero_tokens_never_opens_a_stream() {
        let service = pingpong(MemoryStreamProvider::echo());
        let tokens: [&str; 0] = [];

        let result = service
            .ping(&PingContext::background(), PeerId::random(), &tokens)
            .await;

        assert_matches!(result, Err(PingpongError::InvalidArgument(_)));
        assert_eq!(service.provider.opens(), 0);
    }

    #[tokio::test]
    async fn oversized_token_is_rejected_before_opening() {
        let service = Pingpong::new(
            MemoryStreamProvider::echo(),
            PingpongConfig::default().with_max_message_size(8),
        );

        let result = service
            .ping(&PingContext::background(), PeerId::random(), &["hey", "far too long"])
            .await;

        assert_matches!(result, Err(PingpongError::InvalidArgument(_)));
        assert_eq!(service.provider.opens(), 0);
    }

    #[tokio::test]
    async fn mismatched_echo_stops_the_exchange() {
        let service = pingpong(MemoryStreamProvider::with_peer(mismatching_peer));

        let result = service
            .ping(&PingContext::background(), PeerId::random(), &CONVERSATION)
            .await;

        assert_matches!(
            result,
            Err(PingpongError::Protocol(ProtocolViolation::EchoMismatch { index: 0, ref sent, .. }))
                if sent == "hey"
        );
        let counters = service.provider.last_stream().unwrap();
        assert_eq!(counters.writes(), 1);
        assert_eq!(counters.closes(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_expiry_times_out_and_resets_stream() {
        let service = pingpong(MemoryStreamProvider::silent());
        let cx = PingContext::with_timeout(Duration::from_secs(1));

        let result = service.ping(&cx, PeerId::random(), &CONVERSATION).await;

        assert_matches!(result, Err(PingpongError::Timeout));
        let counters = service.provider.last_stream().unwrap();
        assert_eq!(counters.writes(), 1);
        assert_eq!(counters.closes(), 0);
        assert_eq!(counters.resets(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_is_not_extended_by_a_hanging_close() {
        let service = pingpong(MemoryStreamProvider::silent().hang_on_close());
        let cx = PingContext::with_timeout(Duration::from_secs(1));
        let started = tokio::time::Instant::now();

        let result = service.ping(&cx, PeerId::random(), &CONVERSATION).await;

        assert_matches!(result, Err(PingpongError::Timeout));
        assert!(started.elapsed() <= Duration::from_secs(1));
        assert_eq!(service.provider.last_stream().unwrap().resets(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn hanging_close_after_success_ends_at_deadline() {
        let service = pingpong(MemoryStreamProvider::echo().hang_on_close());
        let cx = PingContext::with_timeout(Duration::from_secs(1));
        let started = tokio::time::Instant::now();

        let result = service.ping(&cx, PeerId::random(), &["hey"]).await;

        assert_matches!(result, Ok(_));
        assert!(started.elapsed() <= Duration::from_secs(1));
        let counters = service.provider.last_stream().unwrap();
        assert_eq!(counters.closes(), 0);
        assert_eq!(counters.resets(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn silent_peer_hits_message_timeout() {
        let service = Pingpong::new(
            MemoryStreamProvider::silent(),
            PingpongConfig::default().with_message_timeout(Duration::from_millis(100)),
        );

        let result = service
            .ping(&PingContext::background(), PeerId::random(), &["hey"])
            .await;

        assert_matches!(result, Err(PingpongError::Timeout));
        let counters = service.provider.last_stream().unwrap();
        assert_eq!(counters.closes(), 1);
        assert_eq!(counters.resets(), 0);
    }

    #[tokio::test]
    async fn cancellation_aborts_and_resets_stream() {
        let service = pingpong(MemoryStreamProvider::silent());
        let (cx, handle) = PingContext::background().cancellable();

        let ping = service.ping(&cx, PeerId::random(), &CONVERSATION);
        let cancel = async {
            tokio::task::yield_now().await;
            handle.cancel();
        };
        let (result, ()) = tokio::join!(ping, cancel);

        assert_matches!(result, Err(PingpongError::Canceled));
        let counters = service.provider.last_stream().unwrap();
        assert_eq!(counters.closes(), 0);
        assert_eq!(counters.resets(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_expiring_while_opening_times_out() {
        let service = pingpong(MemoryStreamProvider::echo().stall_open());
        let cx = PingContext::with_timeout(Duration::from_secs(1));

        let result = service.ping(&cx, PeerId::random(), &["hey"]).await;

        assert_matches!(result, Err(PingpongError::Timeout));
        assert!(service.provider.last_stream().is_none());
    }

    #[tokio::test]
    async fn cancel_while_opening_is_canceled() {
        let service = pingpong(MemoryStreamProvider::echo().stall_open());
        let (cx, handle) = PingContext::background().cancellable();

        let ping = service.ping(&cx, PeerId::random(), &["hey"]);
        let cancel = async {
            tokio::task::yield_now().await;
            handle.cancel();
        };
        let (result, ()) = tokio::join!(ping, cancel);

        assert_matches!(result, Err(PingpongError::Canceled));
        assert!(service.provider.last_stream().is_none());
    }

    #[tokio::test]
    async fn unreachable_peer_exchanges_nothing() {
        let peer = PeerId::random();
        let service = pingpong(MemoryStreamProvider::echo().unreachable(peer));

        let result = service
            .ping(&PingContext::background(), peer, &["a"])
            .await;

        assert_matches!(result, Err(PingpongError::PeerUnreachable { peer: p, .. }) if p == peer);
        assert!(service.provider.last_stream().is_none());
    }

    #[tokio::test]
    async fn repeated_pings_are_independent() {
        let service = pingpong(MemoryStreamProvider::echo());
        let peer = PeerId::random();
        let cx = PingContext::background();

        service.ping(&cx, peer, &CONVERSATION).await.unwrap();
        service.ping(&cx, peer, &CONVERSATION).await.unwrap();

        assert_eq!(service.provider.opens(), 2);
        assert_eq!(service.provider.last_stream().unwrap().closes(), 1);
    }

    #[tokio::test]
    async fn peer_closing_early_is_an_io_error() {
        let service = pingpong(MemoryStreamProvider::with_peer(|stream| {
            Box::pin(async move { drop(stream) })
        }));

        let result = service
            .ping(&PingContext::background(), PeerId::random(), &["hey"])
            .await;

        assert_matches!(result, Err(PingpongError::Io(_)));
    }

    #[test]
    fn records_one_outcome_per_call() {
        let recorder = DebuggingRecorder::new();
        let snapshotter = recorder.snapshotter();

        metrics::with_local_recorder(&recorder, || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            runtime.block_on(async {
                let service = pingpong(MemoryStreamProvider::echo());
                let cx = PingContext::background();
                let peer = PeerId::random();

                service.ping(&cx, peer, &CONVERSATION).await.unwrap();
                let empty: [&str; 0] = [];
                let _ = service.ping(&cx, peer, &empty).await;
            });
        });

        let mut outcomes = Vec::new();
        let mut rtt_samples = 0;
        for (key, _, _, value) in snapshotter.snapshot().into_vec() {
            let key = key.key();
            match (key.name(), value) {
                ("pingpong.ping.requests_total", DebugValue::Counter(count)) => {
                    let outcome = key
                        .labels()
                        .find(|label| label.key() == "outcome")
                        .map(|label| label.value().to_string())
                        .unwrap();
                    outcomes.push((outcome, count));
                }
                ("pingpong.ping.rtt_seconds", DebugValue::Histogram(samples)) => {
                    rtt_samples = samples.len();
                }
                _ => {}
            }
        }
        outcomes.sort();

        assert_eq!(
            outcomes,
            vec![("invalid_argument".to_string(), 1), ("success".to_string(), 1)]
        );
        assert_eq!(rtt_samples, 1);
    }
}
