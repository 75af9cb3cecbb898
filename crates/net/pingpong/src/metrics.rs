//! Pingpong metrics

use std::time::Duration;

use metrics::{Counter, Histogram};

/// Register descriptions for every pingpong metric with the installed recorder.
pub fn describe_metrics() {
    metrics::describe_counter!(
        "pingpong.ping.requests_total",
        "Completed ping calls, labelled by outcome"
    );
    metrics::describe_histogram!(
        "pingpong.ping.rtt_seconds",
        metrics::Unit::Seconds,
        "Round-trip time of successful ping calls"
    );
    metrics::describe_counter!(
        "pingpong.responder.streams_total",
        "Inbound pingpong streams handled"
    );
    metrics::describe_counter!(
        "pingpong.responder.tokens_echoed_total",
        "Tokens echoed back to initiators"
    );
    metrics::describe_counter!(
        "pingpong.responder.errors_total",
        "Inbound pingpong streams that ended in an error"
    );
}

/// Outcome label recorded for a successful exchange.
pub(crate) const OUTCOME_SUCCESS: &str = "success";

/// Metrics recorded by the initiator and the responder.
#[derive(Clone, Debug)]
pub struct PingpongMetrics {
    /// Round-trip time of successful exchanges
    pub(crate) rtt_seconds: Histogram,
    /// Number of inbound streams handled
    pub(crate) responder_streams_total: Counter,
    /// Number of tokens echoed back
    pub(crate) responder_tokens_echoed_total: Counter,
    /// Number of inbound streams that ended in an error
    pub(crate) responder_errors_total: Counter,
}

impl Default for PingpongMetrics {
    fn default() -> Self {
        Self {
            rtt_seconds: metrics::histogram!("pingpong.ping.rtt_seconds"),
            responder_streams_total: metrics::counter!("pingpong.responder.streams_total"),
            responder_tokens_echoed_total: metrics::counter!(
                "pingpong.responder.tokens_echoed_total"
            ),
            responder_errors_total: metrics::counter!("pingpong.responder.errors_total"),
        }
    }
}

impl PingpongMetrics {
    /// Records the outcome of one `ping` call, and its RTT when it succeeded.
    pub(crate) fn record_ping(&self, outcome: &'static str, rtt: Option<Duration>) {
        metrics::counter!("pingpong.ping.requests_total", "outcome" => outcome).increment(1);
        if let Some(rtt) = rtt {
            self.rtt_seconds.record(rtt.as_secs_f64());
        }
    }

    pub(crate) fn inc_responder_streams(&self) {
        self.responder_streams_total.increment(1);
    }

    pub(crate) fn inc_tokens_echoed(&self) {
        self.responder_tokens_echoed_total.increment(1);
    }

    pub(crate) fn inc_responder_errors(&self) {
        self.responder_errors_total.increment(1);
    }
}
