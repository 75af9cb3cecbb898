//! Prometheus metrics exporter.

use std::net::SocketAddr;

use eyre::{Result, WrapErr};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::info;

use crate::config::MetricsConfig;

/// Install the Prometheus recorder and serve it over HTTP when enabled.
///
/// Must be called from within a tokio runtime.
pub fn install_metrics(config: &MetricsConfig) -> Result<Option<SocketAddr>> {
    if !config.enabled {
        return Ok(None);
    }

    PrometheusBuilder::new()
        .with_http_listener(config.addr)
        .install()
        .wrap_err("failed to install prometheus exporter")?;
    sonar_net_pingpong::describe_metrics();

    info!(addr = %config.addr, "Serving metrics");
    Ok(Some(config.addr))
}
