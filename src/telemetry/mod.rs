//! Telemetry module
//!
//! Logging and Prometheus metrics

mod logging;
mod metrics;

pub use logging::init_logging;
pub use self::metrics::{
    incr_counter, record_latency, set_gauge, CounterMetric, GaugeMetric, LatencyMetric,
};

use crate::config::TelemetryConfig;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::{Ipv4Addr, SocketAddr};

/// Guard that keeps telemetry alive for the life of the process
pub struct TelemetryGuard {
    _priv: (),
}

/// Initialize logging and, when a port is configured, the metrics exporter
///
/// Must be called from inside a Tokio runtime.
pub fn init_telemetry(config: &TelemetryConfig) -> anyhow::Result<TelemetryGuard> {
    init_logging(&config.log_level, config.log_format)?;

    if config.metrics_port != 0 {
        let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, config.metrics_port));
        PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()
            .map_err(|e| anyhow::anyhow!("Failed to start metrics exporter: {}", e))?;
        tracing::info!(%addr, "Prometheus exporter listening");
    }

    Ok(TelemetryGuard { _priv: () })
}
