//! Prometheus metrics for monitoring board operations.
//!
//! Metrics are exposed in Prometheus text format on a dedicated scrape
//! endpoint, enabled by setting `MS_METRICS_BIND`.

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Initialize the Prometheus metrics exporter.
///
/// Metrics become available at `http://<addr>/metrics`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {e}"))
}

/// Record one board operation and the HTTP status it produced.
pub fn board_op(op: &str, status: u16) {
    metrics::counter!("board_ops_total",
        "op" => op.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record one board reset attempt.
pub fn board_reset(outcome: &str) {
    metrics::counter!("board_resets_total", "outcome" => outcome.to_string()).increment(1);
}
