//! Metrics collection and exposition.
//!
//! # Metrics
//! - `app_requests_total` (counter): requests by method, status, route
//! - `app_request_duration_seconds` (histogram): latency distribution
//!
//! # Design Decisions
//! - Prometheus exporter on its own listener, gated by config
//! - Recording is a no-op until an exporter is installed, so tests and
//!   metric-less deployments pay nothing

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter on `addr`. Failures are logged, not
/// fatal; the server runs without metrics.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "metrics exporter started"),
        Err(error) => tracing::error!(error = %error, "failed to start metrics exporter"),
    }
}

/// Record one finished request.
pub fn record_request(method: &str, status: u16, route: &str, start: Instant) {
    let elapsed = start.elapsed().as_secs_f64();
    metrics::counter!(
        "app_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "route" => route.to_string()
    )
    .increment(1);
    metrics::histogram!(
        "app_request_duration_seconds",
        "method" => method.to_string(),
        "route" => route.to_string()
    )
    .record(elapsed);
}
