//! Metrics collection and exposition.
//!
//! # Metrics
//! - `relay_invocations_total` (counter): invocations by role, status
//! - `relay_invocation_duration_seconds` (histogram): latency by role
//! - `relay_downstream_requests_total` (counter): outbound calls by outcome

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one finished invocation.
pub fn record_invocation(role: &'static str, status: u16, start: Instant) {
    metrics::counter!(
        "relay_invocations_total",
        "role" => role,
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("relay_invocation_duration_seconds", "role" => role)
        .record(start.elapsed().as_secs_f64());
}

/// Record the outcome of the outbound call.
pub fn record_downstream(outcome: &'static str) {
    metrics::counter!("relay_downstream_requests_total", "outcome" => outcome).increment(1);
}
