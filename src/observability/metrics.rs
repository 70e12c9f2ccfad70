//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define proxy metrics (requests, latency, rewrites, failures)
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `proxy_requests_total` (counter): total requests by method, status
//! - `proxy_request_duration_seconds` (histogram): latency distribution
//! - `proxy_body_rewrites_total` (counter): rewritten bodies by content type
//! - `proxy_rewrite_failures_total` (counter): failed rewrites by kind
//!
//! # Design Decisions
//! - Recording is a no-op until `init_metrics` installs the exporter
//! - Content type label is reduced to its media type (no parameters)

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus exporter listening on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a completed proxied request.
pub fn record_request(method: &str, status: u16, start: Instant) {
    let labels = [
        ("method", method.to_string()),
        ("status", status.to_string()),
    ];
    ::metrics::counter!("proxy_requests_total", &labels).increment(1);
    ::metrics::histogram!("proxy_request_duration_seconds", &labels)
        .record(start.elapsed().as_secs_f64());
}

/// Record a rewritten response body.
pub fn record_body_rewrite(content_type: &str) {
    ::metrics::counter!(
        "proxy_body_rewrites_total",
        "content_type" => media_type(content_type).to_string()
    )
    .increment(1);
}

/// Record a response that could not be rewritten.
pub fn record_rewrite_failure(kind: &'static str) {
    ::metrics::counter!("proxy_rewrite_failures_total", "kind" => kind).increment(1);
}

fn media_type(content_type: &str) -> &str {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
}
