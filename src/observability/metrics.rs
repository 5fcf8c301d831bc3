//! Metrics collection and exposition.
//!
//! # Metrics
//! - `devproxy_requests_total` (counter): requests by method, status, rule
//! - `devproxy_request_duration_seconds` (histogram): latency by rule
//! - `devproxy_upstream_errors_total` (counter): transport failures by rule, kind
//!
//! The `rule` label is the matching rule's prefix, or `static`/`none` for
//! requests no rule claimed.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Rule label for requests served from the static directory.
pub const RULE_STATIC: &str = "static";
/// Rule label for requests that matched nothing.
pub const RULE_NONE: &str = "none";

/// Start the Prometheus scrape endpoint. Must run inside a tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16, rule: &str, start: Instant) {
    metrics::counter!(
        "devproxy_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "rule" => rule.to_string()
    )
    .increment(1);

    metrics::histogram!(
        "devproxy_request_duration_seconds",
        "rule" => rule.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}

pub fn record_upstream_error(rule: &str, kind: &'static str) {
    metrics::counter!(
        "devproxy_upstream_errors_total",
        "rule" => rule.to_string(),
        "kind" => kind
    )
    .increment(1);
}
