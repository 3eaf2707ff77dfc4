//! Metrics collection and exposition.
//!
//! # Metrics
//! - `smart_router_decisions_total` (counter): decisions by rule and target
//! - `smart_router_requests_total` (counter): forwarded requests by target, status
//! - `smart_router_request_duration_seconds` (histogram): end-to-end latency
//! - `smart_router_config_reloads_total` (counter): reloads by outcome
//!
//! Recording is a no-op until [`init_metrics`] installs the exporter.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter with an HTTP listener on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint started"),
        Err(e) => {
            tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter")
        }
    }
}

/// Count one routing decision. The default path is labelled `rule="default"`.
pub fn record_decision(rule: &str, target: &str) {
    let rule = if rule.is_empty() { "default" } else { rule };
    counter!(
        "smart_router_decisions_total",
        "rule" => rule.to_string(),
        "target" => target.to_string()
    )
    .increment(1);
}

/// Count a proxied request and record its latency.
pub fn record_request(target: &str, status: u16, start: Instant) {
    counter!(
        "smart_router_requests_total",
        "target" => target.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!(
        "smart_router_request_duration_seconds",
        "target" => target.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}

pub fn record_config_reload(outcome: &'static str) {
    counter!("smart_router_config_reloads_total", "outcome" => outcome).increment(1);
}
