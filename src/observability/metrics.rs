//! Metrics collection and exposition.
//!
//! # Metrics
//! - `site_requests_total` (counter): requests by method, status
//! - `site_request_duration_seconds` (histogram): latency distribution
//! - `site_rate_limited_total` (counter): requests denied by the gate
//! - `site_rate_limit_registry_size` (gauge): tracked client IPs
//! - `site_upstream_requests_total` (counter): backend calls by endpoint, outcome
//! - `site_upstream_duration_seconds` (histogram): backend call latency by endpoint
//!
//! Without an installed recorder every call here is a no-op.

use std::net::SocketAddr;
use std::time::Instant;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    let status = status.to_string();
    counter!("site_requests_total", "method" => method.to_string(), "status" => status.clone())
        .increment(1);
    histogram!("site_request_duration_seconds", "method" => method.to_string(), "status" => status)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_rate_limited() {
    counter!("site_rate_limited_total").increment(1);
}

pub fn record_registry_size(size: usize) {
    gauge!("site_rate_limit_registry_size").set(size as f64);
}

pub fn record_upstream(endpoint: &'static str, outcome: &'static str, start: Instant) {
    counter!("site_upstream_requests_total", "endpoint" => endpoint, "outcome" => outcome)
        .increment(1);
    histogram!("site_upstream_duration_seconds", "endpoint" => endpoint)
        .record(start.elapsed().as_secs_f64());
}
