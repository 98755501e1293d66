//! Metrics collection and exposition.
//!
//! # Metrics
//! - `cmdrouter_requests_total` (counter): user requests by method, status
//! - `cmdrouter_request_duration_seconds` (histogram): dispatch latency
//! - `cmdrouter_routes` (gauge): current route count
//! - `cmdrouter_commands_total` (counter): command runs by outcome

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

/// Record a finished user request.
pub fn record_request(method: &str, status: u16, start: Instant) {
    counter!(
        "cmdrouter_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("cmdrouter_request_duration_seconds", "method" => method.to_string())
        .record(start.elapsed().as_secs_f64());
}

/// Record the route count after a table mutation.
pub fn record_route_count(count: usize) {
    gauge!("cmdrouter_routes").set(count as f64);
}

/// Record a command run: `ok`, `failed`.
pub fn record_command(outcome: &'static str) {
    counter!("cmdrouter_commands_total", "outcome" => outcome).increment(1);
}
