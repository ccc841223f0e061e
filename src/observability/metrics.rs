//! Metrics collection and exposition.
//!
//! # Metrics
//! - `fault_updates_total` (counter): fault records written
//! - `fault_removals_total` (counter): records dropped for retired destinations
//! - `fault_fallback_picks_total` (counter): fallback picks by outcome (`picked`, `empty`)
//! - `fault_tracked_destinations` (gauge): records currently held
//!
//! Without an installed recorder every call here is a no-op.

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter on `addr`. Must run inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_fault_update() {
    metrics::counter!("fault_updates_total").increment(1);
}

pub fn record_removal() {
    metrics::counter!("fault_removals_total").increment(1);
}

pub fn record_fallback_pick(outcome: &'static str) {
    metrics::counter!("fault_fallback_picks_total", "outcome" => outcome).increment(1);
}

pub fn record_tracked(count: usize) {
    metrics::gauge!("fault_tracked_destinations").set(count as f64);
}
