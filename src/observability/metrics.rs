//! Metrics collection and exposition.
//!
//! # Metrics
//! - `page_router_route_lookups_total` (counter): route cache lookups by `outcome` (hit/miss)
//! - `page_router_dispatch_total` (counter): requests by `outcome` (dispatched/forwarded)
//! - `page_router_page_errors_total` (counter): pages answered with a 500
//! - `page_router_cache_entries` (gauge): entries per `cache` after a sweep

use std::net::SocketAddr;

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus exporter on `addr`. Requires a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_route_lookup(outcome: &'static str) {
    counter!("page_router_route_lookups_total", "outcome" => outcome).increment(1);
}

pub fn record_dispatch(outcome: &'static str) {
    counter!("page_router_dispatch_total", "outcome" => outcome).increment(1);
}

pub fn record_page_error() {
    counter!("page_router_page_errors_total").increment(1);
}

pub fn record_cache_size(cache: &'static str, entries: usize) {
    gauge!("page_router_cache_entries", "cache" => cache).set(entries as f64);
}
