//! Metrics collection and exposition.
//!
//! # Metrics
//! - `pool_free_connections` (gauge): idle connections per pool
//! - `pool_allocated_connections` (gauge): connections on loan per pool
//! - `pool_reservations_total` (counter): reservations by pool and outcome
//! - `catalog_auth_total` (counter): identity authentications by outcome
//! - `tenant_init_attempts_total` (counter): catalog init attempts by provider

use std::net::SocketAddr;

use metrics::{counter, describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::pool::PoolStats;

/// Install the Prometheus recorder and its HTTP scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => {
            describe_metrics();
            tracing::info!(address = %addr, "Metrics exporter listening");
        }
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

fn describe_metrics() {
    describe_gauge!("pool_free_connections", "Idle connections held by a pool");
    describe_gauge!("pool_allocated_connections", "Connections currently on loan");
    describe_counter!("pool_reservations_total", "Reservation attempts by outcome");
    describe_counter!("catalog_auth_total", "Identity service authentications by outcome");
    describe_counter!("tenant_init_attempts_total", "Service catalog init attempts");
}

/// Publish a pool's current counters.
pub fn record_pool_state(pool: &str, stats: &PoolStats) {
    gauge!("pool_free_connections", "pool" => pool.to_string()).set(stats.free as f64);
    gauge!("pool_allocated_connections", "pool" => pool.to_string()).set(stats.allocated as f64);
}

/// Count a reservation attempt (`reused`, `created`, `at_capacity`, ...).
pub fn record_reservation(pool: &str, outcome: &'static str) {
    counter!("pool_reservations_total", "pool" => pool.to_string(), "outcome" => outcome).increment(1);
}

/// Count an identity authentication (`success`, `connection`, `protocol`).
pub fn record_catalog_auth(version: &'static str, outcome: &'static str) {
    counter!("catalog_auth_total", "version" => version, "outcome" => outcome).increment(1);
}

/// Count one `ServiceCatalog::init` attempt made by a tenant cache.
pub fn record_init_attempt(provider: &str) {
    counter!("tenant_init_attempts_total", "provider" => provider.to_string()).increment(1);
}
