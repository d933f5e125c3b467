//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! pool / catalog / tenant produce:
//!     → logging.rs (structured log events via `tracing`)
//!     → metrics.rs (pool gauges, reservation and auth counters)
//!
//! Consumers:
//!     → stdout (fmt subscriber, filtered by RUST_LOG or config)
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Every pool is labelled `provider/tenant/region` in logs and metrics
//! - Credentials never appear in log fields
//! - Metric updates are no-ops until a recorder is installed

pub mod logging;
pub mod metrics;
