//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Tenant cache initialization:
//!     → retries.rs (attempt catalog init, classify failure)
//!     → Connection failure: backoff.rs (delay × attempts so far), sleep, retry
//!     → Protocol failure: abort, no further attempts
//! ```
//!
//! # Design Decisions
//! - Only transient (connection) failures are retried
//! - The attempt limit is the only way out of the loop; there is no cancellation
//! - Sleeping goes through `Sleeper` so tests observe delays without waiting

pub mod backoff;
pub mod retries;
