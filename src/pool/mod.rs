//! Bounded resource pool subsystem.
//!
//! # Data Flow
//! ```text
//! reserve()
//!     → free list non-empty? pop most-recently-released slot
//!     → else below max_size? reserve a pending slot
//!         → PoolBehavior::allocate (outside the lock)
//!         → reconcile: on-loan or Unavailable
//!     → else AtCapacity
//! release(lease)
//!     → issued here? on-loan set → head of free list
//!     → else logged and ignored
//! trim(n) / drain()
//!     → unlink slots under the lock
//!     → PoolBehavior::destroy each (outside the lock)
//! ```
//!
//! # Design Decisions
//! - Bookkeeping lives behind one mutex; slow callbacks never run under it
//! - Free list is MRU at the front, LRU at the back; trim evicts from the back
//! - Drain is terminal and force-closes connections that are still on loan
//! - Allocator failure is a missing value, surfaced as `PoolError::Unavailable`

pub mod resource_pool;
pub mod settings;
pub mod types;

pub use resource_pool::{PoolGuard, ResourcePool};
pub use settings::PoolSettings;
pub use types::{Lease, PoolBounds, PoolError, PoolResult, PoolStats};

/// Creation and destruction callbacks a pool delegates to its owner.
pub trait PoolBehavior<T>: Send + Sync {
    /// Build a new resource for this pool.
    ///
    /// Returns `None` when the resource cannot be produced right now; the
    /// reservation that triggered the call fails with `PoolError::Unavailable`.
    fn allocate(&self, settings: &PoolSettings) -> Option<T>;

    /// Release the resource's underlying connection. Must not fail.
    fn destroy(&self, resource: &T, settings: &PoolSettings);
}
