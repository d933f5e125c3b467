//! Pool bounds, leases and error definitions.

use std::ops::Deref;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use crate::error::ErrorKind;

/// Errors surfaced by pool bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolError {
    /// Invalid bounds supplied at construction.
    #[error("Invalid pool bounds: {0}")]
    Specification(String),

    /// The pool was drained and accepts no further work.
    #[error("Pool '{0}' has been drained")]
    Drained(String),

    /// Every slot is on loan or being created.
    #[error("Pool '{pool}' is at capacity ({max_size} connections)")]
    AtCapacity { pool: String, max_size: usize },

    /// The allocator could not produce a connection for this reservation.
    #[error("Pool '{0}' could not allocate a connection")]
    Unavailable(String),
}

impl PoolError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PoolError::Specification(_) => ErrorKind::Specification,
            PoolError::Drained(_) => ErrorKind::Drained,
            PoolError::AtCapacity { .. } => ErrorKind::AtCapacity,
            PoolError::Unavailable(_) => ErrorKind::Unavailable,
        }
    }
}

/// Result type for pool operations.
pub type PoolResult<T> = Result<T, PoolError>;

/// Validated minimum/maximum pool size. `max_size == 0` means unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PoolBounds {
    pub min_size: usize,
    pub max_size: usize,
}

impl PoolBounds {
    /// Validate raw (possibly negative) bounds as read from configuration.
    pub fn new(min_size: i64, max_size: i64) -> PoolResult<Self> {
        if min_size < 0 {
            return Err(PoolError::Specification(format!(
                "min_size must not be negative (got {})",
                min_size
            )));
        }
        if max_size < 0 {
            return Err(PoolError::Specification(format!(
                "max_size must not be negative (got {})",
                max_size
            )));
        }
        if max_size > 0 && min_size > max_size {
            return Err(PoolError::Specification(format!(
                "min_size {} exceeds max_size {}",
                min_size, max_size
            )));
        }
        Ok(Self {
            min_size: min_size as usize,
            max_size: max_size as usize,
        })
    }

    /// Bounds with no upper limit.
    pub fn unbounded() -> Self {
        Self {
            min_size: 0,
            max_size: 0,
        }
    }

    pub fn is_unbounded(&self) -> bool {
        self.max_size == 0
    }
}

/// Point-in-time view of a pool's bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    pub free: usize,
    pub allocated: usize,
    /// Slots reserved for allocations still in flight.
    pub pending: usize,
    pub min_size: usize,
    pub max_size: usize,
    pub drained: bool,
}

impl PoolStats {
    /// Number of live (created, not yet destroyed) resources.
    pub fn live(&self) -> usize {
        self.free + self.allocated
    }
}

/// Exclusive loan of a pooled resource.
///
/// Hand it back with `ResourcePool::release`. A lease dropped without being
/// released keeps its slot counted as allocated until the pool is drained.
#[derive(Debug)]
pub struct Lease<T> {
    pub(crate) pool_id: u64,
    pub(crate) id: u64,
    pub(crate) resource: Arc<T>,
}

impl<T> Lease<T> {
    /// Pool-unique identifier of the leased slot.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Process-unique identifier of the pool that issued this lease.
    pub fn pool_id(&self) -> u64 {
        self.pool_id
    }
}

impl<T> Deref for Lease<T> {
    type Target = T;
    fn deref(&self) -> &Self::Target {
        &self.resource
    }
}
