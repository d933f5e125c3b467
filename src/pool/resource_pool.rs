//! Thread-safe bounded pool of expensive connections.
//!
//! # Responsibilities
//! - Hand out resources for exclusive use, reusing the most recently released
//! - Create resources lazily through the owner's `PoolBehavior`
//! - Enforce `max_size` across free, on-loan and in-flight slots
//! - Shrink on demand and drain irreversibly on teardown

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::ops::Deref;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::observability::metrics;
use crate::pool::settings::PoolSettings;
use crate::pool::types::{Lease, PoolBounds, PoolError, PoolResult, PoolStats};
use crate::pool::PoolBehavior;

static NEXT_POOL_ID: AtomicU64 = AtomicU64::new(0);

/// A free resource waiting in the pool.
struct Slot<T> {
    id: u64,
    resource: Arc<T>,
}

struct PoolState<T> {
    /// Front is most recently released, back is least recently used.
    free: VecDeque<Slot<T>>,
    /// Resources currently on loan, by slot id.
    allocated: HashMap<u64, Arc<T>>,
    /// Slots reserved for allocations running outside the lock.
    pending: usize,
    next_id: u64,
    drained: bool,
}

impl<T> PoolState<T> {
    fn live(&self) -> usize {
        self.free.len() + self.allocated.len()
    }

    fn take_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

/// Bounded pool of resources created and destroyed by a [`PoolBehavior`].
pub struct ResourcePool<T> {
    /// Stamped on every lease so it can only come back here.
    id: u64,
    /// Label used in logs and metrics (e.g. `provider/tenant/region`).
    label: String,
    bounds: PoolBounds,
    settings: PoolSettings,
    behavior: Arc<dyn PoolBehavior<T>>,
    state: Mutex<PoolState<T>>,
}

impl<T> ResourcePool<T> {
    /// Create an empty pool. No resources are created up front.
    pub fn new(
        label: impl Into<String>,
        bounds: PoolBounds,
        settings: PoolSettings,
        behavior: Arc<dyn PoolBehavior<T>>,
    ) -> PoolResult<Self> {
        // Bounds built outside `PoolBounds::new` still get checked.
        if bounds.max_size > 0 && bounds.min_size > bounds.max_size {
            return Err(PoolError::Specification(format!(
                "min_size {} exceeds max_size {}",
                bounds.min_size, bounds.max_size
            )));
        }

        let label = label.into();
        tracing::debug!(
            pool = %label,
            min_size = bounds.min_size,
            max_size = bounds.max_size,
            settings = %settings,
            "Resource pool created"
        );

        Ok(Self {
            id: NEXT_POOL_ID.fetch_add(1, Ordering::Relaxed),
            label,
            bounds,
            settings,
            behavior,
            state: Mutex::new(PoolState {
                free: VecDeque::new(),
                allocated: HashMap::new(),
                pending: 0,
                next_id: 0,
                drained: false,
            }),
        })
    }

    fn lock(&self) -> MutexGuard<'_, PoolState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Reserve a resource for exclusive use.
    ///
    /// Never blocks waiting for capacity: a full pool fails with
    /// `AtCapacity` and the caller decides how to back off.
    pub fn reserve(&self) -> PoolResult<Lease<T>> {
        let id = {
            let mut state = self.lock();
            if state.drained {
                metrics::record_reservation(&self.label, "drained");
                return Err(PoolError::Drained(self.label.clone()));
            }

            if let Some(slot) = state.free.pop_front() {
                state.allocated.insert(slot.id, slot.resource.clone());
                metrics::record_reservation(&self.label, "reused");
                metrics::record_pool_state(&self.label, &self.snapshot(&state));
                return Ok(Lease {
                    pool_id: self.id,
                    id: slot.id,
                    resource: slot.resource,
                });
            }

            if !self.bounds.is_unbounded() && state.live() + state.pending >= self.bounds.max_size {
                tracing::debug!(
                    pool = %self.label,
                    allocated = state.allocated.len(),
                    pending = state.pending,
                    "Pool at capacity"
                );
                metrics::record_reservation(&self.label, "at_capacity");
                return Err(PoolError::AtCapacity {
                    pool: self.label.clone(),
                    max_size: self.bounds.max_size,
                });
            }

            state.pending += 1;
            state.take_id()
        };

        let pending = PendingSlot {
            pool: self,
            settled: false,
        };
        let created = self.behavior.allocate(&self.settings);
        let mut state = pending.settle();

        let Some(resource) = created else {
            tracing::warn!(pool = %self.label, "Allocator produced no connection");
            metrics::record_reservation(&self.label, "unavailable");
            return Err(PoolError::Unavailable(self.label.clone()));
        };
        let resource = Arc::new(resource);

        if state.drained {
            drop(state);
            tracing::debug!(pool = %self.label, "Pool drained during allocation, closing new connection");
            self.behavior.destroy(&resource, &self.settings);
            metrics::record_reservation(&self.label, "drained");
            return Err(PoolError::Drained(self.label.clone()));
        }

        state.allocated.insert(id, resource.clone());
        metrics::record_reservation(&self.label, "created");
        metrics::record_pool_state(&self.label, &self.snapshot(&state));
        tracing::trace!(pool = %self.label, slot = id, "Allocated new connection");

        Ok(Lease {
            pool_id: self.id,
            id,
            resource,
        })
    }

    /// Return a leased resource to the head of the free list.
    ///
    /// A lease issued by another pool is logged and ignored.
    pub fn release(&self, lease: Lease<T>) {
        if !self.owns(&lease) {
            tracing::warn!(
                pool = %self.label,
                slot = lease.id,
                lease_pool = lease.pool_id,
                "Released a connection issued by another pool"
            );
            return;
        }
        self.return_slot(lease.id);
    }

    /// Whether `lease` was issued by this pool.
    pub fn owns(&self, lease: &Lease<T>) -> bool {
        lease.pool_id == self.id
    }

    /// Reserve a resource that returns itself to the pool when dropped.
    pub fn checkout(&self) -> PoolResult<PoolGuard<'_, T>> {
        let lease = self.reserve()?;
        Ok(PoolGuard {
            pool: self,
            id: lease.id,
            resource: lease.resource,
        })
    }

    fn return_slot(&self, id: u64) {
        let mut state = self.lock();

        match state.allocated.remove(&id) {
            Some(resource) => {
                state.free.push_front(Slot { id, resource });
                metrics::record_pool_state(&self.label, &self.snapshot(&state));
            }
            None if state.drained => {
                // Already force-closed by drain.
                tracing::debug!(pool = %self.label, slot = id, "Lease returned after drain");
            }
            None => {
                tracing::warn!(pool = %self.label, slot = id, "Released a connection that is not on loan");
            }
        }
    }

    /// Destroy up to `count` free resources, least recently used first.
    ///
    /// Returns the number of resources destroyed.
    pub fn trim(&self, count: usize) -> usize {
        let victims: Vec<Slot<T>> = {
            let mut state = self.lock();
            let n = count.min(state.free.len());
            let victims = (0..n).filter_map(|_| state.free.pop_back()).collect();
            metrics::record_pool_state(&self.label, &self.snapshot(&state));
            victims
        };

        self.destroy_all(victims.iter().map(|slot| &slot.resource));

        if !victims.is_empty() {
            tracing::debug!(pool = %self.label, trimmed = victims.len(), "Trimmed idle connections");
        }
        victims.len()
    }

    /// Trim free resources until the live count is back at `min_size`.
    pub fn shrink_to_min(&self) -> usize {
        let excess = {
            let state = self.lock();
            state
                .live()
                .saturating_sub(self.bounds.min_size)
                .min(state.free.len())
        };
        self.trim(excess)
    }

    /// Destroy every resource, including those on loan, and refuse further
    /// reservations. Returns the number of resources destroyed.
    pub fn drain(&self) -> usize {
        let doomed: Vec<Arc<T>> = {
            let mut state = self.lock();
            if state.drained {
                return 0;
            }
            state.drained = true;
            let mut doomed: Vec<Arc<T>> = state.free.drain(..).map(|slot| slot.resource).collect();
            doomed.extend(state.allocated.drain().map(|(_, resource)| resource));
            metrics::record_pool_state(&self.label, &self.snapshot(&state));
            doomed
        };

        self.destroy_all(doomed.iter());

        tracing::info!(pool = %self.label, destroyed = doomed.len(), "Pool drained");
        doomed.len()
    }

    fn destroy_all<'a>(&self, resources: impl Iterator<Item = &'a Arc<T>>)
    where
        T: 'a,
    {
        for resource in resources {
            self.behavior.destroy(resource, &self.settings);
        }
    }

    fn snapshot(&self, state: &PoolState<T>) -> PoolStats {
        PoolStats {
            free: state.free.len(),
            allocated: state.allocated.len(),
            pending: state.pending,
            min_size: self.bounds.min_size,
            max_size: self.bounds.max_size,
            drained: state.drained,
        }
    }

    /// Consistent snapshot of the pool's counters.
    pub fn stats(&self) -> PoolStats {
        let state = self.lock();
        self.snapshot(&state)
    }

    pub fn free(&self) -> usize {
        self.lock().free.len()
    }

    pub fn allocated(&self) -> usize {
        self.lock().allocated.len()
    }

    pub fn is_drained(&self) -> bool {
        self.lock().drained
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn bounds(&self) -> PoolBounds {
        self.bounds
    }

    pub fn settings(&self) -> &PoolSettings {
        &self.settings
    }
}

/// Holds one pending slot while the allocator runs outside the lock.
///
/// Gives the slot back if the allocator unwinds.
struct PendingSlot<'a, T> {
    pool: &'a ResourcePool<T>,
    settled: bool,
}

impl<'a, T> PendingSlot<'a, T> {
    /// Lock the pool and retire the pending slot.
    fn settle(mut self) -> MutexGuard<'a, PoolState<T>> {
        self.settled = true;
        let mut state = self.pool.lock();
        state.pending -= 1;
        state
    }
}

impl<T> Drop for PendingSlot<'_, T> {
    fn drop(&mut self) {
        if !self.settled {
            self.pool.lock().pending -= 1;
        }
    }
}

/// A checked-out resource, released back to its pool on drop.
pub struct PoolGuard<'a, T> {
    pool: &'a ResourcePool<T>,
    id: u64,
    resource: Arc<T>,
}

impl<T> Deref for PoolGuard<'_, T> {
    type Target = T;
    fn deref(&self) -> &Self::Target {
        &self.resource
    }
}

impl<T> Drop for PoolGuard<'_, T> {
    fn drop(&mut self) {
        self.pool.return_slot(self.id);
    }
}

impl<T> fmt::Debug for ResourcePool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourcePool")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("stats", &self.stats())
            .finish()
    }
}
