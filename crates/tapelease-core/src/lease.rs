//! Scope-bound, exclusive access to one pooled instance.

use std::ops::{Deref, DerefMut};
use std::time::Duration;

use parking_lot::MutexGuard;
use tracing::error;

use crate::error::PoolError;
use crate::pool::ResourcePool;
use crate::slot::SlotRef;

/// Exclusive use of one resource instance until the lease goes out of scope.
///
/// Dropping the lease returns the slot to its pool. This happens on every exit
/// path, including `?` propagation and unwinding, and happens exactly once.
///
/// # Example
/// ```
/// use tapelease_core::{ResourcePool, ScopedLease};
///
/// let pool = ResourcePool::from_clone(&Vec::<u32>::new(), 2).unwrap();
/// {
///     let mut lease = ScopedLease::acquire(&pool).unwrap();
///     lease.push(7);
///     assert_eq!(pool.status().leased, 1);
/// }
/// assert_eq!(pool.status().available, 2);
/// ```
#[must_use = "the slot is released as soon as the lease is dropped"]
pub struct ScopedLease<'p, R: Send> {
    // Field order matters: the guard unlocks before the ticket releases.
    guard: MutexGuard<'p, R>,
    ticket: Ticket<'p, R>,
}

/// Returns its slot to the pool when dropped.
struct Ticket<'p, R: Send> {
    pool: &'p ResourcePool<R>,
    slot: SlotRef,
}

impl<R: Send> Drop for Ticket<'_, R> {
    fn drop(&mut self) {
        if let Err(err) = self.pool.release(self.slot) {
            error!(slot = self.slot.index(), %err, "lease failed to return its slot");
        }
    }
}

impl<'p, R: Send> ScopedLease<'p, R> {
    /// Block until `pool` grants a slot and take exclusive use of it.
    pub fn acquire(pool: &'p ResourcePool<R>) -> Result<Self, PoolError> {
        let slot = pool.acquire()?;
        Ok(Self::bind(pool, slot))
    }

    /// Like [`acquire`](Self::acquire), but give up after `timeout`.
    pub fn acquire_timeout(
        pool: &'p ResourcePool<R>,
        timeout: Duration,
    ) -> Result<Self, PoolError> {
        let slot = pool.acquire_timeout(timeout)?;
        Ok(Self::bind(pool, slot))
    }

    fn bind(pool: &'p ResourcePool<R>, slot: SlotRef) -> Self {
        // The ticket exists before the lock so the slot comes back even if locking unwinds.
        let ticket = Ticket { pool, slot };
        let guard = pool.slot(slot).lock();
        Self { guard, ticket }
    }

    /// Mutable access to the leased instance.
    pub fn access(&mut self) -> &mut R {
        &mut self.guard
    }

    /// Index of the leased slot.
    #[must_use]
    pub fn index(&self) -> usize {
        self.ticket.slot.index()
    }

    /// The grant this lease holds.
    #[must_use]
    pub fn slot(&self) -> SlotRef {
        self.ticket.slot
    }
}

impl<R: Send> Deref for ScopedLease<'_, R> {
    type Target = R;

    fn deref(&self) -> &R {
        &self.guard
    }
}

impl<R: Send> DerefMut for ScopedLease<'_, R> {
    fn deref_mut(&mut self) -> &mut R {
        &mut self.guard
    }
}

impl<R: Send> std::fmt::Debug for ScopedLease<'_, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopedLease")
            .field("slot", &self.ticket.slot)
            .finish_non_exhaustive()
    }
}
