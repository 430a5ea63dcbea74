//! Fixed-size pool of resource instances handed out one holder at a time.
//!
//! The pool owns N slots and a bounded queue of the indices that are not
//! currently leased. `acquire` blocks on that queue; `release` pushes back
//! into it. Both are safe to call from any number of threads without
//! external locking.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};
use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use crate::error::{ConstructionError, PoolError, ReleaseFault};
use crate::lease::ScopedLease;
use crate::resource::Resource;
use crate::slot::{ResourceSlot, SlotRef};
use crate::stats::{AtomicPoolStats, PoolStats};
use crate::thread_index::{ThreadIndexHint, ThreadIndexTable};

static NEXT_POOL_ID: AtomicU64 = AtomicU64::new(1);

/// Point-in-time view of slot occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStatus {
    /// Number of slots owned by the pool.
    pub size: usize,
    /// Slots waiting in the availability queue.
    pub available: usize,
    /// Slots held by a live grant.
    pub leased: usize,
}

/// Owns every instance and lends them out through scoped leases.
pub struct ResourcePool<R> {
    id: u64,
    slots: Box<[ResourceSlot<R>]>,
    available_tx: Sender<usize>,
    available_rx: Receiver<usize>,
    // Dropping the sender disconnects `shutdown_rx` and wakes every waiter.
    shutdown_tx: Mutex<Option<Sender<()>>>,
    shutdown_rx: Receiver<()>,
    closed: AtomicBool,
    parallel_sections: AtomicUsize,
    thread_index: ThreadIndexTable,
    stats: AtomicPoolStats,
}

impl<R: Resource> ResourcePool<R> {
    /// Build a pool holding `num_instances` deep copies of `template`.
    pub fn new(template: &R, num_instances: usize) -> Result<Self, ConstructionError> {
        if num_instances == 0 {
            return Err(ConstructionError::EmptyPool);
        }
        let instances = (0..num_instances)
            .map(|index| {
                template
                    .try_clone()
                    .map_err(|err| ConstructionError::CloneFailed {
                        index,
                        source: Box::new(err),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::from_instances(instances))
    }
}

impl<R: Clone + Send> ResourcePool<R> {
    /// Build a pool from an infallibly cloneable template.
    pub fn from_clone(template: &R, num_instances: usize) -> Result<Self, ConstructionError> {
        if num_instances == 0 {
            return Err(ConstructionError::EmptyPool);
        }
        Ok(Self::from_instances(vec![template.clone(); num_instances]))
    }
}

impl<R: Send> ResourcePool<R> {
    fn from_instances(instances: Vec<R>) -> Self {
        let size = instances.len();
        let slots: Box<[ResourceSlot<R>]> = instances
            .into_iter()
            .enumerate()
            .map(|(index, instance)| ResourceSlot::new(index, instance))
            .collect();

        let (available_tx, available_rx) = crossbeam_channel::bounded(size);
        for index in 0..size {
            // Capacity is exactly `size`, so these never fail.
            let _ = available_tx.try_send(index);
        }
        let (shutdown_tx, shutdown_rx) = crossbeam_channel::bounded(0);

        let id = NEXT_POOL_ID.fetch_add(1, Ordering::Relaxed);
        debug!(pool = id, size, "resource pool constructed");

        Self {
            id,
            slots,
            available_tx,
            available_rx,
            shutdown_tx: Mutex::new(Some(shutdown_tx)),
            shutdown_rx,
            closed: AtomicBool::new(false),
            parallel_sections: AtomicUsize::new(0),
            thread_index: ThreadIndexTable::new(),
            stats: AtomicPoolStats::new(),
        }
    }

    /// Block until a slot is free, then take it.
    ///
    /// The grant is recorded as the calling thread's index hint. Fails with
    /// [`PoolError::Closed`] if the pool is closed before or while waiting.
    pub fn acquire(&self) -> Result<SlotRef, PoolError> {
        let index = self.take_index(None)?;
        Ok(self.grant(index))
    }

    /// Like [`acquire`](Self::acquire), but give up after `timeout`.
    ///
    /// A zero timeout only succeeds if a slot is free right now.
    pub fn acquire_timeout(&self, timeout: Duration) -> Result<SlotRef, PoolError> {
        let index = self.take_index(Some(timeout))?;
        Ok(self.grant(index))
    }

    fn take_index(&self, timeout: Option<Duration>) -> Result<usize, PoolError> {
        if self.is_closed() {
            return Err(PoolError::Closed);
        }
        if let Ok(index) = self.available_rx.try_recv() {
            return Ok(index);
        }

        self.stats.record_wait();
        trace!(pool = self.id, "waiting for a free slot");
        let received = match timeout {
            None => crossbeam_channel::select! {
                recv(self.available_rx) -> msg => msg.map_err(|_| PoolError::Closed),
                recv(self.shutdown_rx) -> _ => Err(PoolError::Closed),
            },
            Some(timeout) => crossbeam_channel::select! {
                recv(self.available_rx) -> msg => msg.map_err(|_| PoolError::Closed),
                recv(self.shutdown_rx) -> _ => Err(PoolError::Closed),
                default(timeout) => {
                    self.stats.record_timeout();
                    Err(PoolError::Timeout(timeout))
                }
            },
        };
        if received.is_err() {
            trace!(pool = self.id, "gave up waiting for a slot");
        }
        received
    }

    fn grant(&self, index: usize) -> SlotRef {
        let epoch = self.slots[index].mark_leased();
        self.thread_index.record(index);
        self.stats.record_grant();
        trace!(pool = self.id, slot = index, "slot granted");
        SlotRef {
            pool_id: self.id,
            index,
            epoch,
        }
    }

    /// Return a granted slot to the availability queue.
    ///
    /// Rejects references from other pools and grants that were already
    /// released; a rejected call leaves the queue untouched.
    pub fn release(&self, slot: SlotRef) -> Result<(), PoolError> {
        if let Err(reason) = self.check_release(slot) {
            self.stats.record_invalid_release();
            warn!(pool = self.id, slot = slot.index, %reason, "rejected release");
            return Err(PoolError::InvalidRelease {
                index: slot.index,
                reason,
            });
        }
        // The slot just left the leased state, so its index is not queued and
        // at most `size - 1` others are: the bounded queue has room.
        let _ = self.available_tx.try_send(slot.index);
        self.stats.record_release();
        trace!(pool = self.id, slot = slot.index, "slot released");
        Ok(())
    }

    fn check_release(&self, slot: SlotRef) -> Result<(), ReleaseFault> {
        if slot.pool_id != self.id {
            return Err(ReleaseFault::ForeignPool);
        }
        let target = self.slots.get(slot.index).ok_or(ReleaseFault::UnknownSlot)?;
        if !target.mark_available(slot.epoch) {
            return Err(ReleaseFault::NotLeased);
        }
        Ok(())
    }

    /// Run `f` with exclusive access to one instance, releasing it afterwards.
    ///
    /// The slot is returned whether `f` returns normally or unwinds.
    pub fn with_lease<T>(&self, f: impl FnOnce(&mut R) -> T) -> Result<T, PoolError> {
        let mut lease = ScopedLease::acquire(self)?;
        Ok(f(lease.access()))
    }

    /// The slot index most recently granted on the calling thread.
    #[must_use]
    pub fn thread_index_hint(&self) -> ThreadIndexHint {
        self.thread_index.current()
    }

    /// Number of threads holding a slot binding.
    ///
    /// Bindings of exited threads are recycled by new threads, so this tracks
    /// the peak number of live leasing threads rather than every thread ever seen.
    #[must_use]
    pub fn bound_threads(&self) -> usize {
        self.thread_index.len()
    }

    /// Close the pool. Blocked and future acquires fail with [`PoolError::Closed`].
    ///
    /// Outstanding leases remain valid and release normally.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.shutdown_tx.lock().take();
        debug!(pool = self.id, "resource pool closed");
    }

    /// Whether [`close`](Self::close) has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Whether any [`ParallelSection`](crate::ParallelSection) on this pool is alive.
    #[must_use]
    pub fn is_parallel_active(&self) -> bool {
        self.parallel_sections.load(Ordering::Acquire) > 0
    }

    pub(crate) fn enter_parallel(&self) {
        self.parallel_sections.fetch_add(1, Ordering::AcqRel);
    }

    pub(crate) fn leave_parallel(&self) {
        self.parallel_sections.fetch_sub(1, Ordering::AcqRel);
    }

    /// Number of instances the pool owns.
    #[must_use]
    pub fn size(&self) -> usize {
        self.slots.len()
    }

    /// The pool's slots in index order.
    pub fn slots(&self) -> impl Iterator<Item = &ResourceSlot<R>> {
        self.slots.iter()
    }

    /// Current slot occupancy.
    ///
    /// Under concurrent traffic the two counts are read separately and may
    /// briefly disagree; they sum to `size` whenever no call is in flight.
    #[must_use]
    pub fn status(&self) -> PoolStatus {
        PoolStatus {
            size: self.size(),
            available: self.available_rx.len(),
            leased: self.slots().filter(|slot| slot.is_leased()).count(),
        }
    }

    /// Snapshot of traffic counters.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        self.stats.snapshot()
    }

    /// Reset traffic counters.
    pub fn reset_stats(&self) {
        self.stats.reset();
    }

    /// Consume the pool and return its instances in slot order.
    pub fn into_instances(self) -> Vec<R> {
        self.slots
            .into_vec()
            .into_iter()
            .map(ResourceSlot::into_instance)
            .collect()
    }

    pub(crate) fn slot(&self, slot: SlotRef) -> &ResourceSlot<R> {
        &self.slots[slot.index]
    }
}

impl<R> std::fmt::Debug for ResourcePool<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourcePool")
            .field("id", &self.id)
            .field("size", &self.slots.len())
            .field("available", &self.available_rx.len())
            .field("closed", &self.closed.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}
