//! Slots: the pool's bookkeeping unit pairing a stable index with one instance.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{Mutex, MutexGuard};

/// One resource instance and the index it was assigned at construction.
///
/// The instance sits behind a mutex that is never contended: the availability
/// queue hands each index to one holder at a time. The epoch is even while the
/// slot is available and odd while it is leased.
pub struct ResourceSlot<R> {
    index: usize,
    instance: Mutex<R>,
    epoch: AtomicU64,
}

impl<R> ResourceSlot<R> {
    pub(crate) fn new(index: usize, instance: R) -> Self {
        Self {
            index,
            instance: Mutex::new(instance),
            epoch: AtomicU64::new(0),
        }
    }

    /// Stable index of this slot, in `0..size`.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Whether the slot is currently leased.
    #[must_use]
    pub fn is_leased(&self) -> bool {
        self.epoch.load(Ordering::Acquire) % 2 == 1
    }

    /// Mark the slot leased and return the epoch naming this grant.
    pub(crate) fn mark_leased(&self) -> u64 {
        let epoch = self.epoch.fetch_add(1, Ordering::AcqRel) + 1;
        debug_assert!(epoch % 2 == 1, "slot {} granted twice", self.index);
        epoch
    }

    /// Mark the slot available if `epoch` still names the live grant.
    pub(crate) fn mark_available(&self, epoch: u64) -> bool {
        epoch % 2 == 1
            && self
                .epoch
                .compare_exchange(epoch, epoch + 1, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, R> {
        self.instance.lock()
    }

    pub(crate) fn into_instance(self) -> R {
        self.instance.into_inner()
    }
}

/// A reference to one grant of one slot.
///
/// Returned by [`ResourcePool::acquire`](crate::ResourcePool::acquire) and
/// accepted back by [`ResourcePool::release`](crate::ResourcePool::release).
/// It carries no access to the instance; only a
/// [`ScopedLease`](crate::ScopedLease) does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotRef {
    pub(crate) pool_id: u64,
    pub(crate) index: usize,
    pub(crate) epoch: u64,
}

impl SlotRef {
    /// Index of the granted slot.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }
}
