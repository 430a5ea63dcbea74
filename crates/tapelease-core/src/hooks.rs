//! Bridge for runtimes that need a thread count and a stable thread number.
//!
//! Some numerical runtimes keep per-thread allocator state and ask the host
//! for two callbacks before the first parallel use: "are we in parallel
//! mode" and "which thread is this, as a small integer". A pool can answer
//! both: its size bounds the number of concurrent users and the slot index
//! granted on a thread is a stable identifier for as long as the lease lives.
//! Registering these callbacks must happen before the first lease is used in
//! parallel; nothing in the pool itself depends on it.

use crate::pool::ResourcePool;

/// Callbacks an external runtime can query for thread setup.
pub trait ThreadIndexProvider: Send + Sync {
    /// Upper bound on the number of threads using the runtime at once.
    fn thread_count(&self) -> usize;

    /// Small integer identifying the calling thread, in `0..thread_count()`.
    fn thread_num(&self) -> usize;

    /// Whether parallel workers are currently active.
    fn in_parallel(&self) -> bool;
}

impl<R: Send> ThreadIndexProvider for ResourcePool<R> {
    fn thread_count(&self) -> usize {
        self.size()
    }

    /// Threads that never held a lease report 0, the master-thread convention.
    fn thread_num(&self) -> usize {
        self.thread_index_hint().index().unwrap_or(0)
    }

    fn in_parallel(&self) -> bool {
        self.is_parallel_active()
    }
}

/// Marks a pool parallel-active for as long as the section is alive.
///
/// Sections are counted, so overlapping sections may end in any order; the
/// flag drops once the last one is gone.
///
/// ```
/// use tapelease_core::{ParallelSection, ResourcePool};
///
/// let pool = ResourcePool::from_clone(&0u8, 2).unwrap();
/// {
///     let _section = ParallelSection::enter(&pool);
///     assert!(pool.is_parallel_active());
/// }
/// assert!(!pool.is_parallel_active());
/// ```
#[must_use = "the section ends as soon as it is dropped"]
pub struct ParallelSection<'p, R: Send> {
    pool: &'p ResourcePool<R>,
}

impl<'p, R: Send> ParallelSection<'p, R> {
    /// Raise the pool's parallel flag until the returned guard is dropped.
    pub fn enter(pool: &'p ResourcePool<R>) -> Self {
        pool.enter_parallel();
        Self { pool }
    }
}

impl<R: Send> Drop for ParallelSection<'_, R> {
    fn drop(&mut self) {
        self.pool.leave_parallel();
    }
}
