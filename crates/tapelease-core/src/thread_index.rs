//! Per-pool record of which slot each thread was last granted.

use std::thread::{self, ThreadId};

use parking_lot::RwLock;
use thread_local::ThreadLocal;

/// The slot index most recently granted on the calling thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadIndexHint {
    /// A lease was granted on this thread; this is its slot index.
    Bound(usize),
    /// No lease has ever been granted on this thread by this pool.
    Unbound,
}

impl ThreadIndexHint {
    /// The slot index, if bound.
    #[must_use]
    pub fn index(self) -> Option<usize> {
        match self {
            Self::Bound(index) => Some(index),
            Self::Unbound => None,
        }
    }

    /// Whether a lease has been granted on this thread.
    #[must_use]
    pub fn is_bound(self) -> bool {
        matches!(self, Self::Bound(_))
    }
}

#[derive(Debug, Clone, Copy)]
struct Binding {
    thread: ThreadId,
    index: usize,
}

/// The last slot index granted on each thread.
///
/// Storage of exited threads is handed to new threads, so the table stays as
/// large as the peak number of concurrently live leasing threads. Each entry
/// carries its owner's id: a recycled entry reads as unbound.
#[derive(Default)]
pub(crate) struct ThreadIndexTable {
    entries: ThreadLocal<RwLock<Option<Binding>>>,
}

impl ThreadIndexTable {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Record `index` for the calling thread.
    pub(crate) fn record(&self, index: usize) {
        let thread = thread::current().id();
        *self.entries.get_or_default().write() = Some(Binding { thread, index });
    }

    /// Look up the calling thread.
    pub(crate) fn current(&self) -> ThreadIndexHint {
        let thread = thread::current().id();
        self.entries
            .get()
            .and_then(|entry| *entry.read())
            .filter(|binding| binding.thread == thread)
            .map_or(ThreadIndexHint::Unbound, |binding| {
                ThreadIndexHint::Bound(binding.index)
            })
    }

    /// Number of bound entries, including those left by exited threads not yet recycled.
    pub(crate) fn len(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.read().is_some())
            .count()
    }
}
