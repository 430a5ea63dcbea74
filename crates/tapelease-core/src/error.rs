//! Error types for pool construction and lease traffic.

use std::time::Duration;

/// Boxed error produced by a resource's deep copy.
pub type CloneFailure = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failure while building a pool. No partially built pool is ever returned.
#[derive(Debug, thiserror::Error)]
pub enum ConstructionError {
    /// The pool was asked to hold zero instances.
    #[error("pool must hold at least one instance")]
    EmptyPool,

    /// Copying the template into slot `index` failed.
    #[error("failed to clone template into slot {index}: {source}")]
    CloneFailed {
        /// Slot whose copy failed.
        index: usize,
        /// Error reported by the resource.
        #[source]
        source: CloneFailure,
    },
}

/// Why a release was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseFault {
    /// The slot reference was issued by a different pool.
    ForeignPool,
    /// The slot index does not exist in this pool.
    UnknownSlot,
    /// The grant named by the reference was already released.
    NotLeased,
}

impl std::fmt::Display for ReleaseFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::ForeignPool => "slot belongs to another pool",
            Self::UnknownSlot => "no such slot",
            Self::NotLeased => "slot is not leased under this grant",
        };
        f.write_str(text)
    }
}

/// Per-call failure of `acquire` or `release`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PoolError {
    /// The pool was closed before a slot could be granted.
    #[error("resource pool is closed")]
    Closed,

    /// No slot became available within the timeout.
    #[error("timed out after {0:?} waiting for a resource")]
    Timeout(Duration),

    /// A release named a slot that is not currently leased from this pool.
    #[error("invalid release of slot {index}: {reason}")]
    InvalidRelease {
        /// Slot index carried by the rejected reference.
        index: usize,
        /// What was wrong with it.
        reason: ReleaseFault,
    },
}
