//! The contract a pooled resource must satisfy.

/// A mutable handle that is expensive to build and unsafe to share.
///
/// Implementors must be `Send` so a lease can hand them to whichever worker
/// thread holds it, but they need not be `Sync`: the pool guarantees that at
/// most one thread touches an instance at a time.
///
/// Types that are plain `Clone` can skip this trait and build a pool with
/// [`ResourcePool::from_clone`](crate::ResourcePool::from_clone).
pub trait Resource: Send + Sized {
    /// Error returned when a deep copy cannot be made.
    type CloneError: std::error::Error + Send + Sync + 'static;

    /// Produce an independent deep copy of this instance.
    fn try_clone(&self) -> Result<Self, Self::CloneError>;
}
