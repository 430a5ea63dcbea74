//! # tapelease-core
//!
//! A fixed-size pool of expensive, non-thread-safe resources shared among
//! many worker threads. Each worker takes a [`ScopedLease`] on one instance,
//! uses it exclusively, and the instance goes back to the pool when the lease
//! leaves scope, however that happens.
//!
//! ```
//! use tapelease_core::{ResourcePool, ScopedLease};
//!
//! let pool = ResourcePool::from_clone(&0u64, 4).unwrap();
//! std::thread::scope(|s| {
//!     for _ in 0..8 {
//!         s.spawn(|| {
//!             let mut lease = ScopedLease::acquire(&pool).unwrap();
//!             *lease += 1;
//!         });
//!     }
//! });
//! assert_eq!(pool.into_instances().iter().sum::<u64>(), 8);
//! ```
#![warn(missing_docs)]

pub mod error;
pub mod hooks;
pub mod lease;
pub mod pool;
pub mod resource;
pub mod slot;
pub mod stats;
pub mod thread_index;

// Re-exports
pub use error::{ConstructionError, PoolError, ReleaseFault};
pub use hooks::{ParallelSection, ThreadIndexProvider};
pub use lease::ScopedLease;
pub use pool::{PoolStatus, ResourcePool};
pub use resource::Resource;
pub use slot::{ResourceSlot, SlotRef};
pub use stats::PoolStats;
pub use thread_index::ThreadIndexHint;
