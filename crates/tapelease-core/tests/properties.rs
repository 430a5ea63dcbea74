//! Property-based tests for pool bookkeeping.
//!
//! A random sequence of acquires and releases is replayed against a pool and
//! a simple model of which slots are held.

use std::time::Duration;

use proptest::prelude::*;

use tapelease_core::{PoolError, ResourcePool, SlotRef};

#[derive(Debug, Clone)]
enum Op {
    Acquire,
    Release(usize),
    ReleaseStale,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => Just(Op::Acquire),
        3 => any::<usize>().prop_map(Op::Release),
        1 => Just(Op::ReleaseStale),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Right after construction everything is available.
    #[test]
    fn fresh_pool_is_fully_available(n in 1usize..64) {
        let pool = ResourcePool::from_clone(&0u8, n).unwrap();
        let status = pool.status();
        prop_assert_eq!(status.size, n);
        prop_assert_eq!(status.available, n);
        prop_assert_eq!(status.leased, 0);
    }

    /// leased + available == N after every operation, and no slot is granted twice.
    #[test]
    fn occupancy_always_sums_to_size(n in 1usize..8, ops in prop::collection::vec(op(), 0..64)) {
        let pool = ResourcePool::from_clone(&0u8, n).unwrap();
        let mut held: Vec<SlotRef> = Vec::new();
        let mut released: Vec<SlotRef> = Vec::new();

        for op in ops {
            match op {
                Op::Acquire => match pool.acquire_timeout(Duration::ZERO) {
                    Ok(slot) => {
                        prop_assert!(slot.index() < n);
                        prop_assert!(held.iter().all(|h| h.index() != slot.index()));
                        held.push(slot);
                    }
                    Err(err) => {
                        prop_assert_eq!(err, PoolError::Timeout(Duration::ZERO));
                        prop_assert_eq!(held.len(), n);
                    }
                },
                Op::Release(pick) => {
                    if !held.is_empty() {
                        let slot = held.swap_remove(pick % held.len());
                        prop_assert!(pool.release(slot).is_ok());
                        released.push(slot);
                    }
                }
                Op::ReleaseStale => {
                    if let Some(&slot) = released.last() {
                        let is_invalid = matches!(
                            pool.release(slot),
                            Err(PoolError::InvalidRelease { .. })
                        );
                        prop_assert!(is_invalid);
                    }
                }
            }

            let status = pool.status();
            prop_assert_eq!(status.leased + status.available, n);
            prop_assert_eq!(status.leased, held.len());
        }
    }
}
