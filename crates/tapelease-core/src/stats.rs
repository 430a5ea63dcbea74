//! Atomic lease statistics for lock-free usage tracking.

use std::sync::atomic::{AtomicU64, Ordering};

/// Snapshot of pool traffic counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Slots handed out.
    pub grants: u64,
    /// Slots returned.
    pub releases: u64,
    /// Acquires that found no free slot and had to block.
    pub waits: u64,
    /// Acquires that gave up after their timeout.
    pub timeouts: u64,
    /// Releases rejected as invalid.
    pub invalid_releases: u64,
}

/// Atomic pool statistics for lock-free updates.
pub struct AtomicPoolStats {
    grants: AtomicU64,
    releases: AtomicU64,
    waits: AtomicU64,
    timeouts: AtomicU64,
    invalid_releases: AtomicU64,
}

impl AtomicPoolStats {
    /// Create new zeroed stats.
    pub fn new() -> Self {
        Self {
            grants: AtomicU64::new(0),
            releases: AtomicU64::new(0),
            waits: AtomicU64::new(0),
            timeouts: AtomicU64::new(0),
            invalid_releases: AtomicU64::new(0),
        }
    }

    /// Take a snapshot of current stats.
    pub fn snapshot(&self) -> PoolStats {
        PoolStats {
            grants: self.grants.load(Ordering::Relaxed),
            releases: self.releases.load(Ordering::Relaxed),
            waits: self.waits.load(Ordering::Relaxed),
            timeouts: self.timeouts.load(Ordering::Relaxed),
            invalid_releases: self.invalid_releases.load(Ordering::Relaxed),
        }
    }

    /// Reset all counters.
    pub fn reset(&self) {
        self.grants.store(0, Ordering::Relaxed);
        self.releases.store(0, Ordering::Relaxed);
        self.waits.store(0, Ordering::Relaxed);
        self.timeouts.store(0, Ordering::Relaxed);
        self.invalid_releases.store(0, Ordering::Relaxed);
    }

    pub(crate) fn record_grant(&self) {
        self.grants.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_release(&self) {
        self.releases.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_wait(&self) {
        self.waits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_timeout(&self) {
        self.timeouts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_invalid_release(&self) {
        self.invalid_releases.fetch_add(1, Ordering::Relaxed);
    }
}

impl Default for AtomicPoolStats {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_stats_are_zeroed() {
        let stats = AtomicPoolStats::new();
        assert_eq!(stats.snapshot(), PoolStats::default());
    }

    #[test]
    fn record_and_snapshot() {
        let stats = AtomicPoolStats::new();
        stats.record_grant();
        stats.record_grant();
        stats.record_release();
        stats.record_wait();
        stats.record_timeout();
        stats.record_invalid_release();
        stats.record_invalid_release();
        let snap = stats.snapshot();
        assert_eq!(snap.grants, 2);
        assert_eq!(snap.releases, 1);
        assert_eq!(snap.waits, 1);
        assert_eq!(snap.timeouts, 1);
        assert_eq!(snap.invalid_releases, 2);
    }

    #[test]
    fn reset_clears_counters() {
        let stats = AtomicPoolStats::new();
        stats.record_grant();
        stats.record_release();
        stats.record_wait();
        stats.reset();
        assert_eq!(stats.snapshot(), PoolStats::default());
    }
}
