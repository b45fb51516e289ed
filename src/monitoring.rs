//! Forwarder statistics.
//!
//! Lock-free counters updated on the sample path and read by the health
//! endpoint.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Running counters of the forwarder.
#[derive(Debug, Default)]
pub struct ForwarderStats {
    samples_accepted: AtomicU64,
    unknown_type: AtomicU64,
    arity_mismatch: AtomicU64,
    flushes: AtomicU64,
    records_flushed: AtomicU64,
    transmit_failures: AtomicU64,
    records_dropped: AtomicU64,
}

/// Point-in-time copy of [`ForwarderStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    /// Samples normalized and buffered
    pub samples_accepted: u64,
    /// Samples dropped because their type is not in the types database
    pub unknown_type: u64,
    /// Samples dropped because their value count did not match the type
    pub arity_mismatch: u64,
    /// Flush attempts
    pub flushes: u64,
    /// Records the collector accepted
    pub records_flushed: u64,
    /// Flush attempts that failed
    pub transmit_failures: u64,
    /// Records lost to failed flushes
    pub records_dropped: u64,
}

impl ForwarderStats {
    /// Create zeroed counters
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an accepted sample
    pub fn record_accepted(&self) {
        self.samples_accepted.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a sample of unknown type
    pub fn record_unknown_type(&self) {
        self.unknown_type.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a sample with the wrong number of values
    pub fn record_arity_mismatch(&self) {
        self.arity_mismatch.fetch_add(1, Ordering::Relaxed);
    }

    /// Record the outcome of a flush of `count` records
    pub fn record_flush(&self, count: usize, delivered: bool) {
        let count = count as u64;
        self.flushes.fetch_add(1, Ordering::Relaxed);
        if delivered {
            self.records_flushed.fetch_add(count, Ordering::Relaxed);
        } else {
            self.transmit_failures.fetch_add(1, Ordering::Relaxed);
            self.records_dropped.fetch_add(count, Ordering::Relaxed);
        }
    }

    /// Read all counters
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            samples_accepted: self.samples_accepted.load(Ordering::Relaxed),
            unknown_type: self.unknown_type.load(Ordering::Relaxed),
            arity_mismatch: self.arity_mismatch.load(Ordering::Relaxed),
            flushes: self.flushes.load(Ordering::Relaxed),
            records_flushed: self.records_flushed.load(Ordering::Relaxed),
            transmit_failures: self.transmit_failures.load(Ordering::Relaxed),
            records_dropped: self.records_dropped.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flush_accounting() {
        let stats = ForwarderStats::new();
        stats.record_accepted();
        stats.record_accepted();
        stats.record_unknown_type();
        stats.record_flush(2, true);
        stats.record_flush(5, false);

        let snap = stats.snapshot();
        assert_eq!(snap.samples_accepted, 2);
        assert_eq!(snap.unknown_type, 1);
        assert_eq!(snap.arity_mismatch, 0);
        assert_eq!(snap.flushes, 2);
        assert_eq!(snap.records_flushed, 2);
        assert_eq!(snap.transmit_failures, 1);
        assert_eq!(snap.records_dropped, 5);
    }
}
