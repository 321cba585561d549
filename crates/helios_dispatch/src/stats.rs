//! Session-wide render statistics.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use helios_core::WorkerCounters;

/// Concurrent counters incremented by every worker.
///
/// Increments are individually atomic but the four counters are not
/// updated as one group: a live read mid-render may see a transient
/// mismatch between them. Only the snapshot taken after all workers
/// have joined is guaranteed to equal the sum of per-worker
/// contributions.
#[derive(Debug, Default)]
pub struct Statistics {
    rays: AtomicU64,
    intersections: AtomicU64,
    bbox_tests: AtomicU64,
    primitive_tests: AtomicU64,
}

impl Statistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Zero all counters at session start.
    pub fn reset(&self) {
        self.rays.store(0, Ordering::Relaxed);
        self.intersections.store(0, Ordering::Relaxed);
        self.bbox_tests.store(0, Ordering::Relaxed);
        self.primitive_tests.store(0, Ordering::Relaxed);
    }

    /// Fold one worker's local contribution in.
    pub fn record(&self, counters: WorkerCounters) {
        if counters.is_zero() {
            return;
        }
        self.rays.fetch_add(counters.rays, Ordering::Relaxed);
        self.intersections
            .fetch_add(counters.intersections, Ordering::Relaxed);
        self.bbox_tests
            .fetch_add(counters.bbox_tests, Ordering::Relaxed);
        self.primitive_tests
            .fetch_add(counters.primitive_tests, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            rays: self.rays.load(Ordering::Relaxed),
            intersections: self.intersections.load(Ordering::Relaxed),
            bbox_tests: self.bbox_tests.load(Ordering::Relaxed),
            primitive_tests: self.primitive_tests.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time read of the four counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub rays: u64,
    pub intersections: u64,
    pub bbox_tests: u64,
    pub primitive_tests: u64,
}

fn to_kilo(n: u64) -> u64 {
    (n + 500) / 1000
}

impl fmt::Display for StatsSnapshot {
    /// Thousands-rounded summary, e.g. `r1234k, i567k, bb89k, t12k`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "r{}k, i{}k, bb{}k, t{}k",
            to_kilo(self.rays),
            to_kilo(self.intersections),
            to_kilo(self.bbox_tests),
            to_kilo(self.primitive_tests)
        )
    }
}
