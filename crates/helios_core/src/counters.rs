//! Per-worker statistics contributions.

/// Counters a renderer accumulates locally while tracing.
///
/// Workers drain these into the session-wide aggregator at scanline
/// granularity; the hot per-ray path only touches plain integers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerCounters {
    /// Rays cast (primary, shadow, reflection, refraction).
    pub rays: u64,
    /// Ray/surface intersections found.
    pub intersections: u64,
    /// Bounding-box tests performed.
    pub bbox_tests: u64,
    /// Primitive (sphere/plane/triangle) tests performed.
    pub primitive_tests: u64,
}

impl WorkerCounters {
    /// Fold another contribution into this one.
    pub fn merge(&mut self, other: WorkerCounters) {
        self.rays += other.rays;
        self.intersections += other.intersections;
        self.bbox_tests += other.bbox_tests;
        self.primitive_tests += other.primitive_tests;
    }

    /// Take the current counts, leaving zeros behind.
    pub fn take(&mut self) -> WorkerCounters {
        std::mem::take(self)
    }

    pub fn is_zero(&self) -> bool {
        *self == WorkerCounters::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_and_take() {
        let mut a = WorkerCounters {
            rays: 1,
            intersections: 2,
            bbox_tests: 3,
            primitive_tests: 4,
        };
        a.merge(WorkerCounters {
            rays: 10,
            intersections: 20,
            bbox_tests: 30,
            primitive_tests: 40,
        });
        assert_eq!(a.rays, 11);
        assert_eq!(a.primitive_tests, 44);

        let taken = a.take();
        assert_eq!(taken.intersections, 22);
        assert!(a.is_zero());
    }
}
