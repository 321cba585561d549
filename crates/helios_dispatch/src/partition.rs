//! Row-interleaved work partitioning.
//!
//! Worker `i` of `N` owns the scanlines `{ y : y % N == i }`. The
//! interleave spreads rows of uneven cost (sky vs. geometry-dense
//! regions) statistically evenly across workers, so no dynamic
//! work-stealing is needed.

/// One worker's share of the image rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkAssignment {
    ordinal: u32,
    total: u32,
}

impl WorkAssignment {
    /// Create the assignment for worker `ordinal` of `total`.
    pub fn new(ordinal: u32, total: u32) -> Self {
        assert!(total >= 1, "total workers must be at least 1");
        assert!(ordinal < total, "ordinal must be below total");
        Self { ordinal, total }
    }

    pub fn ordinal(&self) -> u32 {
        self.ordinal
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    /// The rows this worker owns for an image of the given height.
    ///
    /// May be empty when `height < total` - that is legal, not an
    /// error.
    pub fn rows(&self, height: u32) -> impl Iterator<Item = u32> {
        (self.ordinal..height).step_by(self.total as usize)
    }

    /// Number of rows this worker owns.
    pub fn row_count(&self, height: u32) -> u32 {
        if height <= self.ordinal {
            0
        } else {
            (height - self.ordinal).div_ceil(self.total)
        }
    }

    /// True if this worker owns row `y`.
    pub fn owns_row(&self, y: u32) -> bool {
        y % self.total == self.ordinal
    }
}
