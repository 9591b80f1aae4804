//! Per-level upper density thresholds.
//!
//! Level 0 is a single segment and level `L` is the whole store. The permitted
//! fill ratio falls linearly from the leaf threshold to the root threshold, so
//! small windows may pack tightly while the root keeps enough slack that the
//! store doubles only once every Θ(n) insertions.
//!
//! Thresholds are integer percentages and every bound is computed in integer
//! arithmetic: `max_occupancy` is exact, which the rebalancer relies on when it
//! spreads a window across its sub-windows.

use crate::store::Geometry;
use crate::{LEAF_DENSITY_PERCENT, ROOT_DENSITY_PERCENT};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct DensityModel {
    leaf_percent: u32,
    root_percent: u32,
    segment_len: usize,
    levels: u32,
}

impl DensityModel {
    pub(crate) fn new(geometry: Geometry) -> Self {
        Self::with_thresholds(geometry, LEAF_DENSITY_PERCENT, ROOT_DENSITY_PERCENT)
    }

    pub(crate) fn with_thresholds(
        geometry: Geometry,
        leaf_percent: u32,
        root_percent: u32,
    ) -> Self {
        debug_assert!(0 < root_percent && root_percent <= leaf_percent && leaf_percent <= 100);
        Self {
            leaf_percent,
            root_percent,
            segment_len: geometry.segment_len(),
            levels: geometry.levels(),
        }
    }

    #[inline]
    fn check_level(self, level: u32) {
        assert!(
            level <= self.levels,
            "level {level} exceeds the root level {}",
            self.levels
        );
    }

    /// Threshold at `level`, scaled by `100 * max(L, 1)`.
    #[inline]
    fn scaled_threshold(self, level: u32) -> u64 {
        if self.levels == 0 {
            // A single window is both leaf and root; the root bound wins.
            return u64::from(self.root_percent);
        }
        let levels = u64::from(self.levels);
        let spread = u64::from(self.leaf_percent - self.root_percent);
        u64::from(self.leaf_percent) * levels - spread * u64::from(level)
    }

    #[inline]
    fn scale(self) -> u64 {
        100 * u64::from(self.levels.max(1))
    }

    /// Number of slots in a window at `level`.
    #[inline]
    pub(crate) fn capacity(self, level: u32) -> usize {
        self.check_level(level);
        self.segment_len << level
    }

    /// Maximum permitted fill ratio for windows at `level`.
    pub(crate) fn threshold(self, level: u32) -> f64 {
        self.check_level(level);
        self.scaled_threshold(level) as f64 / self.scale() as f64
    }

    /// `floor(threshold(level) * capacity(level))`.
    #[inline]
    pub(crate) fn max_occupancy(self, level: u32) -> usize {
        let capacity = self.capacity(level) as u128;
        let bound = capacity * u128::from(self.scaled_threshold(level)) / u128::from(self.scale());
        bound as usize
    }

    #[inline]
    pub(crate) fn is_overfull(self, count: usize, level: u32) -> bool {
        count > self.max_occupancy(level)
    }
}
