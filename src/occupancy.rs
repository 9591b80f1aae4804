//! Occupied-slot counts for every aligned window.
//!
//! Counts are stored flat and level-major: the `S` segments first, then the
//! `S/2` level-1 windows, and so on up to the single root window, `2S - 1`
//! counters in total. The counters for level `k` start at `2S - (2S >> k)`.

use crate::store::Geometry;

#[derive(Clone, Debug)]
pub(crate) struct Occupancy {
    counts: Vec<usize>,
    segments: usize,
    segment_shift: u32,
    levels: u32,
}

impl Occupancy {
    pub(crate) fn new(geometry: Geometry) -> Self {
        let segments = geometry.segments();
        Self {
            counts: vec![0; 2 * segments - 1],
            segments,
            segment_shift: geometry.segment_shift(),
            levels: geometry.levels(),
        }
    }

    #[inline]
    fn offset(&self, level: u32) -> usize {
        2 * self.segments - ((2 * self.segments) >> level)
    }

    #[inline]
    fn windows(&self, level: u32) -> usize {
        self.segments >> level
    }

    #[inline]
    fn at(&self, level: u32, window: usize) -> usize {
        debug_assert!(level <= self.levels);
        debug_assert!(window < self.windows(level));
        self.offset(level) + window
    }

    /// Number of occupied slots in window `window` at `level`.
    #[inline]
    pub(crate) fn count(&self, level: u32, window: usize) -> usize {
        self.counts[self.at(level, window)]
    }

    pub(crate) fn increment(&mut self, slot: usize) {
        let mut window = slot >> self.segment_shift;
        for level in 0..=self.levels {
            let at = self.at(level, window);
            self.counts[at] += 1;
            window >>= 1;
        }
    }

    pub(crate) fn decrement(&mut self, slot: usize) {
        let mut window = slot >> self.segment_shift;
        for level in 0..=self.levels {
            let at = self.at(level, window);
            debug_assert!(self.counts[at] > 0);
            self.counts[at] -= 1;
            window >>= 1;
        }
    }

    /// Rescans the slots under one window, rebuilds every count inside it and
    /// shifts the enclosing windows by the difference. Returns the new count.
    pub(crate) fn recount<T>(&mut self, level: u32, window: usize, slots: &[Option<T>]) -> usize {
        let before = self.count(level, window);
        let segment_len = 1usize << self.segment_shift;

        let first_segment = window << level;
        for segment in first_segment..first_segment + (1 << level) {
            let start = segment << self.segment_shift;
            let occupied = slots[start..start + segment_len]
                .iter()
                .filter(|slot| slot.is_some())
                .count();
            self.counts[segment] = occupied;
        }

        for inner in 1..=level {
            let span = 1usize << (level - inner);
            let below = self.offset(inner - 1);
            let here = self.offset(inner);
            for w in window * span..(window + 1) * span {
                self.counts[here + w] = self.counts[below + 2 * w] + self.counts[below + 2 * w + 1];
            }
        }

        let after = self.count(level, window);
        let mut enclosing = window;
        for outer in level + 1..=self.levels {
            enclosing >>= 1;
            let at = self.at(outer, enclosing);
            self.counts[at] = self.counts[at] - before + after;
        }
        after
    }

    /// First non-empty segment at or after `from`.
    ///
    /// Climbs until a right sibling holds elements, then descends along the
    /// leftmost non-empty children.
    pub(crate) fn next_occupied_segment(&self, from: usize) -> Option<usize> {
        if from >= self.segments {
            return None;
        }
        if self.count(0, from) > 0 {
            return Some(from);
        }

        let mut level = 0;
        let mut window = from;
        loop {
            if window % 2 == 0
                && window + 1 < self.windows(level)
                && self.count(level, window + 1) > 0
            {
                window += 1;
                break;
            }
            if level == self.levels {
                return None;
            }
            level += 1;
            window /= 2;
        }

        while level > 0 {
            level -= 1;
            window *= 2;
            if self.count(level, window) == 0 {
                window += 1;
            }
        }
        Some(window)
    }
}
