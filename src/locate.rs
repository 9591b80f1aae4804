//! Predecessor search.
//!
//! Segments are binary searched on "the first element at or after this
//! segment is `<= key`". The store is sorted, so that first element never
//! decreases as the segment index grows and the predicate holds for a prefix
//! of the segments. Empty segments are skipped through the occupancy index.
//! The last segment satisfying the predicate is non-empty and holds the
//! predecessor, which an in-segment scan from the right picks out.

use crate::PackedMemoryArray;

impl<T: Ord> PackedMemoryArray<T> {
    /// First element stored in segment `from` or any later segment.
    fn first_from_segment(&self, from: usize) -> Option<&T> {
        let segment = self.store.occupancy().next_occupied_segment(from)?;
        self.store.segment(segment).iter().find_map(Option::as_ref)
    }

    /// Slot of the rightmost element `<= key`.
    pub(crate) fn predecessor_slot(&self, key: &T) -> Option<usize> {
        let geometry = self.store.geometry();

        let (mut lo, mut hi) = (0, geometry.segments());
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            let first = self.first_from_segment(mid);
            if first.is_some_and(|first| first <= key) {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }

        let segment = lo.checked_sub(1)?;
        let start = segment << geometry.segment_shift();
        let found = self
            .store
            .segment(segment)
            .iter()
            .rposition(|slot| slot.as_ref().is_some_and(|value| value <= key));
        debug_assert!(
            found.is_some(),
            "segment {segment} should hold the predecessor"
        );
        found.map(|offset| start + offset)
    }

    /// Slot right after the predecessor of `key`, or `0` without one.
    #[inline]
    pub(crate) fn find_anchor(&self, key: &T) -> usize {
        self.predecessor_slot(key).map_or(0, |slot| slot + 1)
    }
}
