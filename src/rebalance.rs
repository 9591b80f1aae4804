//! Window rebalancing, the escalation search that picks the window, and
//! capacity doubling when no window is left.

use tracing::{debug, trace};

use crate::store::SlotStore;
use crate::PackedMemoryArray;

/// Where an insertion next to a given anchor can go.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Placement {
    /// Every enclosing window accepts one more element.
    Fits,
    /// Rebalance the window at `start` on `level`, merging the new element.
    Window { start: usize, level: u32 },
    /// The root window would overflow.
    Exhausted,
}

impl<T: Ord> PackedMemoryArray<T> {
    /// Escalates from the segment holding `anchor` to the root.
    ///
    /// The chosen window is the smallest one that, together with every larger
    /// window around it, stays within its threshold after one more element.
    pub(crate) fn balance_search(&self, anchor: usize) -> Placement {
        let geometry = self.store.geometry();
        let density = self.store.density();
        let occupancy = self.store.occupancy();
        let slot = anchor.min(geometry.capacity() - 1);
        let segment = geometry.segment_of(slot);

        let mut overfull = None;
        for level in 0..=geometry.levels() {
            let count = occupancy.count(level, segment >> level);
            if density.is_overfull(count + 1, level) {
                overfull = Some(level);
            }
        }

        match overfull {
            None => Placement::Fits,
            Some(level) if level == geometry.levels() => Placement::Exhausted,
            Some(level) => Placement::Window {
                start: geometry.window_start(slot, level + 1),
                level: level + 1,
            },
        }
    }

    /// Spreads the elements of the window at `start` on `level`, plus
    /// `incoming` if given, evenly across the window. Every element that was
    /// already in the window counts as one move.
    pub(crate) fn rebalance_window(&mut self, start: usize, level: u32, incoming: Option<T>) {
        self.moves += self.spread(start, level, incoming) as u64;
    }

    /// Does the work of `rebalance_window` and returns how many of the
    /// placed elements were already in the window.
    ///
    /// The `j`-th element lands on `start + (j + 1) * width / m - 1`, which is
    /// strictly increasing whenever `m <= width`.
    fn spread(&mut self, start: usize, level: u32, incoming: Option<T>) -> usize {
        let width = self.store.density().capacity(level);
        debug_assert_eq!(
            start % width,
            0,
            "window start {start} is not aligned to {width}"
        );
        let window = start / width;

        let occupied = self.store.occupancy().count(level, window);
        let mut gathered = Vec::with_capacity(occupied + 1);
        let mut incoming = incoming;
        for i in start..start + width {
            if let Some(value) = self.store.vacate(i) {
                if let Some(new) = incoming.take_if(|new| *new < value) {
                    gathered.push(new);
                }
                gathered.push(value);
            }
        }
        gathered.extend(incoming);

        let m = gathered.len();
        assert!(
            m <= width,
            "window at {start} on level {level} cannot hold {m} elements in {width} slots"
        );
        for (j, value) in gathered.into_iter().enumerate() {
            self.store.occupy(start + (j + 1) * width / m - 1, value);
        }
        self.store.settle(level, window);

        trace!(start, level, elements = m, "rebalanced window");
        occupied
    }

    /// Doubles the capacity and rebuilds the store around `incoming`.
    ///
    /// Each old element is written twice, once by the merge pass and once by
    /// the spread. The new element is not counted.
    pub(crate) fn grow(&mut self, incoming: T) {
        let from = self.store.capacity();
        let geometry = self.store.geometry().doubled();
        let old = std::mem::replace(&mut self.store, SlotStore::new(geometry));
        let copied = old.len();

        self.pack(old.into_values(), Some(incoming));
        self.moves += 2 * copied as u64;

        debug!(
            from,
            to = geometry.capacity(),
            len = self.store.len(),
            segment_len = geometry.segment_len(),
            levels = geometry.levels(),
            "doubled capacity"
        );
    }

    /// Writes `values` (sorted), with `incoming` merged in, into the front of
    /// an empty store, then spreads them over the whole store. Moves are left
    /// to the caller.
    pub(crate) fn pack(&mut self, values: impl Iterator<Item = T>, incoming: Option<T>) {
        debug_assert_eq!(self.store.len(), 0);
        let geometry = self.store.geometry();

        let mut next = 0;
        let mut incoming = incoming;
        for value in values {
            if let Some(new) = incoming.take_if(|new| *new < value) {
                self.store.occupy(next, new);
                next += 1;
            }
            self.store.occupy(next, value);
            next += 1;
        }
        if let Some(new) = incoming {
            self.store.occupy(next, new);
        }
        self.store.settle(geometry.levels(), 0);

        self.spread(0, geometry.levels(), None);
    }
}
