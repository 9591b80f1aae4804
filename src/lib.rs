//! # pma-rs
//!
//! A Packed Memory Array (PMA): a sorted array with gaps.
//!
//! Elements stay in ascending order inside a sparse backing store, so scans
//! keep array locality while single-element inserts only shift a small
//! neighbourhood. The store is cut into segments of `Θ(log N)` slots, and
//! aligned windows of `segment_len · 2^level` slots form an implicit binary
//! tree over them. Each level has an upper density bound, loose at the leaves
//! and tight at the root. An insert that would break a bound rebalances the
//! smallest enclosing window that stays within bounds; if even the root would
//! overflow, the capacity doubles.
//!
//! Based on "A Locality-Preserving Cache-Oblivious Dynamic Dictionary"
//! (Bender, Duan, Iacono, Wu).
//!
//! ## Example
//!
//! ```rust
//! use pma_rs::PackedMemoryArray;
//!
//! let mut pma = PackedMemoryArray::new(20);
//! pma.insert(10);
//! pma.insert(30);
//!
//! assert_eq!(pma.iter().copied().collect::<Vec<_>>(), vec![10, 20, 30]);
//!
//! let slot = pma.find(&20).unwrap();
//! assert_eq!(pma.element_at(slot), &20);
//! pma.delete_at(slot);
//! assert_eq!(pma.find(&20), None);
//! ```
//!
//! Deletion only tombstones a slot; gaps are never reclaimed and capacity
//! never shrinks. The structure is single-threaded: share it behind a lock.

mod density;
mod error;
mod locate;
mod occupancy;
mod rebalance;
mod store;

use std::fmt;
use std::iter::FusedIterator;

use tracing::debug;

pub use error::{PmaError, Result};

use rebalance::Placement;
use store::{Geometry, SlotStore};

// =============================================================================
// Configuration
// =============================================================================

const LEAF_DENSITY_PERCENT: u32 = 100; // Segment windows may fill completely
const ROOT_DENSITY_PERCENT: u32 = 50; // Whole store stays at most half full
const INITIAL_CAPACITY: usize = 2; // Smallest store, holds the first element

// =============================================================================
// Packed Memory Array
// =============================================================================

/// A sorted, gap-filled array of `T`.
///
/// Elements are their own keys and duplicates are allowed. Slot indices are
/// physical positions: they stay valid until the next insert, which may move
/// elements around.
///
/// Cloning duplicates the whole slot array.
#[derive(Clone)]
pub struct PackedMemoryArray<T> {
    store: SlotStore<T>,
    /// Element writes performed by rebalancing and doubling.
    moves: u64,
}

impl<T> PackedMemoryArray<T> {
    /// Creates a store holding `first`, at the smallest capacity whose root
    /// window admits one element.
    pub fn new(first: T) -> Self {
        let mut store = SlotStore::new(Geometry::fitting(1));
        store.mark_present(0, first);
        Self { store, moves: 0 }
    }

    /// Number of live elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.store.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.store.len() == 0
    }

    /// Number of slots, live or empty. Always a power of two.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.store.capacity()
    }

    /// Slots per segment, the leaf rebalancing unit.
    #[inline]
    pub fn segment_len(&self) -> usize {
        self.store.geometry().segment_len()
    }

    /// Level of the root window; level 0 is a single segment.
    #[inline]
    pub fn levels(&self) -> u32 {
        self.store.geometry().levels()
    }

    /// Slots in a window at `level`.
    ///
    /// # Panics
    ///
    /// If `level` exceeds [`levels`](Self::levels).
    pub fn capacity_at(&self, level: u32) -> usize {
        self.store.density().capacity(level)
    }

    /// Maximum fill ratio allowed for windows at `level`.
    ///
    /// # Panics
    ///
    /// If `level` exceeds [`levels`](Self::levels).
    pub fn threshold_at(&self, level: u32) -> f64 {
        self.store.density().threshold(level)
    }

    /// Elements rewritten by rebalances and capacity doublings so far. The
    /// first placement of a newly inserted element is not counted.
    #[inline]
    pub fn moves(&self) -> u64 {
        self.moves
    }

    /// Whether slot `index` holds an element. Out-of-range slots do not.
    #[inline]
    pub fn exists(&self, index: usize) -> bool {
        self.store.exists(index)
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.store.get(index)
    }

    pub fn try_element_at(&self, index: usize) -> Result<&T> {
        self.check_bounds(index)?;
        self.store.get(index).ok_or(PmaError::EmptySlot { index })
    }

    /// Element in slot `index`.
    ///
    /// # Panics
    ///
    /// If the slot is empty or out of range.
    pub fn element_at(&self, index: usize) -> &T {
        match self.try_element_at(index) {
            Ok(value) => value,
            Err(err) => panic!("{err}"),
        }
    }

    /// Tombstones slot `index` and returns its element. Neighbouring
    /// elements are not moved.
    pub fn try_delete_at(&mut self, index: usize) -> Result<T> {
        self.check_bounds(index)?;
        if !self.store.exists(index) {
            return Err(PmaError::EmptySlot { index });
        }
        Ok(self.store.mark_absent(index))
    }

    /// Tombstones slot `index` and returns its element.
    ///
    /// # Panics
    ///
    /// If the slot is empty or out of range.
    pub fn delete_at(&mut self, index: usize) -> T {
        match self.try_delete_at(index) {
            Ok(value) => value,
            Err(err) => panic!("{err}"),
        }
    }

    /// Live elements in ascending order.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            slots: self.store.slots().iter(),
            remaining: self.store.len(),
        }
    }

    /// Every slot in index order, `None` for gaps.
    pub fn slots(&self) -> impl DoubleEndedIterator<Item = Option<&T>> + ExactSizeIterator + '_ {
        self.store.slots().iter().map(Option::as_ref)
    }

    #[inline]
    fn check_bounds(&self, index: usize) -> Result<()> {
        let capacity = self.store.capacity();
        if index >= capacity {
            return Err(PmaError::OutOfBounds { index, capacity });
        }
        Ok(())
    }
}

impl<T: Ord> PackedMemoryArray<T> {
    /// Builds a store from already sorted `values`, spacing them evenly.
    ///
    /// The capacity is the one sequential inserts of the same values would
    /// reach.
    pub fn from_sorted(values: Vec<T>) -> Result<Self> {
        if values.is_empty() {
            return Err(PmaError::EmptyInput);
        }
        if let Some(pos) = values.windows(2).position(|pair| pair[0] > pair[1]) {
            return Err(PmaError::Unsorted { index: pos + 1 });
        }

        let geometry = Geometry::fitting(values.len());
        let mut pma = Self {
            store: SlotStore::new(geometry),
            moves: 0,
        };
        pma.pack(values.into_iter(), None);

        debug!(
            len = pma.len(),
            capacity = geometry.capacity(),
            segment_len = geometry.segment_len(),
            levels = geometry.levels(),
            "bulk loaded"
        );
        Ok(pma)
    }

    /// Inserts `value` after every element `<= value`.
    pub fn insert(&mut self, value: T) {
        let anchor = self.find_anchor(&value);
        match self.balance_search(anchor) {
            Placement::Fits if anchor < self.capacity() && !self.store.exists(anchor) => {
                self.store.mark_present(anchor, value);
            }
            Placement::Fits => {
                let slot = anchor.min(self.capacity() - 1);
                let start = self.store.geometry().window_start(slot, 0);
                self.rebalance_window(start, 0, Some(value));
            }
            Placement::Window { start, level } => self.rebalance_window(start, level, Some(value)),
            Placement::Exhausted => self.grow(value),
        }
    }

    /// Slot of the rightmost element `<= value`.
    pub fn predecessor_index(&self, value: &T) -> Option<usize> {
        self.predecessor_slot(value)
    }

    /// Slot of an element equal to `value`.
    pub fn find(&self, value: &T) -> Option<usize> {
        self.predecessor_slot(value)
            .filter(|&slot| self.store.get(slot) == Some(value))
    }

    pub fn contains(&self, value: &T) -> bool {
        self.find(value).is_some()
    }
}

impl<T: fmt::Debug> PackedMemoryArray<T> {
    /// Slot-by-slot listing, `--` for gaps, followed by `empty/capacity`.
    /// For diagnostics only; the format may change.
    pub fn debug_dump(&self) -> String {
        let mut out = String::new();
        let mut empty = 0;
        for slot in self.store.slots() {
            match slot {
                Some(value) => out.push_str(&format!("{value:?} ")),
                None => {
                    empty += 1;
                    out.push_str("-- ");
                }
            }
        }
        out.push('\n');
        out.push_str(&format!("{empty}/{}", self.capacity()));
        out
    }
}

impl<T: fmt::Debug> fmt::Debug for PackedMemoryArray<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<'a, T> IntoIterator for &'a PackedMemoryArray<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

pub struct Iter<'a, T> {
    slots: std::slice::Iter<'a, Option<T>>,
    remaining: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let value = self.slots.find_map(Option::as_ref)?;
        self.remaining -= 1;
        Some(value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> DoubleEndedIterator for Iter<'_, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        let value = self.slots.by_ref().rev().find_map(Option::as_ref)?;
        self.remaining -= 1;
        Some(value)
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

impl<T> FusedIterator for Iter<'_, T> {}


#[cfg(test)]
mod proptests;
