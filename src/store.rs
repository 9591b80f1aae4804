//! Backing slots and the geometry derived from their count.

use crate::density::DensityModel;
use crate::occupancy::Occupancy;
use crate::INITIAL_CAPACITY;

/// Shape of a store of `capacity` slots.
///
/// `segment_len` is `log2(capacity)` rounded up to a power of two and `levels`
/// is `log2(capacity) - log2(segment_len)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Geometry {
    capacity: usize,
    segment_len: usize,
    levels: u32,
}

impl Geometry {
    pub(crate) fn for_capacity(capacity: usize) -> Self {
        assert!(
            capacity >= 2 && capacity.is_power_of_two(),
            "capacity {capacity} must be a power of two of at least 2"
        );
        let log2n = capacity.trailing_zeros();
        let segment_len = (log2n as usize).next_power_of_two();
        Self {
            capacity,
            segment_len,
            levels: log2n - segment_len.trailing_zeros(),
        }
    }

    /// Smallest geometry, starting from [`INITIAL_CAPACITY`], whose root window
    /// admits `len` elements.
    pub(crate) fn fitting(len: usize) -> Self {
        let mut geometry = Self::for_capacity(INITIAL_CAPACITY);
        loop {
            let density = DensityModel::new(geometry);
            if !density.is_overfull(len, geometry.levels) {
                return geometry;
            }
            geometry = geometry.doubled();
        }
    }

    #[inline]
    pub(crate) fn doubled(self) -> Self {
        Self::for_capacity(self.capacity * 2)
    }

    #[inline]
    pub(crate) fn capacity(self) -> usize {
        self.capacity
    }

    #[inline]
    pub(crate) fn segment_len(self) -> usize {
        self.segment_len
    }

    #[inline]
    pub(crate) fn segment_shift(self) -> u32 {
        self.segment_len.trailing_zeros()
    }

    #[inline]
    pub(crate) fn segments(self) -> usize {
        self.capacity >> self.segment_shift()
    }

    #[inline]
    pub(crate) fn levels(self) -> u32 {
        self.levels
    }

    #[inline]
    pub(crate) fn segment_of(self, slot: usize) -> usize {
        slot >> self.segment_shift()
    }

    /// First slot of the level-`level` window containing `slot`.
    #[inline]
    pub(crate) fn window_start(self, slot: usize, level: u32) -> usize {
        let width = self.segment_len << level;
        slot - slot % width
    }
}

/// Slot array plus per-window occupancy.
///
/// `mark_present` / `mark_absent` keep `len` and the occupancy index current.
/// `occupy` / `vacate` are the rebalancer's bulk primitives: they touch only
/// the slot, and the caller restores the bookkeeping with [`SlotStore::settle`]
/// once the window is rewritten.
#[derive(Clone)]
pub(crate) struct SlotStore<T> {
    slots: Vec<Option<T>>,
    len: usize,
    geometry: Geometry,
    density: DensityModel,
    occupancy: Occupancy,
}

impl<T> SlotStore<T> {
    pub(crate) fn new(geometry: Geometry) -> Self {
        let mut slots = Vec::with_capacity(geometry.capacity());
        slots.resize_with(geometry.capacity(), || None);
        Self {
            slots,
            len: 0,
            geometry,
            density: DensityModel::new(geometry),
            occupancy: Occupancy::new(geometry),
        }
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub(crate) fn geometry(&self) -> Geometry {
        self.geometry
    }

    #[inline]
    pub(crate) fn density(&self) -> DensityModel {
        self.density
    }

    #[inline]
    pub(crate) fn occupancy(&self) -> &Occupancy {
        &self.occupancy
    }

    #[inline]
    pub(crate) fn slots(&self) -> &[Option<T>] {
        &self.slots
    }

    #[inline]
    pub(crate) fn exists(&self, index: usize) -> bool {
        matches!(self.slots.get(index), Some(Some(_)))
    }

    #[inline]
    pub(crate) fn get(&self, index: usize) -> Option<&T> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    /// Slots of segment `segment`.
    #[inline]
    pub(crate) fn segment(&self, segment: usize) -> &[Option<T>] {
        let start = segment << self.geometry.segment_shift();
        &self.slots[start..start + self.geometry.segment_len()]
    }

    pub(crate) fn mark_present(&mut self, index: usize, value: T) {
        self.occupy(index, value);
        self.len += 1;
        self.occupancy.increment(index);
    }

    pub(crate) fn mark_absent(&mut self, index: usize) -> T {
        let value = match self.vacate(index) {
            Some(value) => value,
            None => panic!("slot {index} holds no element"),
        };
        self.len -= 1;
        self.occupancy.decrement(index);
        value
    }

    /// Writes `value` into an empty slot without bookkeeping.
    #[inline]
    pub(crate) fn occupy(&mut self, index: usize, value: T) {
        let slot = &mut self.slots[index];
        assert!(slot.is_none(), "slot {index} is already occupied");
        *slot = Some(value);
    }

    /// Empties a slot without bookkeeping.
    #[inline]
    pub(crate) fn vacate(&mut self, index: usize) -> Option<T> {
        self.slots[index].take()
    }

    /// Recounts the window `window` at `level` after `occupy` / `vacate`, and
    /// brings `len` and the enclosing windows' counts in line.
    pub(crate) fn settle(&mut self, level: u32, window: usize) {
        let before = self.occupancy.count(level, window);
        let after = self.occupancy.recount(level, window, &self.slots);
        self.len = self.len - before + after;
    }

    /// Consumes the store, yielding its elements in slot order.
    pub(crate) fn into_values(self) -> impl Iterator<Item = T> {
        self.slots.into_iter().flatten()
    }
}
