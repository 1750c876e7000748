//! Open-addressed hash accumulator
//!
//! The table never grows while a column is being built: `begin` sizes it
//! to the next power of two at or above twice the distinct-count bound,
//! so linear probing always finds a free slot. Occupied slots are listed
//! so that extraction and clearing cost O(count) rather than O(table).

use crate::accumulator::Accumulator;
use crate::constants::{HASH_EMPTY, HASH_MULTIPLIER, MIN_HASH_TABLE_SIZE};
use crate::error::{Error, Result};
use crate::utils::{try_filled, try_with_capacity};

/// Hash accumulator keyed by row index
pub struct HashAccumulator<T> {
    keys: Vec<usize>,
    values: Vec<T>,
    used: Vec<usize>,
    mask: usize,
}

impl<T: Copy + Default> HashAccumulator<T> {
    /// Create an accumulator with no table; `begin` allocates one
    pub fn new() -> Self {
        Self {
            keys: Vec::new(),
            values: Vec::new(),
            used: Vec::new(),
            mask: 0,
        }
    }

    /// Current table size
    pub fn capacity(&self) -> usize {
        self.keys.len()
    }

    #[inline]
    fn hash(i: usize) -> usize {
        i.wrapping_mul(HASH_MULTIPLIER)
    }

    /// Slot holding `i`, or the empty slot where it belongs
    #[inline]
    fn probe(&self, i: usize) -> (usize, bool) {
        let mut slot = Self::hash(i) & self.mask;
        loop {
            let key = self.keys[slot];
            if key == i {
                return (slot, true);
            }
            if key == HASH_EMPTY {
                return (slot, false);
            }
            slot = (slot + 1) & self.mask;
        }
    }

    fn occupy(&mut self, slot: usize, i: usize) {
        debug_assert!(self.used.len() < self.keys.len(), "hash table bound exceeded");
        self.keys[slot] = i;
        self.used.push(slot);
    }

    /// Sorts the occupied slots by key and releases them
    fn sorted_slots(&mut self) -> Vec<usize> {
        let keys = &self.keys;
        self.used.sort_unstable_by_key(|&slot| keys[slot]);
        std::mem::take(&mut self.used)
    }

    fn release(&mut self, slots: Vec<usize>) {
        for &slot in &slots {
            self.keys[slot] = HASH_EMPTY;
        }
        self.used = slots;
        self.used.clear();
    }
}

impl<T: Copy + Default> Default for HashAccumulator<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Copy + Default> Accumulator<T> for HashAccumulator<T> {
    fn begin(&mut self, bound: usize) -> Result<()> {
        for &slot in &self.used {
            self.keys[slot] = HASH_EMPTY;
        }
        self.used.clear();

        let size = bound
            .saturating_mul(2)
            .checked_next_power_of_two()
            .ok_or(Error::OutOfMemory {
                what: "hash accumulator",
                elements: bound,
            })?
            .max(MIN_HASH_TABLE_SIZE);
        if size > self.keys.len() {
            self.keys = try_filled(size, HASH_EMPTY, "hash accumulator keys")?;
            self.values = try_filled(size, T::default(), "hash accumulator values")?;
            self.used = try_with_capacity(bound, "hash accumulator slots")?;
        }
        self.mask = self.keys.len() - 1;
        Ok(())
    }

    #[inline]
    fn insert(&mut self, i: usize) -> bool {
        let (slot, found) = self.probe(i);
        if !found {
            self.occupy(slot, i);
        }
        !found
    }

    #[inline]
    fn accumulate(&mut self, i: usize, value: T, combine: impl Fn(T, T) -> T) {
        let (slot, found) = self.probe(i);
        if found {
            self.values[slot] = combine(self.values[slot], value);
        } else {
            self.occupy(slot, i);
            self.values[slot] = value;
        }
    }

    fn len(&self) -> usize {
        self.used.len()
    }

    fn drain_indices(&mut self, indices: &mut [usize]) {
        debug_assert_eq!(indices.len(), self.used.len());
        let slots = self.sorted_slots();
        for (out, &slot) in indices.iter_mut().zip(&slots) {
            *out = self.keys[slot];
        }
        self.release(slots);
    }

    fn drain_into(&mut self, indices: &mut [usize], values: &mut [T]) {
        debug_assert_eq!(indices.len(), self.used.len());
        debug_assert_eq!(values.len(), self.used.len());
        let slots = self.sorted_slots();
        for ((out, value), &slot) in indices.iter_mut().zip(values.iter_mut()).zip(&slots) {
            *out = self.keys[slot];
            *value = self.values[slot];
        }
        self.release(slots);
    }
}
