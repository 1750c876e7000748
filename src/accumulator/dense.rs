//! Dense gather accumulator
//!
//! Keeps one value slot per index of the column space. Presence is
//! tracked with generation marks so clearing between columns is O(1):
//! an index belongs to the current column only when its mark equals the
//! current stamp, and every slot is initialized lazily on first touch.

use crate::accumulator::Accumulator;
use crate::error::Result;
use crate::utils::try_filled;

/// Dense accumulator over an index space of fixed size
pub struct DenseAccumulator<T> {
    /// Stamp of the column that last touched each index
    marks: Vec<usize>,

    /// Value slots, valid only where the mark is current
    values: Vec<T>,

    /// Stamp of the column being built; 0 never marks a live slot
    stamp: usize,

    /// Distinct indices recorded for the current column
    count: usize,
}

impl<T: Copy + Default> DenseAccumulator<T> {
    /// Create a dense accumulator over `vlen` indices
    pub fn new(vlen: usize) -> Result<Self> {
        Ok(Self {
            marks: try_filled(vlen, 0, "dense accumulator marks")?,
            values: try_filled(vlen, T::default(), "dense accumulator values")?,
            stamp: 0,
            count: 0,
        })
    }

    /// Ascending sweep over the marked indices, stopping once all are found
    fn sweep(&self) -> impl Iterator<Item = usize> + '_ {
        let stamp = self.stamp;
        self.marks
            .iter()
            .enumerate()
            .filter(move |&(_, &m)| m == stamp)
            .map(|(i, _)| i)
            .take(self.count)
    }
}

impl<T: Copy + Default> Accumulator<T> for DenseAccumulator<T> {
    fn begin(&mut self, _bound: usize) -> Result<()> {
        self.stamp += 1;
        self.count = 0;
        Ok(())
    }

    #[inline]
    fn insert(&mut self, i: usize) -> bool {
        if self.marks[i] == self.stamp {
            return false;
        }
        self.marks[i] = self.stamp;
        self.count += 1;
        true
    }

    #[inline]
    fn accumulate(&mut self, i: usize, value: T, combine: impl Fn(T, T) -> T) {
        if self.marks[i] == self.stamp {
            self.values[i] = combine(self.values[i], value);
        } else {
            self.marks[i] = self.stamp;
            self.values[i] = value;
            self.count += 1;
        }
    }

    fn len(&self) -> usize {
        self.count
    }

    fn drain_indices(&mut self, indices: &mut [usize]) {
        debug_assert_eq!(indices.len(), self.count);
        for (slot, i) in indices.iter_mut().zip(self.sweep()) {
            *slot = i;
        }
    }

    fn drain_into(&mut self, indices: &mut [usize], values: &mut [T]) {
        debug_assert_eq!(indices.len(), self.count);
        debug_assert_eq!(values.len(), self.count);
        for ((slot, value), i) in indices.iter_mut().zip(values.iter_mut()).zip(self.sweep()) {
            *slot = i;
            *value = self.values[i];
        }
    }
}
