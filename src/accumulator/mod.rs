//! Per-column accumulators for the symbolic and numeric phases
//!
//! Both phases build one output column at a time by scattering candidate
//! row indices (and, numerically, products) into an accumulator. The
//! dense gather keeps a length-`vlen` slot array and suits columns whose
//! row space is densely hit; the hash accumulator sizes its table from a
//! bound on the distinct count and suits everything else.

pub mod dense;
pub mod hash;

pub use dense::DenseAccumulator;
pub use hash::HashAccumulator;

use crate::error::Result;

/// Accumulation strategy for one output column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Flag array over the full index space
    DenseGather,
    /// Open-addressed table sized from an estimate
    Hash,
}

impl Strategy {
    /// Chooses the strategy for a column
    ///
    /// # Arguments
    ///
    /// * `estimate` - Upper bound on the column's distinct row count
    /// * `vlen` - Size of the column's index space
    /// * `dense_fraction` - Fraction of `vlen` at which the dense gather wins
    pub fn select(estimate: usize, vlen: usize, dense_fraction: f64) -> Self {
        if vlen > 0 && estimate as f64 >= dense_fraction * vlen as f64 {
            Strategy::DenseGather
        } else {
            Strategy::Hash
        }
    }
}

/// Scatter target for one output column at a time
pub trait Accumulator<T> {
    /// Clears the accumulator for a column with at most `bound` distinct indices
    fn begin(&mut self, bound: usize) -> Result<()>;

    /// Records index `i`; true when it was not yet present
    fn insert(&mut self, i: usize) -> bool;

    /// Stores `value` at `i`, or combines it with the value already there
    fn accumulate(&mut self, i: usize, value: T, combine: impl Fn(T, T) -> T);

    /// Number of distinct indices recorded since `begin`
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Writes the recorded indices in ascending order
    ///
    /// `indices` must hold exactly `len()` slots.
    fn drain_indices(&mut self, indices: &mut [usize]);

    /// Writes the recorded `(index, value)` pairs in ascending index order
    ///
    /// Both slices must hold exactly `len()` slots.
    fn drain_into(&mut self, indices: &mut [usize], values: &mut [T]);
}

/// Lazily allocated accumulators owned by one task
///
/// A task switches between strategies column by column; each accumulator
/// is created on first use and reused for the rest of the task.
pub struct Workspace<T> {
    vlen: usize,
    dense: Option<DenseAccumulator<T>>,
    hash: Option<HashAccumulator<T>>,
}

impl<T: Copy + Default> Workspace<T> {
    pub fn new(vlen: usize) -> Self {
        Self {
            vlen,
            dense: None,
            hash: None,
        }
    }

    /// Dense accumulator prepared for a new column
    pub fn dense(&mut self) -> Result<&mut DenseAccumulator<T>> {
        let acc = match self.dense.take() {
            Some(acc) => acc,
            None => DenseAccumulator::new(self.vlen)?,
        };
        let acc = self.dense.insert(acc);
        acc.begin(self.vlen)?;
        Ok(acc)
    }

    /// Hash accumulator prepared for a column of at most `bound` indices
    pub fn hash(&mut self, bound: usize) -> Result<&mut HashAccumulator<T>> {
        let acc = self.hash.get_or_insert_with(HashAccumulator::new);
        acc.begin(bound)?;
        Ok(acc)
    }
}
