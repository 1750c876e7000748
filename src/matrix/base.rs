//! The format-polymorphic sparse matrix

use std::fmt;

use ndarray::Array2;

use crate::error::{Error, Result};
use crate::matrix::builder::SparseBuilder;
use crate::matrix::config::{
    FormatControl, OptionField, OptionValue, Orientation, Sparsity,
};
use crate::matrix::storage::{PatternView, Storage, VectorEntries, VectorIndices};
use crate::semiring::Scalar;

/// A sparse matrix held in one of four layouts
///
/// The logical content is the set of `(row, col, value)` triples; layout
/// and orientation are physical choices that never change it. Format
/// hints travel with the matrix as ordinary fields.
#[derive(Clone)]
pub struct Matrix<T> {
    nrows: usize,
    ncols: usize,
    orientation: Orientation,
    control: FormatControl,
    pub(crate) storage: Storage<T>,
}

impl<T: Scalar> Matrix<T> {
    /// Wraps validated storage
    pub(crate) fn from_parts(
        nrows: usize,
        ncols: usize,
        orientation: Orientation,
        storage: Storage<T>,
    ) -> Result<Self> {
        let matrix = Self {
            nrows,
            ncols,
            orientation,
            control: FormatControl::default(),
            storage,
        };
        matrix.validate()?;
        Ok(matrix)
    }

    /// Wraps storage built internally, whose invariants already hold
    pub(crate) fn from_parts_unchecked(
        nrows: usize,
        ncols: usize,
        orientation: Orientation,
        control: FormatControl,
        storage: Storage<T>,
    ) -> Self {
        Self {
            nrows,
            ncols,
            orientation,
            control,
            storage,
        }
    }

    /// Creates a by-column sparse matrix from compressed-column arrays
    ///
    /// # Arguments
    ///
    /// * `col_ptr` - Column pointers (length `ncols + 1`)
    /// * `row_idx` - Row indices, strictly ascending within each column
    /// * `values` - Entry values
    pub fn from_csc(
        nrows: usize,
        ncols: usize,
        col_ptr: Vec<usize>,
        row_idx: Vec<usize>,
        values: Vec<T>,
    ) -> Result<Self> {
        let storage = Storage::Sparse {
            ptr: col_ptr,
            idx: row_idx,
            values,
        };
        Self::from_parts(nrows, ncols, Orientation::ByCol, storage)
    }

    /// Creates a by-row sparse matrix from compressed-row arrays
    pub fn from_csr(
        nrows: usize,
        ncols: usize,
        row_ptr: Vec<usize>,
        col_idx: Vec<usize>,
        values: Vec<T>,
    ) -> Result<Self> {
        let storage = Storage::Sparse {
            ptr: row_ptr,
            idx: col_idx,
            values,
        };
        Self::from_parts(nrows, ncols, Orientation::ByRow, storage)
    }

    /// Creates a by-column sparse matrix from `(row, col, value)` triples
    ///
    /// Triples may come in any order; a repeated position is an error.
    pub fn from_triplets(nrows: usize, ncols: usize, triplets: &[(usize, usize, T)]) -> Result<Self> {
        let mut sorted = triplets.to_vec();
        sorted.sort_by_key(|&(i, j, _)| (j, i));

        let mut builder = SparseBuilder::with_capacity(nrows, ncols, sorted.len())?;
        for (i, j, value) in sorted {
            builder.push(j, i, value)?;
        }
        Ok(Self::from_parts_unchecked(
            nrows,
            ncols,
            Orientation::ByCol,
            FormatControl::default(),
            builder.finish(),
        ))
    }

    /// Creates a full by-column matrix from a dense array
    pub fn from_dense(array: &Array2<T>) -> Self {
        let (nrows, ncols) = array.dim();
        // Column-major walk matches the by-column dense layout
        let values: Vec<T> = array.t().iter().copied().collect();
        Self::from_parts_unchecked(
            nrows,
            ncols,
            Orientation::ByCol,
            FormatControl::default(),
            Storage::Full { values },
        )
    }

    /// Creates a matrix with no entries
    pub fn empty(nrows: usize, ncols: usize) -> Self {
        Self::from_parts_unchecked(
            nrows,
            ncols,
            Orientation::ByCol,
            FormatControl::default(),
            Storage::Sparse {
                ptr: vec![0; ncols + 1],
                idx: Vec::new(),
                values: Vec::new(),
            },
        )
    }

    /// Creates an `n × n` identity with `one` on the diagonal
    pub fn identity(n: usize, one: T) -> Self {
        Self::from_parts_unchecked(
            n,
            n,
            Orientation::ByCol,
            FormatControl::default(),
            Storage::Sparse {
                ptr: (0..=n).collect(),
                idx: (0..n).collect(),
                values: vec![one; n],
            },
        )
    }

    /// Replaces the format-control hints
    pub fn with_control(mut self, control: FormatControl) -> Self {
        self.control = control;
        self
    }

    /// Replaces the format-control hints in place
    pub fn set_control(&mut self, control: FormatControl) {
        self.control = control;
    }

    /// Checks every data-model invariant
    pub fn validate(&self) -> Result<()> {
        self.storage.validate(self.vlen(), self.vdim())
    }

    pub fn nrows(&self) -> usize {
        self.nrows
    }

    pub fn ncols(&self) -> usize {
        self.ncols
    }

    /// `(nrows, ncols)`
    pub fn shape(&self) -> (usize, usize) {
        (self.nrows, self.ncols)
    }

    /// Number of explicit entries
    pub fn nvals(&self) -> usize {
        self.storage.nvals()
    }

    pub fn sparsity(&self) -> Sparsity {
        self.storage.sparsity()
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn control(&self) -> &FormatControl {
        &self.control
    }

    /// Length of each stored vector
    pub fn vlen(&self) -> usize {
        match self.orientation {
            Orientation::ByCol => self.nrows,
            Orientation::ByRow => self.ncols,
        }
    }

    /// Number of stored vectors
    pub fn vdim(&self) -> usize {
        match self.orientation {
            Orientation::ByCol => self.ncols,
            Orientation::ByRow => self.nrows,
        }
    }

    /// Value-free view of the pattern
    pub fn pattern(&self) -> PatternView<'_> {
        self.storage.pattern(self.vlen(), self.vdim())
    }

    /// Iterates `(index, value)` pairs of vector `v` in ascending index order
    ///
    /// # Panics
    ///
    /// Panics if `v >= self.vdim()`.
    pub fn vector_iter(&self, v: usize) -> VectorEntries<'_, T> {
        assert!(v < self.vdim(), "Vector index out of bounds");
        VectorEntries::new(&self.storage, self.vlen(), self.vdim(), v)
    }

    /// Iterates the indices of vector `v` in ascending order
    ///
    /// # Panics
    ///
    /// Panics if `v >= self.vdim()`.
    pub fn vector_indices(&self, v: usize) -> VectorIndices<'_> {
        assert!(v < self.vdim(), "Vector index out of bounds");
        self.pattern().vector(v)
    }

    /// Whether vector `v` holds at least one entry
    pub fn vector_is_nonempty(&self, v: usize) -> bool {
        self.vector_indices(v).next().is_some()
    }

    /// Entry count of every vector
    pub fn vector_counts(&self) -> Vec<usize> {
        self.pattern().vector_counts()
    }

    /// Number of vectors holding at least one entry
    pub fn nonempty_vectors(&self) -> usize {
        self.vector_counts().iter().filter(|&&c| c > 0).count()
    }

    /// Value at `(i, j)`, if present
    pub fn get(&self, i: usize, j: usize) -> Option<T> {
        if i >= self.nrows || j >= self.ncols {
            return None;
        }
        let (pos, v) = match self.orientation {
            Orientation::ByCol => (i, j),
            Orientation::ByRow => (j, i),
        };
        let vlen = self.vlen();
        match &self.storage {
            Storage::Sparse { idx, values, .. } | Storage::Hypersparse { idx, values, .. } => {
                let range = self.pattern().compressed_range(v)?;
                let start = range.start;
                idx[range]
                    .binary_search(&pos)
                    .ok()
                    .map(|k| values[start + k])
            }
            Storage::Bitmap { present, values, .. } => {
                let p = v * vlen + pos;
                present[p].then(|| values[p])
            }
            Storage::Full { values } => Some(values[v * vlen + pos]),
        }
    }

    /// Visits every entry as `(row, col, value)` in storage order
    pub fn for_each_entry(&self, mut f: impl FnMut(usize, usize, T)) {
        let by_col = self.orientation == Orientation::ByCol;
        for v in 0..self.vdim() {
            for (i, value) in self.vector_iter(v) {
                if by_col {
                    f(i, v, value);
                } else {
                    f(v, i, value);
                }
            }
        }
    }

    /// All entries as `(row, col, value)`, sorted by row then column
    pub fn to_triplets(&self) -> Vec<(usize, usize, T)> {
        let mut triplets = Vec::with_capacity(self.nvals());
        self.for_each_entry(|i, j, value| triplets.push((i, j, value)));
        if self.orientation == Orientation::ByCol {
            triplets.sort_unstable_by_key(|&(i, j, _)| (i, j));
        }
        triplets
    }

    /// Dense copy with `fill` at every absent position
    pub fn to_dense(&self, fill: T) -> Array2<T> {
        let mut dense = Array2::from_elem((self.nrows, self.ncols), fill);
        self.for_each_entry(|i, j, value| dense[[i, j]] = value);
        dense
    }

    /// Value-free copy sharing this matrix's pattern and layout
    pub fn structure(&self) -> Matrix<()> {
        let storage = match &self.storage {
            Storage::Sparse { ptr, idx, .. } => Storage::Sparse {
                ptr: ptr.clone(),
                idx: idx.clone(),
                values: vec![(); idx.len()],
            },
            Storage::Hypersparse { hlist, ptr, idx, .. } => Storage::Hypersparse {
                hlist: hlist.clone(),
                ptr: ptr.clone(),
                idx: idx.clone(),
                values: vec![(); idx.len()],
            },
            Storage::Bitmap { present, nvals, .. } => Storage::Bitmap {
                present: present.clone(),
                values: vec![(); present.len()],
                nvals: *nvals,
            },
            Storage::Full { values } => Storage::Full {
                values: vec![(); values.len()],
            },
        };
        Matrix {
            nrows: self.nrows,
            ncols: self.ncols,
            orientation: self.orientation,
            control: self.control,
            storage,
        }
    }

    /// Integer-valued option
    pub fn option_i32(&self, field: OptionField) -> Result<i32> {
        match field {
            OptionField::SparsityControl => Ok(self.control.sparsity_control().bits()),
            OptionField::SparsityStatus => Ok(self.sparsity().code()),
            OptionField::Format => Ok(self.orientation.code()),
            _ => Err(Error::InvalidValue { field }),
        }
    }

    /// Floating-point option
    pub fn option_f64(&self, field: OptionField) -> Result<f64> {
        match field {
            OptionField::HyperSwitch => Ok(self.control.hyper_switch()),
            OptionField::BitmapSwitch => Ok(self.control.bitmap_switch()),
            _ => Err(Error::InvalidValue { field }),
        }
    }

    /// Any option, typed by its field
    pub fn option(&self, field: OptionField) -> OptionValue {
        match field {
            OptionField::HyperSwitch => OptionValue::Float(self.control.hyper_switch()),
            OptionField::BitmapSwitch => OptionValue::Float(self.control.bitmap_switch()),
            OptionField::SparsityControl => OptionValue::Int(self.control.sparsity_control().bits()),
            OptionField::SparsityStatus => OptionValue::Int(self.sparsity().code()),
            OptionField::Format => OptionValue::Int(self.orientation.code()),
            OptionField::IsHyper => OptionValue::Bool(self.sparsity() == Sparsity::Hypersparse),
        }
    }
}

/// Logical equality: same shape and same `(row, col, value)` set,
/// regardless of layout or orientation
impl<T: Scalar + PartialEq> PartialEq for Matrix<T> {
    fn eq(&self, other: &Self) -> bool {
        self.shape() == other.shape()
            && self.nvals() == other.nvals()
            && self.to_triplets() == other.to_triplets()
    }
}

impl<T: Scalar + fmt::Debug> fmt::Debug for Matrix<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Matrix {{")?;
        writeln!(f, "  dimensions: {} × {}", self.nrows, self.ncols)?;
        writeln!(f, "  layout: {:?} {:?}", self.sparsity(), self.orientation)?;
        writeln!(f, "  nvals: {}", self.nvals())?;

        let triplets = self.to_triplets();
        let max_entries = 8.min(triplets.len());
        if max_entries > 0 {
            writeln!(f, "  content sample:")?;
            for (i, j, value) in &triplets[..max_entries] {
                writeln!(f, "    ({}, {}): {:?}", i, j, value)?;
            }
            if triplets.len() > max_entries {
                writeln!(f, "    ... ({} more)", triplets.len() - max_entries)?;
            }
        }

        write!(f, "}}")
    }
}
