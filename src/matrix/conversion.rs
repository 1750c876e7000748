//! Conversion functions between layouts and orientations
//!
//! Every conversion preserves the logical matrix exactly: the same set of
//! `(row, col, value)` triples comes out as went in.

use crate::error::{Error, Result};
use crate::matrix::builder::SparseBuilder;
use crate::matrix::config::{Orientation, Sparsity};
use crate::matrix::storage::{dense_len, Storage};
use crate::matrix::Matrix;
use crate::semiring::Scalar;
use crate::utils::{exclusive_scan, permute, try_filled, try_with_capacity};

impl<T: Scalar> Storage<T> {
    /// Converts to `target`, cloning when already there
    pub(crate) fn convert(&self, vlen: usize, vdim: usize, target: Sparsity) -> Result<Storage<T>> {
        match (self, target) {
            (Storage::Sparse { .. }, Sparsity::Sparse)
            | (Storage::Hypersparse { .. }, Sparsity::Hypersparse)
            | (Storage::Bitmap { .. }, Sparsity::Bitmap)
            | (Storage::Full { .. }, Sparsity::Full) => Ok(self.clone()),

            (Storage::Full { values }, Sparsity::Bitmap) => Ok(Storage::Bitmap {
                present: try_filled(values.len(), true, "bitmap presence")?,
                values: values.clone(),
                nvals: values.len(),
            }),
            (Storage::Bitmap { values, nvals, .. }, Sparsity::Full) => {
                check_full(*nvals, values.len())?;
                Ok(Storage::Full {
                    values: values.clone(),
                })
            }

            _ => {
                let sparse = self.to_sparse(vlen, vdim)?;
                sparse.sparse_into(vlen, vdim, target)
            }
        }
    }

    /// Consuming variant of [`Storage::convert`]
    pub(crate) fn into_sparsity(self, vlen: usize, vdim: usize, target: Sparsity) -> Result<Storage<T>> {
        if self.sparsity() == target {
            return Ok(self);
        }
        match self {
            Storage::Sparse { .. } => self.sparse_into(vlen, vdim, target),
            other => other.convert(vlen, vdim, target),
        }
    }

    fn to_sparse(&self, vlen: usize, vdim: usize) -> Result<Storage<T>> {
        match self {
            Storage::Sparse { .. } => Ok(self.clone()),
            Storage::Hypersparse {
                hlist,
                ptr,
                idx,
                values,
            } => {
                let mut counts = try_filled(vdim, 0usize, "vector pointers")?;
                for (k, &v) in hlist.iter().enumerate() {
                    counts[v] = ptr[k + 1] - ptr[k];
                }
                Ok(Storage::Sparse {
                    ptr: exclusive_scan(&counts),
                    idx: idx.clone(),
                    values: values.clone(),
                })
            }
            Storage::Bitmap { .. } | Storage::Full { .. } => {
                let view = self.pattern(vlen, vdim);
                let dense_values = self.values();
                let mut builder = SparseBuilder::with_capacity(vlen, vdim, self.nvals())?;
                for v in 0..vdim {
                    for i in view.vector(v) {
                        builder.push(v, i, dense_values[v * vlen + i])?;
                    }
                }
                Ok(builder.finish())
            }
        }
    }

    /// Converts sparse storage to `target`
    fn sparse_into(self, vlen: usize, vdim: usize, target: Sparsity) -> Result<Storage<T>> {
        let (ptr, idx, values) = match self {
            Storage::Sparse { ptr, idx, values } => (ptr, idx, values),
            _ => return Err(Error::invalid("expected sparse storage")),
        };
        match target {
            Sparsity::Sparse => Ok(Storage::Sparse { ptr, idx, values }),
            Sparsity::Hypersparse => {
                let nonempty = ptr.windows(2).filter(|w| w[1] > w[0]).count();
                check_hyper(nonempty, vdim)?;
                let mut hlist = try_with_capacity(nonempty, "hyperlist")?;
                let mut hptr = try_with_capacity(nonempty + 1, "vector pointers")?;
                hptr.push(0);
                for (v, w) in ptr.windows(2).enumerate() {
                    if w[1] > w[0] {
                        hlist.push(v);
                        hptr.push(w[1]);
                    }
                }
                Ok(Storage::Hypersparse {
                    hlist,
                    ptr: hptr,
                    idx,
                    values,
                })
            }
            Sparsity::Bitmap | Sparsity::Full => {
                let len = dense_len(vlen, vdim)?;
                if target == Sparsity::Full {
                    check_full(idx.len(), len)?;
                }
                let mut present = try_filled(len, false, "bitmap presence")?;
                let mut dense = try_filled(len, T::default(), "dense values")?;
                for v in 0..vdim {
                    for p in ptr[v]..ptr[v + 1] {
                        let pos = v * vlen + idx[p];
                        present[pos] = true;
                        dense[pos] = values[p];
                    }
                }
                if target == Sparsity::Full {
                    Ok(Storage::Full { values: dense })
                } else {
                    Ok(Storage::Bitmap {
                        present,
                        values: dense,
                        nvals: idx.len(),
                    })
                }
            }
        }
    }
}

fn check_hyper(nonempty: usize, vdim: usize) -> Result<()> {
    if nonempty >= vdim {
        return Err(Error::invalid(format!(
            "cannot convert to hypersparse: {} of {} vectors hold entries",
            nonempty, vdim
        )));
    }
    Ok(())
}

/// True when some vector of sparse storage holds no entry
fn has_empty_vector<T>(storage: &Storage<T>) -> bool {
    match storage {
        Storage::Sparse { ptr, .. } => ptr.windows(2).any(|w| w[0] == w[1]),
        _ => false,
    }
}

fn check_full(nvals: usize, len: usize) -> Result<()> {
    if nvals != len {
        return Err(Error::invalid(format!(
            "cannot convert to full: {} of {} positions present",
            nvals, len
        )));
    }
    Ok(())
}

/// Re-lays compressed vectors along the other dimension
///
/// Returns sparse storage with `vlen` vectors of length `vdim`.
fn transpose_sparse<T: Scalar>(
    vdim: usize,
    vlen: usize,
    ptr: &[usize],
    idx: &[usize],
    values: &[T],
) -> Result<Storage<T>> {
    let nnz = idx.len();

    // Count entries landing in each new vector
    let mut counts = try_filled(vlen, 0usize, "vector pointers")?;
    for &i in idx {
        counts[i] += 1;
    }
    let new_ptr = exclusive_scan(&counts);

    let mut next = new_ptr.clone();
    let mut new_idx = try_filled(nnz, 0usize, "entry indices")?;
    let mut perm = try_filled(nnz, 0usize, "transpose permutation")?;
    for v in 0..vdim {
        for p in ptr[v]..ptr[v + 1] {
            let q = next[idx[p]];
            next[idx[p]] += 1;
            new_idx[q] = v;
            perm[q] = p;
        }
    }

    let mut new_values = try_filled(nnz, T::default(), "entry values")?;
    permute(Some(&perm), values, &mut new_values, nnz)?;

    Ok(Storage::Sparse {
        ptr: new_ptr,
        idx: new_idx,
        values: new_values,
    })
}

impl<T: Scalar> Matrix<T> {
    /// Copy of this matrix stored as `target`
    ///
    /// Converting to [`Sparsity::Full`] fails unless every position holds
    /// an entry, and converting to [`Sparsity::Hypersparse`] fails unless
    /// at least one vector is empty.
    pub fn convert(&self, target: Sparsity) -> Result<Matrix<T>> {
        let storage = self.storage.convert(self.vlen(), self.vdim(), target)?;
        Ok(Matrix::from_parts_unchecked(
            self.nrows(),
            self.ncols(),
            self.orientation(),
            *self.control(),
            storage,
        ))
    }

    /// Consuming variant of [`Matrix::convert`]
    pub fn into_sparsity(self, target: Sparsity) -> Result<Matrix<T>> {
        let (vlen, vdim) = (self.vlen(), self.vdim());
        let (nrows, ncols, orientation, control) =
            (self.nrows(), self.ncols(), self.orientation(), *self.control());
        let storage = self.storage.into_sparsity(vlen, vdim, target)?;
        Ok(Matrix::from_parts_unchecked(
            nrows,
            ncols,
            orientation,
            control,
            storage,
        ))
    }

    /// Copy of this matrix stored along `orientation`, keeping its layout
    ///
    /// A hypersparse matrix with no empty vector along the new
    /// orientation comes back sparse.
    pub fn to_orientation(&self, orientation: Orientation) -> Result<Matrix<T>> {
        if orientation == self.orientation() {
            return Ok(self.clone());
        }
        let (vlen, vdim) = (self.vlen(), self.vdim());
        let sparsity = self.sparsity();

        let storage = match &self.storage {
            // Dense layouts re-lay position by position
            Storage::Bitmap { .. } | Storage::Full { .. } => {
                let len = dense_len(vlen, vdim)?;
                let mut perm = try_filled(len, 0usize, "transpose permutation")?;
                for v in 0..vlen {
                    for i in 0..vdim {
                        perm[v * vdim + i] = i * vlen + v;
                    }
                }
                let mut values = try_filled(len, T::default(), "dense values")?;
                permute(Some(&perm), self.storage.values(), &mut values, len)?;
                match &self.storage {
                    Storage::Bitmap { present, nvals, .. } => {
                        let mut new_present = try_filled(len, false, "bitmap presence")?;
                        permute(Some(&perm), present, &mut new_present, len)?;
                        Storage::Bitmap {
                            present: new_present,
                            values,
                            nvals: *nvals,
                        }
                    }
                    _ => Storage::Full { values },
                }
            }
            _ => {
                let sparse = self.storage.convert(vlen, vdim, Sparsity::Sparse)?;
                let transposed = match &sparse {
                    Storage::Sparse { ptr, idx, values } => {
                        transpose_sparse(vdim, vlen, ptr, idx, values)?
                    }
                    _ => return Err(Error::invalid("expected sparse storage")),
                };
                let target = match sparsity {
                    Sparsity::Hypersparse if !has_empty_vector(&transposed) => Sparsity::Sparse,
                    other => other,
                };
                transposed.into_sparsity(vdim, vlen, target)?
            }
        };

        Ok(Matrix::from_parts_unchecked(
            self.nrows(),
            self.ncols(),
            orientation,
            *self.control(),
            storage,
        ))
    }
}
