//! Physical layouts and uniform read access over them
//!
//! A matrix stores `vdim` vectors of length `vlen`. For a by-column matrix
//! the vectors are its columns and each index is a row index; a by-row
//! matrix swaps the two. Dense layouts (bitmap, full) place entry `i` of
//! vector `v` at position `v * vlen + i`.

use std::ops::Range;

use crate::error::{Error, Result};
use crate::matrix::config::Sparsity;

/// Owned storage for one of the four layouts
#[derive(Clone)]
pub(crate) enum Storage<T> {
    Sparse {
        ptr: Vec<usize>,
        idx: Vec<usize>,
        values: Vec<T>,
    },
    Hypersparse {
        hlist: Vec<usize>,
        ptr: Vec<usize>,
        idx: Vec<usize>,
        values: Vec<T>,
    },
    Bitmap {
        present: Vec<bool>,
        values: Vec<T>,
        nvals: usize,
    },
    Full {
        values: Vec<T>,
    },
}

impl<T> Storage<T> {
    pub(crate) fn sparsity(&self) -> Sparsity {
        match self {
            Storage::Sparse { .. } => Sparsity::Sparse,
            Storage::Hypersparse { .. } => Sparsity::Hypersparse,
            Storage::Bitmap { .. } => Sparsity::Bitmap,
            Storage::Full { .. } => Sparsity::Full,
        }
    }

    pub(crate) fn nvals(&self) -> usize {
        match self {
            Storage::Sparse { idx, .. } | Storage::Hypersparse { idx, .. } => idx.len(),
            Storage::Bitmap { nvals, .. } => *nvals,
            Storage::Full { values } => values.len(),
        }
    }

    pub(crate) fn pattern(&self, vlen: usize, vdim: usize) -> PatternView<'_> {
        let pattern = match self {
            Storage::Sparse { ptr, idx, .. } => Pattern::Sparse { ptr, idx },
            Storage::Hypersparse { hlist, ptr, idx, .. } => Pattern::Hypersparse { hlist, ptr, idx },
            Storage::Bitmap { present, .. } => Pattern::Bitmap { present },
            Storage::Full { .. } => Pattern::Full,
        };
        PatternView { vlen, vdim, pattern }
    }

    pub(crate) fn values(&self) -> &[T] {
        match self {
            Storage::Sparse { values, .. }
            | Storage::Hypersparse { values, .. }
            | Storage::Bitmap { values, .. }
            | Storage::Full { values } => values,
        }
    }

    /// Checks every structural invariant of the layout
    pub(crate) fn validate(&self, vlen: usize, vdim: usize) -> Result<()> {
        match self {
            Storage::Sparse { ptr, idx, values } => {
                if ptr.len() != vdim + 1 {
                    return Err(Error::invalid(format!(
                        "pointer array has length {}, expected {}",
                        ptr.len(),
                        vdim + 1
                    )));
                }
                validate_compressed(ptr, idx, values.len(), vlen)
            }
            Storage::Hypersparse { hlist, ptr, idx, values } => {
                if ptr.len() != hlist.len() + 1 {
                    return Err(Error::invalid(format!(
                        "hypersparse pointer array has length {}, expected {}",
                        ptr.len(),
                        hlist.len() + 1
                    )));
                }
                if hlist.windows(2).any(|w| w[0] >= w[1]) {
                    return Err(Error::invalid("hyperlist must be strictly ascending"));
                }
                if hlist.last().map_or(false, |&v| v >= vdim) {
                    return Err(Error::invalid("hyperlist entry out of bounds"));
                }
                if hlist.len() >= vdim {
                    return Err(Error::invalid(format!(
                        "hyperlist lists {} of {} vectors, at least one must be left out",
                        hlist.len(),
                        vdim
                    )));
                }
                if ptr.windows(2).any(|w| w[0] == w[1]) {
                    return Err(Error::invalid("hyperlist names an empty vector"));
                }
                validate_compressed(ptr, idx, values.len(), vlen)
            }
            Storage::Bitmap { present, values, nvals } => {
                let len = dense_len(vlen, vdim)?;
                if present.len() != len || values.len() != len {
                    return Err(Error::invalid(format!(
                        "bitmap arrays must have length {}",
                        len
                    )));
                }
                let counted = present.iter().filter(|&&p| p).count();
                if counted != *nvals {
                    return Err(Error::invalid(format!(
                        "bitmap records {} entries but marks {}",
                        nvals, counted
                    )));
                }
                Ok(())
            }
            Storage::Full { values } => {
                let len = dense_len(vlen, vdim)?;
                if values.len() != len {
                    return Err(Error::invalid(format!(
                        "full value array must have length {}",
                        len
                    )));
                }
                Ok(())
            }
        }
    }
}

/// Number of positions of a dense `vlen × vdim` layout
pub(crate) fn dense_len(vlen: usize, vdim: usize) -> Result<usize> {
    vlen.checked_mul(vdim)
        .ok_or_else(|| Error::invalid(format!("dense size {} x {} overflows", vlen, vdim)))
}

fn validate_compressed(ptr: &[usize], idx: &[usize], n_values: usize, vlen: usize) -> Result<()> {
    if ptr.first() != Some(&0) {
        return Err(Error::invalid("pointer array must start at 0"));
    }
    if ptr.windows(2).any(|w| w[0] > w[1]) {
        return Err(Error::invalid("pointer array must be non-decreasing"));
    }
    let nnz = ptr[ptr.len() - 1];
    if nnz != idx.len() || idx.len() != n_values {
        return Err(Error::invalid(format!(
            "pointer array ends at {}, but there are {} indices and {} values",
            nnz,
            idx.len(),
            n_values
        )));
    }
    for w in ptr.windows(2) {
        let vector = &idx[w[0]..w[1]];
        if vector.windows(2).any(|p| p[0] >= p[1]) {
            return Err(Error::invalid("indices within a vector must be strictly ascending"));
        }
        if let Some(&last) = vector.last() {
            if last >= vlen {
                return Err(Error::invalid(format!(
                    "index {} out of bounds (vector length {})",
                    last, vlen
                )));
            }
        }
    }
    Ok(())
}

/// Borrowed, value-free view of a layout's pattern
#[derive(Clone, Copy)]
pub enum Pattern<'a> {
    Sparse {
        ptr: &'a [usize],
        idx: &'a [usize],
    },
    Hypersparse {
        hlist: &'a [usize],
        ptr: &'a [usize],
        idx: &'a [usize],
    },
    Bitmap {
        present: &'a [bool],
    },
    Full,
}

/// A pattern together with its vector geometry
#[derive(Clone, Copy)]
pub struct PatternView<'a> {
    pub vlen: usize,
    pub vdim: usize,
    pub pattern: Pattern<'a>,
}

impl<'a> PatternView<'a> {
    /// Range of vector `v` inside the compressed index array, `None` when
    /// the layout is dense or `v` is absent from the hyperlist
    #[inline]
    pub fn compressed_range(&self, v: usize) -> Option<Range<usize>> {
        match self.pattern {
            Pattern::Sparse { ptr, .. } => Some(ptr[v]..ptr[v + 1]),
            Pattern::Hypersparse { hlist, ptr, .. } => hlist
                .binary_search(&v)
                .ok()
                .map(|k| ptr[k]..ptr[k + 1]),
            Pattern::Bitmap { .. } | Pattern::Full => None,
        }
    }

    /// Whether position `i` of vector `v` holds an entry
    #[inline]
    pub fn contains(&self, i: usize, v: usize) -> bool {
        match self.pattern {
            Pattern::Sparse { idx, .. } | Pattern::Hypersparse { idx, .. } => self
                .compressed_range(v)
                .map_or(false, |r| idx[r].binary_search(&i).is_ok()),
            Pattern::Bitmap { present } => present[v * self.vlen + i],
            Pattern::Full => true,
        }
    }

    /// Number of entries in vector `v`
    pub fn vector_len(&self, v: usize) -> usize {
        match self.pattern {
            Pattern::Sparse { .. } | Pattern::Hypersparse { .. } => {
                self.compressed_range(v).map_or(0, |r| r.len())
            }
            Pattern::Bitmap { present } => present[v * self.vlen..(v + 1) * self.vlen]
                .iter()
                .filter(|&&p| p)
                .count(),
            Pattern::Full => self.vlen,
        }
    }

    /// Entry count of every vector in one pass
    pub fn vector_counts(&self) -> Vec<usize> {
        match self.pattern {
            Pattern::Sparse { ptr, .. } => ptr.windows(2).map(|w| w[1] - w[0]).collect(),
            Pattern::Hypersparse { hlist, ptr, .. } => {
                let mut counts = vec![0; self.vdim];
                for (k, &v) in hlist.iter().enumerate() {
                    counts[v] = ptr[k + 1] - ptr[k];
                }
                counts
            }
            Pattern::Bitmap { present } => {
                if self.vlen == 0 {
                    return vec![0; self.vdim];
                }
                present
                    .chunks(self.vlen)
                    .map(|chunk| chunk.iter().filter(|&&p| p).count())
                    .collect()
            }
            Pattern::Full => vec![self.vlen; self.vdim],
        }
    }

    /// Indices of vector `v` in ascending order
    pub fn vector(&self, v: usize) -> VectorIndices<'a> {
        let inner = match self.pattern {
            Pattern::Sparse { idx, .. } | Pattern::Hypersparse { idx, .. } => {
                let range = self.compressed_range(v).unwrap_or(0..0);
                IndicesInner::Compressed(idx[range].iter())
            }
            Pattern::Bitmap { present } => IndicesInner::Bitmap {
                present: &present[v * self.vlen..(v + 1) * self.vlen],
                pos: 0,
            },
            Pattern::Full => IndicesInner::Full(0..self.vlen),
        };
        VectorIndices { inner }
    }
}

/// Iterator over the indices of one vector
pub struct VectorIndices<'a> {
    inner: IndicesInner<'a>,
}

enum IndicesInner<'a> {
    Compressed(std::slice::Iter<'a, usize>),
    Bitmap { present: &'a [bool], pos: usize },
    Full(Range<usize>),
}

impl Iterator for VectorIndices<'_> {
    type Item = usize;

    #[inline]
    fn next(&mut self) -> Option<usize> {
        match &mut self.inner {
            IndicesInner::Compressed(iter) => iter.next().copied(),
            IndicesInner::Bitmap { present, pos } => {
                while *pos < present.len() {
                    let i = *pos;
                    *pos += 1;
                    if present[i] {
                        return Some(i);
                    }
                }
                None
            }
            IndicesInner::Full(range) => range.next(),
        }
    }
}

/// Iterator over the `(index, value)` pairs of one vector
pub struct VectorEntries<'a, T> {
    inner: EntriesInner<'a, T>,
}

enum EntriesInner<'a, T> {
    Compressed {
        idx: std::slice::Iter<'a, usize>,
        values: std::slice::Iter<'a, T>,
    },
    Bitmap {
        present: &'a [bool],
        values: &'a [T],
        pos: usize,
    },
    Full {
        values: &'a [T],
        pos: usize,
    },
}

impl<'a, T> VectorEntries<'a, T> {
    pub(crate) fn new(storage: &'a Storage<T>, vlen: usize, vdim: usize, v: usize) -> Self {
        let view = storage.pattern(vlen, vdim);
        let inner = match storage {
            Storage::Sparse { idx, values, .. } | Storage::Hypersparse { idx, values, .. } => {
                let range = view.compressed_range(v).unwrap_or(0..0);
                EntriesInner::Compressed {
                    idx: idx[range.clone()].iter(),
                    values: values[range].iter(),
                }
            }
            Storage::Bitmap { present, values, .. } => EntriesInner::Bitmap {
                present: &present[v * vlen..(v + 1) * vlen],
                values: &values[v * vlen..(v + 1) * vlen],
                pos: 0,
            },
            Storage::Full { values } => EntriesInner::Full {
                values: &values[v * vlen..(v + 1) * vlen],
                pos: 0,
            },
        };
        Self { inner }
    }
}

impl<T: Copy> Iterator for VectorEntries<'_, T> {
    type Item = (usize, T);

    #[inline]
    fn next(&mut self) -> Option<(usize, T)> {
        match &mut self.inner {
            EntriesInner::Compressed { idx, values } => Some((*idx.next()?, *values.next()?)),
            EntriesInner::Bitmap {
                present,
                values,
                pos,
            } => {
                while *pos < present.len() {
                    let i = *pos;
                    *pos += 1;
                    if present[i] {
                        return Some((i, values[i]));
                    }
                }
                None
            }
            EntriesInner::Full { values, pos } => {
                let i = *pos;
                let value = *values.get(i)?;
                *pos += 1;
                Some((i, value))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match &self.inner {
            EntriesInner::Compressed { idx, .. } => idx.size_hint(),
            EntriesInner::Bitmap { present, pos, .. } => (0, Some(present.len() - pos)),
            EntriesInner::Full { values, pos } => {
                let left = values.len() - pos;
                (left, Some(left))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_sparse() -> Storage<i32> {
        // vlen 3, vdim 3: vector 0 = {0, 2}, vector 1 = {}, vector 2 = {1}
        Storage::Sparse {
            ptr: vec![0, 2, 2, 3],
            idx: vec![0, 2, 1],
            values: vec![1, 2, 3],
        }
    }

    #[test]
    fn test_sparse_entries() {
        let s = sample_sparse();
        assert!(s.validate(3, 3).is_ok());
        let v0: Vec<_> = VectorEntries::new(&s, 3, 3, 0).collect();
        assert_eq!(v0, vec![(0, 1), (2, 2)]);
        assert_eq!(VectorEntries::new(&s, 3, 3, 1).count(), 0);
        assert_eq!(s.pattern(3, 3).vector_counts(), vec![2, 0, 1]);
    }

    #[test]
    fn test_hypersparse_lookup() {
        let s = Storage::Hypersparse {
            hlist: vec![1, 4],
            ptr: vec![0, 1, 3],
            idx: vec![2, 0, 1],
            values: vec![5, 6, 7],
        };
        assert!(s.validate(3, 5).is_ok());
        let view = s.pattern(3, 5);
        assert!(view.contains(2, 1));
        assert!(!view.contains(2, 4));
        assert!(!view.contains(0, 0));
        assert_eq!(view.vector(4).collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(view.vector_counts(), vec![0, 1, 0, 0, 2]);
    }

    #[test]
    fn test_bitmap_entries() {
        let s = Storage::Bitmap {
            present: vec![true, false, false, true],
            values: vec![1, 0, 0, 4],
            nvals: 2,
        };
        assert!(s.validate(2, 2).is_ok());
        let v1: Vec<_> = VectorEntries::new(&s, 2, 2, 1).collect();
        assert_eq!(v1, vec![(1, 4)]);
        assert_eq!(s.pattern(2, 2).vector_len(0), 1);
    }

    #[test]
    fn test_validation_rejects_unsorted_indices() {
        let s = Storage::Sparse {
            ptr: vec![0, 2],
            idx: vec![1, 0],
            values: vec![1, 2],
        };
        assert!(s.validate(2, 1).is_err());
    }

    #[test]
    fn test_validation_rejects_wrong_bitmap_count() {
        let s = Storage::Bitmap {
            present: vec![true, true],
            values: vec![1, 2],
            nvals: 1,
        };
        assert!(s.validate(2, 1).is_err());
    }

    #[test]
    fn test_validation_rejects_hyperlist_covering_every_vector() {
        let s = Storage::Hypersparse {
            hlist: vec![0, 1],
            ptr: vec![0, 1, 2],
            idx: vec![0, 0],
            values: vec![1, 1],
        };
        assert!(s.validate(1, 2).is_err());
        // Same entries with a third, absent vector are fine
        assert!(s.validate(1, 3).is_ok());
    }

    #[test]
    fn test_validation_rejects_empty_listed_vector() {
        let s = Storage::Hypersparse {
            hlist: vec![0, 2],
            ptr: vec![0, 1, 1],
            idx: vec![0],
            values: vec![1],
        };
        assert!(s.validate(1, 4).is_err());
    }

    #[test]
    fn test_validation_rejects_unsorted_hyperlist() {
        let s = Storage::Hypersparse {
            hlist: vec![2, 1],
            ptr: vec![0, 1, 2],
            idx: vec![0, 0],
            values: vec![1, 1],
        };
        assert!(s.validate(1, 3).is_err());
    }
}
