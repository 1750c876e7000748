//! Append-only write path for compressed layouts

use crate::error::{Error, Result};
use crate::matrix::storage::Storage;
use crate::utils::try_with_capacity;

/// Builds sparse storage by appending entries vector by vector
///
/// Vectors must be visited in ascending order and, within a vector,
/// indices must arrive strictly ascending.
pub struct SparseBuilder<T> {
    vlen: usize,
    vdim: usize,
    ptr: Vec<usize>,
    idx: Vec<usize>,
    values: Vec<T>,
    current: usize,
}

impl<T> SparseBuilder<T> {
    /// Creates a builder for `vdim` vectors of length `vlen`, reserving room
    /// for `capacity` entries
    pub fn with_capacity(vlen: usize, vdim: usize, capacity: usize) -> Result<Self> {
        let mut ptr = try_with_capacity(vdim + 1, "vector pointers")?;
        ptr.push(0);
        Ok(Self {
            vlen,
            vdim,
            ptr,
            idx: try_with_capacity(capacity, "entry indices")?,
            values: try_with_capacity(capacity, "entry values")?,
            current: 0,
        })
    }

    /// Appends entry `i` of vector `v`
    pub fn push(&mut self, v: usize, i: usize, value: T) -> Result<()> {
        if v >= self.vdim || i >= self.vlen {
            return Err(Error::invalid(format!(
                "entry ({}, {}) outside {} vectors of length {}",
                i, v, self.vdim, self.vlen
            )));
        }
        if v < self.current {
            return Err(Error::invalid(format!(
                "vector {} appended after vector {}",
                v, self.current
            )));
        }
        if v > self.current {
            while self.ptr.len() <= v {
                self.ptr.push(self.idx.len());
            }
            self.current = v;
        } else if self.ptr[self.ptr.len() - 1] < self.idx.len() {
            if let Some(&last) = self.idx.last() {
                if last >= i {
                    return Err(Error::invalid(format!(
                        "index {} of vector {} does not follow {}",
                        i, v, last
                    )));
                }
            }
        }
        self.idx.push(i);
        self.values.push(value);
        Ok(())
    }

    /// Entries appended so far
    pub fn len(&self) -> usize {
        self.idx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.idx.is_empty()
    }

    pub(crate) fn finish(mut self) -> Storage<T> {
        while self.ptr.len() <= self.vdim {
            self.ptr.push(self.idx.len());
        }
        Storage::Sparse {
            ptr: self.ptr,
            idx: self.idx,
            values: self.values,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_skips_empty_vectors() {
        let mut builder = SparseBuilder::with_capacity(3, 4, 3).unwrap();
        builder.push(1, 0, 10).unwrap();
        builder.push(1, 2, 20).unwrap();
        builder.push(3, 1, 30).unwrap();
        assert_eq!(builder.len(), 3);

        match builder.finish() {
            Storage::Sparse { ptr, idx, values } => {
                assert_eq!(ptr, vec![0, 0, 2, 2, 3]);
                assert_eq!(idx, vec![0, 2, 1]);
                assert_eq!(values, vec![10, 20, 30]);
            }
            _ => panic!("builder must produce sparse storage"),
        }
    }

    #[test]
    fn test_builder_rejects_out_of_order() {
        let mut builder = SparseBuilder::with_capacity(3, 3, 0).unwrap();
        builder.push(1, 1, 1).unwrap();
        assert!(builder.push(1, 1, 2).is_err());
        assert!(builder.push(0, 0, 3).is_err());
        assert!(builder.push(2, 3, 4).is_err());
        // A new vector may start at any index
        assert!(builder.push(2, 0, 5).is_ok());
    }

    #[test]
    fn test_builder_empty() {
        let builder = SparseBuilder::<f64>::with_capacity(2, 2, 0).unwrap();
        assert!(builder.is_empty());
        match builder.finish() {
            Storage::Sparse { ptr, .. } => assert_eq!(ptr, vec![0, 0, 0]),
            _ => panic!("builder must produce sparse storage"),
        }
    }
}
