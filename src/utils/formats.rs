//! Utilities for converting between our matrix type and external libraries

use sprs::CsMat;

use crate::error::{Error, Result};
use crate::matrix::config::{Orientation, Sparsity};
use crate::matrix::storage::Storage;
use crate::matrix::Matrix;
use crate::semiring::Scalar;

/// Converts a matrix to sprs `CsMat`
///
/// A by-row matrix becomes CSR and a by-column matrix CSC; every layout
/// is expanded to compressed form first.
pub fn to_sprs<T: Scalar>(matrix: &Matrix<T>) -> Result<CsMat<T>> {
    let shape = matrix.shape();
    let sparse = matrix.convert(Sparsity::Sparse)?;
    let orientation = sparse.orientation();
    match sparse.storage {
        Storage::Sparse { ptr, idx, values } => Ok(match orientation {
            Orientation::ByRow => CsMat::new(shape, ptr, idx, values),
            Orientation::ByCol => CsMat::new_csc(shape, ptr, idx, values),
        }),
        _ => Err(Error::invalid("expected sparse storage")),
    }
}

/// Converts sprs `CsMat` to a sparse matrix, keeping its orientation
pub fn from_sprs<T: Scalar>(matrix: CsMat<T>) -> Result<Matrix<T>> {
    let (n_rows, n_cols) = matrix.shape();
    let is_csr = matrix.is_csr();
    let (indptr, indices, data) = matrix.into_raw_storage();

    if is_csr {
        Matrix::from_csr(n_rows, n_cols, indptr, indices, data)
    } else {
        Matrix::from_csc(n_rows, n_cols, indptr, indices, data)
    }
}
