//! Reference implementation of masked semiring multiplication
//!
//! This provides a baseline for correctness testing and performance comparison.
//! It works column by column with a hashmap accumulator, folding every
//! product into the additive identity, and shares no code with the
//! planned kernel beyond the matrix types.

use std::collections::HashMap;

use crate::error::Result;
use crate::mask::Mask;
use crate::matrix::builder::SparseBuilder;
use crate::matrix::config::{FormatControl, Orientation};
use crate::matrix::Matrix;
use crate::parallel::check_operands;
use crate::semiring::{BinaryOp, Scalar, Semiring};

/// Computes `C⟨M⟩ = A ⊕.⊗ B` sequentially
///
/// The result is a by-column sparse matrix.
pub fn reference_multiply<T, A, M>(
    a: &Matrix<T>,
    b: &Matrix<T>,
    semiring: &Semiring<T, A, M>,
    mask: Option<&Mask<'_>>,
) -> Result<Matrix<T>>
where
    T: Scalar,
    A: BinaryOp<T>,
    M: BinaryOp<T>,
{
    check_operands(a, b, mask)?;

    let a = a.to_orientation(Orientation::ByCol)?;
    let b = b.to_orientation(Orientation::ByCol)?;
    let (n_rows, n_cols) = (a.nrows(), b.ncols());

    let mut builder = SparseBuilder::with_capacity(n_rows, n_cols, 0)?;

    for j in 0..n_cols {
        // Use a hashmap as an accumulator for this column
        let mut accum: HashMap<usize, T> = HashMap::new();

        for (k, b_val) in b.vector_iter(j) {
            for (i, a_val) in a.vector_iter(k) {
                if mask.map_or(true, |m| m.permits(i, j)) {
                    let slot = accum.entry(i).or_insert_with(|| semiring.add().identity());
                    *slot = semiring.combine(*slot, semiring.multiply(a_val, b_val));
                }
            }
        }

        let mut column: Vec<_> = accum.into_iter().collect();
        column.sort_unstable_by_key(|&(i, _)| i);
        for (i, value) in column {
            builder.push(j, i, value)?;
        }
    }

    Ok(Matrix::from_parts_unchecked(
        n_rows,
        n_cols,
        Orientation::ByCol,
        FormatControl::default(),
        builder.finish(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semiring::{min_plus, plus_times};

    #[test]
    fn test_reference_small() {
        // A = [1 0; 3 4], B = [0 2; 1 0], C = [0 2; 4 6]
        let a = Matrix::from_triplets(2, 2, &[(0, 0, 1.0), (1, 0, 3.0), (1, 1, 4.0)]).unwrap();
        let b = Matrix::from_triplets(2, 2, &[(1, 0, 1.0), (0, 1, 2.0)]).unwrap();
        let c = reference_multiply(&a, &b, &plus_times(), None).unwrap();

        assert_eq!(c.nvals(), 3);
        assert_eq!(c.get(0, 0), None);
        assert_eq!(c.get(0, 1), Some(2.0));
        assert_eq!(c.get(1, 0), Some(4.0));
        assert_eq!(c.get(1, 1), Some(6.0));
    }

    #[test]
    fn test_reference_masked_tropical() {
        // Path lengths: 0 -> 1 costs 2, 1 -> 2 costs 3, 0 -> 2 costs 10
        let g = Matrix::from_triplets(3, 3, &[(0, 1, 2), (1, 2, 3), (0, 2, 10)]).unwrap();
        let c = reference_multiply(&g, &g, &min_plus::<i32>(), None).unwrap();
        assert_eq!(c.nvals(), 1);
        assert_eq!(c.get(0, 2), Some(5));

        let m = Matrix::from_triplets(3, 3, &[(0, 2, ())]).unwrap();
        let mask = Mask::complement(&m).unwrap();
        let c = reference_multiply(&g, &g, &min_plus::<i32>(), Some(&mask)).unwrap();
        assert_eq!(c.nvals(), 0);
    }

    #[test]
    fn test_reference_rejects_bad_shapes() {
        let a = Matrix::<f64>::empty(2, 3);
        let b = Matrix::<f64>::empty(2, 3);
        assert!(reference_multiply(&a, &b, &plus_times(), None).is_err());
    }
}
