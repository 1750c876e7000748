//! # semiring-saxpy: masked sparse multiplication over arbitrary semirings
//!
//! This library computes `C⟨M⟩ = A ⊕.⊗ B` for sparse matrices whose
//! values live in any [`Semiring`]: ordinary arithmetic, tropical
//! (min-plus, max-plus), boolean reachability, or user-defined closures.
//!
//! ## Overview
//!
//! Each output column `C(:,j)` is built saxpy-style as the semiring sum
//! of the columns `A(:,k)` scaled by the entries `B(k,j)`. The work runs
//! on a Rayon worker pool in two phases over the same task plan:
//!
//! 1. **Planning**: estimate per-column work, group light columns into
//!    coarse tasks and split heavy columns into fine tasks
//! 2. **Symbolic phase**: count the exact output pattern of every column,
//!    choosing a dense-gather or hash accumulator per column
//! 3. **Numeric phase**: fill pre-sized output slices, merging fine-task
//!    partial columns with the additive monoid
//! 4. **Assembly**: pick the result layout (hypersparse, sparse, bitmap or
//!    full) from the format-control hints
//!
//! An optional structural [`Mask`], possibly complemented, restricts the
//! positions that may receive an entry. Masked-out products are never
//! formed.
//!
//! ## Usage
//!
//! ```
//! use semiring_saxpy::{multiply, plus_times, Mask, Matrix};
//!
//! // A = [1 0]    B = [0 2]
//! //     [3 4]        [1 0]
//! let a = Matrix::from_triplets(2, 2, &[(0, 0, 1.0), (1, 0, 3.0), (1, 1, 4.0)]).unwrap();
//! let b = Matrix::from_triplets(2, 2, &[(1, 0, 1.0), (0, 1, 2.0)]).unwrap();
//!
//! let c = multiply(&a, &b, &plus_times(), None).unwrap();
//! assert_eq!(c.nvals(), 3);
//! assert_eq!(c.get(1, 1), Some(6.0));
//!
//! // Keep only the diagonal
//! let eye = Matrix::identity(2, true);
//! let mask = Mask::new(&eye).unwrap();
//! let d = multiply(&a, &b, &plus_times(), Some(&mask)).unwrap();
//! assert_eq!(d.nvals(), 1);
//! assert_eq!(d.get(1, 1), Some(6.0));
//! ```
//!
//! A sequential reference is available for validation:
//!
//! ```
//! use semiring_saxpy::{reference_multiply, min_plus, Matrix};
//!
//! let g = Matrix::from_triplets(3, 3, &[(0, 1, 2), (1, 2, 3)]).unwrap();
//! let paths = reference_multiply(&g, &g, &min_plus::<i32>(), None).unwrap();
//! assert_eq!(paths.get(0, 2), Some(5));
//! ```

pub mod accumulator;
pub mod assemble;
pub mod constants;
pub mod error;
pub mod mask;
pub mod matrix;
pub mod numeric;
pub mod parallel;
pub mod schedule;
pub mod semiring;
pub mod symbolic;
pub mod utils;

// Re-export primary components
pub use error::{Error, Result};
pub use mask::Mask;
pub use matrix::config::{
    FormatControl, MultiplyConfig, OptionField, OptionValue, Orientation, Sparsity,
    SparsityControl, SystemParameters,
};
pub use matrix::{reference_multiply, Matrix, SparseBuilder};
pub use parallel::multiply_with_config;
pub use schedule::{plan_tasks, Task, TaskPlan};
pub use semiring::{
    lor_land, max_min, max_plus, min_plus, min_second, plus_pair, plus_times, BinaryOp,
    BuiltinSemiring, Monoid, Scalar, Semiring,
};
pub use utils::{from_sprs, to_sprs};

/// Computes `C⟨M⟩ = A ⊕.⊗ B` with the default configuration
///
/// This is the main entry point for the library.
///
/// # Arguments
///
/// * `a` - Left input matrix
/// * `b` - Right input matrix
/// * `semiring` - Additive monoid and multiply operator
/// * `mask` - Optional structural mask over the result
///
/// # Returns
///
/// The product, stored by column in the layout chosen by the default
/// format control.
pub fn multiply<T, A, M>(
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
    multiply_with_config(a, b, semiring, mask, &MultiplyConfig::default())
}

/// Version information for the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
