//! # Parallel masked saxpy multiplication
//!
//! This module drives the whole kernel on a Rayon worker pool:
//!
//! 1. Plan tasks from per-column work estimates
//! 2. Count the output pattern exactly (symbolic phase)
//! 3. Allocate exact-size output arrays from the column offsets
//! 4. Fill indices and values (numeric phase)
//! 5. Convert the result to its final layout and orientation

use std::borrow::Cow;

use tracing::{debug, info_span};

use crate::assemble::{self, OutputBuffers};
use crate::error::{Error, Result};
use crate::mask::Mask;
use crate::matrix::config::{MultiplyConfig, Orientation};
use crate::matrix::Matrix;
use crate::numeric;
use crate::schedule;
use crate::semiring::{BinaryOp, Scalar, Semiring};
use crate::symbolic;

/// Checks that `A`, `B` and the mask describe a valid product
pub(crate) fn check_operands<T: Scalar>(
    a: &Matrix<T>,
    b: &Matrix<T>,
    mask: Option<&Mask<'_>>,
) -> Result<()> {
    if a.ncols() != b.nrows() {
        return Err(Error::DimensionMismatch {
            context: "inner dimensions of A and B",
            expected: (a.ncols(), b.ncols()),
            found: b.shape(),
        });
    }
    if let Some(mask) = mask {
        let shape = (a.nrows(), b.ncols());
        if mask.shape() != shape {
            return Err(Error::DimensionMismatch {
                context: "mask shape",
                expected: shape,
                found: mask.shape(),
            });
        }
    }
    Ok(())
}

/// Borrows `m` when already by column, otherwise re-lays a copy
fn by_col<T: Scalar>(m: &Matrix<T>) -> Result<Cow<'_, Matrix<T>>> {
    match m.orientation() {
        Orientation::ByCol => Ok(Cow::Borrowed(m)),
        Orientation::ByRow => Ok(Cow::Owned(m.to_orientation(Orientation::ByCol)?)),
    }
}

/// Computes `C⟨M⟩ = A ⊕.⊗ B` with explicit configuration
///
/// # Arguments
///
/// * `a` - Left input matrix, any layout or orientation
/// * `b` - Right input matrix, any layout or orientation
/// * `semiring` - Additive monoid and multiply operator
/// * `mask` - Optional structural mask, possibly complemented
/// * `config` - Thread count, planning thresholds and output format
///
/// # Returns
///
/// A new matrix holding exactly the positions that have at least one
/// permitted product. Operand errors are reported before any work.
///
/// # Examples
///
/// ```
/// use semiring_saxpy::{multiply_with_config, plus_times, Matrix, MultiplyConfig};
///
/// let a = Matrix::identity(2, 1.0);
/// let b = Matrix::from_triplets(2, 2, &[(0, 1, 5.0)]).unwrap();
///
/// let c = multiply_with_config(&a, &b, &plus_times(), None, &MultiplyConfig::with_threads(2))
///     .unwrap();
/// assert_eq!(c.get(0, 1), Some(5.0));
/// assert_eq!(c.nvals(), 1);
/// ```
pub fn multiply_with_config<T, A, M>(
    a: &Matrix<T>,
    b: &Matrix<T>,
    semiring: &Semiring<T, A, M>,
    mask: Option<&Mask<'_>>,
    config: &MultiplyConfig,
) -> Result<Matrix<T>>
where
    T: Scalar,
    A: BinaryOp<T>,
    M: BinaryOp<T>,
{
    config.validate()?;
    check_operands(a, b, mask)?;
    a.validate()?;
    b.validate()?;

    let span = info_span!(
        "multiply",
        a = ?a.shape(),
        b = ?b.shape(),
        masked = mask.is_some(),
        threads = config.system_params.n_threads
    );
    let _guard = span.enter();

    let a = by_col(a)?;
    let b = by_col(b)?;

    let n_threads = config.system_params.n_threads;
    if n_threads == rayon::current_num_threads() {
        return run(&a, &b, semiring, mask, config);
    }
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(n_threads)
        .build()?;
    pool.install(|| run(&a, &b, semiring, mask, config))
}

fn run<T, A, M>(
    a: &Matrix<T>,
    b: &Matrix<T>,
    semiring: &Semiring<T, A, M>,
    mask: Option<&Mask<'_>>,
    config: &MultiplyConfig,
) -> Result<Matrix<T>>
where
    T: Scalar,
    A: BinaryOp<T>,
    M: BinaryOp<T>,
{
    let (a_pattern, b_pattern) = (a.pattern(), b.pattern());

    let plan = schedule::plan_tasks(&a_pattern, &b_pattern, mask, config);
    let analysis = symbolic::analyze(&a_pattern, &b_pattern, mask, &plan, config)?;

    let mut buffers = OutputBuffers::<T>::allocate(&analysis.column_counts)?;
    debug!(nvals = buffers.nvals(), "allocated result");

    numeric::compute(
        a,
        b,
        semiring,
        mask,
        &plan,
        &analysis,
        &buffers.ptr,
        &mut buffers.idx,
        &mut buffers.values,
    )?;

    assemble::finalize(a.nrows(), b.ncols(), buffers, config)
}
