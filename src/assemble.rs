//! Output allocation and final format choice
//!
//! The symbolic column counts are scanned into column offsets, and the
//! exact-size index and value arrays are allocated before the numeric
//! phase runs. Once filled, the by-column sparse result is turned into
//! the layout and orientation the format-control settings call for.

use tracing::debug;

use crate::error::Result;
use crate::matrix::config::{FormatControl, MultiplyConfig, Orientation, Sparsity};
use crate::matrix::storage::Storage;
use crate::matrix::Matrix;
use crate::semiring::Scalar;
use crate::utils::{exclusive_scan, try_filled};

/// Exact-size output arrays of a by-column sparse result
pub struct OutputBuffers<T> {
    /// Column offsets, length `ncols + 1`
    pub ptr: Vec<usize>,
    pub idx: Vec<usize>,
    pub values: Vec<T>,
}

impl<T: Scalar> OutputBuffers<T> {
    /// Lays out the result from its per-column entry counts
    pub fn allocate(column_counts: &[usize]) -> Result<Self> {
        let ptr = exclusive_scan(column_counts);
        let nvals = ptr[column_counts.len()];
        Ok(Self {
            ptr,
            idx: try_filled(nvals, 0, "result indices")?,
            values: try_filled(nvals, T::default(), "result values")?,
        })
    }

    pub fn nvals(&self) -> usize {
        self.idx.len()
    }
}

/// Picks the result layout from its shape and the format-control hints
///
/// Full wins when every position is present; then bitmap at or above the
/// bitmap switch, then hypersparse when the fraction of non-empty vectors
/// is at most the hyper switch, then sparse. Hypersparse is never chosen
/// when every vector holds an entry. Only permitted layouts are chosen;
/// when the preferred ones are all forbidden the fallback order is
/// sparse, hypersparse, bitmap. A full-only control on a matrix with
/// missing entries yields a bitmap, and a hypersparse-only control on a
/// matrix without empty vectors yields sparse.
///
/// # Arguments
///
/// * `control` - Permitted layouts and switch thresholds
/// * `vlen`, `vdim` - Vector geometry of the result
/// * `nvals` - Entry count
/// * `nonempty` - Number of vectors with at least one entry
pub fn choose_sparsity(
    control: &FormatControl,
    vlen: usize,
    vdim: usize,
    nvals: usize,
    nonempty: usize,
) -> Sparsity {
    let allowed = control.sparsity_control();
    let len = vlen.checked_mul(vdim);
    let is_full = len == Some(nvals);

    if is_full && allowed.allows(Sparsity::Full) {
        return Sparsity::Full;
    }
    if let Some(len) = len.filter(|&len| len > 0) {
        let density = nvals as f64 / len as f64;
        if allowed.allows(Sparsity::Bitmap) && density >= control.bitmap_switch() {
            return Sparsity::Bitmap;
        }
    }
    let hyper_possible = nonempty < vdim;
    if allowed.allows(Sparsity::Hypersparse)
        && hyper_possible
        && nonempty as f64 <= control.hyper_switch() * vdim as f64
    {
        return Sparsity::Hypersparse;
    }

    [Sparsity::Sparse, Sparsity::Hypersparse, Sparsity::Bitmap]
        .into_iter()
        .find(|&s| allowed.allows(s) && (s != Sparsity::Hypersparse || hyper_possible))
        .unwrap_or(if allowed.allows(Sparsity::Full) {
            Sparsity::Bitmap
        } else {
            Sparsity::Sparse
        })
}

/// Wraps the filled buffers as a matrix in its final format
///
/// # Arguments
///
/// * `nrows`, `ncols` - Shape of the result
/// * `buffers` - Filled by-column sparse arrays
/// * `config` - Output format control and orientation
pub fn finalize<T: Scalar>(
    nrows: usize,
    ncols: usize,
    buffers: OutputBuffers<T>,
    config: &MultiplyConfig,
) -> Result<Matrix<T>> {
    let OutputBuffers { ptr, idx, values } = buffers;
    let control = config.output_control;
    let mut c = Matrix::from_parts_unchecked(
        nrows,
        ncols,
        Orientation::ByCol,
        control,
        Storage::Sparse { ptr, idx, values },
    );
    if config.output_orientation == Orientation::ByRow {
        c = c.to_orientation(Orientation::ByRow)?;
    }

    let sparsity = choose_sparsity(
        &control,
        c.vlen(),
        c.vdim(),
        c.nvals(),
        c.nonempty_vectors(),
    );
    debug!(?sparsity, nvals = c.nvals(), "assembled result");
    c.into_sparsity(sparsity)
}
