//! Structural mask filter
//!
//! A mask restricts which output positions may receive an entry. Only the
//! presence of mask entries matters, never their values. With the
//! complement flag set a position is permitted exactly when the mask has
//! no entry there.

use crate::error::Result;
use crate::matrix::config::Orientation;
use crate::matrix::storage::{Pattern, PatternView};
use crate::matrix::Matrix;
use crate::semiring::Scalar;

/// A structural mask over a matrix of any value type
pub struct Mask<'a> {
    nrows: usize,
    ncols: usize,
    complement: bool,
    source: MaskSource<'a>,
}

enum MaskSource<'a> {
    /// By-column mask used in place
    Borrowed(PatternView<'a>),
    /// By-row mask re-laid by column
    Owned(Matrix<()>),
}

impl<'a> Mask<'a> {
    /// Permits positions where `mask` has an entry
    pub fn new<M: Scalar>(mask: &'a Matrix<M>) -> Result<Self> {
        Self::structural(mask, false)
    }

    /// Permits positions where `mask` has no entry
    pub fn complement<M: Scalar>(mask: &'a Matrix<M>) -> Result<Self> {
        Self::structural(mask, true)
    }

    /// Structural mask with an explicit complement flag
    pub fn structural<M: Scalar>(mask: &'a Matrix<M>, complement: bool) -> Result<Self> {
        let source = match mask.orientation() {
            Orientation::ByCol => MaskSource::Borrowed(mask.pattern()),
            Orientation::ByRow => {
                MaskSource::Owned(mask.structure().to_orientation(Orientation::ByCol)?)
            }
        };
        Ok(Self {
            nrows: mask.nrows(),
            ncols: mask.ncols(),
            complement,
            source,
        })
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.nrows, self.ncols)
    }

    pub fn is_complemented(&self) -> bool {
        self.complement
    }

    fn view(&self) -> PatternView<'_> {
        match &self.source {
            MaskSource::Borrowed(view) => *view,
            MaskSource::Owned(matrix) => matrix.pattern(),
        }
    }

    /// Whether output position `(i, j)` may hold an entry
    pub fn permits(&self, i: usize, j: usize) -> bool {
        self.view().contains(i, j) != self.complement
    }

    /// Lookup structure for column `j`
    pub fn column(&self, j: usize) -> MaskColumn<'_> {
        let view = self.view();
        let kind = match view.pattern {
            Pattern::Sparse { idx, .. } | Pattern::Hypersparse { idx, .. } => {
                ColumnKind::Indices(view.compressed_range(j).map_or(&[][..], |r| &idx[r]))
            }
            Pattern::Bitmap { present } => {
                ColumnKind::Flags(&present[j * view.vlen..(j + 1) * view.vlen])
            }
            Pattern::Full => ColumnKind::All,
        };
        MaskColumn {
            kind,
            complement: self.complement,
        }
    }

    /// Number of permitted positions in every column
    pub fn permitted_counts(&self) -> Vec<usize> {
        let counts = self.view().vector_counts();
        if self.complement {
            counts.into_iter().map(|c| self.nrows - c).collect()
        } else {
            counts
        }
    }
}

/// Mask lookup narrowed to one output column
#[derive(Clone, Copy)]
pub struct MaskColumn<'a> {
    kind: ColumnKind<'a>,
    complement: bool,
}

#[derive(Clone, Copy)]
enum ColumnKind<'a> {
    Indices(&'a [usize]),
    Flags(&'a [bool]),
    All,
}

impl<'a> MaskColumn<'a> {
    /// Column view permitting every position
    pub fn unmasked() -> Self {
        Self {
            kind: ColumnKind::All,
            complement: false,
        }
    }

    /// Column `j` of `mask`, or every position when there is no mask
    pub fn of(mask: Option<&'a Mask<'_>>, j: usize) -> Self {
        mask.map_or_else(Self::unmasked, |m| m.column(j))
    }

    #[inline]
    pub fn permits(&self, i: usize) -> bool {
        let present = match self.kind {
            ColumnKind::Indices(indices) => indices.binary_search(&i).is_ok(),
            ColumnKind::Flags(flags) => flags[i],
            ColumnKind::All => true,
        };
        present != self.complement
    }
}
