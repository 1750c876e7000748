//! Configuration, format-control hints and system parameters

use crate::constants::{
    DEFAULT_BITMAP_SWITCH, DEFAULT_DENSE_FRACTION, DEFAULT_FINE_SPLIT_FACTOR,
    DEFAULT_HYPER_SWITCH, DEFAULT_MIN_TASK_WORK,
};
use crate::error::{Error, Result};

/// Physical storage layout of a matrix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sparsity {
    /// Compressed vectors plus an explicit list of the non-empty ones
    Hypersparse,
    /// Compressed list of vectors
    Sparse,
    /// Dense index space with a presence flag per position
    Bitmap,
    /// Dense, every position present
    Full,
}

impl Sparsity {
    /// All four layouts, most compact first
    pub const ALL: [Sparsity; 4] = [
        Sparsity::Hypersparse,
        Sparsity::Sparse,
        Sparsity::Bitmap,
        Sparsity::Full,
    ];

    /// Status code reported through [`OptionField::SparsityStatus`]
    pub fn code(self) -> i32 {
        match self {
            Sparsity::Hypersparse => SparsityControl::HYPERSPARSE.0,
            Sparsity::Sparse => SparsityControl::SPARSE.0,
            Sparsity::Bitmap => SparsityControl::BITMAP.0,
            Sparsity::Full => SparsityControl::FULL.0,
        }
    }
}

/// Direction along which a matrix stores its vectors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Orientation {
    /// Each stored vector is a row
    ByRow,
    /// Each stored vector is a column
    #[default]
    ByCol,
}

impl Orientation {
    /// Code reported through [`OptionField::Format`]
    pub fn code(self) -> i32 {
        match self {
            Orientation::ByRow => 0,
            Orientation::ByCol => 1,
        }
    }
}

/// Set of layouts a matrix may be converted to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SparsityControl(i32);

impl SparsityControl {
    pub const HYPERSPARSE: SparsityControl = SparsityControl(1);
    pub const SPARSE: SparsityControl = SparsityControl(2);
    pub const BITMAP: SparsityControl = SparsityControl(4);
    pub const FULL: SparsityControl = SparsityControl(8);
    /// Any layout
    pub const AUTO: SparsityControl = SparsityControl(15);

    /// Builds a control from its bit representation
    ///
    /// Returns [`Error::InvalidValue`] unless `bits` is a non-empty subset of
    /// the four layout bits.
    pub fn from_bits(bits: i32) -> Result<Self> {
        if bits <= 0 || bits > Self::AUTO.0 {
            return Err(Error::InvalidValue {
                field: OptionField::SparsityControl,
            });
        }
        Ok(SparsityControl(bits))
    }

    /// Raw bit representation
    pub fn bits(self) -> i32 {
        self.0
    }

    /// Whether `sparsity` is a permitted layout
    pub fn allows(self, sparsity: Sparsity) -> bool {
        self.0 & sparsity.code() != 0
    }

    /// Permitted layouts, most compact first
    pub fn allowed(self) -> impl Iterator<Item = Sparsity> {
        Sparsity::ALL.into_iter().filter(move |&s| self.allows(s))
    }
}

impl Default for SparsityControl {
    fn default() -> Self {
        Self::AUTO
    }
}

impl std::ops::BitOr for SparsityControl {
    type Output = SparsityControl;

    fn bitor(self, rhs: Self) -> Self::Output {
        SparsityControl(self.0 | rhs.0)
    }
}

/// Per-matrix hints steering the layout chosen after an operation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FormatControl {
    sparsity_control: SparsityControl,
    hyper_switch: f64,
    bitmap_switch: f64,
}

impl FormatControl {
    /// Creates a validated set of hints
    pub fn new(
        sparsity_control: SparsityControl,
        hyper_switch: f64,
        bitmap_switch: f64,
    ) -> Result<Self> {
        if !hyper_switch.is_finite() || !(0.0..=1.0).contains(&hyper_switch) {
            return Err(Error::InvalidValue {
                field: OptionField::HyperSwitch,
            });
        }
        if !bitmap_switch.is_finite() || !(0.0..=1.0).contains(&bitmap_switch) {
            return Err(Error::InvalidValue {
                field: OptionField::BitmapSwitch,
            });
        }
        Ok(Self {
            sparsity_control,
            hyper_switch,
            bitmap_switch,
        })
    }

    /// Default switches restricted to the given layouts
    pub fn with_sparsity(sparsity_control: SparsityControl) -> Self {
        Self {
            sparsity_control,
            ..Self::default()
        }
    }

    pub fn sparsity_control(&self) -> SparsityControl {
        self.sparsity_control
    }

    /// Non-empty vector fraction at or below which hypersparse is preferred
    pub fn hyper_switch(&self) -> f64 {
        self.hyper_switch
    }

    /// Density at or above which bitmap is preferred
    pub fn bitmap_switch(&self) -> f64 {
        self.bitmap_switch
    }
}

impl Default for FormatControl {
    fn default() -> Self {
        Self {
            sparsity_control: SparsityControl::AUTO,
            hyper_switch: DEFAULT_HYPER_SWITCH,
            bitmap_switch: DEFAULT_BITMAP_SWITCH,
        }
    }
}

/// Matrix options that can be queried
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptionField {
    /// Permitted layouts (integer bit set)
    SparsityControl,
    /// Current layout (integer code)
    SparsityStatus,
    /// Orientation (0 by row, 1 by column)
    Format,
    /// Hypersparse switch (floating point)
    HyperSwitch,
    /// Bitmap switch (floating point)
    BitmapSwitch,
    /// Whether the matrix is currently hypersparse
    IsHyper,
}

/// Value returned by [`crate::Matrix::option`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OptionValue {
    Int(i32),
    Float(f64),
    Bool(bool),
}

/// System parameters for performance tuning
#[derive(Debug, Clone)]
pub struct SystemParameters {
    /// Number of worker threads
    pub n_threads: usize,
}

impl Default for SystemParameters {
    fn default() -> Self {
        Self {
            n_threads: num_cpus::get(), // Use all available cores
        }
    }
}

/// Configuration for the saxpy multiplication engine
#[derive(Debug, Clone)]
pub struct MultiplyConfig {
    /// System parameters for performance tuning
    pub system_params: SystemParameters,

    /// Floor on the per-thread work target, avoids tiny tasks
    pub min_task_work: usize,

    /// A column whose estimated work exceeds this multiple of the
    /// per-thread target is split into fine tasks
    pub fine_split_factor: usize,

    /// Dense gather is used when the estimated distinct count reaches this
    /// fraction of the vector length
    pub dense_fraction: f64,

    /// Format-control hints for the result
    pub output_control: FormatControl,

    /// Orientation of the result
    pub output_orientation: Orientation,
}

impl Default for MultiplyConfig {
    fn default() -> Self {
        Self {
            system_params: SystemParameters::default(),
            min_task_work: DEFAULT_MIN_TASK_WORK,
            fine_split_factor: DEFAULT_FINE_SPLIT_FACTOR,
            dense_fraction: DEFAULT_DENSE_FRACTION,
            output_control: FormatControl::default(),
            output_orientation: Orientation::ByCol,
        }
    }
}

impl MultiplyConfig {
    /// Default configuration running on `n_threads` workers
    pub fn with_threads(n_threads: usize) -> Self {
        Self {
            system_params: SystemParameters { n_threads },
            ..Self::default()
        }
    }

    /// Rejects settings the planner cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.system_params.n_threads == 0 {
            return Err(Error::invalid("n_threads must be at least 1"));
        }
        if self.fine_split_factor == 0 {
            return Err(Error::invalid("fine_split_factor must be at least 1"));
        }
        if !self.dense_fraction.is_finite() || self.dense_fraction < 0.0 {
            return Err(Error::invalid("dense_fraction must be a finite non-negative number"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sparsity_control_bits() {
        assert!(SparsityControl::from_bits(0).is_err());
        assert!(SparsityControl::from_bits(16).is_err());
        assert!(SparsityControl::from_bits(-1).is_err());

        let control = SparsityControl::from_bits(2 | 4).unwrap();
        assert!(control.allows(Sparsity::Sparse));
        assert!(control.allows(Sparsity::Bitmap));
        assert!(!control.allows(Sparsity::Full));
        assert_eq!(
            control.allowed().collect::<Vec<_>>(),
            vec![Sparsity::Sparse, Sparsity::Bitmap]
        );
        assert_eq!(SparsityControl::SPARSE | SparsityControl::BITMAP, control);
    }

    #[test]
    fn test_format_control_validation() {
        assert!(FormatControl::new(SparsityControl::AUTO, 0.5, 0.5).is_ok());
        assert!(matches!(
            FormatControl::new(SparsityControl::AUTO, f64::NAN, 0.5),
            Err(Error::InvalidValue {
                field: OptionField::HyperSwitch
            })
        ));
        assert!(matches!(
            FormatControl::new(SparsityControl::AUTO, 0.5, 1.5),
            Err(Error::InvalidValue {
                field: OptionField::BitmapSwitch
            })
        ));
    }

    #[test]
    fn test_config_validation() {
        assert!(MultiplyConfig::with_threads(2).validate().is_ok());
        assert!(MultiplyConfig::with_threads(0).validate().is_err());

        let mut config = MultiplyConfig::default();
        config.fine_split_factor = 0;
        assert!(config.validate().is_err());
    }
}
