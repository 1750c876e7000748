//! Error types for semiring-saxpy

use thiserror::Error;

use crate::matrix::config::OptionField;

/// Result type alias using the crate's [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors reported by matrix construction, conversion and multiplication
#[derive(Error, Debug)]
pub enum Error {
    /// Operand shapes do not line up
    #[error("Dimension mismatch in {context}: expected {expected:?}, got {found:?}")]
    DimensionMismatch {
        /// Which check failed
        context: &'static str,
        /// Expected shape
        expected: (usize, usize),
        /// Actual shape
        found: (usize, usize),
    },

    /// An operand or constructor input is absent or malformed
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A format-control field or value is not supported
    #[error("Invalid value for option {field:?}")]
    InvalidValue {
        /// The offending field
        field: OptionField,
    },

    /// A buffer could not be allocated
    #[error("Out of memory: could not allocate {elements} elements for {what}")]
    OutOfMemory {
        /// Which buffer
        what: &'static str,
        /// Requested element count
        elements: usize,
    },

    /// The worker pool could not be created
    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl Error {
    /// True for errors detected before any work is performed
    pub fn is_invalid_argument(&self) -> bool {
        matches!(
            self,
            Error::DimensionMismatch { .. } | Error::InvalidArgument(_) | Error::InvalidValue { .. }
        )
    }

    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }
}
