// Matrix data structures and operations

pub mod base;
pub mod builder;
pub mod config;
pub mod conversion;
pub mod reference;
pub mod storage;

pub use base::Matrix;
pub use builder::SparseBuilder;
pub use config::{
    FormatControl, MultiplyConfig, OptionField, OptionValue, Orientation, Sparsity,
    SparsityControl, SystemParameters,
};
pub use reference::reference_multiply;
pub use storage::{Pattern, PatternView, VectorEntries, VectorIndices};
