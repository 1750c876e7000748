//! Centralized constants for the saxpy multiplication engine
//!
//! All tunable defaults live here rather than scattered through the code.

// ============================================================================
// FORMAT-CONTROL DEFAULTS
// ============================================================================

/// Default hypersparse switch: a matrix with at most this fraction of
/// non-empty vectors is stored hypersparse
pub const DEFAULT_HYPER_SWITCH: f64 = 0.0625;

/// Default bitmap switch: a matrix with at least this fraction of its
/// positions present is stored as a bitmap
pub const DEFAULT_BITMAP_SWITCH: f64 = 0.10;

// ============================================================================
// TASK PLANNING
// ============================================================================

/// Floor on the per-thread work target (multiply-add operations)
pub const DEFAULT_MIN_TASK_WORK: usize = 4096;

/// A column heavier than this multiple of the per-thread target is split
pub const DEFAULT_FINE_SPLIT_FACTOR: usize = 2;

// ============================================================================
// ACCUMULATOR SELECTION
// ============================================================================

/// Dense gather is chosen once the estimated distinct count reaches this
/// fraction of the vector length
pub const DEFAULT_DENSE_FRACTION: f64 = 0.25;

/// Smallest hash table allocated by the hash accumulator
pub const MIN_HASH_TABLE_SIZE: usize = 16;

/// Multiplier of the open-addressing hash function
pub const HASH_MULTIPLIER: usize = 257;

/// Marker for an empty hash slot
pub const HASH_EMPTY: usize = usize::MAX;
