//! Error types for the core value layer.
//!
//! Everything here is a programming-contract violation: the operation that
//! raised it was handed inputs it documents as invalid. These errors are
//! surfaced synchronously to the caller and are not retried.

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, RangeError>;

/// Errors from index-range operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RangeError {
    /// The given index lies outside the range being operated on.
    #[error("index {index} is outside the range [{min}, {max}]")]
    OutsideRange {
        /// The offending index.
        index: u64,
        /// Lower bound of the range.
        min: u64,
        /// Upper bound of the range.
        max: u64,
    },

    /// A single-index range cannot be partitioned at its only element.
    #[error("cannot partition single-index range [{index}] at its only element")]
    SingleIndexPartition {
        /// The range's sole index.
        index: u64,
    },
}
