//! # royalty-splits
//!
//! Royalty invariant checking for the artist / producer / label split.
//!
//! A split is three integer percentages that must each be non-negative and
//! sum to exactly 100. The check is pure and runs before any encryption is
//! attempted, so an invalid split surfaces as a caller error and never as
//! an encryption error.
//!
//! ## Modules
//!
//! - [`splits`] — `check_percentages` and the validated [`splits::PercentageSplit`]

pub mod splits;

/// Error types for split validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SplitError {
    /// Split percentages do not sum to 100.
    #[error("split percentages must sum to 100, got {total}")]
    InvalidSplitTotal {
        /// The actual total.
        total: i128,
    },

    /// A single percentage is negative.
    #[error("{role} percentage is negative: {value}")]
    NegativeShare {
        /// Which party carried the negative share.
        role: royalty_types::Role,
        /// The offending value.
        value: i64,
    },
}

/// Convenience result type for split operations.
pub type Result<T> = std::result::Result<T, SplitError>;
