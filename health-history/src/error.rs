//! Error types for health history recording and queries.
//!
//! Every variant is a caller contract violation detected locally. Nothing here
//! is transient, so none of these errors should ever be retried.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Which execution-context stamp an ordering or validity check failed on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StampField {
    /// Ledger sequence / block number
    BlockHeight,
    /// Seconds since the Unix epoch
    Timestamp,
}

impl fmt::Display for StampField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StampField::BlockHeight => write!(f, "block height"),
            StampField::Timestamp => write!(f, "timestamp"),
        }
    }
}

/// Errors raised by [`crate::HealthHistory`]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HistoryError {
    /// A record was stamped earlier than the last recorded observation
    #[error("Ordering violation: {field} {attempted} is earlier than last recorded {previous}")]
    OrderingViolation {
        /// Stamp that went backwards
        field: StampField,
        /// Value on the last recorded observation
        previous: u64,
        /// Value supplied by the caller
        attempted: u64,
    },

    /// An index at or beyond the current history length was requested
    #[error("Index {index} out of range for history of length {len}")]
    IndexOutOfRange {
        /// Requested index
        index: usize,
        /// History length at the time of the request
        len: usize,
    },

    /// The history has no observations yet
    #[error("Health history is empty")]
    EmptyHistory,

    /// A block height or timestamp of zero was supplied
    #[error("Invalid stamp: {field} must be greater than zero")]
    InvalidStamp {
        /// Stamp that was zero
        field: StampField,
    },

    /// A rebuilt history skipped or repeated a sequence index
    #[error("Non-contiguous sequence index: expected {expected}, found {found}")]
    NonContiguousIndex {
        /// Index the entry should have carried
        expected: usize,
        /// Index it actually carried
        found: usize,
    },
}

/// Result type alias for history operations
pub type Result<T> = std::result::Result<T, HistoryError>;
