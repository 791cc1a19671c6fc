//! Errors in the library.
use thiserror::Error;

/// Errors in the library.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HaliteError {
    /// Sampling was requested before any transition was stored.
    #[error("Replay memory is empty")]
    EmptyMemory,

    /// A cumulative priority query fell outside `[0, total]`, or led to an
    /// unwritten slot. Indicates a broken sum-tree invariant.
    #[error("Priority query {value} is out of range (total priority {total})")]
    OutOfRange {
        /// Queried cumulative priority.
        value: f32,

        /// Total priority held by the tree at the time of the query.
        total: f32,
    },

    /// Invalid argument: mismatched batch lengths, zero capacity and the like.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The lock guarding a shared replay memory was poisoned by a panicking thread.
    #[error("Lock of shared replay memory was poisoned")]
    LockPoisoned,
}
