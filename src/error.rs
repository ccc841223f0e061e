//! Error definitions for the fault-avoidance core.

use thiserror::Error;

/// Errors surfaced by destination selection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FaultError {
    /// Nothing has ever been tracked, so there is no history to guess from.
    #[error("no candidate destination: registry holds no records")]
    NoCandidate,
}

/// Errors raised when building a [`DurationPolicy`](crate::policy::DurationPolicy).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    /// The tier table has no entries.
    #[error("latency tier table is empty")]
    Empty,

    /// Thresholds must be strictly ascending.
    #[error("tier {index} threshold {threshold_ms}ms is not above previous threshold {previous_ms}ms")]
    Unordered {
        index: usize,
        threshold_ms: u128,
        previous_ms: u128,
    },
}

/// Result type for selection.
pub type FaultResult<T> = Result<T, FaultError>;
