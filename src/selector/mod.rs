//! Fallback destination selection.
//!
//! # Data Flow
//! ```text
//! Snapshot of tracked records
//!     → ranking.rs (available first, then latency, recovery time, name)
//!     → keep the best ceil(n * top_ratio) entries
//!     → random.rs (uniform pick within that prefix)
//!     → destination name
//! ```
//!
//! # Design Decisions
//! - Selector is stateless; the registry owns the records and the random source
//! - Never returns nothing while at least one record exists
//! - Randomizing over the better part spreads producers instead of piling onto one broker

pub mod random;
pub mod ranking;

use crate::error::{FaultError, FaultResult};
use crate::registry::RecordSnapshot;

pub use random::RandomSource;

/// Share of the ranked list eligible for the random pick by default ("best half").
pub const DEFAULT_TOP_RATIO: f64 = 0.5;

/// Ranks a snapshot and picks from its better part.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Selector {
    top_ratio: f64,
}

impl Selector {
    /// Create a selector. Ratios outside `(0, 1]` fall back to the default.
    pub fn new(top_ratio: f64) -> Self {
        let top_ratio = if top_ratio.is_finite() && top_ratio > 0.0 && top_ratio <= 1.0 {
            top_ratio
        } else {
            tracing::warn!(top_ratio, "Invalid selector ratio, using default");
            DEFAULT_TOP_RATIO
        };
        Self { top_ratio }
    }

    pub fn top_ratio(&self) -> f64 {
        self.top_ratio
    }

    /// How many of `n` ranked entries are eligible.
    pub fn candidate_count(&self, n: usize) -> usize {
        if n == 0 {
            return 0;
        }
        let count = (n as f64 * self.top_ratio).ceil() as usize;
        count.clamp(1, n)
    }

    /// Rank `snapshot` and pick one name from its eligible prefix.
    pub fn pick<T: Ord>(&self, mut snapshot: Vec<RecordSnapshot<T>>, random: &RandomSource) -> FaultResult<T> {
        match snapshot.len() {
            0 => Err(FaultError::NoCandidate),
            1 => Ok(snapshot.swap_remove(0).name),
            n => {
                ranking::rank(&mut snapshot);
                let index = random.index(self.candidate_count(n));
                Ok(snapshot.swap_remove(index).name)
            }
        }
    }
}

impl Default for Selector {
    fn default() -> Self {
        Self {
            top_ratio: DEFAULT_TOP_RATIO,
        }
    }
}
