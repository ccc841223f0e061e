//! Latency to avoidance-window mapping.
//!
//! # Lookup
//! ```text
//! tiers (ascending):  50 → 0   100 → 0   550 → 30s   ...   15000 → 10m
//! observed 300ms  →  first threshold >= 300 is 550  →  avoid 30s
//! observed 20s    →  above every threshold          →  last tier (10m)
//! ```
//!
//! The registry never consults this table; the send pipeline does, and hands
//! the resulting duration to `update_fault_item`.

use std::time::Duration;

use crate::error::PolicyError;

/// One row of the tier table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatencyTier {
    /// Upper bound of observed latency this tier covers.
    pub threshold: Duration,
    /// How long to avoid the destination.
    pub avoid_for: Duration,
}

impl LatencyTier {
    pub fn from_millis(threshold_ms: u64, avoid_ms: u64) -> Self {
        Self {
            threshold: Duration::from_millis(threshold_ms),
            avoid_for: Duration::from_millis(avoid_ms),
        }
    }
}

const DEFAULT_TIERS_MS: [(u64, u64); 7] = [
    (50, 0),
    (100, 0),
    (550, 30_000),
    (1_000, 60_000),
    (2_000, 120_000),
    (3_000, 180_000),
    (15_000, 600_000),
];

/// Ordered tier table. Stateless once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DurationPolicy {
    tiers: Vec<LatencyTier>,
}

impl DurationPolicy {
    /// Build a policy, rejecting empty or non-ascending tables.
    pub fn new(tiers: Vec<LatencyTier>) -> Result<Self, PolicyError> {
        if tiers.is_empty() {
            return Err(PolicyError::Empty);
        }
        for (index, pair) in tiers.windows(2).enumerate() {
            if pair[1].threshold <= pair[0].threshold {
                return Err(PolicyError::Unordered {
                    index: index + 1,
                    threshold_ms: pair[1].threshold.as_millis(),
                    previous_ms: pair[0].threshold.as_millis(),
                });
            }
        }
        Ok(Self { tiers })
    }

    /// Avoidance window for an observed latency.
    pub fn avoidance_for(&self, latency: Duration) -> Duration {
        // Tables are small (a handful of tiers), a linear scan beats anything clever.
        self.tiers
            .iter()
            .find(|tier| tier.threshold >= latency)
            .or_else(|| self.tiers.last())
            .map(|tier| tier.avoid_for)
            .unwrap_or_default()
    }

    pub fn tiers(&self) -> &[LatencyTier] {
        &self.tiers
    }
}

impl Default for DurationPolicy {
    fn default() -> Self {
        Self {
            tiers: DEFAULT_TIERS_MS
                .iter()
                .map(|&(t, d)| LatencyTier::from_millis(t, d))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn test_default_tiers() {
        let policy = DurationPolicy::default();
        assert_eq!(policy.avoidance_for(ms(0)), ms(0));
        assert_eq!(policy.avoidance_for(ms(50)), ms(0));
        assert_eq!(policy.avoidance_for(ms(100)), ms(0));
        assert_eq!(policy.avoidance_for(ms(101)), ms(30_000));
        assert_eq!(policy.avoidance_for(ms(550)), ms(30_000));
        assert_eq!(policy.avoidance_for(ms(999)), ms(60_000));
        assert_eq!(policy.avoidance_for(ms(2_500)), ms(180_000));
        assert_eq!(policy.avoidance_for(ms(15_000)), ms(600_000));
    }

    #[test]
    fn test_above_every_threshold_uses_last_tier() {
        let policy = DurationPolicy::default();
        assert_eq!(policy.avoidance_for(ms(30_000)), ms(600_000));
        assert_eq!(policy.avoidance_for(Duration::from_secs(3600)), ms(600_000));
    }

    #[test]
    fn test_single_tier() {
        let policy = DurationPolicy::new(vec![LatencyTier::from_millis(700, 60_000)]).unwrap();
        assert_eq!(policy.avoidance_for(ms(10)), ms(60_000));
        assert_eq!(policy.avoidance_for(ms(700)), ms(60_000));
        assert_eq!(policy.avoidance_for(ms(5_000)), ms(60_000));
    }

    #[test]
    fn test_rejects_bad_tables() {
        assert_eq!(DurationPolicy::new(vec![]), Err(PolicyError::Empty));

        let err = DurationPolicy::new(vec![
            LatencyTier::from_millis(100, 0),
            LatencyTier::from_millis(100, 1_000),
        ])
        .unwrap_err();
        assert!(matches!(err, PolicyError::Unordered { index: 1, .. }));
    }
}
