//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from TOML. Every section
//! has defaults, so an empty file is a valid configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::PolicyError;
use crate::policy::{DurationPolicy, LatencyTier};
use crate::selector::{Selector, DEFAULT_TOP_RATIO};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct FaultToleranceConfig {
    /// Latency tiers and avoidance switches.
    pub latency: LatencyConfig,

    /// Fallback selection tuning.
    pub selection: SelectionConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Latency fault avoidance settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct LatencyConfig {
    /// Enable latency-based avoidance. When off, sends are never recorded.
    pub enabled: bool,

    /// Latency assumed for a send that failed outright, in milliseconds.
    pub isolation_latency_ms: u64,

    /// Ascending tier table.
    pub tiers: Vec<TierConfig>,
}

impl Default for LatencyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            isolation_latency_ms: 30_000,
            tiers: DurationPolicy::default()
                .tiers()
                .iter()
                .map(TierConfig::from)
                .collect(),
        }
    }
}

impl LatencyConfig {
    /// Build the duration policy described by `tiers`.
    pub fn policy(&self) -> Result<DurationPolicy, PolicyError> {
        DurationPolicy::new(self.tiers.iter().map(|t| t.to_tier()).collect())
    }

    pub fn isolation_latency(&self) -> Duration {
        Duration::from_millis(self.isolation_latency_ms)
    }
}

/// One `(latency threshold, avoidance)` row.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
pub struct TierConfig {
    /// Observed latency threshold in milliseconds.
    pub latency_ms: u64,

    /// Avoidance window in milliseconds.
    pub avoid_ms: u64,
}

impl TierConfig {
    pub fn to_tier(self) -> LatencyTier {
        LatencyTier::from_millis(self.latency_ms, self.avoid_ms)
    }
}

impl From<&LatencyTier> for TierConfig {
    fn from(tier: &LatencyTier) -> Self {
        Self {
            latency_ms: u64::try_from(tier.threshold.as_millis()).unwrap_or(u64::MAX),
            avoid_ms: u64::try_from(tier.avoid_for.as_millis()).unwrap_or(u64::MAX),
        }
    }
}

/// Fallback selection configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct SelectionConfig {
    /// Share of ranked destinations eligible for the random pick, in `(0, 1]`.
    pub top_ratio: f64,

    /// Fixed seed for reproducible picks. Unset uses thread-local randomness.
    pub seed: Option<u64>,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            top_ratio: DEFAULT_TOP_RATIO,
            seed: None,
        }
    }
}

impl SelectionConfig {
    pub fn selector(&self) -> Selector {
        Selector::new(self.top_ratio)
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
