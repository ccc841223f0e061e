//! Send-side fault strategy.
//!
//! # Responsibilities
//! - Turn a send outcome into a fault update (latency → avoidance window)
//! - Pick a destination from the routing list, skipping ones in their avoidance window
//! - Fall back to the registry's best-effort pick when every candidate is avoided
//!
//! # Design Decisions
//! - Settings live behind `ArcSwap` so a config reload never blocks a send
//! - Round-robin start position spreads load across healthy candidates
//! - Disabled strategy records nothing and rotates over the raw list

use std::marker::PhantomData;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;

use crate::config::schema::LatencyConfig;
use crate::error::{FaultError, FaultResult, PolicyError};
use crate::policy::DurationPolicy;
use crate::registry::{Destination, FaultRegistry, LatencyFaultTolerance};

/// Latency settings that can be swapped at runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategySettings {
    /// Record sends and steer around slow or failed destinations.
    pub enabled: bool,
    pub policy: DurationPolicy,
    /// Latency charged to a send that failed outright.
    pub isolation_latency: Duration,
}

impl StrategySettings {
    pub fn from_config(config: &LatencyConfig) -> Result<Self, PolicyError> {
        Ok(Self {
            enabled: config.enabled,
            policy: config.policy()?,
            isolation_latency: config.isolation_latency(),
        })
    }
}

impl Default for StrategySettings {
    fn default() -> Self {
        Self {
            enabled: true,
            policy: DurationPolicy::default(),
            isolation_latency: Duration::from_millis(30_000),
        }
    }
}

/// Couples a fault tolerance store with the duration policy.
pub struct FaultStrategy<T, F = FaultRegistry<T>>
where
    T: Destination,
    F: LatencyFaultTolerance<T>,
{
    tolerance: F,
    settings: ArcSwap<StrategySettings>,
    next_index: AtomicUsize,
    _destination: PhantomData<fn() -> T>,
}

impl<T, F> FaultStrategy<T, F>
where
    T: Destination,
    F: LatencyFaultTolerance<T>,
{
    pub fn new(tolerance: F, settings: StrategySettings) -> Self {
        Self {
            tolerance,
            settings: ArcSwap::from_pointee(settings),
            next_index: AtomicUsize::new(0),
            _destination: PhantomData,
        }
    }

    pub fn from_config(tolerance: F, config: &LatencyConfig) -> Result<Self, PolicyError> {
        Ok(Self::new(tolerance, StrategySettings::from_config(config)?))
    }

    /// Current settings.
    pub fn settings(&self) -> Arc<StrategySettings> {
        self.settings.load_full()
    }

    /// Replace the latency settings. An invalid tier table keeps the old settings.
    pub fn apply_config(&self, config: &LatencyConfig) -> Result<(), PolicyError> {
        match StrategySettings::from_config(config) {
            Ok(settings) => {
                tracing::info!(
                    enabled = settings.enabled,
                    tiers = settings.policy.tiers().len(),
                    isolation_latency_ms = settings.isolation_latency.as_millis(),
                    "Latency settings applied"
                );
                self.settings.store(Arc::new(settings));
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "Rejected latency settings, keeping current");
                Err(e)
            }
        }
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.settings.rcu(|current| StrategySettings {
            enabled,
            ..StrategySettings::clone(current)
        });
    }

    /// Feed the outcome of one send attempt back into the store.
    ///
    /// `isolated` marks a send that failed outright; its window is derived from
    /// the isolation latency instead of the measured one.
    pub fn record_send(&self, name: T, latency: Duration, isolated: bool) {
        let settings = self.settings.load();
        if !settings.enabled {
            return;
        }

        let lookup = if isolated {
            settings.isolation_latency
        } else {
            latency
        };
        let not_available = settings.policy.avoidance_for(lookup);
        if isolated {
            tracing::debug!(
                name = ?name,
                avoid_ms = not_available.as_millis(),
                "Send failed, isolating destination"
            );
        }
        self.tolerance.update_fault_item(name, latency, not_available);
    }

    /// Candidates that are not currently being avoided, in list order.
    pub fn available(&self, candidates: &[T]) -> Vec<T> {
        candidates
            .iter()
            .filter(|c| self.tolerance.is_available(c))
            .cloned()
            .collect()
    }

    /// Pick a destination for the next send.
    pub fn select(&self, candidates: &[T]) -> FaultResult<T> {
        let start = self.next_index.fetch_add(1, Ordering::Relaxed);
        let len = candidates.len();

        if !self.settings.load().enabled {
            if len == 0 {
                return Err(FaultError::NoCandidate);
            }
            return Ok(candidates[start % len].clone());
        }

        for i in 0..len {
            let candidate = &candidates[(start + i) % len];
            if self.tolerance.is_available(candidate) {
                return Ok(candidate.clone());
            }
        }

        tracing::debug!(candidates = len, "No available candidate, using fallback pick");
        self.tolerance.pick_one_at_least()
    }

    /// Forget a destination the topology no longer lists.
    pub fn retire(&self, name: &T) {
        self.tolerance.remove(name);
    }

    pub fn tolerance(&self) -> &F {
        &self.tolerance
    }
}
