//! Concurrent store of per-destination health records.
//!
//! # Responsibilities
//! - Upsert records after each send (latest write wins)
//! - Answer availability on the routing hot path
//! - Produce a point-in-time snapshot for the fallback pick
//!
//! # Design Decisions
//! - `DashMap` shards the table; a write to one destination only locks its shard
//! - Malformed measurements are clamped, never rejected
//! - Records live until explicitly removed

use std::borrow::Borrow;
use std::hash::Hash;
use std::time::Duration;

use dashmap::DashMap;

use crate::clock::{Clock, SystemClock};
use crate::error::FaultResult;
use crate::observability::metrics;
use crate::registry::{Destination, HealthRecord, LatencyFaultTolerance, RecordSnapshot};
use crate::selector::{RandomSource, Selector};

/// Longest avoidance window accepted. Keeps `now + window` from overflowing.
pub const MAX_NOT_AVAILABLE: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Thread-safe registry of destination health, keyed by name.
#[derive(Debug)]
pub struct FaultRegistry<T: Destination, C: Clock = SystemClock> {
    records: DashMap<T, HealthRecord<T>>,
    clock: C,
    selector: Selector,
    random: RandomSource,
}

impl<T: Destination> FaultRegistry<T, SystemClock> {
    /// Empty registry on the system clock with thread-local randomness.
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl<T: Destination> Default for FaultRegistry<T, SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Destination, C: Clock> FaultRegistry<T, C> {
    /// Empty registry reading time from `clock`.
    pub fn with_clock(clock: C) -> Self {
        Self {
            records: DashMap::new(),
            clock,
            selector: Selector::default(),
            random: RandomSource::default(),
        }
    }

    pub fn with_selector(mut self, selector: Selector) -> Self {
        self.selector = selector;
        self
    }

    pub fn with_random(mut self, random: RandomSource) -> Self {
        self.random = random;
        self
    }

    /// Record the latest observation for `name`, replacing any earlier one.
    pub fn update_fault_item(&self, name: T, current_latency: Duration, not_available: Duration) {
        let not_available = if not_available > MAX_NOT_AVAILABLE {
            tracing::debug!(name = ?name, requested_ms = not_available.as_millis(), "Capping avoidance window");
            MAX_NOT_AVAILABLE
        } else {
            not_available
        };

        let available_from = self.clock.now() + not_available;
        let record = HealthRecord::new(name.clone(), current_latency, available_from);

        tracing::trace!(
            name = ?name,
            latency_ms = current_latency.as_millis(),
            avoid_ms = not_available.as_millis(),
            "Fault item updated"
        );

        let previous = self.records.insert(name, record);
        metrics::record_fault_update();
        if previous.is_none() {
            tracing::debug!(tracked = self.records.len(), "Tracking new destination");
            metrics::record_tracked(self.records.len());
        }
    }

    /// Same as [`update_fault_item`](Self::update_fault_item) for raw signed
    /// millisecond measurements. Negative values are clamped to zero.
    pub fn update_fault_item_millis(&self, name: T, current_latency_ms: i64, not_available_ms: i64) {
        if current_latency_ms < 0 || not_available_ms < 0 {
            tracing::debug!(
                name = ?name,
                current_latency_ms,
                not_available_ms,
                "Clamping negative fault measurement to zero"
            );
        }
        self.update_fault_item(
            name,
            Duration::from_millis(current_latency_ms.max(0).unsigned_abs()),
            Duration::from_millis(not_available_ms.max(0).unsigned_abs()),
        );
    }

    /// True if `name` is untracked or its avoidance window has elapsed.
    pub fn is_available<Q>(&self, name: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let now = self.clock.now();
        self.records
            .get(name)
            .map_or(true, |record| record.is_available_at(now))
    }

    /// Drop the record for `name`, if any.
    pub fn remove<Q>(&self, name: &Q)
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        if let Some((name, _)) = self.records.remove(name) {
            tracing::debug!(name = ?name, "Destination removed from fault registry");
            metrics::record_removal();
            metrics::record_tracked(self.records.len());
        }
    }

    /// Copy of the stored record for `name`.
    pub fn record<Q>(&self, name: &Q) -> Option<HealthRecord<T>>
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.records.get(name).map(|r| r.value().clone())
    }

    /// Copy every record, with availability evaluated at a single instant.
    pub fn snapshot(&self) -> Vec<RecordSnapshot<T>> {
        let now = self.clock.now();
        // Shards are read-locked one at a time: each shard is consistent, but
        // writes to different shards racing this copy may be seen out of order.
        self.records
            .iter()
            .map(|r| RecordSnapshot::capture(r.value(), now))
            .collect()
    }

    /// Choose some tracked destination, preferring healthy and fast ones.
    ///
    /// Fails only when nothing is tracked.
    pub fn pick_one_at_least(&self) -> FaultResult<T> {
        let snapshot = self.snapshot();
        let total = snapshot.len();
        let available = snapshot.iter().filter(|s| s.available).count();

        match self.selector.pick(snapshot, &self.random) {
            Ok(name) => {
                tracing::warn!(
                    picked = ?name,
                    tracked = total,
                    available,
                    "Falling back to best-effort destination"
                );
                metrics::record_fallback_pick("picked");
                Ok(name)
            }
            Err(e) => {
                tracing::warn!("No tracked destination to fall back on");
                metrics::record_fallback_pick("empty");
                Err(e)
            }
        }
    }

    /// Number of tracked destinations.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }
}

impl<T: Destination, C: Clock> LatencyFaultTolerance<T> for FaultRegistry<T, C> {
    fn update_fault_item(&self, name: T, current_latency: Duration, not_available: Duration) {
        FaultRegistry::update_fault_item(self, name, current_latency, not_available);
    }

    fn is_available(&self, name: &T) -> bool {
        FaultRegistry::is_available(self, name)
    }

    fn remove(&self, name: &T) {
        FaultRegistry::remove(self, name);
    }

    fn pick_one_at_least(&self) -> FaultResult<T> {
        FaultRegistry::pick_one_at_least(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::error::FaultError;

    fn registry() -> (FaultRegistry<String, ManualClock>, ManualClock) {
        let clock = ManualClock::new();
        (FaultRegistry::with_clock(clock.clone()), clock)
    }

    #[test]
    fn test_untracked_is_available() {
        let (reg, _) = registry();
        assert!(reg.is_available("never-seen"));
        assert!(reg.is_empty());
    }

    #[test]
    fn test_window_expires() {
        let (reg, clock) = registry();
        reg.update_fault_item("b1".into(), Duration::from_millis(700), Duration::from_millis(60_000));

        assert!(!reg.is_available("b1"));
        clock.advance_millis(59_999);
        assert!(!reg.is_available("b1"));
        clock.advance_millis(1);
        assert!(reg.is_available("b1"));
        // Still tracked after recovering.
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_zero_window_is_available_immediately() {
        let (reg, _) = registry();
        reg.update_fault_item("b1".into(), Duration::from_millis(20), Duration::ZERO);
        assert!(reg.is_available("b1"));
    }

    #[test]
    fn test_latest_write_wins() {
        let (reg, clock) = registry();
        reg.update_fault_item("b1".into(), Duration::from_millis(3_000), Duration::from_secs(600));
        reg.update_fault_item("b1".into(), Duration::from_millis(10), Duration::from_secs(5));

        let record = reg.record("b1").unwrap();
        assert_eq!(record.current_latency, Duration::from_millis(10));

        clock.advance(Duration::from_secs(5));
        assert!(reg.is_available("b1"));
    }

    #[test]
    fn test_negative_measurements_clamped() {
        let (reg, _) = registry();
        reg.update_fault_item_millis("b1".into(), -5, -1_000);

        let record = reg.record("b1").unwrap();
        assert_eq!(record.current_latency, Duration::ZERO);
        assert!(reg.is_available("b1"));
    }

    #[test]
    fn test_huge_window_is_capped() {
        let (reg, clock) = registry();
        reg.update_fault_item("b1".into(), Duration::ZERO, Duration::MAX);

        let record = reg.record("b1").unwrap();
        assert_eq!(record.available_from - clock.now(), MAX_NOT_AVAILABLE);
    }

    #[test]
    fn test_remove_reverts_to_untracked() {
        let (reg, _) = registry();
        reg.update_fault_item("b1".into(), Duration::ZERO, Duration::from_secs(60));
        reg.remove("b1");
        assert!(reg.is_available("b1"));
        assert!(reg.record("b1").is_none());

        // Removing something unknown is a no-op.
        reg.remove("nope");
    }

    #[test]
    fn test_pick_one_at_least() {
        let (reg, _) = registry();
        assert_eq!(reg.pick_one_at_least(), Err(FaultError::NoCandidate));

        reg.update_fault_item("b1".into(), Duration::from_millis(3_000), Duration::from_secs(60));
        assert!(!reg.is_available("b1"));
        assert_eq!(reg.pick_one_at_least(), Ok("b1".to_string()));
    }

    #[test]
    fn test_snapshot_remaining_follows_registry_clock() {
        let (reg, clock) = registry();
        reg.update_fault_item("b1".into(), Duration::from_millis(700), Duration::from_secs(60));
        clock.advance(Duration::from_secs(45));

        let snap = reg.snapshot().pop().unwrap();
        assert!(!snap.available);
        assert_eq!(snap.remaining_at(reg.clock().now()), Duration::from_secs(15));

        clock.advance(Duration::from_secs(20));
        assert_eq!(snap.remaining_at(reg.clock().now()), Duration::ZERO);
    }

    #[test]
    fn test_trait_object_usage() {
        let (reg, _) = registry();
        let tolerance: &dyn LatencyFaultTolerance<String> = &reg;
        tolerance.update_fault_item("b1".into(), Duration::ZERO, Duration::from_secs(1));
        assert!(!tolerance.is_available(&"b1".to_string()));
        tolerance.remove(&"b1".to_string());
        assert!(tolerance.is_available(&"b1".to_string()));
    }
}
