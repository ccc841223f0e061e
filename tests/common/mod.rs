//! Shared helpers for integration tests.

use latency_fault::{FaultRegistry, ManualClock, RandomSource};

/// Registry on a manual clock with seeded randomness, plus a handle on the clock.
pub fn manual_registry(seed: u64) -> (FaultRegistry<String, ManualClock>, ManualClock) {
    let clock = ManualClock::new();
    let registry = FaultRegistry::with_clock(clock.clone()).with_random(RandomSource::seeded(seed));
    (registry, clock)
}

/// Owned broker names, `b0..b{n-1}`.
#[allow(dead_code)]
pub fn broker_names(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("b{}", i)).collect()
}
