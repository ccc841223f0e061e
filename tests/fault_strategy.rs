//! End-to-end send pipeline scenarios through `FaultStrategy`.

use std::collections::HashMap;
use std::time::Duration;

use latency_fault::config::loader::parse_config;
use latency_fault::config::schema::TierConfig;
use latency_fault::config::LatencyConfig;
use latency_fault::{
    DurationPolicy, FaultError, FaultRegistry, FaultStrategy, LatencyTier, ManualClock, StrategySettings,
};

mod common;

type Strategy = FaultStrategy<String, FaultRegistry<String, ManualClock>>;

fn strategy_with(settings: StrategySettings) -> (Strategy, ManualClock) {
    let (registry, clock) = common::manual_registry(17);
    (FaultStrategy::new(registry, settings), clock)
}

#[test]
fn test_single_tier_window() {
    let policy = DurationPolicy::new(vec![LatencyTier::from_millis(700, 60_000)]).unwrap();
    let latency = Duration::from_millis(700);
    let (registry, clock) = common::manual_registry(1);

    registry.update_fault_item("b1".into(), latency, policy.avoidance_for(latency));

    clock.advance_millis(59_999);
    assert!(!registry.is_available("b1"));
    clock.advance_millis(1);
    assert!(registry.is_available("b1"));
}

#[test]
fn test_slow_broker_is_steered_around_then_returns() {
    let (strategy, clock) = strategy_with(StrategySettings::default());
    let brokers = common::broker_names(3);

    // b1 answered in 800ms: avoided for 60s under the default tiers.
    strategy.record_send("b1".into(), Duration::from_millis(800), false);

    let mut counts: HashMap<String, usize> = HashMap::new();
    for _ in 0..30 {
        *counts.entry(strategy.select(&brokers).unwrap()).or_default() += 1;
    }
    assert_eq!(counts.get("b1"), None);
    assert_eq!(counts.values().sum::<usize>(), 30);

    clock.advance(Duration::from_secs(60));
    let picks: Vec<String> = (0..3).map(|_| strategy.select(&brokers).unwrap()).collect();
    assert!(picks.contains(&"b1".to_string()));
}

#[test]
fn test_total_outage_falls_back_to_tracked() {
    let (strategy, _) = strategy_with(StrategySettings::default());
    let brokers = common::broker_names(4);

    for broker in &brokers {
        strategy.record_send(broker.clone(), Duration::from_millis(3_000), true);
    }
    assert!(strategy.available(&brokers).is_empty());

    for _ in 0..50 {
        let picked = strategy.select(&brokers).unwrap();
        assert!(brokers.contains(&picked));
    }
}

#[test]
fn test_retired_broker_is_forgotten() {
    let (strategy, _) = strategy_with(StrategySettings::default());
    strategy.record_send("b0".into(), Duration::ZERO, true);
    strategy.retire(&"b0".to_string());

    assert_eq!(strategy.select(&[]), Err(FaultError::NoCandidate));
    assert_eq!(strategy.select(&common::broker_names(1)), Ok("b0".to_string()));
}

#[test]
fn test_reload_changes_windows() {
    let (strategy, clock) = strategy_with(StrategySettings::default());

    let config = LatencyConfig {
        enabled: true,
        isolation_latency_ms: 30_000,
        tiers: vec![TierConfig { latency_ms: 100, avoid_ms: 0 }, TierConfig { latency_ms: 1_000, avoid_ms: 5_000 }],
    };
    strategy.apply_config(&config).unwrap();

    strategy.record_send("b1".into(), Duration::ZERO, true);
    assert!(!strategy.tolerance().is_available("b1"));
    clock.advance(Duration::from_secs(5));
    assert!(strategy.tolerance().is_available("b1"));
}

#[test]
fn test_strategy_from_toml() {
    let config = parse_config(
        r#"
        [latency]
        enabled = true
        isolation_latency_ms = 2000
        tiers = [
            { latency_ms = 500, avoid_ms = 0 },
            { latency_ms = 2000, avoid_ms = 45000 },
        ]

        [selection]
        top_ratio = 1.0
        "#,
    )
    .unwrap();

    let (registry, clock) = common::manual_registry(4);
    let registry = registry.with_selector(config.selection.selector());
    let strategy = FaultStrategy::from_config(registry, &config.latency).unwrap();

    strategy.record_send("b1".to_string(), Duration::from_millis(10), true);
    clock.advance(Duration::from_millis(44_999));
    assert!(!strategy.tolerance().is_available("b1"));
    clock.advance_millis(1);
    assert!(strategy.tolerance().is_available("b1"));
}
