//! fault-sim: concurrent producers steering around failing brokers.
//!
//! Each producer repeatedly picks a broker through `FaultStrategy`, simulates a
//! send (brokers listed with `--down` always fail), and records the outcome.
//! A JSON summary of sends per broker and the final registry state is printed
//! to stdout.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use rand::Rng;
use serde::Serialize;
use tokio::task::JoinSet;

use latency_fault::config::watcher::{spawn_reload, ConfigWatcher};
use latency_fault::config::{load_config, FaultToleranceConfig};
use latency_fault::observability::{logging, metrics};
use latency_fault::{Clock, FaultError, FaultRegistry, FaultStrategy, RandomSource};

#[derive(Parser, Debug)]
#[command(name = "fault-sim")]
#[command(about = "Simulate producers avoiding failing brokers", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Reload the configuration file when it changes.
    #[arg(long, requires = "config")]
    watch: bool,

    /// Broker names in routing order.
    #[arg(short, long, value_delimiter = ',', default_value = "broker-a,broker-b,broker-c")]
    brokers: Vec<String>,

    /// Brokers whose sends always fail.
    #[arg(short, long, value_delimiter = ',')]
    down: Vec<String>,

    /// Number of concurrent producers.
    #[arg(short, long, default_value_t = 4)]
    producers: usize,

    /// Sends per producer.
    #[arg(short, long, default_value_t = 100)]
    sends: usize,

    /// Pause between two sends of one producer, in milliseconds.
    #[arg(long, default_value_t = 0)]
    interval_ms: u64,
}

#[derive(Debug, Default)]
struct ProducerStats {
    sends: BTreeMap<String, usize>,
    failures: usize,
    no_destination: usize,
}

#[derive(Debug, Serialize)]
struct RecordView {
    name: String,
    current_latency_ms: u128,
    available: bool,
    remaining_ms: u128,
}

#[derive(Debug, Serialize)]
struct Summary {
    sends: BTreeMap<String, usize>,
    failures: usize,
    no_destination: usize,
    records: Vec<RecordView>,
}

type Strategy = FaultStrategy<String, FaultRegistry<String>>;

/// Outcome of one simulated send: latency and whether it failed outright.
fn simulate_send(broker: &str, down: &[String]) -> (Duration, bool) {
    let mut rng = rand::thread_rng();
    if down.iter().any(|d| d == broker) {
        return (Duration::from_millis(3_000), true);
    }
    let latency_ms = if rng.gen_bool(0.05) {
        rng.gen_range(600..1_500)
    } else {
        rng.gen_range(1..120)
    };
    (Duration::from_millis(latency_ms), false)
}

async fn run_producer(
    id: usize,
    strategy: Arc<Strategy>,
    brokers: Arc<Vec<String>>,
    down: Arc<Vec<String>>,
    sends: usize,
    interval: Duration,
) -> ProducerStats {
    let mut stats = ProducerStats::default();

    for _ in 0..sends {
        match strategy.select(&brokers) {
            Ok(broker) => {
                let (latency, failed) = simulate_send(&broker, &down);
                if failed {
                    stats.failures += 1;
                    tracing::debug!(producer = id, broker = %broker, "Send failed");
                }
                *stats.sends.entry(broker.clone()).or_default() += 1;
                strategy.record_send(broker, latency, failed);
            }
            Err(FaultError::NoCandidate) => {
                stats.no_destination += 1;
            }
        }

        if !interval.is_zero() {
            tokio::time::sleep(interval).await;
        }
    }

    stats
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => FaultToleranceConfig::default(),
    };

    logging::init_logging(&config.observability);
    tracing::info!("fault-sim v0.1.0 starting");

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let random = match config.selection.seed {
        Some(seed) => RandomSource::seeded(seed),
        None => RandomSource::Thread,
    };
    let registry: FaultRegistry<String> = FaultRegistry::new()
        .with_selector(config.selection.selector())
        .with_random(random);
    let strategy = Arc::new(FaultStrategy::from_config(registry, &config.latency)?);

    tracing::info!(
        brokers = ?cli.brokers,
        down = ?cli.down,
        producers = cli.producers,
        sends = cli.sends,
        "Simulation configured"
    );

    // Keep the watcher alive for the whole run.
    let _watcher = match (&cli.config, cli.watch) {
        (Some(path), true) => {
            let (watcher, updates) = ConfigWatcher::new(path);
            let watcher = watcher.with_current(config.clone()).run()?;
            spawn_reload(strategy.clone(), updates);
            Some(watcher)
        }
        _ => None,
    };

    let brokers = Arc::new(cli.brokers);
    let down = Arc::new(cli.down);
    let interval = Duration::from_millis(cli.interval_ms);

    let mut producers = JoinSet::new();
    for id in 0..cli.producers {
        producers.spawn(run_producer(
            id,
            strategy.clone(),
            brokers.clone(),
            down.clone(),
            cli.sends,
            interval,
        ));
    }

    let mut sends: BTreeMap<String, usize> = BTreeMap::new();
    let mut failures = 0;
    let mut no_destination = 0;
    while let Some(result) = producers.join_next().await {
        let stats = result?;
        for (broker, count) in stats.sends {
            *sends.entry(broker).or_default() += count;
        }
        failures += stats.failures;
        no_destination += stats.no_destination;
    }

    let now = strategy.tolerance().clock().now();
    let mut records: Vec<RecordView> = strategy
        .tolerance()
        .snapshot()
        .into_iter()
        .map(|s| RecordView {
            remaining_ms: s.remaining_at(now).as_millis(),
            name: s.name,
            current_latency_ms: s.current_latency.as_millis(),
            available: s.available,
        })
        .collect();
    records.sort_by(|a, b| a.name.cmp(&b.name));

    let summary = Summary {
        sends,
        failures,
        no_destination,
        records,
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);

    tracing::info!(failures, no_destination, "Simulation complete");
    Ok(())
}
