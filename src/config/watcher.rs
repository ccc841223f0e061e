//! Live reload of latency settings.
//!
//! # Data Flow
//! ```text
//! file modified / created (notify)
//!     → Reloader::handle: load_config (parse + validate)
//!     → identical to the last accepted config? skip
//!     → mpsc channel
//!     → spawn_reload task: FaultStrategy::apply_config(latency section)
//! ```
//!
//! Invalid files never leave the watcher; the strategy keeps its settings.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::config::loader::load_config;
use crate::config::schema::FaultToleranceConfig;
use crate::registry::{Destination, LatencyFaultTolerance};
use crate::strategy::FaultStrategy;

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Watches one configuration file and forwards each new valid version.
pub struct ConfigWatcher {
    path: PathBuf,
    poll_interval: Duration,
    current: Option<FaultToleranceConfig>,
    update_tx: mpsc::UnboundedSender<FaultToleranceConfig>,
}

impl ConfigWatcher {
    /// Returns the watcher and the receiving end of its updates.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<FaultToleranceConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        let watcher = Self {
            path: path.to_path_buf(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            current: None,
            update_tx,
        };
        (watcher, update_rx)
    }

    /// Config already in effect; an identical reload is not forwarded.
    pub fn with_current(mut self, config: FaultToleranceConfig) -> Self {
        self.current = Some(config);
        self
    }

    /// Poll interval for backends without native change events.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Start watching. Events stop when the returned handle is dropped.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let mut reloader = Reloader {
            path: self.path.clone(),
            last: self.current,
            tx: self.update_tx,
        };

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| reloader.handle(res),
            Config::default().with_poll_interval(self.poll_interval),
        )?;
        watcher.watch(&self.path, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.path, "Config watcher started");
        Ok(watcher)
    }
}

/// State carried by the notify callback.
struct Reloader {
    path: PathBuf,
    last: Option<FaultToleranceConfig>,
    tx: mpsc::UnboundedSender<FaultToleranceConfig>,
}

impl Reloader {
    fn handle(&mut self, res: notify::Result<Event>) {
        let event = match res {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!(error = %e, path = ?self.path, "Config watch error");
                return;
            }
        };
        if !(event.kind.is_modify() || event.kind.is_create()) {
            return;
        }

        match load_config(&self.path) {
            Ok(config) if self.last.as_ref() == Some(&config) => {
                tracing::trace!(path = ?self.path, "Config unchanged, skipping reload");
            }
            Ok(config) => {
                tracing::info!(path = ?self.path, "Config change detected");
                self.last = Some(config.clone());
                if self.tx.send(config).is_err() {
                    tracing::debug!("Reload receiver gone, dropping config update");
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, path = ?self.path, "Ignoring invalid config file");
            }
        }
    }
}

/// Apply every received config to `strategy` until the sender side closes.
///
/// Only the `[latency]` section is live; selection settings need a restart.
pub fn spawn_reload<T, F>(
    strategy: Arc<FaultStrategy<T, F>>,
    mut updates: mpsc::UnboundedReceiver<FaultToleranceConfig>,
) -> JoinHandle<()>
where
    T: Destination,
    F: LatencyFaultTolerance<T> + 'static,
{
    tokio::spawn(async move {
        while let Some(config) = updates.recv().await {
            if let Err(e) = strategy.apply_config(&config.latency) {
                tracing::warn!(error = %e, "Config reload rejected, latency settings unchanged");
            }
        }
        tracing::debug!("Config reload channel closed");
    })
}
