//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! registry / strategy events
//!     → logging.rs (tracing events with structured fields)
//!     → metrics.rs (counters, gauges)
//!
//! Consumers:
//!     → stdout via tracing-subscriber
//!     → Prometheus scrape (optional)
//! ```
//!
//! # Design Decisions
//! - Hot-path operations emit at `trace`/`debug` only
//! - Metric calls are no-ops until a recorder is installed

pub mod logging;
pub mod metrics;
