//! Client-side latency fault avoidance.
//!
//! A producer records which destinations just failed or answered slowly and
//! steers later sends away from them until a cooldown elapses, without waiting
//! for the cluster registry to notice.
//!
//! ```text
//! send outcome ─▶ policy (latency → window) ─▶ registry.update_fault_item
//! routing list ─▶ registry.is_available filter ─▶ empty? registry.pick_one_at_least
//! ```

pub mod clock;
pub mod config;
pub mod error;
pub mod observability;
pub mod policy;
pub mod registry;
pub mod selector;
pub mod strategy;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::FaultToleranceConfig;
pub use error::{FaultError, FaultResult, PolicyError};
pub use policy::{DurationPolicy, LatencyTier};
pub use registry::{Destination, FaultRegistry, HealthRecord, LatencyFaultTolerance, RecordSnapshot};
pub use selector::{RandomSource, Selector};
pub use strategy::{FaultStrategy, StrategySettings};
