//! Local fault registry.
//!
//! # Data Flow
//! ```text
//! Send attempt completes (external pipeline)
//!     → latency / failure measured
//!     → policy.rs (latency → avoidance window)
//!     → FaultRegistry::update_fault_item (upsert record, latest write wins)
//!
//! Next routing decision:
//!     → candidates filtered by FaultRegistry::is_available (hot path, per candidate)
//!     → none left? FaultRegistry::pick_one_at_least
//!         → snapshot of all records
//!         → selector (rank, keep the better part, random pick)
//! ```
//!
//! # Design Decisions
//! - A name with no record is assumed healthy
//! - Availability is computed from the stored timestamp, records never expire on their own
//! - Sharded map so one destination's write never blocks another's read
//! - Only `pick_one_at_least` can fail, and only on an empty registry

pub mod fault_registry;
pub mod record;

use std::fmt::Debug;
use std::hash::Hash;
use std::time::Duration;

use crate::error::FaultResult;

pub use fault_registry::FaultRegistry;
pub use record::{HealthRecord, RecordSnapshot};

/// Identifier of a routable destination (typically a broker name).
pub trait Destination: Eq + Hash + Ord + Clone + Debug + Send + Sync + 'static {}

impl<T> Destination for T where T: Eq + Hash + Ord + Clone + Debug + Send + Sync + 'static {}

/// The four operations a send pipeline uses to steer around failing destinations.
pub trait LatencyFaultTolerance<T>: Send + Sync {
    /// Record the outcome of a send: the observed latency and how long to avoid `name`.
    fn update_fault_item(&self, name: T, current_latency: Duration, not_available: Duration);

    /// True if `name` was never tracked or its avoidance window has elapsed.
    fn is_available(&self, name: &T) -> bool;

    /// Forget everything about `name`.
    fn remove(&self, name: &T);

    /// Best-effort choice among tracked destinations, even if all look unhealthy.
    fn pick_one_at_least(&self) -> FaultResult<T>;
}
