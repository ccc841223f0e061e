//! Per-destination health record.

use std::fmt;
use std::time::{Duration, Instant};

/// Latest observation for one destination.
///
/// `available_from` is always `observation time + avoidance window` of the most
/// recent update; nothing from earlier updates is carried over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthRecord<T> {
    pub name: T,
    pub current_latency: Duration,
    pub available_from: Instant,
}

impl<T> HealthRecord<T> {
    pub fn new(name: T, current_latency: Duration, available_from: Instant) -> Self {
        Self {
            name,
            current_latency,
            available_from,
        }
    }

    /// Healthy once `now` reaches `available_from`.
    pub fn is_available_at(&self, now: Instant) -> bool {
        now >= self.available_from
    }
}

impl<T: fmt::Debug> fmt::Display for HealthRecord<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "HealthRecord {{ name: {:?}, current_latency: {}ms }}",
            self.name,
            self.current_latency.as_millis()
        )
    }
}

/// A record copied out of the registry, with availability fixed at copy time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordSnapshot<T> {
    pub name: T,
    pub current_latency: Duration,
    pub available_from: Instant,
    pub available: bool,
}

impl<T: Clone> RecordSnapshot<T> {
    pub fn capture(record: &HealthRecord<T>, now: Instant) -> Self {
        Self {
            name: record.name.clone(),
            current_latency: record.current_latency,
            available_from: record.available_from,
            available: record.is_available_at(now),
        }
    }
}

impl<T> RecordSnapshot<T> {
    /// Time left in the avoidance window as of `now` (zero once elapsed).
    pub fn remaining_at(&self, now: Instant) -> Duration {
        self.available_from.saturating_duration_since(now)
    }
}
