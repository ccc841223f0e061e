//! Ordering of tracked destinations, best first.

use std::cmp::Ordering;

use crate::registry::RecordSnapshot;

/// Preference ordering between two snapshots.
///
/// - `Ordering::Less` if `this` is preferred over `other`
/// - `Ordering::Greater` if `other` is preferred
///
/// Available beats unavailable, then lower latency, then the earlier recovery
/// time, then the name so the order is total.
pub fn rank_order<T: Ord>(this: &RecordSnapshot<T>, other: &RecordSnapshot<T>) -> Ordering {
    match (this.available, other.available) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => this
            .current_latency
            .cmp(&other.current_latency)
            .then_with(|| this.available_from.cmp(&other.available_from))
            .then_with(|| this.name.cmp(&other.name)),
    }
}

/// Sort snapshots in place, best first.
pub fn rank<T: Ord>(records: &mut [RecordSnapshot<T>]) {
    records.sort_by(rank_order);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    fn snap(name: &'static str, latency_ms: u64, from: Instant, available: bool) -> RecordSnapshot<&'static str> {
        RecordSnapshot {
            name,
            current_latency: Duration::from_millis(latency_ms),
            available_from: from,
            available,
        }
    }

    #[test]
    fn test_available_first_regardless_of_latency() {
        let now = Instant::now();
        let mut records = vec![snap("slow-down", 5, now, false), snap("ok", 900, now, true)];
        rank(&mut records);
        assert_eq!(records[0].name, "ok");
    }

    #[test]
    fn test_composite_tie_breaks() {
        let now = Instant::now();
        let later = now + Duration::from_secs(10);
        let mut records = vec![
            snap("d", 100, later, true),
            snap("c", 100, now, true),
            snap("b", 100, now, true),
            snap("a", 200, now, true),
        ];
        rank(&mut records);
        let names: Vec<_> = records.iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["b", "c", "d", "a"]);
    }
}
