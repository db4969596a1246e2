//! In-memory request metrics.
//!
//! Counters are bucketed per calendar day (`YYYY-MM-DD`) and per hour
//! (`YYYY-MM-DDTHH`) in UTC. Retention is bounded so a long-running process
//! cannot grow without limit; old buckets are pruned on write.

use std::collections::BTreeMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Days of daily buckets kept.
const DAILY_RETENTION: usize = 30;

/// Hours of hourly buckets kept.
const HOURLY_RETENTION: usize = 48;

/// Counters for one time bucket.
#[derive(Debug, Default, Clone, Serialize)]
pub struct BucketCounters {
    /// Total requests seen.
    pub total: u64,
    /// Responses with a 4xx status.
    pub client_errors: u64,
    /// Responses with a 5xx status.
    pub server_errors: u64,
    /// Requests flagged by the suspicious-pattern detector.
    pub suspicious: u64,
}

impl BucketCounters {
    fn record(&mut self, status: u16, suspicious: bool) {
        self.total += 1;
        match status {
            400..=499 => self.client_errors += 1,
            500..=599 => self.server_errors += 1,
            _ => {}
        }
        if suspicious {
            self.suspicious += 1;
        }
    }
}

/// Point-in-time copy of all buckets.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    /// Daily buckets keyed `YYYY-MM-DD`, oldest first.
    pub daily: BTreeMap<String, BucketCounters>,
    /// Hourly buckets keyed `YYYY-MM-DDTHH`, oldest first.
    pub hourly: BTreeMap<String, BucketCounters>,
}

#[derive(Debug, Default)]
struct Buckets {
    daily: BTreeMap<String, BucketCounters>,
    hourly: BTreeMap<String, BucketCounters>,
}

/// Thread-safe request counters.
#[derive(Debug, Default)]
pub struct RequestMetrics {
    buckets: RwLock<Buckets>,
}

impl RequestMetrics {
    /// Create an empty metrics store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one request outcome at time `now`.
    pub fn record(&self, status: u16, suspicious: bool, now: DateTime<Utc>) {
        let day = now.format("%Y-%m-%d").to_string();
        let hour = now.format("%Y-%m-%dT%H").to_string();

        let mut buckets = self
            .buckets
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        buckets.daily.entry(day).or_default().record(status, suspicious);
        buckets
            .hourly
            .entry(hour)
            .or_default()
            .record(status, suspicious);

        prune(&mut buckets.daily, DAILY_RETENTION);
        prune(&mut buckets.hourly, HOURLY_RETENTION);
    }

    /// Copy out every bucket.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        let buckets = self
            .buckets
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        MetricsSnapshot {
            daily: buckets.daily.clone(),
            hourly: buckets.hourly.clone(),
        }
    }
}

/// Drop the oldest buckets until at most `keep` remain.
///
/// Bucket keys sort chronologically, so the map's first keys are oldest.
fn prune(map: &mut BTreeMap<String, BucketCounters>, keep: usize) {
    while map.len() > keep {
        let Some(oldest) = map.keys().next().cloned() else {
            break;
        };
        map.remove(&oldest);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, mo: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, 30, 0).unwrap()
    }

    #[test]
    fn test_record_buckets_by_day_and_hour() {
        let metrics = RequestMetrics::new();
        metrics.record(200, false, at(2026, 3, 1, 10));
        metrics.record(404, false, at(2026, 3, 1, 10));
        metrics.record(500, true, at(2026, 3, 1, 11));
        metrics.record(200, false, at(2026, 3, 2, 0));

        let snap = metrics.snapshot();
        assert_eq!(snap.daily.len(), 2);
        assert_eq!(snap.hourly.len(), 3);

        let day1 = &snap.daily["2026-03-01"];
        assert_eq!(day1.total, 3);
        assert_eq!(day1.client_errors, 1);
        assert_eq!(day1.server_errors, 1);
        assert_eq!(day1.suspicious, 1);

        let hour = &snap.hourly["2026-03-01T10"];
        assert_eq!(hour.total, 2);
    }

    #[test]
    fn test_retention_prunes_oldest() {
        let metrics = RequestMetrics::new();
        for h in 0..24 {
            metrics.record(200, false, at(2026, 3, 1, h));
            metrics.record(200, false, at(2026, 3, 2, h));
            metrics.record(200, false, at(2026, 3, 3, h));
        }

        let snap = metrics.snapshot();
        assert_eq!(snap.hourly.len(), HOURLY_RETENTION);
        // Oldest day's hourly buckets were pruned first.
        assert!(!snap.hourly.contains_key("2026-03-01T00"));
        assert!(snap.hourly.contains_key("2026-03-03T23"));
        assert_eq!(snap.daily.len(), 3);
    }
}
