//! Snapshot types returned by the cache
//!
//! Copies of cache state handed to callers and hooks. Nothing here aliases
//! the cache's internals.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Per-key timestamp log of recorded hits or misses.
pub type EventLog = BTreeMap<String, Vec<DateTime<Utc>>>;

/// A stored record as seen by `on_set` hooks.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheRecord<V> {
    /// The key the record is stored under
    pub key: String,
    /// The stored value
    pub data: V,
    /// Requested lifetime in milliseconds, 0 = no expiration
    pub ttl: u64,
    /// Expiration timestamp (Unix milliseconds), 0 = no expiration
    pub expires_at: u64,
    /// Expiration as a date, None = no expiration
    pub expires_on: Option<DateTime<Utc>>,
}

/// Directory record for a known key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyMeta {
    /// The key
    pub key: String,
    /// When the key was first inserted
    pub created_at: DateTime<Utc>,
    /// When the key was last (re)inserted
    pub changed_at: DateTime<Utc>,
}

impl KeyMeta {
    /// Creates metadata for a freshly inserted key.
    pub fn new(key: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            key: key.into(),
            created_at: now,
            changed_at: now,
        }
    }

    /// Marks the key as re-inserted at `now`.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.changed_at = now;
    }
}

/// Snapshot of the recorded statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatsReport {
    /// Number of recorded hits
    pub hit_count: u64,
    /// Number of recorded misses
    pub miss_count: u64,
    /// Hit timestamps per key
    pub hit_log: EventLog,
    /// Miss timestamps per key
    pub miss_log: EventLog,
}

impl StatsReport {
    // == Hit Rate ==
    /// Calculates the hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if nothing was recorded.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hit_count + self.miss_count;
        if total == 0 {
            0.0
        } else {
            self.hit_count as f64 / total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_meta_touch_keeps_created() {
        let t0 = DateTime::<Utc>::from_timestamp_millis(1_000).unwrap();
        let t1 = DateTime::<Utc>::from_timestamp_millis(2_000).unwrap();

        let mut meta = KeyMeta::new("k", t0);
        meta.touch(t1);

        assert_eq!(meta.created_at, t0);
        assert_eq!(meta.changed_at, t1);
    }

    #[test]
    fn test_hit_rate() {
        let mut report = StatsReport::default();
        assert_eq!(report.hit_rate(), 0.0);

        report.hit_count = 1;
        report.miss_count = 1;
        assert_eq!(report.hit_rate(), 0.5);
    }

    #[test]
    fn test_report_serializes() {
        let mut report = StatsReport {
            hit_count: 1,
            ..Default::default()
        };
        report.hit_log.insert(
            "a".to_string(),
            vec![DateTime::<Utc>::from_timestamp_millis(0).unwrap()],
        );

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["hit_count"], 1);
        assert_eq!(json["hit_log"]["a"][0], "1970-01-01T00:00:00Z");
    }
}
