//! Usage Tracker
//!
//! Per-key, per-UTC-day request counters backing the rate limiter.
//! Counters are process-local and flushed to disk every `flush_every`
//! increments per key and on graceful shutdown; losing a window smaller
//! than `flush_every` on a crash is tolerated.

use std::collections::HashMap;
use std::path::PathBuf;

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::repository::file::{self, StoreError};

/// Persisted counter for one key
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayCount {
    pub day: NaiveDate,
    pub count: u64,
}

struct KeyUsage {
    day: NaiveDate,
    count: u64,
    /// Increments since the last flush for this key
    dirty: u32,
}

/// Outcome of a rate-limit check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateCheck {
    Allowed {
        limit: u64,
        remaining: u64,
    },
    Limited {
        limit: u64,
        /// Midnight UTC of the next day, when the counter resets
        reset: DateTime<Utc>,
    },
}

pub struct UsageTracker {
    path: PathBuf,
    flush_every: u32,
    inner: Mutex<HashMap<String, KeyUsage>>,
}

impl UsageTracker {
    /// Load persisted counters. A missing file yields empty counters; a
    /// corrupt file is an error (fatal at startup).
    pub fn load(path: PathBuf, flush_every: u32) -> Result<Self, StoreError> {
        let persisted: HashMap<String, DayCount> = if path.exists() {
            file::read_json(&path)?
        } else {
            HashMap::new()
        };

        let inner = persisted
            .into_iter()
            .map(|(key, dc)| {
                (
                    key,
                    KeyUsage {
                        day: dc.day,
                        count: dc.count,
                        dirty: 0,
                    },
                )
            })
            .collect();

        Ok(Self {
            path,
            flush_every: flush_every.max(1),
            inner: Mutex::new(inner),
        })
    }

    /// Check the caller against its daily limit for `today`, incrementing
    /// the counter on allow. The first use in a new day resets the count.
    pub async fn check_and_increment(&self, key: &str, limit: u64, today: NaiveDate) -> RateCheck {
        let mut map = self.inner.lock().await;
        let usage = map.entry(key.to_string()).or_insert(KeyUsage {
            day: today,
            count: 0,
            dirty: 0,
        });

        if usage.day != today {
            usage.day = today;
            usage.count = 0;
        }

        if usage.count >= limit {
            return RateCheck::Limited {
                limit,
                reset: next_midnight_utc(today),
            };
        }

        usage.count += 1;
        usage.dirty += 1;
        let remaining = limit - usage.count;

        if usage.dirty >= self.flush_every {
            usage.dirty = 0;
            if let Err(e) = Self::persist(&self.path, &map) {
                tracing::warn!("Failed to flush usage counters: {}", e);
            }
        }

        RateCheck::Allowed { limit, remaining }
    }

    /// Flush all counters to disk (shutdown path)
    pub async fn flush(&self) -> Result<(), StoreError> {
        let mut map = self.inner.lock().await;
        for usage in map.values_mut() {
            usage.dirty = 0;
        }
        Self::persist(&self.path, &map)
    }

    fn persist(path: &PathBuf, map: &HashMap<String, KeyUsage>) -> Result<(), StoreError> {
        let snapshot: HashMap<&String, DayCount> = map
            .iter()
            .map(|(key, usage)| {
                (
                    key,
                    DayCount {
                        day: usage.day,
                        count: usage.count,
                    },
                )
            })
            .collect();
        file::write_json_atomic(path, &snapshot)
    }
}

/// Midnight UTC of the day after `day`
fn next_midnight_utc(day: NaiveDate) -> DateTime<Utc> {
    let next = day.checked_add_days(Days::new(1)).unwrap_or(day);
    next.and_hms_opt(0, 0, 0)
        .expect("midnight is always a valid time")
        .and_utc()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn test_counts_up_to_limit_then_denies() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = UsageTracker::load(dir.path().join("usage.json"), 100).unwrap();
        let today = day("2024-06-01");

        for expected_remaining in [1, 0] {
            match tracker.check_and_increment("k", 2, today).await {
                RateCheck::Allowed { limit, remaining } => {
                    assert_eq!(limit, 2);
                    assert_eq!(remaining, expected_remaining);
                }
                RateCheck::Limited { .. } => panic!("denied below the limit"),
            }
        }

        match tracker.check_and_increment("k", 2, today).await {
            RateCheck::Limited { limit, reset } => {
                assert_eq!(limit, 2);
                assert_eq!(reset.to_rfc3339(), "2024-06-02T00:00:00+00:00");
            }
            RateCheck::Allowed { .. } => panic!("allowed over the limit"),
        }
    }

    #[tokio::test]
    async fn test_new_day_resets_counter() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = UsageTracker::load(dir.path().join("usage.json"), 100).unwrap();

        let monday = day("2024-06-03");
        assert!(matches!(
            tracker.check_and_increment("k", 1, monday).await,
            RateCheck::Allowed { .. }
        ));
        assert!(matches!(
            tracker.check_and_increment("k", 1, monday).await,
            RateCheck::Limited { .. }
        ));

        let tuesday = day("2024-06-04");
        assert!(matches!(
            tracker.check_and_increment("k", 1, tuesday).await,
            RateCheck::Allowed { .. }
        ));
    }

    #[tokio::test]
    async fn test_flush_cadence_persists_every_n_increments() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("usage.json");
        let tracker = UsageTracker::load(path.clone(), 3).unwrap();
        let today = day("2024-06-01");

        tracker.check_and_increment("k", 100, today).await;
        tracker.check_and_increment("k", 100, today).await;
        assert!(!path.exists());

        tracker.check_and_increment("k", 100, today).await;
        assert!(path.exists());

        let persisted: HashMap<String, DayCount> = file::read_json(&path).unwrap();
        assert_eq!(persisted["k"].count, 3);
    }

    #[tokio::test]
    async fn test_explicit_flush_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("usage.json");
        let today = day("2024-06-01");

        let tracker = UsageTracker::load(path.clone(), 1000).unwrap();
        tracker.check_and_increment("k", 100, today).await;
        tracker.flush().await.unwrap();

        let reopened = UsageTracker::load(path, 1000).unwrap();
        match reopened.check_and_increment("k", 100, today).await {
            RateCheck::Allowed { remaining, .. } => assert_eq!(remaining, 98),
            RateCheck::Limited { .. } => panic!("unexpected limit"),
        }
    }

    #[tokio::test]
    async fn test_zero_limit_always_denies() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = UsageTracker::load(dir.path().join("usage.json"), 100).unwrap();
        assert!(matches!(
            tracker.check_and_increment("k", 0, day("2024-06-01")).await,
            RateCheck::Limited { .. }
        ));
    }
}
