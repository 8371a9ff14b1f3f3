//! Uptime and latency statistics over check history
//!
//! Stats are derived from the stored results and memoized per monitor in a
//! moka cache that is invalidated whenever a new result arrives.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use moka::sync::Cache;
use serde::Serialize;

use super::check::CheckResult;

/// Number of newest checks included in `recent_checks`
pub const RECENT_CHECKS: usize = 20;

/// Aggregated view of a monitor's recent behaviour
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonitorStats {
    pub monitor_id: String,
    pub uptime_24h: f64,
    pub uptime_7d: f64,
    pub avg_response_time_24h: u64,
    pub total_checks: usize,
    pub last_check: Option<CheckResult>,
    pub recent_checks: Vec<CheckResult>,
}

impl MonitorStats {
    /// Compute stats from a history ordered newest first
    pub fn compute(monitor_id: &str, history: &[CheckResult], now: DateTime<Utc>) -> Self {
        let day_ago = now - chrono::Duration::hours(24);
        let week_ago = now - chrono::Duration::days(7);

        let last_24h: Vec<&CheckResult> =
            history.iter().filter(|c| c.checked_at >= day_ago).collect();
        let last_7d: Vec<&CheckResult> =
            history.iter().filter(|c| c.checked_at >= week_ago).collect();

        let up_24h: Vec<&&CheckResult> = last_24h.iter().filter(|c| c.is_up).collect();
        let avg_response_time_24h = if up_24h.is_empty() {
            0
        } else {
            let total: u64 = up_24h.iter().map(|c| c.response_time_ms).sum();
            (total as f64 / up_24h.len() as f64).round() as u64
        };

        Self {
            monitor_id: monitor_id.to_string(),
            uptime_24h: uptime_percent(&last_24h),
            uptime_7d: uptime_percent(&last_7d),
            avg_response_time_24h,
            total_checks: history.len(),
            last_check: history.first().cloned(),
            recent_checks: last_24h.into_iter().take(RECENT_CHECKS).cloned().collect(),
        }
    }
}

fn uptime_percent(checks: &[&CheckResult]) -> f64 {
    if checks.is_empty() {
        return 0.0;
    }
    let up = checks.iter().filter(|c| c.is_up).count();
    let percent = up as f64 / checks.len() as f64 * 100.0;
    (percent * 100.0).round() / 100.0
}

/// Per-monitor stats cache with TTL expiration
pub struct StatsCache {
    cache: Cache<String, MonitorStats>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl StatsCache {
    pub fn new(ttl: Duration) -> Self {
        Self::with_capacity(10_000, ttl)
    }

    pub fn with_capacity(max_entries: u64, ttl: Duration) -> Self {
        Self {
            cache: Cache::builder()
                .max_capacity(max_entries)
                .time_to_live(ttl)
                .build(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn get(&self, monitor_id: &str) -> Option<MonitorStats> {
        match self.cache.get(monitor_id) {
            Some(stats) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(stats)
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    pub fn put(&self, stats: MonitorStats) {
        self.cache.insert(stats.monitor_id.clone(), stats);
    }

    /// Drop cached stats for a monitor
    pub fn invalidate(&self, monitor_id: &str) {
        self.cache.invalidate(monitor_id);
    }

    pub fn hit_count(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn miss_count(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }
}

impl Default for StatsCache {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}
