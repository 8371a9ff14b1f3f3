//! Alert state tracking
//!
//! Turns the stream of up/down verdicts for each monitor into discrete
//! failure and recovery notifications. A monitor alerts once it reaches the
//! failure threshold and re-alerts only after the cooldown has elapsed.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde::Serialize;

use super::config::AlertEvent;
use super::notifier::{DeliveryOutcome, Notifier};
use crate::monitor::Monitor;
use crate::store::MonitorStore;

/// Consecutive failures required before a failure alert is sent
pub const FAILURE_THRESHOLD: u32 = 3;

/// Default minimum spacing between failure alerts
pub const DEFAULT_COOLDOWN_MINUTES: i64 = 30;

/// Threshold and cooldown applied to every monitor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlertPolicy {
    pub failure_threshold: u32,
    pub cooldown: Duration,
}

impl AlertPolicy {
    pub fn with_cooldown_minutes(minutes: i64) -> Self {
        Self {
            failure_threshold: FAILURE_THRESHOLD,
            cooldown: Duration::minutes(minutes.max(0)),
        }
    }
}

impl Default for AlertPolicy {
    fn default() -> Self {
        Self::with_cooldown_minutes(DEFAULT_COOLDOWN_MINUTES)
    }
}

/// Per-monitor alert state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AlertState {
    pub consecutive_failures: u32,
    pub last_alert_sent: Option<DateTime<Utc>>,
    pub is_alerting: bool,
}

/// What a verdict means for notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertDecision {
    /// Nothing to send
    Quiet,
    /// Threshold met but the previous alert is still within cooldown
    Suppressed { consecutive_failures: u32 },
    NotifyFailure { consecutive_failures: u32 },
    NotifyRecovery,
}

pub struct AlertTracker {
    policy: AlertPolicy,
    states: DashMap<String, AlertState>,
    store: Arc<dyn MonitorStore>,
    notifier: Arc<Notifier>,
}

impl AlertTracker {
    pub fn new(policy: AlertPolicy, store: Arc<dyn MonitorStore>, notifier: Arc<Notifier>) -> Self {
        Self {
            policy,
            states: DashMap::new(),
            store,
            notifier,
        }
    }

    pub fn policy(&self) -> AlertPolicy {
        self.policy
    }

    /// Apply a failed check observed at `now`
    pub fn record_failure(&self, monitor_id: &str, now: DateTime<Utc>) -> AlertDecision {
        let mut state = self.states.entry(monitor_id.to_string()).or_default();
        state.consecutive_failures = state.consecutive_failures.saturating_add(1);

        if state.consecutive_failures < self.policy.failure_threshold {
            return AlertDecision::Quiet;
        }

        let cooled_down = state
            .last_alert_sent
            .map_or(true, |last| now - last >= self.policy.cooldown);

        if !cooled_down {
            return AlertDecision::Suppressed {
                consecutive_failures: state.consecutive_failures,
            };
        }

        state.last_alert_sent = Some(now);
        state.is_alerting = true;
        AlertDecision::NotifyFailure {
            consecutive_failures: state.consecutive_failures,
        }
    }

    /// Apply a successful check
    pub fn record_success(&self, monitor_id: &str) -> AlertDecision {
        let Some(mut state) = self.states.get_mut(monitor_id) else {
            return AlertDecision::Quiet;
        };

        let was_alerting = state.is_alerting;
        state.consecutive_failures = 0;
        state.is_alerting = false;

        if was_alerting {
            AlertDecision::NotifyRecovery
        } else {
            AlertDecision::Quiet
        }
    }

    pub async fn handle_monitor_failure(&self, monitor: &Monitor) -> Vec<DeliveryOutcome> {
        match self.record_failure(&monitor.id, Utc::now()) {
            AlertDecision::NotifyFailure {
                consecutive_failures,
            } => {
                tracing::warn!(
                    monitor_id = %monitor.id,
                    monitor = %monitor.name,
                    consecutive_failures,
                    "Monitor is down, sending failure alerts"
                );
                self.notify(monitor, AlertEvent::Failure, consecutive_failures)
                    .await
            }
            AlertDecision::Suppressed {
                consecutive_failures,
            } => {
                tracing::debug!(
                    monitor_id = %monitor.id,
                    consecutive_failures,
                    "Failure alert suppressed by cooldown"
                );
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    pub async fn handle_monitor_recovery(&self, monitor: &Monitor) -> Vec<DeliveryOutcome> {
        match self.record_success(&monitor.id) {
            AlertDecision::NotifyRecovery => {
                tracing::info!(
                    monitor_id = %monitor.id,
                    monitor = %monitor.name,
                    "Monitor recovered, sending recovery alerts"
                );
                self.notify(monitor, AlertEvent::Recovery, 0).await
            }
            _ => Vec::new(),
        }
    }

    async fn notify(
        &self,
        monitor: &Monitor,
        event: AlertEvent,
        consecutive_failures: u32,
    ) -> Vec<DeliveryOutcome> {
        let alerts = match self.store.get_active_alerts_for_monitor(&monitor.id).await {
            Ok(alerts) => alerts,
            Err(e) => {
                tracing::error!(
                    monitor_id = %monitor.id,
                    error = %e,
                    "Failed to load alerts for monitor"
                );
                return Vec::new();
            }
        };

        self.notifier
            .dispatch_all(&alerts, monitor, event, consecutive_failures)
            .await
    }

    pub fn state(&self, monitor_id: &str) -> Option<AlertState> {
        self.states.get(monitor_id).map(|s| s.clone())
    }

    pub fn consecutive_failures(&self, monitor_id: &str) -> u32 {
        self.states
            .get(monitor_id)
            .map_or(0, |s| s.consecutive_failures)
    }

    /// Drop state for a deleted monitor
    pub fn forget(&self, monitor_id: &str) {
        self.states.remove(monitor_id);
    }

    pub fn alerting_count(&self) -> usize {
        self.states.iter().filter(|s| s.is_alerting).count()
    }
}
