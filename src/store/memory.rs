//! In-memory store backing monitors, alerts, results and delivery logs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::RwLock;

use super::{AlertLogSink, MonitorStore, ResultSink, StoreError};
use crate::alerts::{Alert, AlertLog};
use crate::monitor::{CheckResult, Monitor};

/// Default number of results retained per monitor
pub const DEFAULT_MAX_CHECKS_PER_MONITOR: usize = 20_000;

/// Default number of delivery records retained across all monitors
pub const DEFAULT_MAX_ALERT_LOGS: usize = 50_000;

pub struct MemoryStore {
    /// Monitors indexed by id
    monitors: DashMap<String, Monitor>,
    /// Check history per monitor, oldest first
    checks: DashMap<String, Vec<CheckResult>>,
    /// Alerts indexed by id
    alerts: DashMap<String, Alert>,
    /// Delivery records, oldest first
    alert_logs: RwLock<Vec<AlertLog>>,
    max_checks_per_monitor: usize,
    max_alert_logs: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_retention(DEFAULT_MAX_CHECKS_PER_MONITOR)
    }

    pub fn with_retention(max_checks_per_monitor: usize) -> Self {
        Self {
            monitors: DashMap::new(),
            checks: DashMap::new(),
            alerts: DashMap::new(),
            alert_logs: RwLock::new(Vec::new()),
            max_checks_per_monitor: max_checks_per_monitor.max(1),
            max_alert_logs: DEFAULT_MAX_ALERT_LOGS,
        }
    }

    pub fn with_alert_log_retention(mut self, max_alert_logs: usize) -> Self {
        self.max_alert_logs = max_alert_logs.max(1);
        self
    }

    // ------------------------------------------------------------------
    // Monitors
    // ------------------------------------------------------------------

    pub fn insert_monitor(&self, monitor: Monitor) -> Result<(), StoreError> {
        if self.monitors.contains_key(&monitor.id) {
            return Err(StoreError::Duplicate(monitor.id));
        }
        self.monitors.insert(monitor.id.clone(), monitor);
        Ok(())
    }

    pub fn get_monitor(&self, id: &str) -> Option<Monitor> {
        self.monitors.get(id).map(|m| m.clone())
    }

    /// Monitors newest first, optionally restricted to one owner
    pub fn list_monitors(&self, owner_id: Option<&str>) -> Vec<Monitor> {
        let mut monitors: Vec<Monitor> = self
            .monitors
            .iter()
            .filter(|m| owner_id.map_or(true, |owner| m.owner_id == owner))
            .map(|m| m.clone())
            .collect();
        monitors.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        monitors
    }

    /// Replace an existing monitor, returning the previous version
    pub fn replace_monitor(&self, monitor: Monitor) -> Result<Monitor, StoreError> {
        match self.monitors.get_mut(&monitor.id) {
            Some(mut entry) => Ok(std::mem::replace(entry.value_mut(), monitor)),
            None => Err(StoreError::MonitorNotFound(monitor.id)),
        }
    }

    /// Delete a monitor together with its history, alerts and delivery logs
    pub fn delete_monitor(&self, id: &str) -> Result<Monitor, StoreError> {
        let (_, monitor) = self
            .monitors
            .remove(id)
            .ok_or_else(|| StoreError::MonitorNotFound(id.to_string()))?;

        self.checks.remove(id);
        self.alerts.retain(|_, alert| alert.monitor_id != id);
        self.alert_logs.write().retain(|log| log.monitor_id != id);

        Ok(monitor)
    }

    pub fn monitor_count(&self) -> usize {
        self.monitors.len()
    }

    // ------------------------------------------------------------------
    // Check history
    // ------------------------------------------------------------------

    /// Full retained history, newest first
    pub fn check_history(&self, monitor_id: &str) -> Vec<CheckResult> {
        self.checks
            .get(monitor_id)
            .map(|checks| checks.iter().rev().cloned().collect())
            .unwrap_or_default()
    }

    /// Results at or after `since`, newest first, at most `limit`
    pub fn recent_checks(
        &self,
        monitor_id: &str,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Vec<CheckResult> {
        self.checks
            .get(monitor_id)
            .map(|checks| {
                checks
                    .iter()
                    .rev()
                    .filter(|c| c.checked_at >= since)
                    .take(limit)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    // ------------------------------------------------------------------
    // Alerts
    // ------------------------------------------------------------------

    pub fn insert_alert(&self, alert: Alert) -> Result<(), StoreError> {
        if !self.monitors.contains_key(&alert.monitor_id) {
            return Err(StoreError::MonitorNotFound(alert.monitor_id));
        }
        if self.alerts.contains_key(&alert.id) {
            return Err(StoreError::Duplicate(alert.id));
        }
        self.alerts.insert(alert.id.clone(), alert);
        Ok(())
    }

    pub fn get_alert(&self, id: &str) -> Option<Alert> {
        self.alerts.get(id).map(|a| a.clone())
    }

    /// All alerts of a monitor, newest first
    pub fn alerts_for_monitor(&self, monitor_id: &str) -> Vec<Alert> {
        let mut alerts: Vec<Alert> = self
            .alerts
            .iter()
            .filter(|a| a.monitor_id == monitor_id)
            .map(|a| a.clone())
            .collect();
        alerts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        alerts
    }

    pub fn replace_alert(&self, alert: Alert) -> Result<Alert, StoreError> {
        match self.alerts.get_mut(&alert.id) {
            Some(mut entry) => Ok(std::mem::replace(entry.value_mut(), alert)),
            None => Err(StoreError::AlertNotFound(alert.id)),
        }
    }

    pub fn delete_alert(&self, id: &str) -> Result<Alert, StoreError> {
        self.alerts
            .remove(id)
            .map(|(_, alert)| alert)
            .ok_or_else(|| StoreError::AlertNotFound(id.to_string()))
    }

    // ------------------------------------------------------------------
    // Delivery logs
    // ------------------------------------------------------------------

    /// Delivery records for a monitor, newest first
    pub fn alert_logs(
        &self,
        monitor_id: &str,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Vec<AlertLog> {
        let logs = self.alert_logs.read();
        logs.iter()
            .rev()
            .filter(|log| log.monitor_id == monitor_id && log.sent_at >= since)
            .take(limit)
            .cloned()
            .collect()
    }

    pub fn alert_log_count(&self) -> usize {
        self.alert_logs.read().len()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MonitorStore for MemoryStore {
    async fn list_active_monitors(&self) -> Result<Vec<Monitor>, StoreError> {
        Ok(self
            .list_monitors(None)
            .into_iter()
            .filter(|m| m.is_active)
            .collect())
    }

    async fn get_active_alerts_for_monitor(
        &self,
        monitor_id: &str,
    ) -> Result<Vec<Alert>, StoreError> {
        Ok(self
            .alerts_for_monitor(monitor_id)
            .into_iter()
            .filter(|a| a.is_active)
            .collect())
    }
}

#[async_trait]
impl ResultSink for MemoryStore {
    /// Results for a monitor that no longer exists are dropped
    async fn store_check_result(&self, result: &CheckResult) -> Result<(), StoreError> {
        // held until the push lands so a concurrent delete clears it afterwards
        let Some(_monitor) = self.monitors.get(&result.monitor_id) else {
            tracing::debug!(
                monitor_id = %result.monitor_id,
                "Dropping result for deleted monitor"
            );
            return Ok(());
        };

        let mut checks = self.checks.entry(result.monitor_id.clone()).or_default();
        checks.push(result.clone());

        let len = checks.len();
        if len > self.max_checks_per_monitor {
            checks.drain(..len - self.max_checks_per_monitor);
        }
        Ok(())
    }
}

#[async_trait]
impl AlertLogSink for MemoryStore {
    async fn store_alert_log(&self, log: AlertLog) -> Result<(), StoreError> {
        let mut logs = self.alert_logs.write();
        logs.push(log);

        let len = logs.len();
        if len > self.max_alert_logs {
            logs.drain(..len - self.max_alert_logs);
        }
        Ok(())
    }
}
