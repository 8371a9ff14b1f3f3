//! Collaborator interfaces for configuration and result persistence
//!
//! The monitoring pipeline only depends on these traits. `MemoryStore` is the
//! in-process implementation used by the server and tests.

pub mod memory;

use async_trait::async_trait;

use crate::alerts::{Alert, AlertLog};
use crate::monitor::{CheckResult, Monitor};

pub use memory::MemoryStore;

/// Source of monitor and alert configuration
#[async_trait]
pub trait MonitorStore: Send + Sync {
    /// All monitors whose active flag is set
    async fn list_active_monitors(&self) -> Result<Vec<Monitor>, StoreError>;

    /// Active alert channels configured for a monitor
    async fn get_active_alerts_for_monitor(
        &self,
        monitor_id: &str,
    ) -> Result<Vec<Alert>, StoreError>;
}

/// Append-only sink for check results
#[async_trait]
pub trait ResultSink: Send + Sync {
    async fn store_check_result(&self, result: &CheckResult) -> Result<(), StoreError>;
}

/// Sink for alert delivery records
#[async_trait]
pub trait AlertLogSink: Send + Sync {
    async fn store_alert_log(&self, log: AlertLog) -> Result<(), StoreError>;
}

/// Storage errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    #[error("Monitor not found: {0}")]
    MonitorNotFound(String),

    #[error("Alert not found: {0}")]
    AlertNotFound(String),

    #[error("Duplicate id: {0}")]
    Duplicate(String),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}
