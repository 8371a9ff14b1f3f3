//! Upwatch: HTTP Uptime Monitoring
//!
//! Periodically probes configured HTTP endpoints, records every check and
//! notifies alert channels when a monitor goes down or recovers.
//!
//! # Features
//!
//! - **Per-Monitor Scheduling**: One task per active monitor, aligned to clock minutes where possible
//! - **HTTP Probing**: Status and keyword validation with bounded timeouts
//! - **Alert Thresholds**: Alerts after repeated failures, with a cooldown between alerts
//! - **Notifications**: Email and webhook channels with a delivery log
//! - **Statistics**: Cached uptime and latency summaries
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use upwatch::api::build_state;
//! use upwatch::config::AppConfig;
//! use upwatch::monitor::Monitor;
//! use upwatch::store::MemoryStore;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(MemoryStore::new());
//! let state = build_state(&AppConfig::default(), Arc::clone(&store))?;
//!
//! let monitor = Monitor::new("homepage", "https://example.com").with_keyword("Example");
//! store.insert_monitor(monitor.clone())?;
//!
//! state.scheduler.start().await?;
//! let result = state.scheduler.perform_check(&monitor).await;
//! println!("up: {}, {} ms", result.is_up, result.response_time_ms);
//! # Ok(())
//! # }
//! ```

pub mod alerts;
pub mod api;
pub mod config;
pub mod monitor;
pub mod probe;
pub mod scheduler;
pub mod store;

// Re-export commonly used types
pub use alerts::{Alert, AlertEvent, AlertTracker, Notifier};
pub use config::AppConfig;
pub use monitor::{CheckResult, Monitor};
pub use scheduler::Scheduler;
pub use store::{MemoryStore, StoreError};
