//! Monitor configuration, check results and derived statistics

pub mod check;
pub mod model;
pub mod request;
pub mod stats;

pub use check::{response_snippet, CheckResult};
pub use model::{HttpMethod, Monitor};
pub use request::{CreateMonitor, UpdateMonitor, ValidationError};
pub use stats::{MonitorStats, StatsCache};
