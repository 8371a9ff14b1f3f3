//! Recurring checks for active monitors
//!
//! Each active monitor runs in its own task firing at the cadence derived
//! from its interval. Results flow through the alert tracker after being
//! stored.

pub mod cadence;
pub mod service;

pub use cadence::{Cadence, ScheduleError};
pub use service::Scheduler;
