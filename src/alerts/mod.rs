//! Alerting for monitors
//!
//! Tracks failure streaks per monitor and delivers failure, recovery and
//! test notifications over email and webhook channels.

pub mod config;
pub mod mail;
pub mod notifier;
pub mod render;
pub mod tracker;

pub use config::{
    Alert, AlertChannel, AlertConfigError, AlertEvent, AlertLog, CreateAlert, UpdateAlert,
};
#[cfg(test)]
pub use mail::MemoryMailTransport;
pub use mail::{LogMailTransport, MailMessage, MailTransport};
pub use notifier::{DeliveryOutcome, EmailSender, Notifier, NotifierError};
pub use tracker::{AlertDecision, AlertPolicy, AlertState, AlertTracker, FAILURE_THRESHOLD};
