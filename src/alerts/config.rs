//! Alert channel configuration types

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Notification channel attached to a monitor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    /// Unique alert ID
    pub id: String,
    /// Monitor this alert belongs to
    pub monitor_id: String,
    /// Delivery channel
    #[serde(rename = "type")]
    pub channel: AlertChannel,
    /// Email address or webhook URL
    pub target: String,
    /// Whether alert is enabled
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Alert {
    /// Create an active alert
    pub fn new(
        monitor_id: impl Into<String>,
        channel: AlertChannel,
        target: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            monitor_id: monitor_id.into(),
            channel,
            target: target.into(),
            is_active: true,
            created_at: Utc::now(),
        }
    }

    pub fn email(monitor_id: impl Into<String>, to: impl Into<String>) -> Self {
        Self::new(monitor_id, AlertChannel::Email, to)
    }

    pub fn webhook(monitor_id: impl Into<String>, url: impl Into<String>) -> Self {
        Self::new(monitor_id, AlertChannel::Webhook, url)
    }

    /// Set enabled state
    pub fn with_active(mut self, active: bool) -> Self {
        self.is_active = active;
        self
    }
}

/// Delivery channel type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertChannel {
    Email,
    Webhook,
}

impl fmt::Display for AlertChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertChannel::Email => f.write_str("email"),
            AlertChannel::Webhook => f.write_str("webhook"),
        }
    }
}

/// Kind of event a notification describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertEvent {
    Failure,
    Recovery,
    Test,
}

impl AlertEvent {
    /// Event name used in webhook payloads
    pub fn webhook_event(&self) -> &'static str {
        match self {
            AlertEvent::Failure => "monitor.down",
            AlertEvent::Recovery => "monitor.up",
            AlertEvent::Test => "monitor.test",
        }
    }

    /// Message recorded in the delivery log
    pub fn log_message(&self) -> &'static str {
        match self {
            AlertEvent::Failure => "Monitor failure alert sent",
            AlertEvent::Recovery => "Monitor recovery alert sent",
            AlertEvent::Test => "Test alert sent",
        }
    }
}

/// Persisted record of one delivery attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertLog {
    pub id: String,
    pub alert_id: String,
    pub monitor_id: String,
    pub message: String,
    pub sent_at: DateTime<Utc>,
    pub success: bool,
    pub error_message: Option<String>,
}

impl AlertLog {
    pub fn new(
        alert_id: impl Into<String>,
        monitor_id: impl Into<String>,
        message: impl Into<String>,
        success: bool,
        error_message: Option<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            alert_id: alert_id.into(),
            monitor_id: monitor_id.into(),
            message: message.into(),
            sent_at: Utc::now(),
            success,
            error_message,
        }
    }
}

/// Request to attach an alert to a monitor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAlert {
    #[serde(rename = "type")]
    pub channel: AlertChannel,
    pub target: String,
}

impl CreateAlert {
    pub fn into_alert(self, monitor_id: &str) -> Result<Alert, AlertConfigError> {
        let target = self.target.trim().to_string();
        validate_target(self.channel, &target)?;
        Ok(Alert::new(monitor_id, self.channel, target))
    }
}

/// Partial alert update
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateAlert {
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

impl UpdateAlert {
    pub fn apply(&self, current: &Alert) -> Result<Alert, AlertConfigError> {
        let mut next = current.clone();
        if let Some(target) = &self.target {
            next.target = target.trim().to_string();
            validate_target(next.channel, &next.target)?;
        }
        if let Some(active) = self.is_active {
            next.is_active = active;
        }
        Ok(next)
    }
}

fn validate_target(channel: AlertChannel, target: &str) -> Result<(), AlertConfigError> {
    match channel {
        AlertChannel::Email => {
            let valid = target
                .split_once('@')
                .map(|(local, domain)| !local.is_empty() && domain.contains('.'))
                .unwrap_or(false);
            if !valid {
                return Err(AlertConfigError::InvalidEmail(target.to_string()));
            }
        }
        AlertChannel::Webhook => {
            let url = reqwest::Url::parse(target)
                .map_err(|_| AlertConfigError::InvalidWebhook(target.to_string()))?;
            if url.scheme() != "http" && url.scheme() != "https" {
                return Err(AlertConfigError::InvalidWebhook(target.to_string()));
            }
        }
    }
    Ok(())
}

/// Alert configuration errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AlertConfigError {
    #[error("Invalid email address: {0}")]
    InvalidEmail(String),

    #[error("Invalid webhook URL: {0}")]
    InvalidWebhook(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alert_serializes_channel_as_type() {
        let alert = Alert::webhook("m1", "https://hooks.example.com/x");
        let json = serde_json::to_value(&alert).unwrap();
        assert_eq!(json["type"], "webhook");
        assert_eq!(json["is_active"], true);
    }

    #[test]
    fn test_event_names() {
        assert_eq!(AlertEvent::Failure.webhook_event(), "monitor.down");
        assert_eq!(AlertEvent::Recovery.webhook_event(), "monitor.up");
        assert_eq!(AlertEvent::Test.log_message(), "Test alert sent");
    }

    #[test]
    fn test_create_alert_validates_target() {
        let alert = CreateAlert {
            channel: AlertChannel::Email,
            target: " ops@example.com ".to_string(),
        }
        .into_alert("m1")
        .unwrap();
        assert_eq!(alert.target, "ops@example.com");
        assert_eq!(alert.monitor_id, "m1");

        let err = CreateAlert {
            channel: AlertChannel::Email,
            target: "nobody".to_string(),
        }
        .into_alert("m1")
        .unwrap_err();
        assert!(matches!(err, AlertConfigError::InvalidEmail(_)));

        let err = CreateAlert {
            channel: AlertChannel::Webhook,
            target: "mailto:ops@example.com".to_string(),
        }
        .into_alert("m1")
        .unwrap_err();
        assert!(matches!(err, AlertConfigError::InvalidWebhook(_)));
    }

    #[test]
    fn test_update_alert() {
        let alert = Alert::email("m1", "ops@example.com");
        let updated = UpdateAlert {
            target: None,
            is_active: Some(false),
        }
        .apply(&alert)
        .unwrap();
        assert!(!updated.is_active);
        assert_eq!(updated.target, alert.target);
    }
}
