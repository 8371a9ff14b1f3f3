//! Notification delivery for alerts

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;

use super::config::{Alert, AlertChannel, AlertEvent, AlertLog};
use super::mail::{MailMessage, MailTransport};
use super::render;
use crate::monitor::{HttpMethod, Monitor};
use crate::store::AlertLogSink;

/// User-Agent sent with webhook deliveries
pub const WEBHOOK_USER_AGENT: &str = concat!("upwatch-webhook/", env!("CARGO_PKG_VERSION"));

/// Deadline for a single webhook delivery
pub const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(10);

/// Sender identity for outgoing email
#[derive(Debug, Clone)]
pub struct EmailSender {
    pub name: String,
    pub email: String,
}

impl EmailSender {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }

    fn mailbox(&self) -> String {
        format!("\"{}\" <{}>", self.name, self.email)
    }
}

impl Default for EmailSender {
    fn default() -> Self {
        Self::new("Uptime Monitor", "alerts@localhost")
    }
}

/// Result of one delivery attempt
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeliveryOutcome {
    pub alert_id: String,
    pub channel: AlertChannel,
    pub success: bool,
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    event: &'static str,
    monitor: WebhookMonitor<'a>,
    timestamp: String,
    consecutive_failures: u32,
}

#[derive(Debug, Serialize)]
struct WebhookMonitor<'a> {
    id: &'a str,
    name: &'a str,
    url: &'a str,
    method: HttpMethod,
}

/// Notifier rendering and sending alert messages.
///
/// Every attempt, successful or not, is written to the delivery log sink.
pub struct Notifier {
    client: reqwest::Client,
    mail: Arc<dyn MailTransport>,
    sender: EmailSender,
    logs: Arc<dyn AlertLogSink>,
}

impl Notifier {
    pub fn new(
        mail: Arc<dyn MailTransport>,
        logs: Arc<dyn AlertLogSink>,
        sender: EmailSender,
    ) -> Result<Self, NotifierError> {
        let client = reqwest::Client::builder()
            .timeout(WEBHOOK_TIMEOUT)
            .user_agent(WEBHOOK_USER_AGENT)
            .build()
            .map_err(|e| NotifierError::Webhook(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            mail,
            sender,
            logs,
        })
    }

    /// Send one notification and record the attempt
    pub async fn dispatch(
        &self,
        alert: &Alert,
        monitor: &Monitor,
        event: AlertEvent,
        consecutive_failures: u32,
    ) -> DeliveryOutcome {
        let result = self
            .send(alert, monitor, event, consecutive_failures)
            .await;

        let error = match &result {
            Ok(()) => {
                tracing::info!(
                    alert_id = %alert.id,
                    monitor_id = %monitor.id,
                    channel = %alert.channel,
                    target = %alert.target,
                    event = ?event,
                    "Alert sent"
                );
                None
            }
            Err(e) => {
                tracing::warn!(
                    alert_id = %alert.id,
                    monitor_id = %monitor.id,
                    channel = %alert.channel,
                    target = %alert.target,
                    event = ?event,
                    error = %e,
                    "Alert delivery failed"
                );
                Some(e.to_string())
            }
        };

        let log = AlertLog::new(
            &alert.id,
            &monitor.id,
            event.log_message(),
            error.is_none(),
            error.clone(),
        );
        if let Err(e) = self.logs.store_alert_log(log).await {
            tracing::error!(
                alert_id = %alert.id,
                monitor_id = %monitor.id,
                error = %e,
                "Failed to record alert log"
            );
        }

        DeliveryOutcome {
            alert_id: alert.id.clone(),
            channel: alert.channel,
            success: error.is_none(),
            error,
        }
    }

    /// Notify every channel independently; one failure does not stop the rest
    pub async fn dispatch_all(
        &self,
        alerts: &[Alert],
        monitor: &Monitor,
        event: AlertEvent,
        consecutive_failures: u32,
    ) -> Vec<DeliveryOutcome> {
        let mut outcomes = Vec::with_capacity(alerts.len());
        for alert in alerts {
            outcomes.push(
                self.dispatch(alert, monitor, event, consecutive_failures)
                    .await,
            );
        }
        outcomes
    }

    async fn send(
        &self,
        alert: &Alert,
        monitor: &Monitor,
        event: AlertEvent,
        consecutive_failures: u32,
    ) -> Result<(), NotifierError> {
        match alert.channel {
            AlertChannel::Email => {
                self.send_email(alert, monitor, event, consecutive_failures)
                    .await
            }
            AlertChannel::Webhook => {
                self.send_webhook(alert, monitor, event, consecutive_failures)
                    .await
            }
        }
    }

    async fn send_email(
        &self,
        alert: &Alert,
        monitor: &Monitor,
        event: AlertEvent,
        consecutive_failures: u32,
    ) -> Result<(), NotifierError> {
        let message = MailMessage {
            from: self.sender.mailbox(),
            to: alert.target.clone(),
            subject: render::subject(event, monitor),
            html_body: render::html_body(event, monitor, consecutive_failures, Utc::now()),
        };
        self.mail.send(&message).await
    }

    /// Send webhook notification
    async fn send_webhook(
        &self,
        alert: &Alert,
        monitor: &Monitor,
        event: AlertEvent,
        consecutive_failures: u32,
    ) -> Result<(), NotifierError> {
        let payload = WebhookPayload {
            event: event.webhook_event(),
            monitor: WebhookMonitor {
                id: &monitor.id,
                name: &monitor.name,
                url: &monitor.url,
                method: monitor.method,
            },
            timestamp: Utc::now().to_rfc3339(),
            consecutive_failures,
        };

        let response = self
            .client
            .post(&alert.target)
            .json(&payload)
            .send()
            .await
            .map_err(|e| NotifierError::Webhook(format!("Failed to send webhook: {}", e)))?;

        if !response.status().is_success() {
            return Err(NotifierError::Webhook(format!(
                "Webhook returned status {}",
                response.status()
            )));
        }

        tracing::debug!(
            alert_id = %alert.id,
            url = %alert.target,
            "Webhook notification sent"
        );

        Ok(())
    }
}

/// Notifier errors
#[derive(Debug, thiserror::Error)]
pub enum NotifierError {
    #[error("Webhook error: {0}")]
    Webhook(String),

    #[error("Email error: {0}")]
    Email(String),
}
