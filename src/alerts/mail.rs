//! Mail transport seam for email alerts

use async_trait::async_trait;

use super::notifier::NotifierError;

/// A rendered email ready for delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html_body: String,
}

/// Delivers rendered email messages
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, message: &MailMessage) -> Result<(), NotifierError>;
}

/// Transport that records messages through tracing instead of SMTP
#[derive(Debug, Default)]
pub struct LogMailTransport;

#[async_trait]
impl MailTransport for LogMailTransport {
    async fn send(&self, message: &MailMessage) -> Result<(), NotifierError> {
        tracing::info!(
            from = %message.from,
            to = %message.to,
            subject = %message.subject,
            "Email notification"
        );
        Ok(())
    }
}

/// Transport keeping every message in memory
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryMailTransport {
    sent: parking_lot::Mutex<Vec<MailMessage>>,
}

#[cfg(test)]
impl MemoryMailTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<MailMessage> {
        self.sent.lock().clone()
    }

    pub fn subjects(&self) -> Vec<String> {
        self.sent.lock().iter().map(|m| m.subject.clone()).collect()
    }
}

#[cfg(test)]
#[async_trait]
impl MailTransport for MemoryMailTransport {
    async fn send(&self, message: &MailMessage) -> Result<(), NotifierError> {
        self.sent.lock().push(message.clone());
        Ok(())
    }
}
