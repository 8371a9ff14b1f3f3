//! Network failure classification

use std::error::Error as StdError;
use std::io;

/// Reason a probe request never produced a response
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProbeError {
    #[error("Request timeout after {0}s")]
    Timeout(u32),

    #[error("Domain not found")]
    DomainNotFound,

    #[error("Connection refused")]
    ConnectionRefused,

    #[error("{0}")]
    Other(String),
}

impl ProbeError {
    /// Classify a transport error into a failure category
    pub fn classify(err: &reqwest::Error, timeout_seconds: u32) -> Self {
        if err.is_timeout() {
            return ProbeError::Timeout(timeout_seconds);
        }

        let mut source: Option<&(dyn StdError + 'static)> = err.source();
        while let Some(cause) = source {
            if let Some(io_err) = cause.downcast_ref::<io::Error>() {
                match io_err.kind() {
                    io::ErrorKind::ConnectionRefused => return ProbeError::ConnectionRefused,
                    io::ErrorKind::TimedOut => return ProbeError::Timeout(timeout_seconds),
                    _ => {}
                }
            }
            let text = cause.to_string();
            if is_dns_failure(&text) {
                return ProbeError::DomainNotFound;
            }
            if text.to_ascii_lowercase().contains("connection refused") {
                return ProbeError::ConnectionRefused;
            }
            source = cause.source();
        }

        ProbeError::Other(describe(err))
    }
}

fn is_dns_failure(message: &str) -> bool {
    let message = message.to_ascii_lowercase();
    message.contains("dns error")
        || message.contains("failed to lookup address")
        || message.contains("name or service not known")
        || message.contains("no such host")
}

/// Error text including its innermost cause
fn describe(err: &reqwest::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message = format!("{}: {}", message, text);
        }
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_strings() {
        assert_eq!(ProbeError::Timeout(30).to_string(), "Request timeout after 30s");
        assert_eq!(ProbeError::DomainNotFound.to_string(), "Domain not found");
        assert_eq!(ProbeError::ConnectionRefused.to_string(), "Connection refused");
        assert_eq!(ProbeError::Other("boom".into()).to_string(), "boom");
    }

    #[test]
    fn test_dns_messages() {
        assert!(is_dns_failure("dns error: failed to lookup address information"));
        assert!(is_dns_failure("No such host is known"));
        assert!(!is_dns_failure("connection reset by peer"));
    }
}
