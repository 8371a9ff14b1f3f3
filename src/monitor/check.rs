//! Check results

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum number of body characters kept in a snippet
pub const SNIPPET_MAX_CHARS: usize = 500;

/// Recorded outcome of a single probe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    pub id: String,
    pub monitor_id: String,
    /// Observed HTTP status, 0 when no response was received
    pub status_code: u16,
    pub response_time_ms: u64,
    pub is_up: bool,
    pub error_message: Option<String>,
    pub response_snippet: Option<String>,
    pub checked_at: DateTime<Utc>,
}

impl CheckResult {
    /// Result for a response that was received
    pub fn received(
        monitor_id: impl Into<String>,
        status_code: u16,
        response_time_ms: u64,
        is_up: bool,
        error_message: Option<String>,
        response_snippet: Option<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            monitor_id: monitor_id.into(),
            status_code,
            response_time_ms,
            is_up,
            error_message,
            response_snippet,
            checked_at: Utc::now(),
        }
    }

    /// Result for a request that never completed
    pub fn unreachable(
        monitor_id: impl Into<String>,
        response_time_ms: u64,
        error_message: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            monitor_id: monitor_id.into(),
            status_code: 0,
            response_time_ms,
            is_up: false,
            error_message: Some(error_message.into()),
            response_snippet: None,
            checked_at: Utc::now(),
        }
    }

    pub fn with_checked_at(mut self, checked_at: DateTime<Utc>) -> Self {
        self.checked_at = checked_at;
        self
    }
}

/// First 500 characters of a body, suffixed with "..." when truncated
pub fn response_snippet(body: &str) -> Option<String> {
    if body.is_empty() {
        return None;
    }

    match body.char_indices().nth(SNIPPET_MAX_CHARS) {
        Some((cut, _)) => Some(format!("{}...", &body[..cut])),
        None => Some(body.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snippet_truncates_long_bodies() {
        let body = "x".repeat(10_000);
        let snippet = response_snippet(&body).unwrap();
        assert_eq!(snippet.chars().count(), 503);
        assert!(snippet.ends_with("..."));
    }

    #[test]
    fn test_snippet_keeps_short_bodies() {
        assert_eq!(response_snippet("ok").as_deref(), Some("ok"));

        let exact = "y".repeat(500);
        assert_eq!(response_snippet(&exact), Some(exact.clone()));
    }

    #[test]
    fn test_snippet_counts_characters_not_bytes() {
        let body = "é".repeat(600);
        let snippet = response_snippet(&body).unwrap();
        assert_eq!(snippet.chars().count(), 503);
    }

    #[test]
    fn test_snippet_omitted_for_empty_body() {
        assert_eq!(response_snippet(""), None);
    }

    #[test]
    fn test_unreachable_has_zero_status() {
        let result = CheckResult::unreachable("m1", 12, "Connection refused");
        assert_eq!(result.status_code, 0);
        assert!(!result.is_up);
        assert_eq!(result.error_message.as_deref(), Some("Connection refused"));
    }
}
