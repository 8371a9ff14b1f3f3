//! Monitor definitions

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status codes accepted when a monitor does not configure its own
pub const DEFAULT_EXPECTED_STATUS_CODES: [u16; 4] = [200, 201, 202, 204];

/// Default check interval in minutes
pub const DEFAULT_INTERVAL_MINUTES: u32 = 5;

/// Default request timeout in seconds
pub const DEFAULT_TIMEOUT_SECONDS: u32 = 30;

pub const MIN_INTERVAL_MINUTES: u32 = 1;
pub const MAX_INTERVAL_MINUTES: u32 = 1440;
pub const MIN_TIMEOUT_SECONDS: u32 = 1;
pub const MAX_TIMEOUT_SECONDS: u32 = 300;

/// HTTP method used when probing a monitor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Delete,
    Patch,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
        }
    }

    /// Whether requests with this method carry the monitor body
    pub fn carries_body(&self) -> bool {
        matches!(self, HttpMethod::Post | HttpMethod::Put | HttpMethod::Patch)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "DELETE" => Ok(HttpMethod::Delete),
            "PATCH" => Ok(HttpMethod::Patch),
            other => Err(format!("unsupported HTTP method: {}", other)),
        }
    }
}

/// A configured endpoint under periodic observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Monitor {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub method: HttpMethod,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default)]
    pub body: Option<String>,
    pub interval_minutes: u32,
    pub timeout_seconds: u32,
    pub expected_status_codes: Vec<u16>,
    #[serde(default)]
    pub keyword_validation: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Monitor {
    /// Create an active GET monitor with default settings
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            owner_id: "anonymous".to_string(),
            name: name.into(),
            url: url.into(),
            method: HttpMethod::Get,
            headers: HashMap::new(),
            body: None,
            interval_minutes: DEFAULT_INTERVAL_MINUTES,
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            expected_status_codes: DEFAULT_EXPECTED_STATUS_CODES.to_vec(),
            keyword_validation: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_method(mut self, method: HttpMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_interval(mut self, minutes: u32) -> Self {
        self.interval_minutes = minutes;
        self
    }

    pub fn with_timeout(mut self, seconds: u32) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    pub fn with_expected_status(mut self, codes: Vec<u16>) -> Self {
        self.expected_status_codes = codes;
        self
    }

    pub fn with_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keyword_validation = Some(keyword.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_active(mut self, active: bool) -> Self {
        self.is_active = active;
        self
    }

    /// Keyword that the response body must contain, ignoring empty values
    pub fn keyword(&self) -> Option<&str> {
        self.keyword_validation.as_deref().filter(|k| !k.is_empty())
    }

    pub fn expects_status(&self, status: u16) -> bool {
        self.expected_status_codes.contains(&status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_serde_uppercase() {
        let json = serde_json::to_string(&HttpMethod::Patch).unwrap();
        assert_eq!(json, "\"PATCH\"");

        let method: HttpMethod = serde_json::from_str("\"DELETE\"").unwrap();
        assert_eq!(method, HttpMethod::Delete);
    }

    #[test]
    fn test_method_parse_is_case_insensitive() {
        assert_eq!("post".parse::<HttpMethod>().unwrap(), HttpMethod::Post);
        assert!("TRACE".parse::<HttpMethod>().is_err());
    }

    #[test]
    fn test_only_payload_methods_carry_body() {
        assert!(HttpMethod::Post.carries_body());
        assert!(HttpMethod::Put.carries_body());
        assert!(HttpMethod::Patch.carries_body());
        assert!(!HttpMethod::Get.carries_body());
        assert!(!HttpMethod::Delete.carries_body());
    }

    #[test]
    fn test_empty_keyword_is_ignored() {
        let monitor = Monitor::new("api", "https://example.com").with_keyword("");
        assert_eq!(monitor.keyword(), None);

        let monitor = monitor.with_keyword("ok");
        assert_eq!(monitor.keyword(), Some("ok"));
    }

    #[test]
    fn test_defaults() {
        let monitor = Monitor::new("api", "https://example.com");
        assert!(monitor.is_active);
        assert_eq!(monitor.interval_minutes, 5);
        assert_eq!(monitor.timeout_seconds, 30);
        assert!(monitor.expects_status(204));
        assert!(!monitor.expects_status(500));
    }
}
