//! Monitor configuration requests and validation

use std::collections::HashMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::model::{
    HttpMethod, Monitor, DEFAULT_EXPECTED_STATUS_CODES, DEFAULT_INTERVAL_MINUTES,
    DEFAULT_TIMEOUT_SECONDS, MAX_INTERVAL_MINUTES, MAX_TIMEOUT_SECONDS, MIN_INTERVAL_MINUTES,
    MIN_TIMEOUT_SECONDS,
};

const MAX_NAME_LEN: usize = 100;

/// Request to create a monitor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMonitor {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub method: HttpMethod,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default = "default_interval")]
    pub interval_minutes: u32,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u32,
    #[serde(default)]
    pub expected_status_codes: Vec<u16>,
    #[serde(default)]
    pub keyword_validation: Option<String>,
    #[serde(default)]
    pub owner_id: Option<String>,
}

fn default_interval() -> u32 {
    DEFAULT_INTERVAL_MINUTES
}

fn default_timeout() -> u32 {
    DEFAULT_TIMEOUT_SECONDS
}

impl CreateMonitor {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            method: HttpMethod::Get,
            headers: HashMap::new(),
            body: None,
            interval_minutes: DEFAULT_INTERVAL_MINUTES,
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            expected_status_codes: Vec::new(),
            keyword_validation: None,
            owner_id: None,
        }
    }

    /// Validate the request and build an active monitor
    pub fn into_monitor(self) -> Result<Monitor, ValidationError> {
        let now = Utc::now();
        let monitor = Monitor {
            id: uuid::Uuid::new_v4().to_string(),
            owner_id: self.owner_id.unwrap_or_else(|| "anonymous".to_string()),
            name: self.name.trim().to_string(),
            url: self.url.trim().to_string(),
            method: self.method,
            headers: self.headers,
            body: self.body,
            interval_minutes: self.interval_minutes,
            timeout_seconds: self.timeout_seconds,
            expected_status_codes: normalize_status_codes(self.expected_status_codes),
            keyword_validation: normalize_keyword(self.keyword_validation),
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        validate(&monitor)?;
        Ok(monitor)
    }
}

/// Partial update of a monitor; absent fields keep their current value
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateMonitor {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub method: Option<HttpMethod>,
    #[serde(default)]
    pub headers: Option<HashMap<String, String>>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub interval_minutes: Option<u32>,
    #[serde(default)]
    pub timeout_seconds: Option<u32>,
    #[serde(default)]
    pub expected_status_codes: Option<Vec<u16>>,
    #[serde(default)]
    pub keyword_validation: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

impl UpdateMonitor {
    pub fn toggle(active: bool) -> Self {
        Self {
            is_active: Some(active),
            ..Self::default()
        }
    }

    /// Merge the update into `current`, returning the validated result
    pub fn apply(&self, current: &Monitor) -> Result<Monitor, ValidationError> {
        let mut next = current.clone();

        if let Some(name) = &self.name {
            next.name = name.trim().to_string();
        }
        if let Some(url) = &self.url {
            next.url = url.trim().to_string();
        }
        if let Some(method) = self.method {
            next.method = method;
        }
        if let Some(headers) = &self.headers {
            next.headers = headers.clone();
        }
        if let Some(body) = &self.body {
            next.body = Some(body.clone()).filter(|b| !b.is_empty());
        }
        if let Some(interval) = self.interval_minutes {
            next.interval_minutes = interval;
        }
        if let Some(timeout) = self.timeout_seconds {
            next.timeout_seconds = timeout;
        }
        if let Some(codes) = &self.expected_status_codes {
            next.expected_status_codes = normalize_status_codes(codes.clone());
        }
        if let Some(keyword) = &self.keyword_validation {
            next.keyword_validation = normalize_keyword(Some(keyword.clone()));
        }
        if let Some(active) = self.is_active {
            next.is_active = active;
        }

        validate(&next)?;
        next.updated_at = Utc::now();
        Ok(next)
    }
}

fn normalize_status_codes(codes: Vec<u16>) -> Vec<u16> {
    if codes.is_empty() {
        DEFAULT_EXPECTED_STATUS_CODES.to_vec()
    } else {
        codes
    }
}

fn normalize_keyword(keyword: Option<String>) -> Option<String> {
    keyword.filter(|k| !k.is_empty())
}

/// Check every configuration invariant of a monitor
pub fn validate(monitor: &Monitor) -> Result<(), ValidationError> {
    if monitor.name.is_empty() {
        return Err(ValidationError::EmptyName);
    }
    if monitor.name.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::NameTooLong(MAX_NAME_LEN));
    }

    let url = reqwest::Url::parse(&monitor.url)
        .map_err(|e| ValidationError::InvalidUrl(format!("{}: {}", monitor.url, e)))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ValidationError::InvalidUrl(format!(
            "{}: scheme must be http or https",
            monitor.url
        )));
    }

    if !(MIN_INTERVAL_MINUTES..=MAX_INTERVAL_MINUTES).contains(&monitor.interval_minutes) {
        return Err(ValidationError::IntervalOutOfRange(monitor.interval_minutes));
    }
    if !(MIN_TIMEOUT_SECONDS..=MAX_TIMEOUT_SECONDS).contains(&monitor.timeout_seconds) {
        return Err(ValidationError::TimeoutOutOfRange(monitor.timeout_seconds));
    }

    if monitor.expected_status_codes.is_empty() {
        return Err(ValidationError::NoExpectedStatus);
    }
    if let Some(code) = monitor
        .expected_status_codes
        .iter()
        .find(|c| !(100..=599).contains(*c))
    {
        return Err(ValidationError::InvalidStatusCode(*code));
    }

    Ok(())
}

/// Monitor configuration errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("Monitor name is required")]
    EmptyName,

    #[error("Monitor name must be at most {0} characters")]
    NameTooLong(usize),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Interval must be between 1 and 1440 minutes, got {0}")]
    IntervalOutOfRange(u32),

    #[error("Timeout must be between 1 and 300 seconds, got {0}")]
    TimeoutOutOfRange(u32),

    #[error("At least one expected status code is required")]
    NoExpectedStatus,

    #[error("Invalid expected status code: {0}")]
    InvalidStatusCode(u16),
}
