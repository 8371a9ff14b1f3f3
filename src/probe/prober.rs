//! HTTP prober executing one request per check

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE, USER_AGENT};
use reqwest::redirect::Policy;
use reqwest::Method;

use super::error::ProbeError;
use crate::monitor::{response_snippet, CheckResult, HttpMethod, Monitor};

/// User-Agent sent with every probe unless the monitor overrides it
pub const PROBE_USER_AGENT: &str = concat!("upwatch/", env!("CARGO_PKG_VERSION"));

/// Maximum redirects followed per probe
pub const MAX_REDIRECTS: usize = 5;

/// Executes a single check for a monitor.
///
/// Implementations never fail: transport problems are reported as a
/// `CheckResult` with `is_up == false`.
#[async_trait]
pub trait Probe: Send + Sync {
    async fn check(&self, monitor: &Monitor) -> CheckResult;
}

/// reqwest-backed prober
#[derive(Debug, Clone)]
pub struct HttpProber {
    client: reqwest::Client,
}

impl HttpProber {
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .redirect(Policy::limited(MAX_REDIRECTS))
            .build()?;
        Ok(Self { client })
    }

    fn build_request(&self, monitor: &Monitor) -> Result<reqwest::RequestBuilder, ProbeError> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(PROBE_USER_AGENT));

        for (name, value) in &monitor.headers {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| ProbeError::Other(format!("Invalid header name {}: {}", name, e)))?;
            let header_value = HeaderValue::from_str(value)
                .map_err(|e| ProbeError::Other(format!("Invalid header value for {}: {}", name, e)))?;
            headers.insert(header_name, header_value);
        }

        let body = monitor
            .body
            .as_ref()
            .filter(|b| !b.is_empty() && monitor.method.carries_body());
        if body.is_some() && !headers.contains_key(CONTENT_TYPE) {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }

        let mut request = self
            .client
            .request(to_reqwest_method(monitor.method), &monitor.url)
            .headers(headers)
            .timeout(Duration::from_secs(u64::from(monitor.timeout_seconds)));

        if let Some(body) = body {
            request = request.body(body.clone());
        }

        Ok(request)
    }

    async fn execute(&self, monitor: &Monitor) -> Result<(u16, String), ProbeError> {
        let request = self.build_request(monitor)?;

        let response = request
            .send()
            .await
            .map_err(|e| ProbeError::classify(&e, monitor.timeout_seconds))?;

        let status = response.status().as_u16();
        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_ascii_lowercase().contains("json"))
            .unwrap_or(false);

        let raw = response
            .text()
            .await
            .map_err(|e| ProbeError::classify(&e, monitor.timeout_seconds))?;

        Ok((status, body_text(raw, is_json)))
    }
}

#[async_trait]
impl Probe for HttpProber {
    async fn check(&self, monitor: &Monitor) -> CheckResult {
        let start = Instant::now();
        let outcome = self.execute(monitor).await;
        let elapsed_ms = start.elapsed().as_millis() as u64;

        match outcome {
            Ok((status, body)) => {
                let (is_up, error_message) = evaluate(monitor, status, &body);

                if is_up {
                    tracing::debug!(
                        monitor_id = %monitor.id,
                        url = %monitor.url,
                        status,
                        elapsed_ms,
                        "Check succeeded"
                    );
                } else {
                    tracing::warn!(
                        monitor_id = %monitor.id,
                        url = %monitor.url,
                        status,
                        elapsed_ms,
                        reason = error_message.as_deref().unwrap_or_default(),
                        "Check failed"
                    );
                }

                CheckResult::received(
                    &monitor.id,
                    status,
                    elapsed_ms,
                    is_up,
                    error_message,
                    response_snippet(&body),
                )
            }
            Err(e) => {
                tracing::warn!(
                    monitor_id = %monitor.id,
                    url = %monitor.url,
                    elapsed_ms,
                    error = %e,
                    "Check request failed"
                );
                CheckResult::unreachable(&monitor.id, elapsed_ms, e.to_string())
            }
        }
    }
}

/// Decide whether a received response counts as up
pub fn evaluate(monitor: &Monitor, status: u16, body: &str) -> (bool, Option<String>) {
    if !monitor.expects_status(status) {
        return (false, Some(format!("Unexpected status code: {}", status)));
    }

    match monitor.keyword() {
        Some(keyword) if !body.contains(keyword) => {
            (false, Some("Keyword validation failed".to_string()))
        }
        _ => (true, None),
    }
}

/// Text used for keyword matching and snippets.
///
/// JSON bodies are re-serialized compactly; a bare JSON string is unwrapped.
fn body_text(raw: String, is_json: bool) -> String {
    if !is_json {
        return raw;
    }
    match serde_json::from_str::<serde_json::Value>(&raw) {
        Ok(serde_json::Value::String(s)) => s,
        Ok(value) => serde_json::to_string(&value).unwrap_or(raw),
        Err(_) => raw,
    }
}

fn to_reqwest_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Delete => Method::DELETE,
        HttpMethod::Patch => Method::PATCH,
    }
}
