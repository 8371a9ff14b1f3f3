//! Environment-driven service configuration

use std::time::Duration;

use crate::alerts::tracker::DEFAULT_COOLDOWN_MINUTES;
use crate::alerts::{AlertPolicy, EmailSender};

/// Service configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Minimum minutes between failure alerts for one monitor
    pub alert_cooldown_minutes: i64,
    pub from_email: String,
    pub from_name: String,
    pub stats_cache_ttl_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            alert_cooldown_minutes: DEFAULT_COOLDOWN_MINUTES,
            from_email: "alerts@localhost".to_string(),
            from_name: "Uptime Monitor".to_string(),
            stats_cache_ttl_secs: 30,
        }
    }
}

impl AppConfig {
    /// Read `UPWATCH_*` variables, falling back to defaults
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; unparsable values use the default
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        Self {
            host: lookup("UPWATCH_HOST").unwrap_or(defaults.host),
            port: lookup("UPWATCH_PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            alert_cooldown_minutes: lookup("UPWATCH_ALERT_COOLDOWN_MINUTES")
                .and_then(|m| m.parse().ok())
                .filter(|m: &i64| *m >= 0)
                .unwrap_or(defaults.alert_cooldown_minutes),
            from_email: lookup("UPWATCH_FROM_EMAIL").unwrap_or(defaults.from_email),
            from_name: lookup("UPWATCH_FROM_NAME").unwrap_or(defaults.from_name),
            stats_cache_ttl_secs: lookup("UPWATCH_STATS_CACHE_TTL_SECS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.stats_cache_ttl_secs),
        }
    }

    pub fn alert_policy(&self) -> AlertPolicy {
        AlertPolicy::with_cooldown_minutes(self.alert_cooldown_minutes)
    }

    pub fn email_sender(&self) -> EmailSender {
        EmailSender::new(&self.from_name, &self.from_email)
    }

    pub fn stats_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.stats_cache_ttl_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(|_| None);
        assert_eq!(config.port, 8080);
        assert_eq!(config.alert_cooldown_minutes, 30);
        assert_eq!(config.alert_policy().cooldown, chrono::Duration::minutes(30));
        assert_eq!(config.alert_policy().failure_threshold, 3);
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_lookup(lookup(&[
            ("UPWATCH_HOST", "127.0.0.1"),
            ("UPWATCH_PORT", "9000"),
            ("UPWATCH_ALERT_COOLDOWN_MINUTES", "5"),
            ("UPWATCH_FROM_NAME", "Ops"),
            ("UPWATCH_FROM_EMAIL", "ops@example.com"),
        ]));
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 9000);
        assert_eq!(config.alert_cooldown_minutes, 5);
        assert_eq!(config.email_sender().name, "Ops");
        assert_eq!(config.email_sender().email, "ops@example.com");
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = AppConfig::from_lookup(lookup(&[
            ("UPWATCH_PORT", "not-a-port"),
            ("UPWATCH_ALERT_COOLDOWN_MINUTES", "-4"),
        ]));
        assert_eq!(config.port, 8080);
        assert_eq!(config.alert_cooldown_minutes, 30);
    }
}
