//! Upwatch Server
//!
//! Run with: cargo run
//!
//! Environment variables:
//! - UPWATCH_HOST: Bind address (default: 0.0.0.0)
//! - UPWATCH_PORT: Port number (default: 8080)
//! - UPWATCH_ALERT_COOLDOWN_MINUTES: Minimum minutes between failure alerts (default: 30)
//! - UPWATCH_FROM_EMAIL: Sender address for email alerts (default: alerts@localhost)
//! - UPWATCH_FROM_NAME: Sender name for email alerts (default: Uptime Monitor)
//! - UPWATCH_STATS_CACHE_TTL_SECS: Lifetime of cached monitor stats (default: 30)
//! - RUST_LOG: Log level (default: info)

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use upwatch::api::run_server;
use upwatch::config::AppConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "upwatch=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env();

    tracing::info!("Upwatch configuration:");
    tracing::info!("  Host: {}:{}", config.host, config.port);
    tracing::info!(
        "  Alert cooldown: {} minutes",
        config.alert_cooldown_minutes
    );
    tracing::info!(
        "  Alert sender: {} <{}>",
        config.from_name,
        config.from_email
    );
    tracing::info!(
        "  Stats cache TTL: {} seconds",
        config.stats_cache_ttl_secs
    );

    println!(
        r#"
  _   _ _ ____ __      __ _ _____ ___ _  _
 | | | | '_ \ \ /\ / / _` | __/ __| || |
 | |_| | |_) \ V  V / (_| | || (__| __ |
  \__,_| .__/ \_/\_/ \__,_|\__\___|_||_|
       |_|

 HTTP Uptime Monitoring
 Version: {}
"#,
        env!("CARGO_PKG_VERSION")
    );

    run_server(config).await
}
