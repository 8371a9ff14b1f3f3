use axum::{
    routing::{get, patch, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers::{
    create_alert, create_monitor, delete_alert, delete_monitor, get_monitor, health_check,
    list_alerts, list_monitors, monitor_alert_logs, monitor_checks, monitor_stats,
    scheduler_status, test_alert, test_monitor, toggle_monitor, update_alert, update_monitor,
    AppState,
};
use crate::alerts::{AlertTracker, LogMailTransport, Notifier};
use crate::config::AppConfig;
use crate::monitor::StatsCache;
use crate::probe::HttpProber;
use crate::scheduler::Scheduler;
use crate::store::MemoryStore;

/// Build the application router
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Monitors
        .route("/monitors", get(list_monitors).post(create_monitor))
        .route(
            "/monitors/:id",
            get(get_monitor)
                .patch(update_monitor)
                .delete(delete_monitor),
        )
        .route("/monitors/:id/toggle", post(toggle_monitor))
        .route("/monitors/:id/test", post(test_monitor))
        // History
        .route("/monitors/:id/checks", get(monitor_checks))
        .route("/monitors/:id/stats", get(monitor_stats))
        // Alerts
        .route("/monitors/:id/alerts", get(list_alerts).post(create_alert))
        .route("/monitors/:id/alert-logs", get(monitor_alert_logs))
        .route("/alerts/:id", patch(update_alert).delete(delete_alert))
        .route("/alerts/:id/test", post(test_alert))
        // Scheduler
        .route("/scheduler", get(scheduler_status))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Wire the monitoring services around a store
pub fn build_state(
    config: &AppConfig,
    store: Arc<MemoryStore>,
) -> Result<Arc<AppState>, Box<dyn std::error::Error>> {
    let stats_cache = Arc::new(StatsCache::new(config.stats_cache_ttl()));
    let notifier = Arc::new(Notifier::new(
        Arc::new(LogMailTransport),
        store.clone(),
        config.email_sender(),
    )?);
    let tracker = Arc::new(AlertTracker::new(
        config.alert_policy(),
        store.clone(),
        Arc::clone(&notifier),
    ));
    let scheduler = Arc::new(
        Scheduler::new(
            store.clone(),
            store.clone(),
            Arc::new(HttpProber::new()?),
            tracker,
        )
        .with_stats_cache(Arc::clone(&stats_cache)),
    );

    Ok(Arc::new(AppState {
        store,
        scheduler,
        notifier,
        stats_cache,
        monitor_writes: parking_lot::Mutex::new(()),
    }))
}

/// Run the HTTP server
pub async fn run_server(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(MemoryStore::new());
    let state = build_state(&config, store)?;

    // Start scheduling before accepting requests
    let scheduled = state.scheduler.start().await?;
    tracing::info!("Scheduled {} monitors", scheduled);

    let scheduler = Arc::clone(&state.scheduler);
    let app = build_router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    tracing::info!("Starting upwatch server on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(Arc::clone(&scheduler)))
        .await?;

    // Checks already running when the signal arrived finish here
    scheduler.shutdown().await;

    tracing::info!("upwatch server stopped");
    Ok(())
}

async fn shutdown_signal(scheduler: Arc<Scheduler>) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }

    tracing::info!("Shutdown signal received, stopping scheduler...");
    scheduler.stop();
}
