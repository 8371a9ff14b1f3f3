use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::alerts::{
    Alert, AlertConfigError, AlertEvent, AlertLog, CreateAlert, DeliveryOutcome, Notifier,
    UpdateAlert,
};
use crate::monitor::{
    CheckResult, CreateMonitor, Monitor, MonitorStats, StatsCache, UpdateMonitor, ValidationError,
};
use crate::scheduler::{ScheduleError, Scheduler};
use crate::store::{MemoryStore, StoreError};

const DEFAULT_HISTORY_HOURS: i64 = 24;
const MAX_HISTORY_HOURS: i64 = 24 * 30;
const DEFAULT_HISTORY_LIMIT: usize = 100;
const MAX_HISTORY_LIMIT: usize = 1000;

/// Application state shared across handlers
pub struct AppState {
    pub store: Arc<MemoryStore>,
    pub scheduler: Arc<Scheduler>,
    pub notifier: Arc<Notifier>,
    pub stats_cache: Arc<StatsCache>,
    /// Held while a monitor change is written to the store and the scheduler
    pub monitor_writes: Mutex<()>,
}

impl AppState {
    fn monitor(&self, id: &str) -> Result<Monitor, ApiError> {
        self.store
            .get_monitor(id)
            .ok_or_else(|| ApiError::NotFound(format!("Monitor '{}' not found", id)))
    }

    fn alert(&self, id: &str) -> Result<Alert, ApiError> {
        self.store
            .get_alert(id)
            .ok_or_else(|| ApiError::NotFound(format!("Alert '{}' not found", id)))
    }
}

// ============================================================================
// Health Check
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub monitors: usize,
}

pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        monitors: state.store.monitor_count(),
    })
}

// ============================================================================
// Monitors
// ============================================================================

#[derive(Deserialize)]
pub struct ListMonitorsParams {
    #[serde(default)]
    pub owner_id: Option<String>,
}

pub async fn list_monitors(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListMonitorsParams>,
) -> Json<Vec<Monitor>> {
    Json(state.store.list_monitors(params.owner_id.as_deref()))
}

pub async fn create_monitor(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateMonitor>,
) -> Result<(StatusCode, Json<Monitor>), ApiError> {
    let monitor = request.into_monitor()?;
    {
        let _writes = state.monitor_writes.lock();
        state.store.insert_monitor(monitor.clone())?;
        state.scheduler.add_monitor(&monitor)?;
    }

    tracing::info!(monitor_id = %monitor.id, url = %monitor.url, "Monitor created");
    Ok((StatusCode::CREATED, Json(monitor)))
}

pub async fn get_monitor(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Monitor>, ApiError> {
    Ok(Json(state.monitor(&id)?))
}

pub async fn update_monitor(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(request): Json<UpdateMonitor>,
) -> Result<Json<Monitor>, ApiError> {
    apply_update(&state, &id, |_| request).map(Json)
}

pub async fn toggle_monitor(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Monitor>, ApiError> {
    apply_update(&state, &id, |current| UpdateMonitor::toggle(!current.is_active)).map(Json)
}

/// Read, change and reschedule a monitor without a delete landing in between
fn apply_update(
    state: &AppState,
    id: &str,
    request: impl FnOnce(&Monitor) -> UpdateMonitor,
) -> Result<Monitor, ApiError> {
    let _writes = state.monitor_writes.lock();
    let current = state.monitor(id)?;
    let updated = request(&current).apply(&current)?;
    state.store.replace_monitor(updated.clone())?;
    state.scheduler.update_monitor(&updated)?;

    tracing::info!(
        monitor_id = %updated.id,
        is_active = updated.is_active,
        interval_minutes = updated.interval_minutes,
        "Monitor updated"
    );
    Ok(updated)
}

pub async fn delete_monitor(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    {
        let _writes = state.monitor_writes.lock();
        state.store.delete_monitor(&id)?;
        state.scheduler.forget_monitor(&id);
    }
    state.stats_cache.invalidate(&id);

    tracing::info!(monitor_id = %id, "Monitor deleted");
    Ok(Json(serde_json::json!({ "deleted": id })))
}

/// Run a check immediately and return its result
pub async fn test_monitor(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<CheckResult>, ApiError> {
    let monitor = state.monitor(&id)?;
    Ok(Json(state.scheduler.perform_check(&monitor).await))
}

// ============================================================================
// History & Stats
// ============================================================================

#[derive(Deserialize)]
pub struct HistoryParams {
    #[serde(default)]
    pub hours: Option<i64>,
    #[serde(default)]
    pub limit: Option<usize>,
}

impl HistoryParams {
    fn since(&self) -> chrono::DateTime<Utc> {
        let hours = self
            .hours
            .unwrap_or(DEFAULT_HISTORY_HOURS)
            .clamp(1, MAX_HISTORY_HOURS);
        Utc::now() - chrono::Duration::hours(hours)
    }

    fn limit(&self) -> usize {
        self.limit
            .unwrap_or(DEFAULT_HISTORY_LIMIT)
            .clamp(1, MAX_HISTORY_LIMIT)
    }
}

pub async fn monitor_checks(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<Vec<CheckResult>>, ApiError> {
    state.monitor(&id)?;
    Ok(Json(
        state
            .store
            .recent_checks(&id, params.since(), params.limit()),
    ))
}

pub async fn monitor_stats(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<MonitorStats>, ApiError> {
    state.monitor(&id)?;

    if let Some(stats) = state.stats_cache.get(&id) {
        return Ok(Json(stats));
    }

    let history = state.store.check_history(&id);
    let stats = MonitorStats::compute(&id, &history, Utc::now());
    state.stats_cache.put(stats.clone());
    Ok(Json(stats))
}

// ============================================================================
// Alerts
// ============================================================================

pub async fn list_alerts(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Alert>>, ApiError> {
    state.monitor(&id)?;
    Ok(Json(state.store.alerts_for_monitor(&id)))
}

pub async fn create_alert(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(request): Json<CreateAlert>,
) -> Result<(StatusCode, Json<Alert>), ApiError> {
    state.monitor(&id)?;
    let alert = request.into_alert(&id)?;
    state.store.insert_alert(alert.clone())?;

    tracing::info!(
        alert_id = %alert.id,
        monitor_id = %id,
        channel = %alert.channel,
        "Alert created"
    );
    Ok((StatusCode::CREATED, Json(alert)))
}

pub async fn update_alert(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(request): Json<UpdateAlert>,
) -> Result<Json<Alert>, ApiError> {
    let current = state.alert(&id)?;
    let updated = request.apply(&current)?;
    state.store.replace_alert(updated.clone())?;
    Ok(Json(updated))
}

pub async fn delete_alert(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.store.delete_alert(&id)?;
    Ok(Json(serde_json::json!({ "deleted": id })))
}

/// Send a test notification through one alert channel
pub async fn test_alert(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<DeliveryOutcome>, ApiError> {
    let alert = state.alert(&id)?;
    let monitor = state.monitor(&alert.monitor_id)?;
    let failures = state.scheduler.tracker().consecutive_failures(&monitor.id);

    let outcome = state
        .notifier
        .dispatch(&alert, &monitor, AlertEvent::Test, failures)
        .await;
    Ok(Json(outcome))
}

pub async fn monitor_alert_logs(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<Vec<AlertLog>>, ApiError> {
    state.monitor(&id)?;
    Ok(Json(
        state
            .store
            .alert_logs(&id, params.since(), params.limit()),
    ))
}

// ============================================================================
// Scheduler
// ============================================================================

#[derive(Serialize)]
pub struct SchedulerStatus {
    pub running: bool,
    pub active_monitors: usize,
    pub monitor_ids: Vec<String>,
    pub alerting_monitors: usize,
    pub stats_cache_hits: u64,
    pub stats_cache_misses: u64,
}

pub async fn scheduler_status(State(state): State<Arc<AppState>>) -> Json<SchedulerStatus> {
    let scheduler = &state.scheduler;
    Json(SchedulerStatus {
        running: scheduler.is_running(),
        active_monitors: scheduler.active_monitor_count(),
        monitor_ids: scheduler.scheduled_ids(),
        alerting_monitors: scheduler.tracker().alerting_count(),
        stats_cache_hits: state.stats_cache.hit_count(),
        stats_cache_misses: state.stats_cache.miss_count(),
    })
}

// ============================================================================
// Error Handling
// ============================================================================

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    Internal(String),
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        ApiError::BadRequest(e.to_string())
    }
}

impl From<AlertConfigError> for ApiError {
    fn from(e: AlertConfigError) -> Self {
        ApiError::BadRequest(e.to_string())
    }
}

impl From<ScheduleError> for ApiError {
    fn from(e: ScheduleError) -> Self {
        ApiError::BadRequest(e.to_string())
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::MonitorNotFound(_) | StoreError::AlertNotFound(_) => {
                ApiError::NotFound(e.to_string())
            }
            StoreError::Duplicate(_) => ApiError::Conflict(e.to_string()),
            StoreError::Unavailable(_) => ApiError::Internal(e.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = serde_json::json!({
            "error": message
        });

        (status, Json(body)).into_response()
    }
}
