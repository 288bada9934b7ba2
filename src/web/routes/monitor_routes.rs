use axum::{
    Extension, Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use chrono::Utc;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::db::models::{Monitor, MonitorStatus};
use crate::db::store::MonitorUpdate;
use crate::web::models::{
    AuthenticatedUser, CreateMonitorRequest, ManualCheckResponse, MonitorDetailResponse,
    MonitorListResponse, MonitorResponse, UpdateMonitorRequest,
};
use crate::web::{AppState, error::AppError};

const DEFAULT_CHECK_INTERVAL: u64 = 86_400;

pub fn create_monitor_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_monitors).post(create_monitor))
        .route(
            "/{id}",
            get(get_monitor).put(update_monitor).delete(delete_monitor),
        )
        .route("/{id}/check", post(run_manual_check))
}

async fn list_monitors(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<MonitorListResponse>, AppError> {
    let monitors = state.store.monitors_for_user(user.id).await;
    Ok(Json(MonitorListResponse { monitors }))
}

async fn create_monitor(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(payload): Json<CreateMonitorRequest>,
) -> Result<Json<MonitorResponse>, AppError> {
    if payload.name.trim().is_empty() || payload.url.trim().is_empty() {
        return Err(AppError::InvalidInput("Name and URL required".to_string()));
    }

    let limits = user.plan.limits();
    let current = state.store.monitors_for_user(user.id).await.len();
    if current >= limits.max_monitors {
        return Err(AppError::PlanLimit(format!(
            "Plan limit: {} monitors. Upgrade for more.",
            limits.max_monitors
        )));
    }

    let check_interval = payload
        .check_interval
        .unwrap_or(DEFAULT_CHECK_INTERVAL)
        .max(limits.min_interval_seconds);

    let monitor = Monitor {
        id: Uuid::new_v4(),
        user_id: user.id,
        name: payload.name,
        url: payload.url,
        check_interval,
        selector: payload.selector,
        keywords: payload.keywords,
        keyword_mode: payload.keyword_mode,
        notify_webhook: payload.notify_webhook,
        webhook_type: payload.webhook_type,
        notify_email: payload.notify_email.unwrap_or(true),
        status: MonitorStatus::Active,
        last_check: None,
        last_hash: None,
        last_content: None,
        created_at: Utc::now(),
    };
    let monitor = state.store.create_monitor(monitor).await?;

    Ok(Json(MonitorResponse {
        success: true,
        monitor,
    }))
}

async fn get_monitor(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<MonitorDetailResponse>, AppError> {
    let monitor = owned_monitor(&state, &user, id).await?;
    let checks = state.store.checks_for_monitor(monitor.id).await;
    Ok(Json(MonitorDetailResponse { monitor, checks }))
}

async fn update_monitor(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateMonitorRequest>,
) -> Result<Json<MonitorResponse>, AppError> {
    owned_monitor(&state, &user, id).await?;

    let limits = user.plan.limits();
    let update = MonitorUpdate {
        name: payload.name,
        url: payload.url,
        check_interval: payload
            .check_interval
            .map(|interval| interval.max(limits.min_interval_seconds)),
        selector: payload.selector,
        keywords: payload.keywords,
        keyword_mode: payload.keyword_mode,
        notify_webhook: payload.notify_webhook,
        webhook_type: payload.webhook_type,
        notify_email: payload.notify_email,
        status: payload.status,
    };
    let monitor = state
        .store
        .update_monitor(id, update)
        .await?
        .ok_or_else(|| AppError::NotFound("Monitor not found".to_string()))?;

    Ok(Json(MonitorResponse {
        success: true,
        monitor,
    }))
}

async fn delete_monitor(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    owned_monitor(&state, &user, id).await?;
    state.store.delete_monitor(id).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}

async fn run_manual_check(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<ManualCheckResponse>, AppError> {
    let monitor = owned_monitor(&state, &user, id).await?;
    info!(monitor_id = %monitor.id, name = %monitor.name, "Manual check requested.");

    // Manual checks persist like scheduled ones but never notify.
    let record = state.scheduler.check_monitor(&monitor, false).await?;

    let response = match record.error {
        Some(error) => ManualCheckResponse {
            success: false,
            changed: None,
            hash: None,
            error: Some(error),
            checked_at: record.checked_at,
        },
        None => ManualCheckResponse {
            success: true,
            changed: Some(record.changed),
            hash: record.hash.map(|h| format!("{}...", &h[..16])),
            error: None,
            checked_at: record.checked_at,
        },
    };
    Ok(Json(response))
}

/// Fetches a monitor and enforces ownership; a foreign or unknown id is a
/// plain not-found, never a permission hint.
async fn owned_monitor(
    state: &AppState,
    user: &AuthenticatedUser,
    id: Uuid,
) -> Result<Monitor, AppError> {
    state
        .store
        .get_monitor(id)
        .await
        .filter(|m| m.user_id == user.id)
        .ok_or_else(|| AppError::NotFound("Monitor not found".to_string()))
}
