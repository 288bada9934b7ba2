//! Request and response bodies for the HTTP API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::checker::keywords::KeywordMode;
use crate::db::models::{CheckRecord, Monitor, MonitorStatus, Plan, PlanLimits, WebhookType};

/// The authenticated account attached to a request by the auth middleware.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub id: Uuid,
    pub email: String,
    pub plan: Plan,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub success: bool,
    pub api_key: String,
    pub plan: Plan,
}

#[derive(Debug, Deserialize)]
pub struct CreateMonitorRequest {
    pub name: String,
    pub url: String,
    pub check_interval: Option<u64>,
    pub selector: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub keyword_mode: KeywordMode,
    pub notify_webhook: Option<String>,
    #[serde(default)]
    pub webhook_type: WebhookType,
    pub notify_email: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateMonitorRequest {
    pub name: Option<String>,
    pub url: Option<String>,
    pub check_interval: Option<u64>,
    pub selector: Option<String>,
    pub keywords: Option<Vec<String>>,
    pub keyword_mode: Option<KeywordMode>,
    pub notify_webhook: Option<String>,
    pub webhook_type: Option<WebhookType>,
    pub notify_email: Option<bool>,
    pub status: Option<MonitorStatus>,
}

#[derive(Debug, Serialize)]
pub struct MonitorResponse {
    pub success: bool,
    pub monitor: Monitor,
}

#[derive(Debug, Serialize)]
pub struct MonitorListResponse {
    pub monitors: Vec<Monitor>,
}

#[derive(Debug, Serialize)]
pub struct MonitorDetailResponse {
    pub monitor: Monitor,
    pub checks: Vec<CheckRecord>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualCheckResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub checked_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct AccountResponse {
    pub email: String,
    pub plan: Plan,
    pub monitors: usize,
    pub limits: PlanLimits,
}

#[derive(Debug, Deserialize)]
pub struct NewsletterRequest {
    pub email: String,
}
