//! Persisted document types. Field names (camelCase on the wire) are part of
//! the contract shared with stored data and API consumers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::checker::differ::ContentDiff;
use crate::checker::keywords::KeywordMode;

/// Account tier controlling monitor count and check cadence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    #[default]
    Free,
    Pro,
    Team,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanLimits {
    pub max_monitors: usize,
    pub min_interval_seconds: u64,
}

impl Plan {
    pub fn limits(&self) -> PlanLimits {
        match self {
            Plan::Free => PlanLimits {
                max_monitors: 3,
                min_interval_seconds: 86_400,
            },
            Plan::Pro => PlanLimits {
                max_monitors: 25,
                min_interval_seconds: 3_600,
            },
            Plan::Team => PlanLimits {
                max_monitors: 100,
                min_interval_seconds: 300,
            },
        }
    }
}

/// Represents a registered account.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub api_key: String,
    pub plan: Plan,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MonitorStatus {
    #[default]
    Active,
    Paused,
}

/// Payload shape for the configured webhook endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WebhookType {
    #[default]
    Standard,
    Slack,
}

/// A user-configured target URL plus check cadence and notification rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Monitor {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub url: String,
    /// Seconds between checks; never below the owning plan's minimum.
    pub check_interval: u64,
    #[serde(default)]
    pub selector: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub keyword_mode: KeywordMode,
    #[serde(default)]
    pub notify_webhook: Option<String>,
    #[serde(default)]
    pub webhook_type: WebhookType,
    pub notify_email: bool,
    pub status: MonitorStatus,
    #[serde(default)]
    pub last_check: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_hash: Option<String>,
    #[serde(default)]
    pub last_content: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Monitor {
    /// Due = active and the interval has elapsed, or never checked at all.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        if self.status != MonitorStatus::Active {
            return false;
        }
        match self.last_check {
            None => true,
            Some(last) => {
                now.signed_duration_since(last).num_seconds() >= self.check_interval as i64
            }
        }
    }
}

/// One observation of a monitored page. Append-only per monitor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckRecord {
    pub id: Uuid,
    pub monitor_id: Uuid,
    #[serde(default)]
    pub hash: Option<String>,
    pub changed: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub diff: Option<ContentDiff>,
    pub checked_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsletterSubscriber {
    pub email: String,
    pub subscribed_at: DateTime<Utc>,
}

/// Store-wide counters surfaced by the stats endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct StoreStats {
    pub users: usize,
    pub monitors: usize,
    pub checks: usize,
    pub newsletter: usize,
}
