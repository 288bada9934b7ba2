//! Outbound notification shapes.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::checker::differ::ContentDiff;
use crate::db::models::{Monitor, User, WebhookType};

/// The monitor fields carried into outbound payloads.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorRef {
    pub id: Uuid,
    pub name: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selector: Option<String>,
}

impl From<&Monitor> for MonitorRef {
    fn from(monitor: &Monitor) -> Self {
        Self {
            id: monitor.id,
            name: monitor.name.clone(),
            url: monitor.url.clone(),
            selector: monitor.selector.clone(),
        }
    }
}

/// One queued outbound notification. Delivery is at most once, best effort.
#[derive(Debug, Clone)]
pub enum NotificationJob {
    Email {
        to: String,
        monitor: MonitorRef,
        diff: Option<ContentDiff>,
        detected_at: DateTime<Utc>,
    },
    Webhook {
        url: String,
        kind: WebhookType,
        monitor: MonitorRef,
        diff: Option<ContentDiff>,
        detected_at: DateTime<Utc>,
    },
}

impl NotificationJob {
    pub fn email(monitor: &Monitor, user: &User, diff: Option<ContentDiff>) -> Self {
        Self::Email {
            to: user.email.clone(),
            monitor: monitor.into(),
            diff,
            detected_at: Utc::now(),
        }
    }

    pub fn webhook(monitor: &Monitor, url: &str, diff: Option<ContentDiff>) -> Self {
        Self::Webhook {
            url: url.to_string(),
            kind: monitor.webhook_type,
            monitor: monitor.into(),
            diff,
            detected_at: Utc::now(),
        }
    }

    pub fn monitor_name(&self) -> &str {
        match self {
            Self::Email { monitor, .. } | Self::Webhook { monitor, .. } => &monitor.name,
        }
    }
}
