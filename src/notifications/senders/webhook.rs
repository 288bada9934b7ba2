//! Webhook delivery: a generic JSON payload, or a chat-formatted message
//! for Slack-compatible endpoints.

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Serialize;

use super::SenderError;
use crate::checker::differ::ContentDiff;
use crate::notifications::models::MonitorRef;

pub struct WebhookSender {
    client: Client,
}

#[derive(Serialize)]
struct WebhookPayload<'a> {
    event: &'static str,
    monitor: &'a MonitorRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    diff: Option<&'a ContentDiff>,
    timestamp: DateTime<Utc>,
}

#[derive(Serialize)]
struct ChatPayload {
    text: String,
}

impl Default for WebhookSender {
    fn default() -> Self {
        Self::new()
    }
}

impl WebhookSender {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    pub async fn send_webhook(
        &self,
        url: &str,
        monitor: &MonitorRef,
        diff: Option<&ContentDiff>,
        detected_at: DateTime<Utc>,
    ) -> Result<(), SenderError> {
        let payload = WebhookPayload {
            event: "page_changed",
            monitor,
            diff,
            timestamp: detected_at,
        };
        self.post(url, &payload).await
    }

    pub async fn send_chat_webhook(
        &self,
        url: &str,
        monitor: &MonitorRef,
        diff: Option<&ContentDiff>,
    ) -> Result<(), SenderError> {
        let summary = diff
            .map(|d| d.summary.as_str())
            .unwrap_or("Content changed");
        let payload = ChatPayload {
            text: format!("*{}* changed\n{}\n{}", monitor.name, monitor.url, summary),
        };
        self.post(url, &payload).await
    }

    async fn post<T: Serialize>(&self, url: &str, payload: &T) -> Result<(), SenderError> {
        let response = self.client.post(url).json(payload).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SenderError::SendFailed(format!(
                "Webhook returned non-success status: {status}"
            )));
        }
        Ok(())
    }
}
