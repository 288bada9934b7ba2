//! Change-notification email delivery via the Resend HTTP API.

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Serialize;

use super::SenderError;
use crate::checker::differ::ContentDiff;
use crate::notifications::models::MonitorRef;

const RESEND_ENDPOINT: &str = "https://api.resend.com/emails";

pub struct EmailSender {
    client: Client,
    api_key: Option<String>,
    from: String,
}

#[derive(Serialize)]
struct ResendPayload<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: String,
    html: String,
    text: String,
}

impl EmailSender {
    pub fn new(api_key: Option<String>, from: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            from,
        }
    }

    pub async fn send_change_email(
        &self,
        to: &str,
        monitor: &MonitorRef,
        diff: Option<&ContentDiff>,
        detected_at: DateTime<Utc>,
    ) -> Result<(), SenderError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(SenderError::NotConfigured("RESEND_API_KEY"));
        };

        let payload = ResendPayload {
            from: &self.from,
            to: [to],
            subject: format!("Change detected: {}", monitor.name),
            html: html_body(monitor, diff, detected_at),
            text: text_body(monitor, diff, detected_at),
        };

        let response = self
            .client
            .post(RESEND_ENDPOINT)
            .bearer_auth(api_key)
            .json(&payload)
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            return Err(SenderError::SendFailed(format!(
                "Resend API returned non-success status: {status}. Body: {body}"
            )));
        }

        Ok(())
    }
}

fn html_body(monitor: &MonitorRef, diff: Option<&ContentDiff>, detected_at: DateTime<Utc>) -> String {
    let mut body = String::new();
    body.push_str("<h2>Page Change Detected</h2>");
    body.push_str("<p>Your monitored page has changed:</p><ul>");
    body.push_str(&format!("<li><strong>Monitor:</strong> {}</li>", monitor.name));
    body.push_str(&format!(
        "<li><strong>URL:</strong> <a href=\"{0}\">{0}</a></li>",
        monitor.url
    ));
    if let Some(selector) = &monitor.selector {
        body.push_str(&format!("<li><strong>Selector:</strong> {selector}</li>"));
    }
    body.push_str(&format!(
        "<li><strong>Detected at:</strong> {}</li></ul>",
        detected_at.to_rfc2822()
    ));
    if let Some(diff) = diff {
        body.push_str(&format!("<p><strong>Changes:</strong> {}</p>", diff.summary));
    }
    body.push_str(
        "<p>You're receiving this because you set up monitoring for this URL on PagePulse.</p>",
    );
    body
}

fn text_body(monitor: &MonitorRef, diff: Option<&ContentDiff>, detected_at: DateTime<Utc>) -> String {
    let mut body = format!(
        "Page Change Detected\n\nMonitor: {}\nURL: {}\n",
        monitor.name, monitor.url
    );
    if let Some(selector) = &monitor.selector {
        body.push_str(&format!("Selector: {selector}\n"));
    }
    body.push_str(&format!("Detected at: {}\n", detected_at.to_rfc2822()));
    if let Some(diff) = diff {
        body.push_str(&format!("Changes: {}\n", diff.summary));
    }
    body.push_str(&format!("\nVisit the page: {}", monitor.url));
    body
}
