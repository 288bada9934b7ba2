//! Fire-and-forget notification dispatch.
//!
//! Jobs are enqueued without waiting; a single background worker delivers
//! them. At most once, best effort: a full queue drops the job, delivery
//! failures are logged and never retried.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{error, info, warn};

use super::models::NotificationJob;
use super::senders::{SenderError, email::EmailSender, webhook::WebhookSender};
use crate::db::models::WebhookType;
use crate::server::config::ServerConfig;

pub const QUEUE_CAPACITY: usize = 64;

pub struct NotificationService {
    tx: mpsc::Sender<NotificationJob>,
}

impl NotificationService {
    /// Creates a service plus the receiving end of its queue. Production
    /// callers use [`NotificationService::spawn`]; tests keep the receiver
    /// to observe what was enqueued.
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<NotificationJob>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }

    /// Builds the senders from config and runs the dispatch worker.
    pub fn spawn(config: &ServerConfig) -> Arc<Self> {
        let (service, rx) = Self::new(QUEUE_CAPACITY);
        let email = EmailSender::new(config.resend_api_key.clone(), config.from_email.clone());
        let webhook = WebhookSender::new();
        tokio::spawn(dispatch_loop(rx, email, webhook));
        Arc::new(service)
    }

    pub fn enqueue(&self, job: NotificationJob) {
        if let Err(e) = self.tx.try_send(job) {
            warn!(error = %e, "Notification queue full or closed; dropping job.");
        }
    }
}

async fn dispatch_loop(
    mut rx: mpsc::Receiver<NotificationJob>,
    email: EmailSender,
    webhook: WebhookSender,
) {
    while let Some(job) = rx.recv().await {
        let result = match &job {
            NotificationJob::Email {
                to,
                monitor,
                diff,
                detected_at,
            } => {
                email
                    .send_change_email(to, monitor, diff.as_ref(), *detected_at)
                    .await
            }
            NotificationJob::Webhook {
                url,
                kind,
                monitor,
                diff,
                detected_at,
            } => match kind {
                WebhookType::Standard => {
                    webhook
                        .send_webhook(url, monitor, diff.as_ref(), *detected_at)
                        .await
                }
                WebhookType::Slack => webhook.send_chat_webhook(url, monitor, diff.as_ref()).await,
            },
        };

        match result {
            Ok(()) => info!(monitor = job.monitor_name(), "Notification delivered."),
            Err(SenderError::NotConfigured(what)) => {
                info!(what, "Notification skipped; sender not configured.")
            }
            Err(e) => {
                error!(monitor = job.monitor_name(), error = %e, "Notification delivery failed.")
            }
        }
    }
}
