//! The due-monitor check cycle.
//!
//! A single periodic driver selects due monitors and processes them one at
//! a time. Each monitor is isolated: its fetch failure becomes a check
//! record, never an aborted cycle.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Mutex;
use tokio::time::interval;
use tracing::{error, info, warn};

use crate::checker::{self, ContentDiff, KeywordVerdict, PageFetcher, evaluate_keywords};
use crate::db::models::{CheckRecord, Monitor};
use crate::db::store::{NewCheck, Store, StoreError};
use crate::notifications::models::NotificationJob;
use crate::notifications::service::NotificationService;

pub struct CheckScheduler {
    store: Arc<Store>,
    fetcher: Arc<dyn PageFetcher>,
    notifications: Arc<NotificationService>,
    cycle_guard: Mutex<()>,
}

impl CheckScheduler {
    pub fn new(
        store: Arc<Store>,
        fetcher: Arc<dyn PageFetcher>,
        notifications: Arc<NotificationService>,
    ) -> Self {
        Self {
            store,
            fetcher,
            notifications,
            cycle_guard: Mutex::new(()),
        }
    }

    /// Runs one cycle immediately, then one per period. A tick that lands
    /// while the previous cycle is still running is skipped, so a slow
    /// cycle never doubles up fetches against the same monitor.
    pub async fn start_periodic_checks(self: Arc<Self>, period_seconds: u64) {
        info!(period_seconds, "Check scheduler started.");
        let mut ticker = interval(Duration::from_secs(period_seconds));
        loop {
            ticker.tick().await;
            match self.cycle_guard.try_lock() {
                Ok(_guard) => self.run_check_cycle().await,
                Err(_) => warn!("Previous check cycle still running; skipping this tick."),
            }
        }
    }

    pub async fn run_check_cycle(&self) {
        let due = self.store.get_due_monitors(Utc::now()).await;
        if !due.is_empty() {
            info!(due = due.len(), "Running check cycle.");
        }
        for monitor in due {
            if let Err(e) = self.check_monitor(&monitor, true).await {
                error!(monitor_id = %monitor.id, error = %e, "Failed to persist check result.");
            }
        }
    }

    /// Checks one monitor end to end: fetch, normalize, compare, persist,
    /// and (when `notify` is set) dispatch notifications. The `monitor`
    /// argument is the pre-check snapshot; its `last_content` is the diff
    /// and keyword baseline and must be consulted before `update_check_state`
    /// replaces it.
    pub async fn check_monitor(
        &self,
        monitor: &Monitor,
        notify: bool,
    ) -> Result<CheckRecord, StoreError> {
        info!(monitor_id = %monitor.id, name = %monitor.name, url = %monitor.url, "Checking monitor.");
        let now = Utc::now();

        let page = match checker::check_page(
            self.fetcher.as_ref(),
            &monitor.url,
            monitor.selector.as_deref(),
        )
        .await
        {
            Ok(page) => page,
            Err(fetch_err) => {
                warn!(monitor_id = %monitor.id, error = %fetch_err, "Check failed.");
                let record = self
                    .store
                    .add_check_record(
                        monitor.id,
                        NewCheck {
                            error: Some(fetch_err.to_string()),
                            ..NewCheck::default()
                        },
                    )
                    .await?;
                self.store
                    .update_check_state(monitor.id, now, None, None)
                    .await?;
                return Ok(record);
            }
        };

        // The very first successful check has no baseline and is never a
        // change.
        let changed = monitor.last_hash.as_deref().is_some_and(|h| h != page.hash);
        let old_text = monitor.last_content.as_deref().unwrap_or("");

        let mut diff = None;
        let mut verdict = None;
        if changed {
            diff = checker::compute_diff(old_text, &page.text);
            let keyword_verdict =
                evaluate_keywords(old_text, &page.text, &monitor.keywords, monitor.keyword_mode);
            if let Some(diff) = diff.as_mut() {
                if !keyword_verdict.matched_keywords.is_empty() {
                    diff.keyword_match = Some(keyword_verdict.matched_keywords.join(", "));
                }
            }
            verdict = Some(keyword_verdict);
        }

        let record = self
            .store
            .add_check_record(
                monitor.id,
                NewCheck {
                    hash: Some(page.hash.clone()),
                    changed,
                    content: Some(page.text.clone()),
                    diff: diff.clone(),
                    error: None,
                },
            )
            .await?;
        self.store
            .update_check_state(monitor.id, now, Some(page.hash), Some(page.text))
            .await?;

        if changed {
            info!(monitor_id = %monitor.id, "Change detected.");
            if notify {
                if let Some(verdict) = verdict {
                    self.dispatch_notifications(monitor, diff, verdict).await;
                }
            }
        }

        Ok(record)
    }

    async fn dispatch_notifications(
        &self,
        monitor: &Monitor,
        diff: Option<ContentDiff>,
        verdict: KeywordVerdict,
    ) {
        if !verdict.should_notify {
            info!(
                monitor_id = %monitor.id,
                reason = verdict.reason.as_deref().unwrap_or_default(),
                "Keyword filter declined notification."
            );
            return;
        }
        if let Some(reason) = &verdict.reason {
            info!(monitor_id = %monitor.id, %reason, "Keyword filter passed.");
        }

        if monitor.notify_email {
            match self.store.get_user(monitor.user_id).await {
                Some(user) => self
                    .notifications
                    .enqueue(NotificationJob::email(monitor, &user, diff.clone())),
                None => {
                    warn!(monitor_id = %monitor.id, "Owner not found; skipping email notification.")
                }
            }
        }
        if let Some(url) = &monitor.notify_webhook {
            self.notifications
                .enqueue(NotificationJob::webhook(monitor, url, diff));
        }
    }
}
