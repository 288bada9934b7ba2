//! Document store with JSON file persistence.
//!
//! Every mutation is a read-modify-write-persist pass under a single writer
//! lock, so no reader observes a partially written document and the on-disk
//! file always reflects the last completed mutation.

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::warn;
use uuid::Uuid;

use super::models::{
    CheckRecord, Monitor, MonitorStatus, NewsletterSubscriber, StoreStats, User, WebhookType,
};
use crate::checker::differ::ContentDiff;
use crate::checker::keywords::KeywordMode;

/// Global cap across all monitors; the oldest record is evicted first.
const MAX_CHECK_RECORDS: usize = 1000;
const CHECK_HISTORY_LIMIT: usize = 50;
const DB_FILE: &str = "db.json";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct StoreData {
    users: HashMap<Uuid, User>,
    monitors: HashMap<Uuid, Monitor>,
    checks: VecDeque<CheckRecord>,
    newsletter: Vec<NewsletterSubscriber>,
}

/// Fields for a new check record; id and timestamp are assigned on append.
#[derive(Debug, Clone, Default)]
pub struct NewCheck {
    pub hash: Option<String>,
    pub changed: bool,
    pub error: Option<String>,
    pub content: Option<String>,
    pub diff: Option<ContentDiff>,
}

/// User-editable monitor fields; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct MonitorUpdate {
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

pub struct Store {
    path: PathBuf,
    data: RwLock<StoreData>,
}

impl Store {
    /// Opens the store under `data_dir`, creating the directory if needed.
    /// An unreadable or corrupt file is replaced by an empty store with a
    /// warning; the next mutation overwrites it.
    pub fn open(data_dir: &Path) -> Result<Self, StoreError> {
        std::fs::create_dir_all(data_dir)?;
        let path = data_dir.join(DB_FILE);

        let data = if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(raw) => match serde_json::from_str(&raw) {
                    Ok(data) => data,
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "Stored data unreadable; starting from an empty store.");
                        StoreData::default()
                    }
                },
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to read stored data; starting from an empty store.");
                    StoreData::default()
                }
            }
        } else {
            StoreData::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    async fn mutate<T>(&self, f: impl FnOnce(&mut StoreData) -> T) -> Result<T, StoreError> {
        let mut data = self.data.write().await;
        let out = f(&mut data);
        let json = serde_json::to_string_pretty(&*data)?;
        tokio::fs::write(&self.path, json).await?;
        Ok(out)
    }

    // --- Users ---

    pub async fn create_user(
        &self,
        email: String,
        password_hash: String,
        api_key: String,
    ) -> Result<User, StoreError> {
        let user = User {
            id: Uuid::new_v4(),
            email,
            password_hash,
            api_key,
            plan: Default::default(),
            created_at: Utc::now(),
        };
        self.mutate(|data| {
            data.users.insert(user.id, user.clone());
        })
        .await?;
        Ok(user)
    }

    pub async fn get_user(&self, id: Uuid) -> Option<User> {
        self.data.read().await.users.get(&id).cloned()
    }

    pub async fn get_user_by_email(&self, email: &str) -> Option<User> {
        self.data
            .read()
            .await
            .users
            .values()
            .find(|u| u.email == email)
            .cloned()
    }

    pub async fn get_user_by_api_key(&self, api_key: &str) -> Option<User> {
        self.data
            .read()
            .await
            .users
            .values()
            .find(|u| u.api_key == api_key)
            .cloned()
    }

    // --- Monitors ---

    pub async fn create_monitor(&self, monitor: Monitor) -> Result<Monitor, StoreError> {
        self.mutate(|data| {
            data.monitors.insert(monitor.id, monitor.clone());
        })
        .await?;
        Ok(monitor)
    }

    pub async fn get_monitor(&self, id: Uuid) -> Option<Monitor> {
        self.data.read().await.monitors.get(&id).cloned()
    }

    pub async fn monitors_for_user(&self, user_id: Uuid) -> Vec<Monitor> {
        self.data
            .read()
            .await
            .monitors
            .values()
            .filter(|m| m.user_id == user_id)
            .cloned()
            .collect()
    }

    pub async fn update_monitor(
        &self,
        id: Uuid,
        update: MonitorUpdate,
    ) -> Result<Option<Monitor>, StoreError> {
        self.mutate(|data| {
            let monitor = data.monitors.get_mut(&id)?;
            if let Some(name) = update.name {
                monitor.name = name;
            }
            if let Some(url) = update.url {
                monitor.url = url;
            }
            if let Some(interval) = update.check_interval {
                monitor.check_interval = interval;
            }
            if let Some(selector) = update.selector {
                monitor.selector = Some(selector);
            }
            if let Some(keywords) = update.keywords {
                monitor.keywords = keywords;
            }
            if let Some(mode) = update.keyword_mode {
                monitor.keyword_mode = mode;
            }
            if let Some(webhook) = update.notify_webhook {
                monitor.notify_webhook = Some(webhook);
            }
            if let Some(kind) = update.webhook_type {
                monitor.webhook_type = kind;
            }
            if let Some(notify_email) = update.notify_email {
                monitor.notify_email = notify_email;
            }
            if let Some(status) = update.status {
                monitor.status = status;
            }
            Some(monitor.clone())
        })
        .await
    }

    pub async fn delete_monitor(&self, id: Uuid) -> Result<bool, StoreError> {
        self.mutate(|data| data.monitors.remove(&id).is_some()).await
    }

    pub async fn get_due_monitors(&self, now: DateTime<Utc>) -> Vec<Monitor> {
        self.data
            .read()
            .await
            .monitors
            .values()
            .filter(|m| m.is_due(now))
            .cloned()
            .collect()
    }

    /// Scheduler-side refresh after a check. `hash`/`content` of `None`
    /// leave the previous values in place (the fetch-failure path).
    pub async fn update_check_state(
        &self,
        id: Uuid,
        checked_at: DateTime<Utc>,
        hash: Option<String>,
        content: Option<String>,
    ) -> Result<(), StoreError> {
        self.mutate(|data| {
            if let Some(monitor) = data.monitors.get_mut(&id) {
                monitor.last_check = Some(checked_at);
                if let Some(hash) = hash {
                    monitor.last_hash = Some(hash);
                }
                if let Some(content) = content {
                    monitor.last_content = Some(content);
                }
            }
        })
        .await
    }

    // --- Checks ---

    pub async fn add_check_record(
        &self,
        monitor_id: Uuid,
        check: NewCheck,
    ) -> Result<CheckRecord, StoreError> {
        let record = CheckRecord {
            id: Uuid::new_v4(),
            monitor_id,
            hash: check.hash,
            changed: check.changed,
            error: check.error,
            content: check.content,
            diff: check.diff,
            checked_at: Utc::now(),
        };
        self.mutate(|data| {
            data.checks.push_back(record.clone());
            while data.checks.len() > MAX_CHECK_RECORDS {
                data.checks.pop_front();
            }
        })
        .await?;
        Ok(record)
    }

    /// The most recent records for one monitor, newest first.
    pub async fn checks_for_monitor(&self, monitor_id: Uuid) -> Vec<CheckRecord> {
        self.data
            .read()
            .await
            .checks
            .iter()
            .rev()
            .filter(|c| c.monitor_id == monitor_id)
            .take(CHECK_HISTORY_LIMIT)
            .cloned()
            .collect()
    }

    // --- Newsletter ---

    /// Returns `None` when the address is already subscribed.
    pub async fn add_newsletter_subscriber(
        &self,
        email: &str,
    ) -> Result<Option<NewsletterSubscriber>, StoreError> {
        let subscriber = NewsletterSubscriber {
            email: email.to_string(),
            subscribed_at: Utc::now(),
        };
        self.mutate(|data| {
            if data.newsletter.iter().any(|s| s.email == subscriber.email) {
                None
            } else {
                data.newsletter.push(subscriber.clone());
                Some(subscriber)
            }
        })
        .await
    }

    pub async fn stats(&self) -> StoreStats {
        let data = self.data.read().await;
        StoreStats {
            users: data.users.len(),
            monitors: data.monitors.len(),
            checks: data.checks.len(),
            newsletter: data.newsletter.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tempfile::TempDir;

    fn sample_monitor(user_id: Uuid) -> Monitor {
        Monitor {
            id: Uuid::new_v4(),
            user_id,
            name: "docs".to_string(),
            url: "https://example.com/docs".to_string(),
            check_interval: 3600,
            selector: None,
            keywords: Vec::new(),
            keyword_mode: KeywordMode::default(),
            notify_webhook: None,
            webhook_type: WebhookType::default(),
            notify_email: true,
            status: MonitorStatus::Active,
            last_check: None,
            last_hash: None,
            last_content: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn data_survives_a_reopen() {
        let dir = TempDir::new().unwrap();
        let monitor_id;
        {
            let store = Store::open(dir.path()).unwrap();
            let user = store
                .create_user("a@b.c".to_string(), "hash".to_string(), "pp_k".to_string())
                .await
                .unwrap();
            let monitor = store.create_monitor(sample_monitor(user.id)).await.unwrap();
            monitor_id = monitor.id;
        }
        let reopened = Store::open(dir.path()).unwrap();
        let monitor = reopened.get_monitor(monitor_id).await.unwrap();
        assert_eq!(monitor.name, "docs");
        assert!(reopened.get_user_by_api_key("pp_k").await.is_some());
    }

    #[tokio::test]
    async fn corrupt_file_falls_back_to_an_empty_store() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(DB_FILE), "{not json").unwrap();
        let store = Store::open(dir.path()).unwrap();
        assert_eq!(store.stats().await.users, 0);
    }

    #[tokio::test]
    async fn check_records_are_capped_globally() {
        let dir = TempDir::new().unwrap();
        let store = Store::open(dir.path()).unwrap();
        let busy = Uuid::new_v4();
        let quiet = Uuid::new_v4();

        let first = store
            .add_check_record(quiet, NewCheck::default())
            .await
            .unwrap();
        for _ in 0..MAX_CHECK_RECORDS {
            store.add_check_record(busy, NewCheck::default()).await.unwrap();
        }

        // The oldest record belonged to the quiet monitor; a busy monitor
        // can starve others' history.
        assert_eq!(store.stats().await.checks, MAX_CHECK_RECORDS);
        assert!(store.checks_for_monitor(quiet).await.is_empty());
        assert_ne!(
            store.checks_for_monitor(busy).await.first().unwrap().id,
            first.id
        );
    }

    #[tokio::test]
    async fn check_history_is_newest_first_and_bounded() {
        let dir = TempDir::new().unwrap();
        let store = Store::open(dir.path()).unwrap();
        let monitor_id = Uuid::new_v4();
        let mut last = None;
        for _ in 0..60 {
            last = Some(
                store
                    .add_check_record(monitor_id, NewCheck::default())
                    .await
                    .unwrap(),
            );
        }
        let history = store.checks_for_monitor(monitor_id).await;
        assert_eq!(history.len(), CHECK_HISTORY_LIMIT);
        assert_eq!(history.first().unwrap().id, last.unwrap().id);
    }

    #[tokio::test]
    async fn due_selection_respects_status_and_interval() {
        let dir = TempDir::new().unwrap();
        let store = Store::open(dir.path()).unwrap();
        let user_id = Uuid::new_v4();
        let now = Utc::now();

        let never_checked = store.create_monitor(sample_monitor(user_id)).await.unwrap();
        let mut fresh = sample_monitor(user_id);
        fresh.last_check = Some(now - Duration::seconds(30));
        let fresh = store.create_monitor(fresh).await.unwrap();
        let mut paused = sample_monitor(user_id);
        paused.status = MonitorStatus::Paused;
        let paused = store.create_monitor(paused).await.unwrap();

        let due: Vec<Uuid> = store
            .get_due_monitors(now)
            .await
            .into_iter()
            .map(|m| m.id)
            .collect();
        assert!(due.contains(&never_checked.id));
        assert!(!due.contains(&fresh.id));
        assert!(!due.contains(&paused.id));
    }

    #[tokio::test]
    async fn update_check_state_keeps_previous_hash_on_failure() {
        let dir = TempDir::new().unwrap();
        let store = Store::open(dir.path()).unwrap();
        let monitor = store
            .create_monitor(sample_monitor(Uuid::new_v4()))
            .await
            .unwrap();

        let t1 = Utc::now();
        store
            .update_check_state(monitor.id, t1, Some("h1".to_string()), Some("body".to_string()))
            .await
            .unwrap();
        let t2 = Utc::now();
        store.update_check_state(monitor.id, t2, None, None).await.unwrap();

        let monitor = store.get_monitor(monitor.id).await.unwrap();
        assert_eq!(monitor.last_check, Some(t2));
        assert_eq!(monitor.last_hash.as_deref(), Some("h1"));
        assert_eq!(monitor.last_content.as_deref(), Some("body"));
    }

    #[tokio::test]
    async fn newsletter_rejects_duplicates() {
        let dir = TempDir::new().unwrap();
        let store = Store::open(dir.path()).unwrap();
        assert!(store.add_newsletter_subscriber("a@b.c").await.unwrap().is_some());
        assert!(store.add_newsletter_subscriber("a@b.c").await.unwrap().is_none());
    }
}
