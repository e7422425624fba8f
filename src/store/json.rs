use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{retention_cutoff, NewTask, Store, Task, TaskPatch, User};

/// The persisted document: `{users: {email → record}, tasks: {email → [Task…]}}`.
/// A missing backing file reads as the empty document, never as an error.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreDoc {
    #[serde(default)]
    users: HashMap<String, UserRecord>,
    #[serde(default)]
    tasks: HashMap<String, Vec<Task>>,
}

/// User row as stored in the document; the email lives in the map key.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct UserRecord {
    username: String,
    password_hash: String,
    #[serde(with = "time::serde::rfc3339")]
    created: OffsetDateTime,
}

impl UserRecord {
    fn into_user(self, email: &str) -> User {
        User {
            email: email.to_string(),
            username: self.username,
            password_hash: self.password_hash,
            created: self.created,
        }
    }
}

/// Whole-document store over a single JSON file. The document is held in
/// memory behind one mutex, so writers are serialized and a read-modify-write
/// from two requests cannot clobber each other. Every mutation rewrites the
/// file via a temp file and rename, keeping the on-disk copy atomic.
pub struct JsonStore {
    path: PathBuf,
    doc: Mutex<StoreDoc>,
}

impl JsonStore {
    pub async fn open(path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let path = path.into();
        let doc = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .with_context(|| format!("malformed data file {}", path.display()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => StoreDoc::default(),
            Err(e) => {
                return Err(e).with_context(|| format!("read data file {}", path.display()))
            }
        };
        Ok(Self {
            path,
            doc: Mutex::new(doc),
        })
    }

    async fn persist(path: &Path, doc: &StoreDoc) -> anyhow::Result<()> {
        let bytes = serde_json::to_vec_pretty(doc)?;
        let tmp = path.with_extension("tmp");
        tokio::fs::write(&tmp, &bytes)
            .await
            .with_context(|| format!("write {}", tmp.display()))?;
        tokio::fs::rename(&tmp, path)
            .await
            .with_context(|| format!("rename {} into place", tmp.display()))?;
        Ok(())
    }
}

#[async_trait]
impl Store for JsonStore {
    async fn find_user(&self, email: &str) -> anyhow::Result<Option<User>> {
        let doc = self.doc.lock().await;
        Ok(doc
            .users
            .get(email)
            .cloned()
            .map(|record| record.into_user(email)))
    }

    async fn create_user(
        &self,
        email: &str,
        username: &str,
        password_hash: &str,
    ) -> anyhow::Result<User> {
        let mut doc = self.doc.lock().await;
        anyhow::ensure!(!doc.users.contains_key(email), "user already exists");
        let record = UserRecord {
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            created: OffsetDateTime::now_utc(),
        };
        doc.users.insert(email.to_string(), record.clone());
        // New accounts start with an empty task list already materialized.
        doc.tasks.entry(email.to_string()).or_default();
        Self::persist(&self.path, &doc).await?;
        Ok(record.into_user(email))
    }

    async fn list_tasks(&self, email: &str) -> anyhow::Result<Vec<Task>> {
        let doc = self.doc.lock().await;
        Ok(doc.tasks.get(email).cloned().unwrap_or_default())
    }

    async fn create_task(&self, email: &str, new: NewTask) -> anyhow::Result<Task> {
        let mut doc = self.doc.lock().await;
        let task = Task::new(email, new, OffsetDateTime::now_utc());
        doc.tasks
            .entry(email.to_string())
            .or_default()
            .push(task.clone());
        Self::persist(&self.path, &doc).await?;
        Ok(task)
    }

    async fn update_task(
        &self,
        email: &str,
        id: Uuid,
        patch: TaskPatch,
    ) -> anyhow::Result<Option<Task>> {
        let mut doc = self.doc.lock().await;
        let Some(task) = doc
            .tasks
            .get_mut(email)
            .and_then(|tasks| tasks.iter_mut().find(|t| t.id == id))
        else {
            return Ok(None);
        };
        task.apply_patch(&patch, OffsetDateTime::now_utc());
        let updated = task.clone();
        Self::persist(&self.path, &doc).await?;
        Ok(Some(updated))
    }

    async fn delete_task(&self, email: &str, id: Uuid) -> anyhow::Result<bool> {
        let mut doc = self.doc.lock().await;
        let Some(tasks) = doc.tasks.get_mut(email) else {
            return Ok(false);
        };
        let before = tasks.len();
        tasks.retain(|t| t.id != id);
        let removed = tasks.len() != before;
        if removed {
            Self::persist(&self.path, &doc).await?;
        }
        Ok(removed)
    }

    async fn cleanup_completed(&self, email: &str, retention_days: i64) -> anyhow::Result<u64> {
        let cutoff = retention_cutoff(OffsetDateTime::now_utc(), retention_days);
        let mut doc = self.doc.lock().await;
        let Some(tasks) = doc.tasks.get_mut(email) else {
            return Ok(0);
        };
        let before = tasks.len();
        tasks.retain(|t| !t.expired(cutoff));
        let removed = (before - tasks.len()) as u64;
        if removed > 0 {
            Self::persist(&self.path, &doc).await?;
        }
        Ok(removed)
    }
}
