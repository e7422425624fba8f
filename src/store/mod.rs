use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

mod json;
mod sqlite;

pub use json::JsonStore;
pub use sqlite::SqliteStore;

pub const DEFAULT_LIST: &str = "All Tasks";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub email: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub user_email: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: i64,
    #[serde(default = "default_list")]
    pub list: String,
    pub completed: bool,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created: OffsetDateTime,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub completed_date: Option<OffsetDateTime>,
}

fn default_list() -> String {
    DEFAULT_LIST.to_string()
}

/// Fields for a task being created. Everything except the title is optional.
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub priority: i64,
    pub list: Option<String>,
    pub due_date: Option<String>,
}

/// Partial update applied to an existing task. `None` fields are left alone.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskPatch {
    #[serde(alias = "text")]
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<i64>,
    pub list: Option<String>,
    pub due_date: Option<String>,
    pub completed: Option<bool>,
}

impl Task {
    pub fn new(email: &str, new: NewTask, now: OffsetDateTime) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_email: email.to_string(),
            title: new.title,
            description: new.description,
            priority: new.priority,
            list: new.list.unwrap_or_else(default_list),
            completed: false,
            due_date: new.due_date,
            created: now,
            completed_date: None,
        }
    }

    /// Applies a patch, keeping `completed == true ⇔ completed_date.is_some()`.
    /// A false→true transition stamps `completed_date`; true→false clears it.
    pub fn apply_patch(&mut self, patch: &TaskPatch, now: OffsetDateTime) {
        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
        if let Some(description) = &patch.description {
            self.description = Some(description.clone());
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
        if let Some(list) = &patch.list {
            self.list = list.clone();
        }
        if let Some(due_date) = &patch.due_date {
            self.due_date = Some(due_date.clone());
        }
        if let Some(completed) = patch.completed {
            if completed && !self.completed {
                self.completed_date = Some(now);
            } else if !completed {
                self.completed_date = None;
            }
            self.completed = completed;
        }
    }

    /// True when the task is completed and its completion predates `cutoff`.
    pub fn expired(&self, cutoff: OffsetDateTime) -> bool {
        self.completed && self.completed_date.map_or(false, |d| d < cutoff)
    }
}

pub fn retention_cutoff(now: OffsetDateTime, retention_days: i64) -> OffsetDateTime {
    now - Duration::days(retention_days)
}

pub(crate) fn format_ts(ts: OffsetDateTime) -> anyhow::Result<String> {
    Ok(ts.format(&Rfc3339)?)
}

pub(crate) fn parse_ts(raw: &str) -> anyhow::Result<OffsetDateTime> {
    Ok(OffsetDateTime::parse(raw, &Rfc3339)?)
}

/// Durable state behind the task and identity operations. Two backends exist:
/// a whole-document JSON file ([`JsonStore`]) and a relational mapping over
/// sqlite ([`SqliteStore`]). Every operation is scoped to one user's email;
/// nothing here can see or touch another user's rows.
#[async_trait]
pub trait Store: Send + Sync {
    async fn find_user(&self, email: &str) -> anyhow::Result<Option<User>>;

    async fn create_user(
        &self,
        email: &str,
        username: &str,
        password_hash: &str,
    ) -> anyhow::Result<User>;

    /// All of the user's tasks, in creation order.
    async fn list_tasks(&self, email: &str) -> anyhow::Result<Vec<Task>>;

    async fn create_task(&self, email: &str, new: NewTask) -> anyhow::Result<Task>;

    /// `Ok(None)` when the user owns no task with that id.
    async fn update_task(
        &self,
        email: &str,
        id: Uuid,
        patch: TaskPatch,
    ) -> anyhow::Result<Option<Task>>;

    /// Idempotent; returns whether a task was actually removed.
    async fn delete_task(&self, email: &str, id: Uuid) -> anyhow::Result<bool>;

    /// Retention sweep: permanently deletes the user's completed tasks whose
    /// `completed_date` is older than `retention_days`. Returns the count
    /// removed. Incomplete tasks are never touched, overdue or not.
    async fn cleanup_completed(&self, email: &str, retention_days: i64) -> anyhow::Result<u64>;
}
