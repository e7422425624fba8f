use std::str::FromStr;

use anyhow::Context;
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use time::OffsetDateTime;
use uuid::Uuid;

use super::{format_ts, parse_ts, retention_cutoff, NewTask, Store, Task, TaskPatch, User};

const TASK_COLUMNS: &str =
    "id, user_email, title, description, priority, is_complete, list, due_date, created, completed_date";

/// Relational variant of the persistence adapter: one row per user and per
/// task instead of a whole-document file. A single pooled connection keeps
/// writers serialized, matching the JSON backend's guarantees.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn connect(url: &str) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .with_context(|| format!("parse sqlite url {url}"))?
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .context("connect to sqlite")?;
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("run migrations")?;
        Ok(Self { pool })
    }

    fn row_to_user(row: &SqliteRow) -> anyhow::Result<User> {
        Ok(User {
            email: row.try_get("email")?,
            username: row.try_get("username")?,
            password_hash: row.try_get("password_hash")?,
            created: parse_ts(&row.try_get::<String, _>("created")?)?,
        })
    }

    fn row_to_task(row: &SqliteRow) -> anyhow::Result<Task> {
        let id: String = row.try_get("id")?;
        let completed_date: Option<String> = row.try_get("completed_date")?;
        Ok(Task {
            id: Uuid::parse_str(&id).context("malformed task id")?,
            user_email: row.try_get("user_email")?,
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            priority: row.try_get("priority")?,
            list: row.try_get("list")?,
            completed: row.try_get("is_complete")?,
            due_date: row.try_get("due_date")?,
            created: parse_ts(&row.try_get::<String, _>("created")?)?,
            completed_date: completed_date.as_deref().map(parse_ts).transpose()?,
        })
    }

    async fn fetch_task(&self, email: &str, id: Uuid) -> anyhow::Result<Option<Task>> {
        let row = sqlx::query(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1 AND user_email = ?2"
        ))
        .bind(id.to_string())
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(Self::row_to_task).transpose()
    }

    async fn write_back(&self, task: &Task) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE tasks
            SET title = ?1, description = ?2, priority = ?3, is_complete = ?4,
                list = ?5, due_date = ?6, completed_date = ?7
            WHERE id = ?8
            "#,
        )
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.priority)
        .bind(task.completed)
        .bind(&task.list)
        .bind(&task.due_date)
        .bind(task.completed_date.map(format_ts).transpose()?)
        .bind(task.id.to_string())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl Store for SqliteStore {
    async fn find_user(&self, email: &str) -> anyhow::Result<Option<User>> {
        let row = sqlx::query(
            "SELECT email, username, password_hash, created FROM users WHERE email = ?1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(Self::row_to_user).transpose()
    }

    async fn create_user(
        &self,
        email: &str,
        username: &str,
        password_hash: &str,
    ) -> anyhow::Result<User> {
        let created = OffsetDateTime::now_utc();
        sqlx::query(
            "INSERT INTO users (email, username, password_hash, created) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(email)
        .bind(username)
        .bind(password_hash)
        .bind(format_ts(created)?)
        .execute(&self.pool)
        .await?;
        Ok(User {
            email: email.to_string(),
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            created,
        })
    }

    async fn list_tasks(&self, email: &str) -> anyhow::Result<Vec<Task>> {
        let rows = sqlx::query(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE user_email = ?1 ORDER BY rowid ASC"
        ))
        .bind(email)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(Self::row_to_task).collect()
    }

    async fn create_task(&self, email: &str, new: NewTask) -> anyhow::Result<Task> {
        let task = Task::new(email, new, OffsetDateTime::now_utc());
        sqlx::query(
            r#"
            INSERT INTO tasks (id, user_email, title, description, priority, is_complete,
                               list, due_date, created, completed_date)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, NULL)
            "#,
        )
        .bind(task.id.to_string())
        .bind(&task.user_email)
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.priority)
        .bind(task.completed)
        .bind(&task.list)
        .bind(&task.due_date)
        .bind(format_ts(task.created)?)
        .execute(&self.pool)
        .await?;
        Ok(task)
    }

    async fn update_task(
        &self,
        email: &str,
        id: Uuid,
        patch: TaskPatch,
    ) -> anyhow::Result<Option<Task>> {
        let Some(mut task) = self.fetch_task(email, id).await? else {
            return Ok(None);
        };
        task.apply_patch(&patch, OffsetDateTime::now_utc());
        self.write_back(&task).await?;
        Ok(Some(task))
    }

    async fn delete_task(&self, email: &str, id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = ?1 AND user_email = ?2")
            .bind(id.to_string())
            .bind(email)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn cleanup_completed(&self, email: &str, retention_days: i64) -> anyhow::Result<u64> {
        let cutoff = retention_cutoff(OffsetDateTime::now_utc(), retention_days);
        let rows = sqlx::query(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE user_email = ?1 AND is_complete = 1"
        ))
        .bind(email)
        .fetch_all(&self.pool)
        .await?;

        let mut removed = 0u64;
        for row in &rows {
            let task = Self::row_to_task(row)?;
            if task.expired(cutoff) {
                sqlx::query("DELETE FROM tasks WHERE id = ?1")
                    .bind(task.id.to_string())
                    .execute(&self.pool)
                    .await?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}
