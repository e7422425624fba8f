use axum::extract::{Path, State};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::auth::sessions::CurrentUser;
use crate::error::ApiError;
use crate::state::AppState;
use crate::store::{NewTask, Task, TaskPatch};

use super::dto::{CleanupResponse, CreateTaskRequest};

pub fn task_routes() -> Router<AppState> {
    Router::new()
        .route("/api/tasks", get(list_tasks).post(create_task))
        .route("/api/tasks/:id", put(update_task).delete(delete_task))
        .route("/api/cleanup-tasks", post(cleanup_tasks))
}

/// Listing runs the retention sweep first, so expired completed tasks never
/// reach the client.
#[instrument(skip(state, session), fields(email = %session.email))]
pub async fn list_tasks(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
) -> Result<Json<Vec<Task>>, ApiError> {
    let removed = state
        .store
        .cleanup_completed(&session.email, state.config.retention_days)
        .await?;
    if removed > 0 {
        info!(removed, "retention sweep before listing");
    }
    let tasks = state.store.list_tasks(&session.email).await?;
    Ok(Json(tasks))
}

#[instrument(skip(state, session, payload), fields(email = %session.email))]
pub async fn create_task(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Json(payload): Json<CreateTaskRequest>,
) -> Result<Json<Task>, ApiError> {
    if payload.text.trim().is_empty() {
        return Err(ApiError::BadRequest("task text is required".into()));
    }
    let task = state
        .store
        .create_task(
            &session.email,
            NewTask {
                title: payload.text,
                description: payload.description,
                priority: payload.priority.unwrap_or(0),
                list: payload.list,
                due_date: payload.due_date,
            },
        )
        .await?;
    info!(task_id = %task.id, "task created");
    Ok(Json(task))
}

#[instrument(skip(state, session, patch), fields(email = %session.email))]
pub async fn update_task(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Path(id): Path<String>,
    Json(patch): Json<TaskPatch>,
) -> Result<Json<Task>, ApiError> {
    // An id that is not even a uuid cannot belong to anyone.
    let id = Uuid::parse_str(&id).map_err(|_| ApiError::NotFound)?;
    let task = state
        .store
        .update_task(&session.email, id, patch)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(task))
}

#[instrument(skip(state, session), fields(email = %session.email))]
pub async fn delete_task(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if let Ok(id) = Uuid::parse_str(&id) {
        state.store.delete_task(&session.email, id).await?;
    }
    // Deleting something already gone is still a success.
    Ok(Json(json!({ "success": true })))
}

#[instrument(skip(state, session), fields(email = %session.email))]
pub async fn cleanup_tasks(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
) -> Result<Json<CleanupResponse>, ApiError> {
    let removed = state
        .store
        .cleanup_completed(&session.email, state.config.retention_days)
        .await?;
    info!(removed, "manual retention sweep");
    Ok(Json(CleanupResponse {
        message: format!(
            "Removed {removed} completed task(s) older than {} days",
            state.config.retention_days
        ),
        removed_count: removed,
    }))
}
