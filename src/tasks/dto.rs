use serde::{Deserialize, Serialize};

/// Body of POST /api/tasks. The client-facing field is `text`; it becomes the
/// task title. Everything else is optional.
#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    #[serde(alias = "title")]
    pub text: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Option<i64>,
    #[serde(default)]
    pub list: Option<String>,
    #[serde(default)]
    pub due_date: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CleanupResponse {
    pub message: String,
    pub removed_count: u64,
}
