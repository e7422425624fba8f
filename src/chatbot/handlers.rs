use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use tracing::{instrument, warn};

use crate::auth::sessions::CurrentUser;
use crate::error::ApiError;
use crate::state::AppState;

use super::rules::{respond, ChatReply, TaskSummary, Topic};

pub fn chatbot_routes() -> Router<AppState> {
    Router::new().route("/api/chatbot", post(chatbot))
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

/// Answers via the upstream language model when one is configured, otherwise
/// via the built-in rule table. An upstream failure is not an HTTP error: the
/// user gets an apologetic reply carrying the error text.
#[instrument(skip(state, session, payload), fields(email = %session.email))]
pub async fn chatbot(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatReply>, ApiError> {
    if let Some(llm) = &state.llm {
        return match llm.complete(&payload.message).await {
            Ok(message) => Ok(Json(ChatReply {
                message,
                topic: Topic::Assistant,
            })),
            Err(e) => {
                warn!(error = %e, "chatbot upstream failed");
                Ok(Json(ChatReply {
                    message: format!(
                        "Sorry, I'm having trouble answering right now ({e}). Please try again later."
                    ),
                    topic: Topic::Error,
                }))
            }
        };
    }

    let tasks = state.store.list_tasks(&session.email).await?;
    let summary = TaskSummary::from_tasks(&tasks);
    Ok(Json(respond(&payload.message, Some(&summary))))
}
