use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use time::OffsetDateTime;
use tracing::instrument;

use crate::auth::sessions::CurrentUser;
use crate::error::ApiError;
use crate::state::AppState;

use super::grid::{month_view, MonthView};

pub fn calendar_routes() -> Router<AppState> {
    Router::new().route("/api/calendar", get(calendar))
}

/// Query params arrive as raw strings so a non-integer month is our 400, not
/// a framework rejection.
#[derive(Debug, Deserialize)]
pub struct MonthQuery {
    pub year: Option<String>,
    pub month: Option<String>,
}

#[instrument(skip(state, session), fields(email = %session.email))]
pub async fn calendar(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Query(query): Query<MonthQuery>,
) -> Result<Json<MonthView>, ApiError> {
    let now = OffsetDateTime::now_utc();
    let year = match query.year {
        Some(raw) => raw
            .parse::<i32>()
            .map_err(|_| ApiError::BadRequest("year must be an integer".into()))?,
        None => now.year(),
    };
    let month = match query.month {
        Some(raw) => raw
            .parse::<u8>()
            .map_err(|_| ApiError::BadRequest("month must be an integer".into()))?,
        None => u8::from(now.month()),
    };

    let tasks = state.store.list_tasks(&session.email).await?;
    let view = month_view(year, month, &tasks)
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    Ok(Json(view))
}
