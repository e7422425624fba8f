pub mod handlers;
pub mod llm;
pub mod rules;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::chatbot_routes()
}
