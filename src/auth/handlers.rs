use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tracing::{info, instrument, warn};

use crate::auth::dto::{AuthResponse, LoginRequest, PublicUser, RegisterRequest};
use crate::auth::password::{hash_password, verify_password};
use crate::auth::sessions::CurrentUser;
use crate::error::ApiError;
use crate::state::AppState;

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/logout", post(logout))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/api/me", get(get_me))
}

/// Registration is an explicit operation: an email that is already taken is a
/// conflict, never a silent login.
#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    payload.email = payload.email.trim().to_lowercase();

    if payload.email.is_empty() || payload.password.is_empty() {
        return Err(ApiError::BadRequest(
            "email and password are required".into(),
        ));
    }
    if state.store.find_user(&payload.email).await?.is_some() {
        warn!(email = %payload.email, "email already registered");
        return Err(ApiError::AlreadyExists);
    }

    let hash = hash_password(&payload.password)?;
    let user = state
        .store
        .create_user(&payload.email, &payload.username, &hash)
        .await?;
    let session = state.sessions.issue(&user.email, &user.username);

    info!(email = %user.email, "user registered");
    Ok(Json(AuthResponse {
        token: session.token,
        user: PublicUser {
            email: user.email,
            username: user.username,
        },
    }))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    payload.email = payload.email.trim().to_lowercase();

    let user = match state.store.find_user(&payload.email).await? {
        Some(user) => user,
        None => {
            warn!(email = %payload.email, "login for unknown email");
            return Err(ApiError::InvalidCredentials);
        }
    };

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(email = %payload.email, "login with invalid password");
        return Err(ApiError::InvalidCredentials);
    }

    let session = state.sessions.issue(&user.email, &user.username);
    info!(email = %user.email, "user logged in");
    Ok(Json(AuthResponse {
        token: session.token,
        user: PublicUser {
            email: user.email,
            username: user.username,
        },
    }))
}

#[instrument(skip(state, session), fields(email = %session.email))]
pub async fn logout(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
) -> Json<serde_json::Value> {
    state.sessions.revoke(session.token);
    info!("session ended");
    Json(json!({ "success": true }))
}

#[instrument(skip(session))]
pub async fn get_me(CurrentUser(session): CurrentUser) -> Json<PublicUser> {
    Json(PublicUser {
        email: session.email,
        username: session.username,
    })
}
