use std::collections::HashMap;
use std::sync::RwLock;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

/// Server-held binding of a bearer token to an authenticated user. Created on
/// login or registration, destroyed on logout; gone when the process restarts.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub token: Uuid,
    pub email: String,
    pub username: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created: OffsetDateTime,
}

#[derive(Default)]
pub struct SessionStore {
    inner: RwLock<HashMap<Uuid, Session>>,
}

impl SessionStore {
    pub fn issue(&self, email: &str, username: &str) -> Session {
        let session = Session {
            token: Uuid::new_v4(),
            email: email.to_string(),
            username: username.to_string(),
            created: OffsetDateTime::now_utc(),
        };
        self.inner
            .write()
            .expect("session store poisoned")
            .insert(session.token, session.clone());
        session
    }

    pub fn get(&self, token: Uuid) -> Option<Session> {
        self.inner
            .read()
            .expect("session store poisoned")
            .get(&token)
            .cloned()
    }

    /// Idempotent; returns whether a session was actually revoked.
    pub fn revoke(&self, token: Uuid) -> bool {
        self.inner
            .write()
            .expect("session store poisoned")
            .remove(&token)
            .is_some()
    }
}

/// Request-scoped identity: resolves `Authorization: Bearer <token>` against
/// the session store. Every protected handler takes this as an argument, so
/// the acting user is explicit rather than ambient.
pub struct CurrentUser(pub Session);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(ApiError::AuthRequired)?;
        let token = header
            .strip_prefix("Bearer ")
            .and_then(|t| Uuid::parse_str(t.trim()).ok())
            .ok_or(ApiError::AuthRequired)?;
        state
            .sessions
            .get(token)
            .map(CurrentUser)
            .ok_or(ApiError::AuthRequired)
    }
}
