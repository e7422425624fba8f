use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request body for account creation.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub password: String,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Returned after register or login; the token authenticates later requests.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: Uuid,
    pub user: PublicUser,
}

/// Public part of the user returned to the client.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub email: String,
    pub username: String,
}
