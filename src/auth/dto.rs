use serde::{Deserialize, Serialize};

use crate::auth::claims::Role;

/// Request body for user registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    #[serde(alias = "password")]
    pub secret: String,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    #[serde(alias = "password")]
    pub secret: String,
}

/// Response returned after a successful login.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub role: Role,
    pub username: String,
}

/// Empty object returned on registration.
#[derive(Debug, Serialize)]
pub struct Registered {}
