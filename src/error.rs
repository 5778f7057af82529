use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

use crate::auth::jwt::TokenError;

/// Failures reported by the credential and metric stores.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unique identity already taken")]
    Duplicate,
    #[error("facility does not exist")]
    UnknownFacility,
    #[error("store unavailable")]
    Unavailable(#[source] anyhow::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        let code = err
            .as_database_error()
            .and_then(|db| db.code())
            .map(|c| c.into_owned());
        match code.as_deref() {
            // unique_violation
            Some("23505") => StoreError::Duplicate,
            // foreign_key_violation
            Some("23503") => StoreError::UnknownFacility,
            _ => StoreError::Unavailable(err.into()),
        }
    }
}

/// Request-level error; every handler returns this and it maps to a stable status code.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("identity already registered")]
    DuplicateIdentity,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("missing bearer credentials")]
    MissingCredentials,
    #[error("unauthenticated: {0}")]
    Unauthenticated(#[from] TokenError),
    #[error("forbidden")]
    Forbidden,
    #[error("store unavailable")]
    StoreUnavailable(#[source] anyhow::Error),
    #[error("internal error")]
    Internal(#[source] anyhow::Error),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidInput(_) | AppError::DuplicateIdentity => StatusCode::BAD_REQUEST,
            AppError::InvalidCredentials
            | AppError::MissingCredentials
            | AppError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::StoreUnavailable(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message shown to clients. Authentication and authorization failures share one
    /// message so the body never says which check failed.
    fn public_message(&self) -> String {
        match self {
            AppError::InvalidInput(msg) => msg.clone(),
            AppError::DuplicateIdentity => "identity already registered".into(),
            AppError::InvalidCredentials => "invalid credentials".into(),
            AppError::MissingCredentials | AppError::Unauthenticated(_) | AppError::Forbidden => {
                "not authorized".into()
            }
            AppError::StoreUnavailable(_) | AppError::Internal(_) => {
                "internal server error".into()
            }
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate => AppError::DuplicateIdentity,
            StoreError::UnknownFacility => AppError::InvalidInput("unknown facility".into()),
            StoreError::Unavailable(e) => AppError::StoreUnavailable(e),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = ?self, "request failed");
        } else {
            warn!(%status, reason = %self, "request rejected");
        }
        (
            status,
            Json(ErrorBody {
                error: self.public_message(),
            }),
        )
            .into_response()
    }
}
