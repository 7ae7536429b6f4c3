// Authentication error types
// Expected account outcomes (bad password, unknown token, ...) are not errors; see
// `models::AccountFailure`. This type covers what escapes to the HTTP boundary.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, warn};

/// Errors surfaced by the authentication layer
#[derive(Debug, Error)]
pub enum AuthError {
    /// Request payload failed validation
    #[error("Validation error: {0}")]
    ValidationError(#[from] validator::ValidationErrors),

    /// Body missing, not JSON, or not the expected shape
    #[error("Invalid request body: {0}")]
    InvalidBody(#[from] JsonRejection),

    /// Store rejected a user insert because the email is taken
    #[error("Email already exists")]
    EmailAlreadyExists,

    /// Store unavailable or query failure
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Password hashing error: {0}")]
    PasswordHashError(String),

    #[error("Token generation error: {0}")]
    TokenGenerationError(String),

    #[error("Missing authentication token")]
    MissingToken,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token has expired")]
    ExpiredToken,
}

/// JSON body for every error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Machine-readable error code, e.g. "VALIDATION_ERROR"
    pub error_code: String,
    /// Human-readable message, safe to show to clients
    pub message: String,
    /// Field-level details for validation failures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    /// RFC 3339 timestamp
    pub timestamp: String,
}

impl AuthError {
    /// HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::ValidationError(_) | AuthError::InvalidBody(_) => StatusCode::BAD_REQUEST,
            AuthError::EmailAlreadyExists => StatusCode::CONFLICT,
            AuthError::DatabaseError(_)
            | AuthError::PasswordHashError(_)
            | AuthError::TokenGenerationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AuthError::MissingToken | AuthError::InvalidToken | AuthError::ExpiredToken => {
                StatusCode::UNAUTHORIZED
            }
        }
    }

    /// Machine-readable error code
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::ValidationError(_) | AuthError::InvalidBody(_) => "VALIDATION_ERROR",
            AuthError::EmailAlreadyExists => "CONFLICT",
            AuthError::DatabaseError(_) => "DATABASE_ERROR",
            AuthError::PasswordHashError(_) | AuthError::TokenGenerationError(_) => "INTERNAL_ERROR",
            AuthError::MissingToken | AuthError::InvalidToken | AuthError::ExpiredToken => {
                "UNAUTHORIZED"
            }
        }
    }

    /// Message safe to send to clients (no internal details)
    pub fn error_message(&self) -> String {
        match self {
            AuthError::ValidationError(_) | AuthError::InvalidBody(_) => {
                "Request validation failed".to_string()
            }
            AuthError::DatabaseError(_) => "A database error occurred".to_string(),
            AuthError::PasswordHashError(_) | AuthError::TokenGenerationError(_) => {
                "An internal server error occurred".to_string()
            }
            other => other.to_string(),
        }
    }

    fn to_error_response(&self) -> ErrorResponse {
        let details = match self {
            AuthError::ValidationError(errors) => {
                debug!("Validation error: {:?}", errors);
                Some(serde_json::to_value(errors).unwrap_or_else(|_| serde_json::json!({})))
            }
            AuthError::InvalidBody(rejection) => {
                debug!("Rejected request body: {}", rejection.body_text());
                Some(serde_json::json!({ "body": [rejection.body_text()] }))
            }
            AuthError::DatabaseError(e) => {
                error!("Database error in auth: {:?}", e);
                None
            }
            AuthError::PasswordHashError(msg) | AuthError::TokenGenerationError(msg) => {
                error!("Internal auth error: {}", msg);
                None
            }
            AuthError::EmailAlreadyExists => {
                warn!("Conflict on user email");
                None
            }
            AuthError::MissingToken | AuthError::InvalidToken | AuthError::ExpiredToken => {
                warn!("Rejected bearer token: {}", self);
                None
            }
        };

        ErrorResponse {
            error_code: self.error_code().to_string(),
            message: self.error_message(),
            details,
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = self.to_error_response();
        (self.status_code(), Json(body)).into_response()
    }
}
