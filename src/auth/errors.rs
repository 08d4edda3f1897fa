use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::auth::PasswordError;
use crate::storage::StoreError;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("{0}")]
    Validation(String),
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("User not found")]
    UserNotFound,
    #[error("A user with this email already exists")]
    EmailAlreadyExists,
    #[error("Account is deactivated")]
    AccountDisabled,
    #[error("Invalid token")]
    InvalidToken,
    #[error("Token expired")]
    TokenExpired,
    #[error("Access token required")]
    MissingAuthHeader,
    #[error("Invalid authorization header format")]
    InvalidAuthHeaderFormat,
    #[error("Insufficient permissions")]
    InsufficientPermissions,
    #[error("Invalid or expired reset token")]
    InvalidResetToken,
    #[error("Too many requests, try again later")]
    RateLimitExceeded,
    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
    #[error("Password hashing error: {0}")]
    PasswordHashing(PasswordError),
    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl From<PasswordError> for AuthError {
    fn from(err: PasswordError) -> Self {
        if err.is_policy_violation() {
            AuthError::Validation(err.to_string())
        } else {
            AuthError::PasswordHashing(err)
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AuthError::Validation(_) => (StatusCode::BAD_REQUEST, "Validation failed"),
            AuthError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "Invalid credentials"),
            AuthError::UserNotFound => (StatusCode::NOT_FOUND, "User not found"),
            AuthError::EmailAlreadyExists => (StatusCode::CONFLICT, "Email already exists"),
            AuthError::AccountDisabled => (StatusCode::FORBIDDEN, "Account disabled"),
            AuthError::InvalidToken => (StatusCode::FORBIDDEN, "Invalid token"),
            AuthError::TokenExpired => (StatusCode::FORBIDDEN, "Token expired"),
            AuthError::MissingAuthHeader => (StatusCode::UNAUTHORIZED, "Missing authorization header"),
            AuthError::InvalidAuthHeaderFormat => (StatusCode::UNAUTHORIZED, "Invalid authorization header format"),
            AuthError::InsufficientPermissions => (StatusCode::FORBIDDEN, "Insufficient permissions"),
            AuthError::InvalidResetToken => (StatusCode::BAD_REQUEST, "Invalid reset token"),
            AuthError::RateLimitExceeded => (StatusCode::TOO_MANY_REQUESTS, "Rate limit exceeded"),
            AuthError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Storage error"),
            AuthError::Jwt(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Token error"),
            AuthError::PasswordHashing(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Password processing error"),
            AuthError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error"),
        };

        let message = if status.is_server_error() {
            tracing::error!("Auth request failed: {}", self);
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        let body = Json(json!({
            "success": false,
            "error": error_message,
            "message": message,
        }));

        (status, body).into_response()
    }
}
