use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::auth::AuthError;
use crate::services::{BookingError, ContentError};
use crate::storage::StoreError;

/// Errors surfaced by HTTP handlers. Domain errors render themselves;
/// extractor rejections become 400s in the same JSON shape.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Booking(#[from] BookingError),
    #[error(transparent)]
    Content(#[from] ContentError),
    #[error("Invalid request body: {0}")]
    Json(#[from] JsonRejection),
    #[error("Invalid query string: {0}")]
    Query(#[from] QueryRejection),
    #[error("Invalid path parameter: {0}")]
    Path(#[from] PathRejection),
    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
    #[error("Route {0} not found")]
    NotFound(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            ApiError::Auth(_) | ApiError::Booking(_) | ApiError::Content(_) => return self.into_domain_response(),
            ApiError::Json(_) | ApiError::Query(_) | ApiError::Path(_) => (StatusCode::BAD_REQUEST, "Bad request"),
            ApiError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Storage error"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "Not found"),
        };

        let message = if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
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

impl ApiError {
    fn into_domain_response(self) -> Response {
        match self {
            ApiError::Auth(err) => err.into_response(),
            ApiError::Booking(err) => err.into_response(),
            ApiError::Content(err) => err.into_response(),
            other => other.into_response(),
        }
    }
}

/// Fallback for unknown `/api` paths
pub async fn api_not_found(uri: Uri) -> ApiError {
    ApiError::NotFound(uri.path().to_string())
}
