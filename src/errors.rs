use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use std::fmt;

use crate::services::catalog_service::CatalogError;
use crate::services::storage_service::StorageError;
use crate::services::vision_service::VisionError;

/// A lightweight wrapper for request-level errors that keeps the message
/// local. Service errors funnel into this via the `From` impls below, so
/// handlers can use `?` throughout.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    /// Create a new AppError with a specific status and message.
    pub fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            status,
            message: msg.into(),
        }
    }

    /// Shortcut for a 500 Internal Server Error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, msg)
    }

    /// Shortcut for 404 Not Found
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, msg)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            // Server-side failures are logged once, here, and rendered as
            // the album's plain error page.
            tracing::error!(status = %self.status, "request failed: {}", self.message);
            let body = format!(
                "An internal error occurred: <pre>{}</pre>\nSee logs for full stacktrace.",
                crate::views::html_escape(&self.message)
            );
            (self.status, Html(body)).into_response()
        } else {
            (self.status, self.message).into_response()
        }
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::BlobNotFound(_) => AppError::not_found(err.to_string()),
            StorageError::InvalidBlobName(_) => AppError::new(StatusCode::BAD_REQUEST, err.to_string()),
            other => AppError::internal(other.to_string()),
        }
    }
}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        AppError::internal(err.to_string())
    }
}

impl From<VisionError> for AppError {
    fn from(err: VisionError) -> Self {
        AppError::internal(err.to_string())
    }
}
