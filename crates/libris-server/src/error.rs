//! Server-specific error types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::any::Any;
use thiserror::Error;
use uuid::Uuid;

use crate::api::response::ErrorResponse;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::NotFound(message) => {
                ErrorResponse::new("NOT_FOUND", message).into_response_with(StatusCode::NOT_FOUND)
            },
            AppError::Validation(message) => ErrorResponse::new("VALIDATION_ERROR", message)
                .into_response_with(StatusCode::BAD_REQUEST),
            AppError::Unavailable(message) => {
                tracing::warn!("Service unavailable: {}", message);
                ErrorResponse::new("SERVICE_UNAVAILABLE", message)
                    .into_response_with(StatusCode::SERVICE_UNAVAILABLE)
            },
            err @ (AppError::Database(_) | AppError::Internal(_) | AppError::Io(_)) => {
                internal_error(&err)
            },
        }
    }
}

/// Log an unexpected failure and answer 500 with a correlation id
///
/// The id appears both in the log record and in the response body so a
/// client report can be matched to the server-side error.
pub fn internal_error(err: &dyn std::fmt::Display) -> Response {
    let error_id = Uuid::new_v4();
    tracing::error!(%error_id, error = %err, "Unhandled error");

    ErrorResponse::with_details(
        "INTERNAL_ERROR",
        "An internal error occurred",
        json!({ "error_id": error_id }),
    )
    .into_response_with(StatusCode::INTERNAL_SERVER_ERROR)
}

/// Response for a handler that panicked, used with `CatchPanicLayer`
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "unknown panic".to_string()
    };

    internal_error(&format!("handler panicked: {detail}"))
}
