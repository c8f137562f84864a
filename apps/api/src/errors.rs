use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::dispatch::DispatchError;
use crate::reconcile::rows::RowError;
use crate::regeneration::GenerationError;
use crate::store::StoreError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Generation error: {0}")]
    Generation(GenerationError),

    #[error("Persistence error: {0}")]
    Persistence(StoreError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<GenerationError> for AppError {
    fn from(err: GenerationError) -> Self {
        match err {
            GenerationError::InvalidAddress(address) => {
                AppError::Validation(format!("'{address}' is not a valid email address"))
            }
            other => AppError::Generation(other),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::Persistence(err)
    }
}

impl From<DispatchError> for AppError {
    fn from(err: DispatchError) -> Self {
        match err {
            DispatchError::AlreadyRunning(job_id) => {
                AppError::Conflict(format!("Dispatch job {job_id} is still running"))
            }
            DispatchError::Spawn(e) => {
                AppError::Internal(anyhow::anyhow!("Failed to launch dispatch process: {e}"))
            }
        }
    }
}

impl From<RowError> for AppError {
    fn from(err: RowError) -> Self {
        match err {
            RowError::UnknownAddress(address) => {
                AppError::NotFound(format!("No contact row for {address}"))
            }
            RowError::AlreadyRegenerating(address) => {
                AppError::Conflict(format!("A regeneration for {address} is already in progress"))
            }
            RowError::Generation(e) => e.into(),
            RowError::Store(e) => e.into(),
            RowError::Interrupted(address) => {
                AppError::Internal(anyhow::anyhow!("Regeneration for {address} did not complete"))
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
            AppError::Generation(e) => {
                tracing::error!("Generation error: {e}");
                (
                    StatusCode::BAD_GATEWAY,
                    "GENERATION_ERROR",
                    format!("Failed to regenerate email: {e}"),
                )
            }
            AppError::Persistence(e) => {
                tracing::error!("Persistence error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "PERSISTENCE_ERROR",
                    "Failed to save content".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
