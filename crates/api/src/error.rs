use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use patchwright_core::error::CoreError;
use patchwright_store::StoreError;
use serde_json::json;

use crate::engine::GenerationError;

/// Application-level error type for HTTP handlers.
///
/// Domain outcomes (not generated, failed, warning) are not errors: they are
/// reported through the `status` field of a 200 response. Only malformed
/// input, unknown ids and storage failures end up here.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `patchwright_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A registry error from `patchwright_store`.
    #[error("Registry error: {0}")]
    Store(#[from] StoreError),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl From<GenerationError> for AppError {
    fn from(err: GenerationError) -> Self {
        match err {
            GenerationError::Core(core) => AppError::Core(core),
            GenerationError::Store(store) => AppError::Store(store),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::NotFound { entity, id } => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("{entity} with id {id} not found"),
                ),
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                CoreError::MalformedPatch(err) => {
                    (StatusCode::BAD_REQUEST, "MALFORMED_PATCH", err.to_string())
                }
                CoreError::Internal(msg) => {
                    tracing::error!(error = %msg, "Internal core error");
                    internal()
                }
            },

            // --- Registry errors ---
            AppError::Store(err) => classify_store_error(err),

            // --- HTTP-specific errors ---
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
        };

        let body = json!({
            "status": "error",
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

/// Invalid ids are the caller's fault; everything else is a persistence
/// failure and is reported as a sanitized 500.
fn classify_store_error(err: &StoreError) -> (StatusCode, &'static str, String) {
    match err {
        StoreError::InvalidId(id) => (
            StatusCode::BAD_REQUEST,
            "INVALID_ID",
            format!("'{id}' is not a valid patch name"),
        ),
        other => {
            tracing::error!(error = %other, "Registry error");
            internal()
        }
    }
}

fn internal() -> (StatusCode, &'static str, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal error occurred".to_string(),
    )
}
