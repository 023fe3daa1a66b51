use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use lattice_core::AppError;
use serde::Serialize;
use tracing::error;

#[derive(Debug, Serialize)]
struct ErrorResponse {
    message: String,
}

/// HTTP error wrapper for the worker's local endpoints.
///
/// Typed failures keep their own status; anything else is an opaque 500.
#[derive(Debug)]
pub struct WorkerError(pub AppError);

impl From<AppError> for WorkerError {
    fn from(value: AppError) -> Self {
        Self(value)
    }
}

impl IntoResponse for WorkerError {
    fn into_response(self) -> Response {
        let (status, message) = match self.0 {
            AppError::Validation(_) | AppError::UnsupportedPath(_) => {
                (StatusCode::BAD_REQUEST, self.0.to_string())
            }
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, self.0.to_string()),
            AppError::Conflict(_) => (StatusCode::CONFLICT, self.0.to_string()),
            AppError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, self.0.to_string()),
            AppError::Verification(_) | AppError::Internal(_) => {
                error!(error = %self.0, "worker request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("unknown error: {}", self.0),
                )
            }
        };

        (status, Json(ErrorResponse { message })).into_response()
    }
}

pub type WorkerResult<T> = Result<T, WorkerError>;
