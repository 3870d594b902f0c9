use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &str, message: &str) -> Self {
        Self {
            field: field.to_string(),
            message: message.to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("validation failed")]
    Validation(Vec<FieldError>),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        // Provider/database detail stays in the logs, not the response.
        let body = match &self {
            AppError::Validation(fields) => {
                serde_json::json!({ "error": "validation failed", "fields": fields })
            }
            AppError::NotFound(msg) => serde_json::json!({ "error": msg }),
            AppError::Conflict(msg) => serde_json::json!({ "error": msg }),
            AppError::Database(e) => {
                tracing::error!(error = %e, "database error");
                serde_json::json!({ "error": "internal error" })
            }
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "internal error");
                serde_json::json!({ "error": "internal error" })
            }
        };

        (status, axum::Json(body)).into_response()
    }
}
