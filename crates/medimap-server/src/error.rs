use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use medimap_core::error::AppError;

/// API error type that maps to HTTP responses.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    /// Request whose parameters are rejected: unparsable, out of range or too short.
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
}

/// JSON error response body
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone()),
            ApiError::Validation(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "validation_error",
                msg.clone(),
            ),
            ApiError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                msg.clone(),
            ),
            ApiError::ServiceUnavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "service_unavailable",
                msg.clone(),
            ),
        };

        if status.is_server_error() {
            tracing::error!(%status, "{}", message);
        }

        let body = Json(ErrorResponse {
            error: error_type.to_string(),
            message,
            details: None,
        });

        (status, body).into_response()
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        match &err {
            AppError::RegionNotFound(code) => {
                ApiError::NotFound(format!("Region not found: {}", code))
            }
            AppError::RegionIdNotFound(id) => {
                ApiError::NotFound(format!("Region not found: id {}", id))
            }
            AppError::DrugNotFound(id) => ApiError::NotFound(format!("Drug not found: id {}", id)),
            AppError::ValidationError(msg) => ApiError::Validation(msg.clone()),
            AppError::DatabaseError(e) => {
                tracing::error!("Database error: {}", e);
                if err.is_retryable() {
                    ApiError::ServiceUnavailable("Database unavailable".to_string())
                } else {
                    ApiError::Internal("Database error".to_string())
                }
            }
            _ => {
                tracing::error!("Unexpected error: {}", err);
                ApiError::Internal("Internal error".to_string())
            }
        }
    }
}
