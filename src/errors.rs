use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::error::DbErr;
use serde::{Deserialize, Serialize};
use tracing::error;
use utoipa::ToSchema;

fn current_request_id() -> Option<String> {
    crate::tracing::current_request_id().map(|rid| rid.as_str().to_string())
}

/// Error body returned by every failing endpoint
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// HTTP status category (e.g., "Not Found", "Bad Request")
    #[schema(example = "Bad Request")]
    pub error: String,
    /// Human-readable error description
    #[schema(example = "Invalid input: planId, productionDate and quantity are required")]
    pub message: String,
    /// Request identifier echoed from the `x-request-id` header
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    /// RFC 3339 timestamp when the error was produced
    pub timestamp: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Rejected before any storage write happened.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Pool exhaustion, connectivity loss or a failed statement.
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(#[from] DbErr),
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::InvalidInput(err.to_string())
    }
}

impl ServiceError {
    pub fn db_error(error: DbErr) -> Self {
        ServiceError::StorageUnavailable(error)
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        ServiceError::InvalidInput(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ServiceError::NotFound(message.into())
    }

    /// Returns the HTTP status code for this error.
    /// This is the single source of truth for error-to-status mapping.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::StorageUnavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the error message suitable for HTTP responses.
    /// Storage failures collapse to a generic message.
    pub fn response_message(&self) -> String {
        match self {
            Self::StorageUnavailable(_) => "Server error".to_string(),
            _ => self.to_string(),
        }
    }

    pub fn is_storage_failure(&self) -> bool {
        matches!(self, Self::StorageUnavailable(_))
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let request_id = current_request_id();

        if status.is_server_error() {
            error!(
                request_id = request_id.as_deref().unwrap_or("-"),
                error = %self,
                "Request failed"
            );
        }

        let err = ErrorResponse {
            error: status.canonical_reason().unwrap_or("Error").to_string(),
            message: self.response_message(),
            request_id,
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        (status, Json(err)).into_response()
    }
}
