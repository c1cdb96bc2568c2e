//! API error handling for the asset admin endpoints.
//!
//! Every failure is answered with `{"error": "<message>", "code": "<CODE>"}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::VaultError;

/// API error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Missing or malformed request fields (400).
    InvalidRequest,
    /// No valid admin session (401).
    Unauthorized,
    /// CSRF token mismatch or insufficient role (403).
    Forbidden,
    /// Not found (404).
    NotFound,
    /// Wrong HTTP method (405).
    MethodNotAllowed,
    /// Target already exists (409).
    Conflict,
    /// Directory still has entries (409).
    NotEmpty,
    /// An upload fragment was never staged (500).
    MissingChunk,
    /// No free file name could be found (500).
    NameExhausted,
    /// Filesystem and catalog disagree after a partial failure (500).
    PartialInconsistency,
    /// Catalog storage failure (500).
    StorageError,
    /// Internal server error (500).
    InternalError,
}

impl ErrorCode {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorCode::InvalidRequest => StatusCode::BAD_REQUEST,
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ErrorCode::Conflict | ErrorCode::NotEmpty => StatusCode::CONFLICT,
            ErrorCode::MissingChunk
            | ErrorCode::NameExhausted
            | ErrorCode::PartialInconsistency
            | ErrorCode::StorageError
            | ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// API error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Human-readable message.
    pub error: String,
    /// Error code.
    pub code: ErrorCode,
}

/// API error type.
#[derive(Debug)]
pub struct ApiError {
    code: ErrorCode,
    message: String,
}

impl ApiError {
    /// Create a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// The error code.
    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// Create a bad request error.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidRequest, message)
    }

    /// Create an unauthorized error.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    /// Create a forbidden error.
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Forbidden, message)
    }

    /// Create a not found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    /// Create a method not allowed error.
    pub fn method_not_allowed(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::MethodNotAllowed, message)
    }

    /// Create a conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Conflict, message)
    }

    /// Create an internal server error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.code.status_code();
        let body = ErrorBody {
            error: self.message,
            code: self.code,
        };
        (status, Json(body)).into_response()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

impl From<VaultError> for ApiError {
    fn from(err: VaultError) -> Self {
        match &err {
            VaultError::InvalidRequest(msg) => ApiError::bad_request(msg.clone()),
            VaultError::Unauthorized(msg) => ApiError::unauthorized(msg.clone()),
            VaultError::Forbidden(msg) => ApiError::forbidden(msg.clone()),
            VaultError::NotFound(_) => ApiError::not_found(err.to_string()),
            VaultError::Conflict(_) => ApiError::conflict(err.to_string()),
            VaultError::NotEmpty(_) => ApiError::new(ErrorCode::NotEmpty, err.to_string()),
            VaultError::MissingChunk { .. } => {
                tracing::warn!("Upload failed: {}", err);
                ApiError::new(ErrorCode::MissingChunk, err.to_string())
            }
            VaultError::NameExhausted { .. } => {
                tracing::error!("Upload failed: {}", err);
                ApiError::new(ErrorCode::NameExhausted, err.to_string())
            }
            VaultError::PartialInconsistency(_) => {
                tracing::error!("{}", err);
                ApiError::new(ErrorCode::PartialInconsistency, err.to_string())
            }
            VaultError::Database(_) | VaultError::DatabaseConnection(_) => {
                tracing::error!("Storage error: {}", err);
                ApiError::new(ErrorCode::StorageError, "Asset catalog unavailable")
            }
            VaultError::Io(_) | VaultError::Config(_) => {
                tracing::error!("Internal error: {}", err);
                ApiError::internal("An internal error occurred")
            }
        }
    }
}
