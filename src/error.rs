//! Error types for assetvault.

use thiserror::Error;

/// Common error type for assetvault.
#[derive(Error, Debug)]
pub enum VaultError {
    /// Catalog storage error.
    ///
    /// Errors from sqlx are converted into this variant. Callers never retry
    /// automatically.
    #[error("database error: {0}")]
    Database(String),

    /// Database connection error.
    #[error("database connection error: {0}")]
    DatabaseConnection(String),

    /// I/O error while writing a fragment or publishing a file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Missing or malformed request parameters.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// No valid session.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Session is valid but the CSRF token did not match.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// A fragment expected during assembly was not staged.
    #[error("missing chunk {index} for upload {session_id}")]
    MissingChunk {
        /// Sanitized session identifier.
        session_id: String,
        /// Index of the first absent fragment.
        index: u32,
    },

    /// Collision-suffix probing ran out of candidates.
    #[error("no free file name for {name} after {attempts} attempts")]
    NameExhausted {
        /// The intended file name.
        name: String,
        /// Number of candidates probed.
        attempts: u32,
    },

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// Target already exists.
    #[error("{0} already exists")]
    Conflict(String),

    /// Directory still has entries.
    #[error("directory {0} is not empty")]
    NotEmpty(String),

    /// The filesystem changed but the catalog update failed afterwards.
    #[error("filesystem and catalog out of sync: {0}")]
    PartialInconsistency(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

// Conversion from sqlx errors
impl From<sqlx::Error> for VaultError {
    fn from(e: sqlx::Error) -> Self {
        VaultError::Database(e.to_string())
    }
}

/// Result type alias for assetvault operations.
pub type Result<T> = std::result::Result<T, VaultError>;
