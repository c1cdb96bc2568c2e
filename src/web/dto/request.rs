//! Request DTOs for the asset admin API.
//!
//! Form fields default to empty strings so that missing values surface as a
//! JSON 400 from the handler instead of an extractor rejection.

use serde::Deserialize;

use crate::web::error::ApiError;

/// Parse a numeric form field, rejecting blanks and garbage with 400.
pub fn parse_field<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, ApiError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ApiError::bad_request(format!("{name} is required")));
    }
    value
        .parse()
        .map_err(|_| ApiError::bad_request(format!("{name} must be a non-negative integer")))
}

/// Fields of one chunk upload request, collected from multipart parts.
#[derive(Debug, Default)]
pub struct UploadChunkForm {
    /// Must be `upload_chunk`.
    pub action: Option<String>,
    /// Fragment index.
    pub chunk_index: Option<String>,
    /// Total number of fragments.
    pub total_chunks: Option<String>,
    /// Client-generated upload identifier.
    pub file_identifier: Option<String>,
    /// Browser-supplied file name.
    pub original_filename: Option<String>,
    /// Target directory.
    pub directory: Option<String>,
    /// CSRF token.
    pub csrf_token: Option<String>,
    /// Fragment bytes.
    pub chunk: Option<Vec<u8>>,
}

/// Create-directory form.
#[derive(Debug, Deserialize)]
pub struct CreateDirectoryRequest {
    /// Parent directory (`""` for the root).
    #[serde(default)]
    pub parent: String,
    /// New directory name.
    #[serde(default)]
    pub name: String,
    /// CSRF token.
    #[serde(default)]
    pub csrf_token: Option<String>,
}

/// Rename-directory form.
#[derive(Debug, Deserialize)]
pub struct RenameDirectoryRequest {
    /// Directory to rename.
    #[serde(default)]
    pub path: String,
    /// New last segment.
    #[serde(default)]
    pub new_name: String,
    /// CSRF token.
    #[serde(default)]
    pub csrf_token: Option<String>,
}

/// Delete-directory form.
#[derive(Debug, Deserialize)]
pub struct DeleteDirectoryRequest {
    /// Directory to delete.
    #[serde(default)]
    pub path: String,
    /// CSRF token.
    #[serde(default)]
    pub csrf_token: Option<String>,
}

/// Move-asset form.
#[derive(Debug, Deserialize)]
pub struct MoveAssetRequest {
    /// Asset ID.
    #[serde(default)]
    pub asset_id: String,
    /// Target directory.
    #[serde(default)]
    pub directory: String,
    /// CSRF token.
    #[serde(default)]
    pub csrf_token: Option<String>,
}

/// Delete-asset form.
#[derive(Debug, Deserialize)]
pub struct DeleteAssetRequest {
    /// Asset ID.
    #[serde(default)]
    pub asset_id: String,
    /// CSRF token.
    #[serde(default)]
    pub csrf_token: Option<String>,
}
