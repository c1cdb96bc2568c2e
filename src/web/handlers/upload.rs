//! Chunked upload handler.

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    Json,
};
use std::sync::Arc;

use crate::asset::{AssetDir, AssetRepository, ChunkUpload};
use crate::web::dto::{parse_field, ChunkReceivedResponse, UploadChunkForm, UploadResponse};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;
use crate::web::middleware::AdminSession;

/// Read every multipart part into an [`UploadChunkForm`].
async fn read_form(mut multipart: Multipart) -> Result<UploadChunkForm, ApiError> {
    let mut form = UploadChunkForm::default();

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        tracing::warn!("Failed to read multipart field: {}", e);
        ApiError::bad_request("Invalid multipart data")
    })? {
        let name = field.name().unwrap_or("").to_string();

        if name == "chunk" {
            let bytes = field.bytes().await.map_err(|e| {
                tracing::warn!("Failed to read chunk content: {}", e);
                ApiError::bad_request("Failed to read chunk")
            })?;
            form.chunk = Some(bytes.to_vec());
            continue;
        }

        let slot = match name.as_str() {
            "action" => &mut form.action,
            "chunk_index" => &mut form.chunk_index,
            "total_chunks" => &mut form.total_chunks,
            "file_identifier" => &mut form.file_identifier,
            "original_filename" => &mut form.original_filename,
            "directory" => &mut form.directory,
            "csrf_token" => &mut form.csrf_token,
            _ => continue,
        };
        *slot = Some(field.text().await.map_err(|e| {
            tracing::warn!("Failed to read field {}: {}", name, e);
            ApiError::bad_request(format!("Invalid {name}"))
        })?);
    }

    Ok(form)
}

/// POST /admin/assets/upload - Stage one chunk, publishing on the last one.
///
/// Request body: multipart/form-data with `action=upload_chunk`, `chunk`,
/// `chunk_index`, `total_chunks`, `file_identifier`, `original_filename`,
/// `directory` and `csrf_token`.
pub async fn upload_chunk(
    State(state): State<Arc<AppState>>,
    session: AdminSession,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, ApiError> {
    let multipart = multipart.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let form = read_form(multipart).await?;

    session.verify_csrf(form.csrf_token.as_deref())?;

    if form.action.as_deref().map(str::trim) != Some("upload_chunk") {
        return Err(ApiError::bad_request("Unsupported action"));
    }

    let upload = ChunkUpload {
        session_id: form.file_identifier.unwrap_or_default(),
        chunk_index: parse_field("chunk_index", form.chunk_index.as_deref().unwrap_or(""))?,
        total_chunks: parse_field("total_chunks", form.total_chunks.as_deref().unwrap_or(""))?,
        original_filename: form.original_filename.unwrap_or_default(),
        directory: form.directory.unwrap_or_default(),
        bytes: form
            .chunk
            .ok_or_else(|| ApiError::bad_request("No chunk provided"))?,
    };

    let receipt = state.receiver.receive(&upload).await?;
    if !receipt.is_last {
        return Ok(Json(UploadResponse::ChunkReceived(
            ChunkReceivedResponse::new(receipt.accepted),
        )));
    }

    let directory = AssetDir::parse(&upload.directory)?;
    let catalog = AssetRepository::new(state.db.pool());
    let result = state
        .assembler
        .assemble(
            &upload.session_id,
            upload.total_chunks,
            &upload.original_filename,
            &directory,
            &catalog,
        )
        .await?;

    Ok(Json(UploadResponse::Complete(result.into())))
}

/// Fallback for other methods on the upload route.
pub async fn upload_method_not_allowed() -> ApiError {
    ApiError::method_not_allowed("Method not allowed")
}
