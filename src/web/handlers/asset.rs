//! Single-asset handlers: download, move and delete.

use axum::{
    body::Body,
    extract::{rejection::FormRejection, Path, State},
    http::header,
    response::{Redirect, Response},
    Form,
};
use std::sync::Arc;

use crate::asset::{Asset, AssetDir, AssetRepository};
use crate::web::dto::{parse_field, DeleteAssetRequest, MoveAssetRequest};
use crate::web::error::ApiError;
use crate::web::handlers::{directory::form_or_400, redirect_to_dir, AppState};
use crate::web::middleware::AdminSession;

/// Generate a safe Content-Disposition header value for file downloads.
///
/// Control characters, quotes and backslashes never reach the quoted
/// `filename` parameter; non-ASCII names also get an RFC 5987 `filename*`.
fn content_disposition_header(filename: &str) -> String {
    let sanitized: String = filename
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| match c {
            '"' | '\\' => '_',
            _ => c,
        })
        .collect();

    if filename.is_ascii() && sanitized == filename {
        return format!("attachment; filename=\"{}\"", filename);
    }

    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        sanitized,
        urlencoding::encode(filename)
    )
}

async fn load_asset(catalog: &AssetRepository<'_>, id: i64) -> Result<Asset, ApiError> {
    catalog
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("asset {id} not found")))
}

/// GET /admin/assets/:id/download - Download an asset's bytes.
pub async fn download_asset(
    State(state): State<Arc<AppState>>,
    _session: AdminSession,
    Path(asset_id): Path<i64>,
) -> Result<Response<Body>, ApiError> {
    let catalog = AssetRepository::new(state.db.pool());
    let asset = load_asset(&catalog, asset_id).await?;

    let content = match tokio::fs::read(state.directories.asset_path(&asset)).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!(asset_id, path = %asset.path, "Catalogued file is missing on disk");
            return Err(ApiError::not_found(format!("file {} not found", asset.path)));
        }
        Err(e) => return Err(crate::VaultError::from(e).into()),
    };

    Response::builder()
        .header(header::CONTENT_TYPE, asset.mime_type.as_str())
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition_header(&asset.filename),
        )
        .header(header::CONTENT_LENGTH, content.len())
        .body(Body::from(content))
        .map_err(|e| {
            tracing::error!("Failed to build response: {}", e);
            ApiError::internal("Failed to build response")
        })
}

/// POST /admin/assets/move - Move an asset into another directory.
pub async fn move_asset(
    State(state): State<Arc<AppState>>,
    session: AdminSession,
    form: Result<Form<MoveAssetRequest>, FormRejection>,
) -> Result<Redirect, ApiError> {
    let req = form_or_400(form)?;
    session.verify_csrf(req.csrf_token.as_deref())?;

    let asset_id: i64 = parse_field("asset_id", &req.asset_id)?;
    let target = AssetDir::parse(&req.directory)?;

    let catalog = AssetRepository::new(state.db.pool());
    let asset = load_asset(&catalog, asset_id).await?;
    let moved = state
        .directories
        .move_asset(&asset, &target, &catalog)
        .await?;

    Ok(redirect_to_dir(&moved.directory))
}

/// POST /admin/assets/delete - Delete an asset row and its file.
pub async fn delete_asset(
    State(state): State<Arc<AppState>>,
    session: AdminSession,
    form: Result<Form<DeleteAssetRequest>, FormRejection>,
) -> Result<Redirect, ApiError> {
    let req = form_or_400(form)?;
    session.verify_csrf(req.csrf_token.as_deref())?;

    let asset_id: i64 = parse_field("asset_id", &req.asset_id)?;

    let catalog = AssetRepository::new(state.db.pool());
    let asset = load_asset(&catalog, asset_id).await?;
    state.directories.delete_asset(&asset, &catalog).await?;

    Ok(redirect_to_dir(&asset.directory))
}
