//! Directory management form handlers.
//!
//! Each action answers `303 See Other` back to the asset manager.

use axum::{
    extract::{rejection::FormRejection, State},
    response::Redirect,
    Form,
};
use std::sync::Arc;

use crate::asset::{AssetDir, AssetRepository};
use crate::web::dto::{CreateDirectoryRequest, DeleteDirectoryRequest, RenameDirectoryRequest};
use crate::web::error::ApiError;
use crate::web::handlers::{redirect_to_dir, AppState};
use crate::web::middleware::AdminSession;

/// Unwrap a form, turning extractor failures into a JSON 400.
pub(crate) fn form_or_400<T>(form: Result<Form<T>, FormRejection>) -> Result<T, ApiError> {
    form.map(|Form(inner)| inner)
        .map_err(|e| ApiError::bad_request(e.body_text()))
}

fn parent_of(dir: &AssetDir) -> String {
    dir.parent().map(|p| p.as_string()).unwrap_or_default()
}

/// POST /admin/assets/directories/create
pub async fn create_directory(
    State(state): State<Arc<AppState>>,
    session: AdminSession,
    form: Result<Form<CreateDirectoryRequest>, FormRejection>,
) -> Result<Redirect, ApiError> {
    let req = form_or_400(form)?;
    session.verify_csrf(req.csrf_token.as_deref())?;

    let parent = AssetDir::parse(&req.parent)?;
    state.directories.create(&parent, &req.name)?;

    Ok(redirect_to_dir(&parent.as_string()))
}

/// POST /admin/assets/directories/rename
pub async fn rename_directory(
    State(state): State<Arc<AppState>>,
    session: AdminSession,
    form: Result<Form<RenameDirectoryRequest>, FormRejection>,
) -> Result<Redirect, ApiError> {
    let req = form_or_400(form)?;
    session.verify_csrf(req.csrf_token.as_deref())?;

    let current = AssetDir::parse(&req.path)?;
    let catalog = AssetRepository::new(state.db.pool());
    let renamed = state
        .directories
        .rename(&current, &req.new_name, &catalog)
        .await?;

    Ok(redirect_to_dir(&parent_of(&renamed)))
}

/// POST /admin/assets/directories/delete
pub async fn delete_directory(
    State(state): State<Arc<AppState>>,
    session: AdminSession,
    form: Result<Form<DeleteDirectoryRequest>, FormRejection>,
) -> Result<Redirect, ApiError> {
    let req = form_or_400(form)?;
    session.verify_csrf(req.csrf_token.as_deref())?;

    let dir = AssetDir::parse(&req.path)?;
    state.directories.delete(&dir)?;

    Ok(redirect_to_dir(&parent_of(&dir)))
}
