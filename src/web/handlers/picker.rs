//! Picker and directory tree handlers.

use axum::{
    extract::{Query, State},
    Json,
};
use std::sync::Arc;

use crate::asset::{AssetPicker, AssetRepository, PickerPage, PickerRequest};
use crate::web::dto::{TreeEntry, TreeResponse};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;
use crate::web::middleware::AdminSession;

/// GET /admin/assets/picker - Directory listing or file name search.
///
/// Query: `q`, `dir`, `filter`, `limit`, `offset`. A non-blank `q` searches
/// every directory and ignores `dir`.
pub async fn picker_query(
    State(state): State<Arc<AppState>>,
    _session: AdminSession,
    Query(request): Query<PickerRequest>,
) -> Result<Json<PickerPage>, ApiError> {
    let catalog = AssetRepository::new(state.db.pool());
    let picker = AssetPicker::new(&catalog, &state.directories, &state.public_url_prefix);

    let page = picker.query(&request).await?;

    Ok(Json(page))
}

/// GET /admin/assets/tree - Every directory known on disk or in the catalog.
pub async fn directory_tree(
    State(state): State<Arc<AppState>>,
    _session: AdminSession,
) -> Result<Json<TreeResponse>, ApiError> {
    let catalog = AssetRepository::new(state.db.pool());
    let catalog_dirs = catalog.list_distinct_directories().await?;

    let directories = state
        .directories
        .merged_tree(&catalog_dirs)?
        .iter()
        .map(TreeEntry::from)
        .collect();

    Ok(Json(TreeResponse { directories }))
}
