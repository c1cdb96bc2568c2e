//! Router configuration for the asset admin API.

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use super::handlers::{
    create_directory, delete_asset, delete_directory, directory_tree, download_asset, move_asset,
    picker_query, rename_directory, upload_chunk, upload_method_not_allowed, AppState,
};
use super::middleware::{create_cors_layer, jwt_auth, JwtState};

/// Room for multipart framing and the text fields around one chunk.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Create the main router.
pub fn create_router(
    app_state: Arc<AppState>,
    jwt_state: Arc<JwtState>,
    cors_origins: &[String],
) -> Router {
    let upload_limit = app_state.max_chunk_bytes + MULTIPART_OVERHEAD_BYTES;

    let asset_routes = Router::new()
        .route(
            "/upload",
            post(upload_chunk)
                .fallback(upload_method_not_allowed)
                .layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/picker", get(picker_query))
        .route("/tree", get(directory_tree))
        .route("/:id/download", get(download_asset))
        .route("/directories/create", post(create_directory))
        .route("/directories/rename", post(rename_directory))
        .route("/directories/delete", post(delete_directory))
        .route("/move", post(move_asset))
        .route("/delete", post(delete_asset));

    let jwt_state_for_middleware = jwt_state.clone();

    Router::new()
        .nest("/admin/assets", asset_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(create_cors_layer(cors_origins))
                .layer(middleware::from_fn(move |req, next| {
                    let state = jwt_state_for_middleware.clone();
                    jwt_auth(state, req, next)
                })),
        )
        .with_state(app_state)
        .merge(create_health_router())
}

/// Create a health check router.
pub fn create_health_router() -> Router {
    Router::new().route("/health", get(health_check))
}

/// Health check handler.
async fn health_check() -> &'static str {
    "OK"
}
