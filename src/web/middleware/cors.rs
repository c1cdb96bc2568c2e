//! CORS configuration for the admin asset endpoints.

use axum::http::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method};
use tower_http::cors::{Any, CorsLayer};

/// Methods used by the upload widget, picker and directory forms.
const ALLOWED_METHODS: [Method; 3] = [Method::GET, Method::POST, Method::OPTIONS];

fn permissive() -> CorsLayer {
    CorsLayer::new()
        .allow_methods(ALLOWED_METHODS)
        .allow_headers(Any)
        .allow_origin(Any)
}

/// Create a CORS layer from the configured origins.
///
/// With no valid origins every origin is allowed without credentials;
/// otherwise only the listed origins may send credentials.
pub fn create_cors_layer(origins: &[String]) -> CorsLayer {
    let parsed_origins: Vec<HeaderValue> =
        origins.iter().filter_map(|o| o.parse().ok()).collect();

    if parsed_origins.is_empty() {
        return permissive();
    }

    CorsLayer::new()
        .allow_methods(ALLOWED_METHODS)
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT])
        .allow_credentials(true)
        .allow_origin(parsed_origins)
}
