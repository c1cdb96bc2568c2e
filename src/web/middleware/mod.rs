//! Middleware for the asset admin API.

pub mod auth;
pub mod cors;

pub use auth::{jwt_auth, AdminSession, JwtClaims, JwtState};
pub use cors::create_cors_layer;
