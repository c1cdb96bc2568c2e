//! Admin session authentication.
//!
//! Sessions are issued by the surrounding admin panel as signed JWTs. This
//! crate only verifies them. The token's `jti` doubles as the CSRF token that
//! mutating forms must echo back.

use axum::{
    body::Body,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, Request},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::web::error::ApiError;

/// Roles allowed to manage assets.
const ADMIN_ROLES: &[&str] = &["admin", "editor"];

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject (user ID).
    pub sub: i64,
    /// Username.
    pub username: String,
    /// User role.
    pub role: String,
    /// Issued at timestamp.
    pub iat: u64,
    /// Expiration timestamp.
    pub exp: u64,
    /// JWT ID, also the session's CSRF token.
    pub jti: String,
}

/// Application state for JWT authentication.
#[derive(Clone)]
pub struct JwtState {
    /// Decoding key for JWT verification.
    pub decoding_key: DecodingKey,
    /// Validation settings.
    pub validation: Validation,
}

impl JwtState {
    /// Create a new JWT state from a secret key.
    pub fn new(secret: &str) -> Self {
        let decoding_key = DecodingKey::from_secret(secret.as_bytes());
        let mut validation = Validation::default();
        validation.validate_exp = true;

        Self {
            decoding_key,
            validation,
        }
    }
}

/// Extractor for an authenticated admin session.
///
/// Reads a bearer token from the `Authorization` header, or from the `token`
/// query parameter for plain browser downloads.
#[derive(Debug, Clone)]
pub struct AdminSession(pub JwtClaims);

impl AdminSession {
    /// Check a submitted CSRF token against this session.
    pub fn verify_csrf(&self, token: Option<&str>) -> Result<(), ApiError> {
        match token.map(str::trim) {
            Some(t) if !t.is_empty() && t == self.0.jti => Ok(()),
            Some(t) if !t.is_empty() => {
                tracing::warn!(user = %self.0.username, "CSRF token mismatch");
                Err(ApiError::forbidden("Invalid CSRF token"))
            }
            _ => Err(ApiError::forbidden("Missing CSRF token")),
        }
    }
}

fn bearer_token(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))
        .map(|t| t.to_string())
}

fn query_token(parts: &Parts) -> Option<String> {
    parts.uri.query().unwrap_or("").split('&').find_map(|pair| {
        let mut kv = pair.splitn(2, '=');
        let key = kv.next()?;
        let value = kv.next()?;
        if key == "token" {
            urlencoding::decode(value).ok().map(|s| s.into_owned())
        } else {
            None
        }
    })
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for AdminSession
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .or_else(|| query_token(parts))
            .ok_or_else(|| ApiError::unauthorized("Missing authorization"))?;

        // Injected by the jwt_auth middleware.
        let jwt_state = parts
            .extensions
            .get::<Arc<JwtState>>()
            .ok_or_else(|| ApiError::internal("JWT state not configured"))?;

        let token_data =
            decode::<JwtClaims>(&token, &jwt_state.decoding_key, &jwt_state.validation).map_err(
                |e| {
                    tracing::debug!("JWT validation failed: {}", e);
                    ApiError::unauthorized("Invalid or expired session")
                },
            )?;

        let claims = token_data.claims;
        if !ADMIN_ROLES.contains(&claims.role.as_str()) {
            return Err(ApiError::forbidden("Admin access required"));
        }

        Ok(AdminSession(claims))
    }
}

/// Middleware function to inject JWT state into request extensions.
pub async fn jwt_auth(
    jwt_state: Arc<JwtState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    request.extensions_mut().insert(jwt_state);
    next.run(request).await
}
