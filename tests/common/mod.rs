//! Test helpers for web API integration tests.
//!
//! Builds the full router over an in-memory catalog and a temporary upload
//! root, and mints admin session tokens the way the admin panel would.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use jsonwebtoken::{encode, EncodingKey, Header};
use tempfile::TempDir;

use assetvault::config::UploadsConfig;
use assetvault::web::handlers::AppState;
use assetvault::web::middleware::{JwtClaims, JwtState};
use assetvault::web::router::create_router;
use assetvault::Database;

/// Secret shared by the test router and the token helper.
pub const TEST_SECRET: &str = "test-secret-key-for-testing-only";

/// CSRF token embedded as `jti` in every test session.
pub const CSRF_TOKEN: &str = "csrf-test-token";

/// A running test application.
pub struct TestApp {
    pub server: TestServer,
    pub db: Arc<Database>,
    pub root: PathBuf,
    _temp: TempDir,
}

impl TestApp {
    /// Absolute path of a file under the upload root.
    pub fn file(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }

    /// Upload `chunks` in order as one session.
    pub async fn upload(
        &self,
        session: &str,
        filename: &str,
        directory: &str,
        chunks: &[&str],
    ) -> serde_json::Value {
        let mut last = serde_json::Value::Null;
        for (i, chunk) in chunks.iter().enumerate() {
            let response = self
                .server
                .post("/admin/assets/upload")
                .add_header(
                    axum::http::header::AUTHORIZATION,
                    format!("Bearer {}", admin_token()),
                )
                .multipart(chunk_form(
                    session,
                    i as u32,
                    chunks.len() as u32,
                    filename,
                    directory,
                    chunk.as_bytes(),
                ))
                .await;
            response.assert_status_ok();
            last = response.json();
        }
        last
    }
}

/// Create a test server with an in-memory database and a temp upload root.
pub async fn create_test_app() -> TestApp {
    create_test_app_with(UploadsConfig::default()).await
}

/// Create a test server with custom upload limits. `root` is replaced.
pub async fn create_test_app_with(mut uploads: UploadsConfig) -> TestApp {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let root = temp.path().join("uploads");
    uploads.root = root.to_string_lossy().to_string();

    let db = Database::open_in_memory()
        .await
        .expect("Failed to create test database");
    let shared_db = Arc::new(db);

    let app_state =
        Arc::new(AppState::new(shared_db.clone(), &uploads).expect("Failed to create app state"));
    let jwt_state = Arc::new(JwtState::new(TEST_SECRET));

    let router = create_router(app_state, jwt_state, &[]);
    let server = TestServer::new(router).expect("Failed to create test server");

    TestApp {
        server,
        db: shared_db,
        root,
        _temp: temp,
    }
}

/// Mint a session token for `role`.
pub fn token_for_role(role: &str) -> String {
    let now = chrono::Utc::now().timestamp();
    let claims = JwtClaims {
        sub: 1,
        username: "editor".to_string(),
        role: role.to_string(),
        iat: now as u64,
        exp: (now + 3600) as u64,
        jti: CSRF_TOKEN.to_string(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
    )
    .expect("Failed to encode token")
}

/// Mint an admin session token.
pub fn admin_token() -> String {
    token_for_role("admin")
}

/// Authorization header value for the admin session.
pub fn bearer() -> String {
    format!("Bearer {}", admin_token())
}

/// Multipart body for one chunk, with the session's CSRF token.
pub fn chunk_form(
    session: &str,
    index: u32,
    total: u32,
    filename: &str,
    directory: &str,
    bytes: &[u8],
) -> MultipartForm {
    MultipartForm::new()
        .add_text("action", "upload_chunk")
        .add_text("chunk_index", index.to_string())
        .add_text("total_chunks", total.to_string())
        .add_text("file_identifier", session)
        .add_text("original_filename", filename)
        .add_text("directory", directory)
        .add_text("csrf_token", CSRF_TOKEN)
        .add_part("chunk", Part::bytes(bytes.to_vec()).file_name("blob"))
}

/// Write a file directly under the upload root, bypassing the catalog.
pub fn write_untracked(root: &Path, relative: &str, bytes: &[u8]) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("Failed to create parent");
    }
    std::fs::write(path, bytes).expect("Failed to write file");
}
