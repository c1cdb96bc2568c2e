//! Web API integration tests for single-asset download, move and delete.

mod common;

use axum::http::{
    header::{AUTHORIZATION, CONTENT_DISPOSITION, CONTENT_TYPE, LOCATION},
    StatusCode,
};
use serde_json::Value;

use assetvault::AssetRepository;
use common::{admin_token, bearer, create_test_app, TestApp, CSRF_TOKEN};

async fn post_form(app: &TestApp, path: &str, form: &[(&str, &str)]) -> axum_test::TestResponse {
    app.server
        .post(path)
        .add_header(AUTHORIZATION, bearer())
        .form(&form)
        .await
}

#[tokio::test]
async fn test_download_asset() {
    let app = create_test_app().await;
    app.upload("s1", "notes.txt", "docs", &["hello ", "world"]).await;

    let response = app
        .server
        .get("/admin/assets/1/download")
        .add_header(AUTHORIZATION, bearer())
        .await;

    response.assert_status_ok();
    assert_eq!(response.header(CONTENT_TYPE), "text/plain");
    assert_eq!(
        response.header(CONTENT_DISPOSITION),
        "attachment; filename=\"notes.txt\""
    );
    assert_eq!(response.as_bytes().as_ref(), b"hello world");
}

#[tokio::test]
async fn test_download_with_query_token() {
    let app = create_test_app().await;
    app.upload("s1", "notes.txt", "", &["hi"]).await;

    let response = app
        .server
        .get("/admin/assets/1/download")
        .add_query_param("token", admin_token())
        .await;

    response.assert_status_ok();
    assert_eq!(response.text(), "hi");
}

#[tokio::test]
async fn test_download_missing_asset() {
    let app = create_test_app().await;

    let response = app
        .server
        .get("/admin/assets/42/download")
        .add_header(AUTHORIZATION, bearer())
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_download_file_missing_on_disk() {
    let app = create_test_app().await;
    app.upload("s1", "gone.txt", "", &["x"]).await;
    std::fs::remove_file(app.file("gone.txt")).unwrap();

    let response = app
        .server
        .get("/admin/assets/1/download")
        .add_header(AUTHORIZATION, bearer())
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_move_asset() {
    let app = create_test_app().await;
    app.upload("s1", "pic.png", "", &["png"]).await;

    let response = post_form(
        &app,
        "/admin/assets/move",
        &[
            ("asset_id", "1"),
            ("directory", "photos/2024"),
            ("csrf_token", CSRF_TOKEN),
        ],
    )
    .await;

    response.assert_status(StatusCode::SEE_OTHER);
    assert_eq!(
        response.header(LOCATION),
        "/admin/assets?dir=photos%2F2024"
    );
    assert!(!app.file("pic.png").exists());
    assert!(app.file("photos/2024/pic.png").is_file());

    let catalog = AssetRepository::new(app.db.pool());
    let asset = catalog.get_by_id(1).await.unwrap().unwrap();
    assert_eq!(asset.directory, "photos/2024");
    assert_eq!(asset.path, "photos/2024/pic.png");
}

#[tokio::test]
async fn test_move_asset_conflict() {
    let app = create_test_app().await;
    app.upload("s1", "pic.png", "", &["root"]).await;
    app.upload("s2", "pic.png", "photos", &["photos"]).await;

    let response = post_form(
        &app,
        "/admin/assets/move",
        &[
            ("asset_id", "1"),
            ("directory", "photos"),
            ("csrf_token", CSRF_TOKEN),
        ],
    )
    .await;

    response.assert_status(StatusCode::CONFLICT);
    assert_eq!(std::fs::read(app.file("pic.png")).unwrap(), b"root");
    assert_eq!(std::fs::read(app.file("photos/pic.png")).unwrap(), b"photos");
}

#[tokio::test]
async fn test_move_asset_bad_id() {
    let app = create_test_app().await;

    let response = post_form(
        &app,
        "/admin/assets/move",
        &[
            ("asset_id", "abc"),
            ("directory", "photos"),
            ("csrf_token", CSRF_TOKEN),
        ],
    )
    .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let response = post_form(
        &app,
        "/admin/assets/move",
        &[
            ("asset_id", "7"),
            ("directory", "photos"),
            ("csrf_token", CSRF_TOKEN),
        ],
    )
    .await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_asset() {
    let app = create_test_app().await;
    app.upload("s1", "pic.png", "photos", &["png"]).await;

    let response = post_form(
        &app,
        "/admin/assets/delete",
        &[("asset_id", "1"), ("csrf_token", CSRF_TOKEN)],
    )
    .await;

    response.assert_status(StatusCode::SEE_OTHER);
    assert_eq!(response.header(LOCATION), "/admin/assets?dir=photos");
    assert!(!app.file("photos/pic.png").exists());

    let catalog = AssetRepository::new(app.db.pool());
    assert_eq!(catalog.get_by_id(1).await.unwrap(), None);

    let response = post_form(
        &app,
        "/admin/assets/delete",
        &[("asset_id", "1"), ("csrf_token", CSRF_TOKEN)],
    )
    .await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_asset_requires_csrf() {
    let app = create_test_app().await;
    app.upload("s1", "pic.png", "", &["png"]).await;

    let response = post_form(
        &app,
        "/admin/assets/delete",
        &[("asset_id", "1"), ("csrf_token", "wrong")],
    )
    .await;

    response.assert_status(StatusCode::FORBIDDEN);
    assert!(app.file("pic.png").is_file());
}
