//! Contract Test: PATCH /{resource}/:lookup

use axum::http::StatusCode;
use restless_common::types::PatchMode;
use serde_json::json;

use crate::support::{article_resource, build_app, build_article_app, create_article, send};

#[tokio::test]
async fn test_patch_sets_field_outside_the_form() {
    let app = build_article_app().await;
    create_article(&app, "Title", "title").await;

    let response = send(&app, "PATCH", "/article/1", Some(json!({"note": "editor only"}))).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["note"], json!("editor only"));
    assert_eq!(response.body["title"], json!("Title"));
}

#[tokio::test]
async fn test_patch_ignores_unknown_keys_and_primary_key() {
    let app = build_article_app().await;
    create_article(&app, "Title", "title").await;

    let response = send(
        &app,
        "PATCH",
        "/article/1",
        Some(json!({"id": 500, "pk": 600, "nonsense": 1, "views": 3})),
    )
    .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["id"], json!(1));
    assert_eq!(response.body["views"], json!(3));
    assert!(response.body.get("nonsense").is_none());
}

#[tokio::test]
async fn test_patch_on_missing_item_is_not_found() {
    let app = build_article_app().await;
    let response = send(&app, "PATCH", "/article/3", Some(json!({"views": 1}))).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_partial_patch_mode_validates_present_keys() {
    let mut resource = article_resource();
    resource.patch_mode = PatchMode::Partial;
    let app = build_app(vec![resource]).await;
    create_article(&app, "Title", "title").await;

    let response = send(&app, "PATCH", "/article/1", Some(json!({"views": "lots"}))).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["message"], json!("Invalid data"));
    assert_eq!(
        response.body["errors"]["views"],
        json!(["Enter a whole number."])
    );

    let response = send(&app, "PATCH", "/article/1", Some(json!({"views": "8"}))).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["views"], json!(8));
    assert_eq!(response.body["slug"], json!("title"));
}
