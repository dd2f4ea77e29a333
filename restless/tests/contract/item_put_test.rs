//! Contract Test: PUT /{resource}/:lookup

use axum::http::StatusCode;
use serde_json::json;

use crate::support::{article_resource, build_app, build_article_app, create_article, send};

#[tokio::test]
async fn test_put_updates_form_fields() {
    let app = build_article_app().await;
    create_article(&app, "Old", "old").await;

    let response = send(
        &app,
        "PUT",
        "/article/1",
        Some(json!({
            "title": "New", "slug": "new", "body": "text",
            "views": 5, "published": true
        })),
    )
    .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["id"], json!(1));
    assert_eq!(response.body["title"], json!("New"));
    assert_eq!(response.body["body"], json!("text"));
    assert_eq!(response.body["views"], json!(5));
    assert_eq!(response.body["published"], json!(true));

    let stored = send(&app, "GET", "/article/1", None).await;
    assert_eq!(stored.body, response.body);
}

#[tokio::test]
async fn test_put_leaves_fields_outside_the_form_unchanged() {
    let mut resource = article_resource();
    resource.form_fields = Some(vec!["title".into(), "slug".into()]);
    let app = build_app(vec![resource]).await;

    let created = send(
        &app,
        "POST",
        "/article",
        Some(json!({"title": "T", "slug": "s"})),
    )
    .await;
    assert_eq!(created.status, StatusCode::CREATED);

    // views / published はフォーム外なのでPATCHで設定してからPUTする
    let patched = send(
        &app,
        "PATCH",
        "/article/1",
        Some(json!({"views": 9, "published": true})),
    )
    .await;
    assert_eq!(patched.status, StatusCode::OK);

    let response = send(
        &app,
        "PUT",
        "/article/1",
        Some(json!({"title": "T2", "slug": "s2", "views": 0})),
    )
    .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["title"], json!("T2"));
    assert_eq!(response.body["views"], json!(9));
    assert_eq!(response.body["published"], json!(true));
}

#[tokio::test]
async fn test_invalid_put_returns_errors() {
    let app = build_article_app().await;
    create_article(&app, "Old", "old").await;

    let response = send(&app, "PUT", "/article/1", Some(json!({"title": "No slug"}))).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["message"], json!("Invalid data"));
    assert_eq!(
        response.body["errors"]["slug"],
        json!(["This field is required."])
    );

    let stored = send(&app, "GET", "/article/1", None).await;
    assert_eq!(stored.body["title"], json!("Old"));
}

#[tokio::test]
async fn test_put_on_missing_item_is_not_found() {
    let app = build_article_app().await;
    let response = send(
        &app,
        "PUT",
        "/article/7",
        Some(json!({"title": "x", "slug": "x"})),
    )
    .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}
