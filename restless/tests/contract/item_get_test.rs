//! Contract Test: GET /{resource}/:lookup

use axum::http::StatusCode;
use serde_json::json;

use crate::support::{article_resource, build_app, build_article_app, create_article, send};

#[tokio::test]
async fn test_get_existing_item() {
    let app = build_article_app().await;
    let created = create_article(&app, "Hello", "hello").await;

    let response = send(&app, "GET", "/article/1", None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, created);
}

#[tokio::test]
async fn test_get_unknown_item_is_not_found() {
    let app = build_article_app().await;
    let response = send(&app, "GET", "/article/42", None).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(
        response.body,
        json!({"message": "Resource Not Found", "errors": null})
    );
}

#[tokio::test]
async fn test_uncoercible_lookup_is_not_found() {
    let app = build_article_app().await;
    create_article(&app, "Hello", "hello").await;
    let response = send(&app, "GET", "/article/hello", None).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_custom_lookup_field() {
    let mut resource = article_resource();
    resource.lookup_field = "slug".to_string();
    let app = build_app(vec![resource]).await;
    create_article(&app, "Hello", "hello-world").await;

    let response = send(&app, "GET", "/article/hello-world", None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["title"], json!("Hello"));

    let response = send(&app, "GET", "/article/1", None).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}
