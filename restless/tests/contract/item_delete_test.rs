//! Contract Test: DELETE /{resource}/:lookup

use axum::http::StatusCode;
use serde_json::json;

use crate::support::{build_article_app, create_article, send};

#[tokio::test]
async fn test_delete_then_get_is_not_found() {
    let app = build_article_app().await;
    create_article(&app, "Doomed", "doomed").await;

    let response = send(&app, "DELETE", "/article/1", None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, json!({}));

    let response = send(&app, "GET", "/article/1", None).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let list = send(&app, "GET", "/article", None).await;
    assert_eq!(list.body, json!([]));
}

#[tokio::test]
async fn test_delete_missing_item_is_not_found() {
    let app = build_article_app().await;
    let response = send(&app, "DELETE", "/article/1", None).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}
