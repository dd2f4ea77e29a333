//! Contract Test: GET /{resource}

use axum::http::StatusCode;
use serde_json::json;

use crate::support::{build_article_app, create_article, send};

#[tokio::test]
async fn test_empty_collection_returns_empty_array() {
    let app = build_article_app().await;
    let response = send(&app, "GET", "/article", None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, json!([]));
}

#[tokio::test]
async fn test_collection_lists_all_rows_in_primary_key_order() {
    let app = build_article_app().await;
    create_article(&app, "First", "first").await;
    create_article(&app, "Second", "second").await;

    let response = send(&app, "GET", "/article", None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.body,
        json!([
            {
                "id": 1, "title": "First", "slug": "first", "body": "",
                "views": 0, "published": false, "note": null, "attachment": null
            },
            {
                "id": 2, "title": "Second", "slug": "second", "body": "",
                "views": 0, "published": false, "note": null, "attachment": null
            }
        ])
    );
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let app = build_article_app().await;
    let response = send(&app, "GET", "/comment", None).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(
        response.body,
        json!({"message": "Resource Not Found", "errors": null})
    );
}
