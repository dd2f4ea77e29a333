//! Contract Test: POST /{resource}（単一オブジェクト）

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::json;

use crate::support::{build_article_app, create_article, send, send_request};

#[tokio::test]
async fn test_valid_post_returns_created_resource() {
    let app = build_article_app().await;
    let response = send(
        &app,
        "POST",
        "/article",
        Some(json!({"title": "Hello", "slug": "hello", "views": "12", "published": true})),
    )
    .await;

    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["id"], json!(1));
    assert_eq!(response.body["title"], json!("Hello"));
    assert_eq!(response.body["views"], json!(12));
    assert_eq!(response.body["published"], json!(true));

    let stored = send(&app, "GET", "/article/1", None).await;
    assert_eq!(stored.body, response.body);
}

#[tokio::test]
async fn test_invalid_post_returns_field_errors_and_persists_nothing() {
    let app = build_article_app().await;
    let response = send(
        &app,
        "POST",
        "/article",
        Some(json!({"title": "x".repeat(51), "views": "many"})),
    )
    .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["message"], json!("Invalid Data"));
    let errors = &response.body["errors"];
    assert_eq!(
        errors["title"],
        json!(["Ensure this value has at most 50 characters (it has 51)."])
    );
    assert_eq!(errors["slug"], json!(["This field is required."]));
    assert_eq!(errors["views"], json!(["Enter a whole number."]));

    let list = send(&app, "GET", "/article", None).await;
    assert_eq!(list.body, json!([]));
}

#[tokio::test]
async fn test_read_only_fields_are_ignored_on_create() {
    let app = build_article_app().await;
    let response = send(
        &app,
        "POST",
        "/article",
        Some(json!({"title": "T", "slug": "t", "note": "sneaky", "id": 99})),
    )
    .await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["note"], json!(null));
    assert_eq!(response.body["id"], json!(1));
}

#[tokio::test]
async fn test_duplicate_unique_field_is_a_field_error() {
    let app = build_article_app().await;
    create_article(&app, "One", "same").await;

    let response = send(
        &app,
        "POST",
        "/article",
        Some(json!({"title": "Two", "slug": "same"})),
    )
    .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        response.body["errors"]["slug"],
        json!(["article with this slug already exists."])
    );
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let app = build_article_app().await;
    let request = Request::builder()
        .method("POST")
        .uri("/article")
        .header("content-type", "application/json")
        .body(Body::from("{\"title\": "))
        .unwrap();
    let response = send_request(&app, request).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        response.body,
        json!({"message": "Malformed JSON", "errors": null})
    );
}

#[tokio::test]
async fn test_urlencoded_post() {
    let app = build_article_app().await;
    let request = Request::builder()
        .method("POST")
        .uri("/article")
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from("title=Form+post&slug=form-post&published=on"))
        .unwrap();
    let response = send_request(&app, request).await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["title"], json!("Form post"));
    assert_eq!(response.body["published"], json!(true));
}
