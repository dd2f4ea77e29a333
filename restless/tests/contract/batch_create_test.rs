//! Contract Test: POST /{resource}（配列による一括作成）

use axum::http::StatusCode;
use restless_common::types::{BatchMode, BatchResponse};
use serde_json::json;

use crate::support::{article_resource, build_app, build_article_app, send};

#[tokio::test]
async fn test_batch_create_returns_empty_object_by_default() {
    let app = build_article_app().await;
    let response = send(
        &app,
        "POST",
        "/article",
        Some(json!([
            {"title": "A", "slug": "a"},
            {"title": "B", "slug": "b"}
        ])),
    )
    .await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body, json!({}));

    let list = send(&app, "GET", "/article", None).await;
    assert_eq!(list.body.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_atomic_batch_persists_nothing_when_an_element_is_invalid() {
    let app = build_article_app().await;
    let response = send(
        &app,
        "POST",
        "/article",
        Some(json!([
            {"title": "Valid", "slug": "valid"},
            {"title": "Missing slug"}
        ])),
    )
    .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["message"], json!("Invalid Data"));
    assert_eq!(
        response.body["errors"]["slug"],
        json!(["This field is required."])
    );

    let list = send(&app, "GET", "/article", None).await;
    assert_eq!(list.body, json!([]));
}

#[tokio::test]
async fn test_atomic_batch_rolls_back_on_store_failure() {
    let app = build_article_app().await;
    let response = send(
        &app,
        "POST",
        "/article",
        Some(json!([
            {"title": "One", "slug": "dup"},
            {"title": "Two", "slug": "dup"}
        ])),
    )
    .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        response.body["errors"]["slug"],
        json!(["article with this slug already exists."])
    );

    let list = send(&app, "GET", "/article", None).await;
    assert_eq!(list.body, json!([]));
}

#[tokio::test]
async fn test_sequential_batch_keeps_rows_before_the_failure() {
    let mut resource = article_resource();
    resource.batch_mode = BatchMode::Sequential;
    let app = build_app(vec![resource]).await;

    let response = send(
        &app,
        "POST",
        "/article",
        Some(json!([
            {"title": "Valid", "slug": "valid"},
            {"title": "Missing slug"},
            {"title": "Never reached", "slug": "never"}
        ])),
    )
    .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let list = send(&app, "GET", "/article", None).await;
    let rows = list.body.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["slug"], json!("valid"));
}

#[tokio::test]
async fn test_batch_can_return_created_resources() {
    let mut resource = article_resource();
    resource.batch_response = BatchResponse::Created;
    let app = build_app(vec![resource]).await;

    let response = send(
        &app,
        "POST",
        "/article",
        Some(json!([{"title": "A", "slug": "a"}, [{"title": "B", "slug": "b"}]])),
    )
    .await;
    assert_eq!(response.status, StatusCode::CREATED);
    let created = response.body.as_array().unwrap();
    assert_eq!(created.len(), 2);
    assert_eq!(created[0]["id"], json!(1));
    assert_eq!(created[1]["slug"], json!("b"));
}

#[tokio::test]
async fn test_batch_element_that_is_not_an_object() {
    let app = build_article_app().await;
    let response = send(&app, "POST", "/article", Some(json!(["nope"]))).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        response.body["errors"]["__all__"],
        json!(["Expected a JSON object."])
    );
}

#[tokio::test]
async fn test_empty_batch() {
    let app = build_article_app().await;
    let response = send(&app, "POST", "/article", Some(json!([]))).await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body, json!({}));
}
