//! テスト共通ユーティリティ

pub mod http;

use axum::{
    body::{to_bytes, Body},
    http::{HeaderMap, Request, StatusCode},
    Router,
};
use restless::api;
use restless::db::{create_pool, ModelStore, SqliteStore};
use restless_common::config::{ResourceConfig, ServiceConfig};
use restless_common::types::{Field, ModelSchema};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

/// テスト用の記事モデル
#[allow(dead_code)]
pub fn article_schema() -> ModelSchema {
    ModelSchema::new("article")
        .field(Field::text("title").max_length(50))
        .field(Field::text("slug").unique())
        .field(Field::text("body").blank())
        .field(Field::integer("views").default_value(0))
        .field(Field::boolean("published"))
        .field(Field::text("note").nullable().read_only())
        .field(Field::file("attachment").nullable())
}

/// 記事リソースの設定
#[allow(dead_code)]
pub fn article_resource() -> ResourceConfig {
    ResourceConfig::for_model(article_schema())
}

/// インメモリSQLiteに対してアプリを組み立てる（.oneshot()スタイルのテスト用）
#[allow(dead_code)]
pub async fn build_app(resources: Vec<ResourceConfig>) -> Router {
    let pool = create_pool("sqlite::memory:")
        .await
        .expect("Failed to create test database");
    let store: Arc<dyn ModelStore> = Arc::new(SqliteStore::new(pool));
    let config = ServiceConfig {
        resources,
        ..ServiceConfig::default()
    };
    let router = api::build_resources(store, &config)
        .await
        .expect("Failed to build resources");
    api::create_app(router)
}

/// 記事リソースのみのアプリ
#[allow(dead_code)]
pub async fn build_article_app() -> Router {
    build_app(vec![article_resource()]).await
}

/// レスポンス
#[allow(dead_code)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

/// 任意のリクエストを送る
#[allow(dead_code)]
pub async fn send_request(app: &Router, request: Request<Body>) -> TestResponse {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    TestResponse {
        status,
        headers,
        body,
    }
}

/// JSON本体付き（または本体なし）のリクエストを送る
#[allow(dead_code)]
pub async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> TestResponse {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    send_request(app, request).await
}

/// 記事を1件作成してそのJSONを返す
#[allow(dead_code)]
pub async fn create_article(app: &Router, title: &str, slug: &str) -> Value {
    let response = send(
        app,
        "POST",
        "/article",
        Some(serde_json::json!({"title": title, "slug": slug})),
    )
    .await;
    assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
    response.body
}
