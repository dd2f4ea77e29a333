//! Contract Test: multipart/form-data によるファイルアップロード

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::json;

use crate::support::{build_article_app, send, send_request};

const BOUNDARY: &str = "restless-test-boundary";

fn multipart_body(parts: &[(&str, Option<&str>, &str)]) -> String {
    let mut body = String::new();
    for (name, filename, content) in parts {
        body.push_str(&format!("--{}\r\n", BOUNDARY));
        match filename {
            Some(filename) => body.push_str(&format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                 Content-Type: text/plain\r\n\r\n",
                name, filename
            )),
            None => body.push_str(&format!(
                "Content-Disposition: form-data; name=\"{}\"\r\n\r\n",
                name
            )),
        }
        body.push_str(content);
        body.push_str("\r\n");
    }
    body.push_str(&format!("--{}--\r\n", BOUNDARY));
    body
}

fn multipart_request(method: &str, uri: &str, body: String) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn test_multipart_create_with_file() {
    let app = build_article_app().await;
    let body = multipart_body(&[
        ("title", None, "With file"),
        ("slug", None, "with-file"),
        ("attachment", Some("notes.txt"), "hello"),
    ]);
    let response = send_request(&app, multipart_request("POST", "/article", body)).await;

    assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
    assert_eq!(response.body["title"], json!("With file"));
    assert_eq!(
        response.body["attachment"],
        json!({
            "name": "notes.txt",
            "content_type": "text/plain",
            "size": 5,
            "data": "aGVsbG8="
        })
    );
}

#[tokio::test]
async fn test_put_without_file_keeps_existing_attachment() {
    let app = build_article_app().await;
    let body = multipart_body(&[
        ("title", None, "With file"),
        ("slug", None, "with-file"),
        ("attachment", Some("notes.txt"), "hello"),
    ]);
    let created = send_request(&app, multipart_request("POST", "/article", body)).await;
    assert_eq!(created.status, StatusCode::CREATED);

    let response = send(
        &app,
        "PUT",
        "/article/1",
        Some(json!({"title": "Renamed", "slug": "with-file"})),
    )
    .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["attachment"]["name"], json!("notes.txt"));

    let body = multipart_body(&[
        ("title", None, "Renamed"),
        ("slug", None, "with-file"),
        ("attachment", Some("other.txt"), "bye"),
    ]);
    let response = send_request(&app, multipart_request("PUT", "/article/1", body)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["attachment"]["name"], json!("other.txt"));
    assert_eq!(response.body["attachment"]["size"], json!(3));
}
