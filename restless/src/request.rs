//! リクエストペイロード
//!
//! HTTPメソッド、パスパラメータ、本体（JSON / multipart / urlencoded）、
//! アップロードファイルをまとめた`ResourceRequest`とそのaxumエクストラクタ。

use axum::async_trait;
use axum::body::Bytes;
use axum::extract::{FromRequest, FromRequestParts, Multipart, Path, Request};
use axum::http::{header, Method};
use axum::Form;
use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::form::{Files, UploadedFile};
use crate::http::HttpError;

/// 1リクエスト分の入力
#[derive(Debug, Clone)]
pub struct ResourceRequest {
    /// HTTPメソッド
    pub method: Method,
    /// パスパラメータ
    pub path_params: HashMap<String, String>,
    /// 本体（空の場合は`Null`）
    pub data: Value,
    /// アップロードファイル
    pub files: Files,
}

impl ResourceRequest {
    /// 本体なしのリクエスト
    pub fn new(method: Method) -> Self {
        Self {
            method,
            path_params: HashMap::new(),
            data: Value::Null,
            files: Files::new(),
        }
    }

    /// パスパラメータを追加
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.path_params.insert(name.into(), value.into());
        self
    }

    /// 本体を設定
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = data;
        self
    }

    /// ファイルを追加
    pub fn with_file(mut self, field: impl Into<String>, file: UploadedFile) -> Self {
        self.files.insert(field.into(), file);
        self
    }

    /// パスパラメータを取得
    pub fn param(&self, name: &str) -> Option<&str> {
        self.path_params.get(name).map(String::as_str)
    }
}

#[async_trait]
impl<S> FromRequest<S> for ResourceRequest
where
    S: Send + Sync,
{
    type Rejection = HttpError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let (mut parts, body) = req.into_parts();
        // コレクション側のルートにはパスパラメータが無い
        let path_params =
            match Path::<HashMap<String, String>>::from_request_parts(&mut parts, state).await {
                Ok(Path(params)) => params,
                Err(_) => HashMap::new(),
            };
        let method = parts.method.clone();
        let content_type = parts
            .headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let req = Request::from_parts(parts, body);

        let mut request = ResourceRequest {
            method,
            path_params,
            data: Value::Null,
            files: Files::new(),
        };

        if content_type.starts_with("multipart/form-data") {
            let multipart = Multipart::from_request(req, state).await.map_err(|e| {
                tracing::debug!(error = %e, "Rejected multipart body");
                HttpError::malformed()
            })?;
            let (data, files) = read_multipart(multipart).await?;
            request.data = data;
            request.files = files;
        } else if content_type.starts_with("application/x-www-form-urlencoded") {
            let Form(pairs) = Form::<Vec<(String, String)>>::from_request(req, state)
                .await
                .map_err(|e| {
                    tracing::debug!(error = %e, "Rejected form body");
                    HttpError::malformed()
                })?;
            let map: Map<String, Value> = pairs
                .into_iter()
                .map(|(k, v)| (k, Value::String(v)))
                .collect();
            request.data = Value::Object(map);
        } else {
            let bytes = Bytes::from_request(req, state)
                .await
                .map_err(|_| HttpError::malformed())?;
            request.data = parse_json_body(&bytes)?;
        }
        Ok(request)
    }
}

/// JSON本体を解析する（空本体は`Null`）
pub fn parse_json_body(bytes: &[u8]) -> Result<Value, HttpError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(bytes).map_err(|e| {
        tracing::debug!(error = %e, "Malformed JSON body");
        HttpError::malformed()
    })
}

/// multipartを本体とファイルに分ける
///
/// ファイル名付きのパートはファイル、それ以外は文字列値として扱う。
async fn read_multipart(mut multipart: Multipart) -> Result<(Value, Files), HttpError> {
    let mut data = Map::new();
    let mut files = Files::new();
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                tracing::debug!(error = %e, "Broken multipart stream");
                return Err(HttpError::malformed());
            }
        };
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.map_err(|e| {
            tracing::debug!(error = %e, field = %name, "Failed to read multipart field");
            HttpError::malformed()
        })?;
        match file_name {
            Some(file_name) => {
                files.insert(
                    name,
                    UploadedFile {
                        name: file_name,
                        content_type,
                        data: bytes.to_vec(),
                    },
                );
            }
            None => {
                data.insert(
                    name,
                    Value::String(String::from_utf8_lossy(&bytes).into_owned()),
                );
            }
        }
    }
    Ok((Value::Object(data), files))
}
