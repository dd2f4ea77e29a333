//! レスポンスエンベロープ
//!
//! 成功レスポンス（`Reply`）とエラーレスポンス（`HttpError`）。
//! どちらもaxumの`IntoResponse`を実装する。

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use restless_common::protocol::{push_error, ErrorBody, FieldErrors};
use serde_json::{json, Value};

use crate::db::StoreError;
use crate::form::FormError;

/// 作成時の検証エラーメッセージ
pub const INVALID_CREATE: &str = "Invalid Data";
/// 更新時の検証エラーメッセージ
pub const INVALID_UPDATE: &str = "Invalid data";

/// 成功レスポンス
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// 200 OK
    Ok(Value),
    /// 201 Created
    Created(Value),
    /// 本体なしの成功（200 `{}`）
    Empty,
}

impl Reply {
    /// ステータスコード
    pub fn status(&self) -> StatusCode {
        match self {
            Reply::Ok(_) | Reply::Empty => StatusCode::OK,
            Reply::Created(_) => StatusCode::CREATED,
        }
    }
}

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            Reply::Ok(value) | Reply::Created(value) => value,
            Reply::Empty => json!({}),
        };
        (status, Json(body)).into_response()
    }
}

/// エラーレスポンス
#[derive(Debug, Clone, PartialEq)]
pub struct HttpError {
    status: StatusCode,
    body: ErrorBody,
    allow: Option<String>,
}

impl HttpError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorBody::new(message),
            allow: None,
        }
    }

    /// 404 Resource Not Found
    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, "Resource Not Found")
    }

    /// 405 Method Not Allowed（`Allow`ヘッダー付き）
    pub fn method_not_allowed(allow: impl Into<String>) -> Self {
        Self {
            allow: Some(allow.into()),
            ..Self::new(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed")
        }
    }

    /// 400 検証エラー
    pub fn invalid(message: impl Into<String>, errors: FieldErrors) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            body: ErrorBody::with_errors(message, errors),
            allow: None,
        }
    }

    /// 400 Malformed JSON
    pub fn malformed() -> Self {
        Self::new(StatusCode::BAD_REQUEST, "Malformed JSON")
    }

    /// 500 Internal Server Error
    pub fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
    }

    /// ステータスコード
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// レスポンス本体
    pub fn body(&self) -> &ErrorBody {
        &self.body
    }

    /// ストアエラーを変換する
    ///
    /// 一意制約違反は`invalid_message`付きの400フィールドエラーになる。
    /// それ以外は内部詳細をログにのみ残し、500を返す。
    pub fn from_store(err: StoreError, invalid_message: &str) -> Self {
        match err {
            StoreError::UniqueViolation { ref field, .. } => {
                let mut errors = FieldErrors::new();
                push_error(&mut errors, field, err.to_string());
                Self::invalid(invalid_message, errors)
            }
            StoreError::DoesNotExist { .. } => Self::not_found(),
            other => {
                tracing::error!(error = %other, "Store operation failed");
                Self::internal()
            }
        }
    }

    /// フォーム保存エラーを変換する
    pub fn from_form(err: FormError, invalid_message: &str) -> Self {
        match err {
            FormError::Invalid(errors) => Self::invalid(invalid_message, errors),
            FormError::Store(err) => Self::from_store(err, invalid_message),
        }
    }
}

impl From<StoreError> for HttpError {
    fn from(err: StoreError) -> Self {
        Self::from_store(err, INVALID_CREATE)
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let mut response = (self.status, Json(self.body)).into_response();
        if let Some(allow) = self.allow {
            if let Ok(value) = HeaderValue::from_str(&allow) {
                response.headers_mut().insert(header::ALLOW, value);
            }
        }
        response
    }
}
