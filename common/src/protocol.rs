//! ワイヤ型定義
//!
//! クライアントへ返すエラーペイロード

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// フィールド名 → エラーメッセージ一覧
///
/// フィールドに紐付かないエラーは`NON_FIELD_ERRORS`キーに入る。
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// フィールドに紐付かないエラーのキー
pub const NON_FIELD_ERRORS: &str = "__all__";

/// エラーレスポンス本体
///
/// # Example
///
/// ```json
/// {
///   "message": "Invalid Data",
///   "errors": { "title": ["This field is required."] }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Human-readable error message
    pub message: String,
    /// Per-field errors (validation failures only)
    pub errors: Option<FieldErrors>,
}

impl ErrorBody {
    /// メッセージのみのエラー本体を作成
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            errors: None,
        }
    }

    /// フィールドエラー付きのエラー本体を作成
    pub fn with_errors(message: impl Into<String>, errors: FieldErrors) -> Self {
        Self {
            message: message.into(),
            errors: Some(errors),
        }
    }
}

/// フィールドエラーを追加するヘルパー
pub fn push_error(errors: &mut FieldErrors, field: &str, message: impl Into<String>) {
    errors
        .entry(field.to_string())
        .or_default()
        .push(message.into());
}
