//! エラー型定義
//!
//! 統一エラー型（thiserror使用）
//!
//! 起動・設定・ストア初期化の失敗は`RestError`で表す。
//! リクエスト処理中のエラーはHTTPレイヤーの`HttpError`が担当する。

use thiserror::Error;

/// Common layer error type
#[derive(Debug, Error)]
pub enum CommonError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<config::ConfigError> for CommonError {
    fn from(err: config::ConfigError) -> Self {
        CommonError::Config(err.to_string())
    }
}

/// restless error type
#[derive(Debug, Error)]
pub enum RestError {
    /// Common layer error
    #[error(transparent)]
    Common(#[from] CommonError),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl RestError {
    /// Shorthand for a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        RestError::Common(CommonError::Config(message.into()))
    }
}
