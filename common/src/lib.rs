//! restless 共通ライブラリ
//!
//! エラー型・設定構造体・モデルスキーマ・ワイヤ型を提供する

#![warn(missing_docs)]

/// 設定管理
pub mod config;

/// エラー型定義
pub mod error;

/// ワイヤ型（エラーレスポンス等）
pub mod protocol;

/// モデルスキーマ型
pub mod types;
