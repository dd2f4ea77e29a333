//! restless
//!
//! モデルストア上に汎用のJSON CRUDエンドポイント（コレクション＋アイテム）を公開するサーバー

#![warn(missing_docs)]

/// Resource Model（スキーマ・検索キー・行）
pub mod model;

/// データベースアクセス（ModelStore trait と SQLite実装）
pub mod db;

/// フォーム検証
pub mod form;

/// レコードのシリアライズ
pub mod serialize;

/// レスポンスエンベロープ
pub mod http;

/// リクエストペイロードとエクストラクタ
pub mod request;

/// コレクション・アイテムエンドポイント
pub mod endpoint;

/// HTTPルーター
pub mod api;

/// 設定管理（環境変数ヘルパー）
pub mod config;

/// ロギング初期化ユーティリティ
pub mod logging;

/// CLIインターフェース
pub mod cli;
