//! Repository traitパターン定義
//!
//! モデルの永続化操作を抽象化する。エンドポイントはこのtraitだけに依存し、
//! 実装（SQLite等）を差し替えられる。

use async_trait::async_trait;
use restless_common::error::RestError;
use thiserror::Error;

use crate::model::{Lookup, Model, Record, Values};

/// ストア操作のエラー
#[derive(Debug, Error)]
pub enum StoreError {
    /// 一意制約違反
    #[error("{model} with this {field} already exists.")]
    UniqueViolation {
        /// モデル名
        model: String,
        /// 制約に違反したフィールド
        field: String,
    },

    /// 単一行検索で複数行が一致した
    #[error("get() returned more than one {0}")]
    MultipleObjectsReturned(String),

    /// 更新対象の行が存在しない
    #[error("{model} with pk {pk} does not exist")]
    DoesNotExist {
        /// モデル名
        model: String,
        /// 主キー
        pk: i64,
    },

    /// その他のデータベースエラー
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<StoreError> for RestError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DoesNotExist { .. } => RestError::NotFound(err.to_string()),
            StoreError::UniqueViolation { .. } => RestError::Database(err.to_string()),
            StoreError::MultipleObjectsReturned(_) => RestError::Internal(err.to_string()),
            StoreError::Database(e) => RestError::Database(e.to_string()),
        }
    }
}

/// モデルCRUD操作のRepository trait
#[async_trait]
pub trait ModelStore: Send + Sync {
    /// モデルのテーブルが無ければ作成
    async fn ensure_table(&self, model: &Model) -> Result<(), StoreError>;
    /// 全行を主キー順に取得
    async fn all(&self, model: &Model) -> Result<Vec<Record>, StoreError>;
    /// 条件に一致する1行を取得（複数一致はエラー）
    async fn get(&self, model: &Model, lookup: &Lookup) -> Result<Option<Record>, StoreError>;
    /// 1行を作成
    async fn insert(&self, model: &Model, values: &Values) -> Result<Record, StoreError>;
    /// 複数行を単一トランザクションで作成（1件でも失敗したら全件ロールバック）
    async fn insert_many(&self, model: &Model, rows: &[Values]) -> Result<Vec<Record>, StoreError>;
    /// 指定カラムのみ更新
    async fn update(&self, model: &Model, pk: i64, values: &Values) -> Result<Record, StoreError>;
    /// 行を削除（削除した場合 true）
    async fn delete(&self, model: &Model, pk: i64) -> Result<bool, StoreError>;
}
