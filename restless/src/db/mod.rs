//! データベースアクセス層
//!
//! SQLiteデータベースへの接続と、`ModelStore`の実装

pub mod sqlite;
pub mod traits;

pub use sqlite::SqliteStore;
pub use traits::{ModelStore, StoreError};

use restless_common::error::RestError;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

/// データベース接続プールを作成
///
/// ファイルが存在しない場合は作成する。インメモリDBは接続ごとに別DBになるため
/// 接続数を1に固定し、アイドル切断もしない。
pub async fn create_pool(database_url: &str) -> Result<SqlitePool, RestError> {
    let options = SqliteConnectOptions::from_str(database_url)
        .map_err(|e| RestError::config(format!("Invalid database URL '{}': {}", database_url, e)))?
        .create_if_missing(true)
        .foreign_keys(true);

    let in_memory = database_url.contains(":memory:") || database_url.contains("mode=memory");
    let pool_options = if in_memory {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(5)
    };

    let pool = pool_options
        .connect_with(options)
        .await
        .map_err(|e| RestError::Database(format!("Failed to connect to database: {}", e)))?;

    tracing::info!(database_url, in_memory, "Database connected");
    Ok(pool)
}
