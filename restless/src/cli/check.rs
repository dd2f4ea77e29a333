//! check サブコマンド
//!
//! 設定ファイルを読み込み、リソース定義を検証して終了します。

use clap::Args;
use restless_common::error::RestError;
use std::path::PathBuf;
use std::sync::Arc;

use crate::api;
use crate::config::{load_service_config, Overrides};
use crate::db::{self, ModelStore, SqliteStore};

/// check サブコマンドの引数
#[derive(Args, Debug, Clone)]
pub struct CheckArgs {
    /// Configuration file to validate
    #[arg(short, long)]
    pub config: PathBuf,
}

/// 設定を検証する
///
/// インメモリDBに対してエンドポイントの解決まで行うため、
/// フォームのフィールド指定や検索フィールドの誤りも検出できる。
/// 成功時はマウントされるリソース数を返す。
pub async fn execute(args: &CheckArgs) -> Result<usize, RestError> {
    let config = load_service_config(
        Some(args.config.as_path()),
        Overrides {
            database_url: Some("sqlite::memory:".to_string()),
            ..Overrides::default()
        },
    )?;
    let pool = db::create_pool(&config.database_url).await?;
    let store: Arc<dyn ModelStore> = Arc::new(SqliteStore::new(pool));
    let _router = api::build_resources(store, &config).await?;
    Ok(config.resources.len())
}
