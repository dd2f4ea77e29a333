//! serve サブコマンド
//!
//! 設定を読み込み、リソースをマウントしてHTTPサーバーを起動します。

use clap::Args;
use restless_common::error::RestError;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::{load_service_config, Overrides};
use crate::db::{self, ModelStore, SqliteStore};
use crate::api;

/// serve サブコマンドの引数
///
/// 省略した値は設定ファイルと`RESTLESS_*`環境変数から取る。
#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// Configuration file (TOML, JSON or YAML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Listen port
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Bind address
    #[arg(short = 'H', long)]
    pub host: Option<String>,

    /// Database URL
    #[arg(long)]
    pub database_url: Option<String>,
}

/// サーバーを起動する
///
/// 設定やスキーマに問題があれば待ち受けを始める前にエラーを返す。
pub async fn execute(args: ServeArgs) -> Result<(), RestError> {
    let config = load_service_config(
        args.config.as_deref(),
        Overrides {
            host: args.host,
            port: args.port,
            database_url: args.database_url,
        },
    )?;

    let pool = db::create_pool(&config.database_url).await?;
    let store: Arc<dyn ModelStore> = Arc::new(SqliteStore::new(pool));
    let router = api::build_resources(store, &config).await?;
    let app = api::create_app(router);

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| RestError::Internal(format!("Failed to bind to {}: {}", bind_addr, e)))?;

    tracing::info!(
        bind_addr = %bind_addr,
        resources = config.resources.len(),
        "restless server listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| RestError::Internal(format!("Server error: {}", e)))?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
