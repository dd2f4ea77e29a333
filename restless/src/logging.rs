//! ログ初期化
//!
//! `RESTLESS_LOG_LEVEL`（旧: `RUST_LOG`）からフィルタを読み、
//! fmtサブスクライバーをグローバルに登録する。

use tracing_subscriber::EnvFilter;

use crate::config::get_env_with_fallback_or;

/// デフォルトのログレベル
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// フィルタ文字列からEnvFilterを作成（不正な場合はデフォルト）
pub fn build_filter(directives: &str) -> EnvFilter {
    EnvFilter::try_new(directives).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL))
}

/// ロギングを初期化
///
/// 二重登録はエラーになる。
pub fn init() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let directives = get_env_with_fallback_or("RESTLESS_LOG_LEVEL", "RUST_LOG", DEFAULT_LOG_LEVEL);
    tracing_subscriber::fmt()
        .with_env_filter(build_filter(&directives))
        .with_target(true)
        .try_init()
}
