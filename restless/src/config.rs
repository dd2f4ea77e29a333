//! Configuration management via environment variables
//!
//! Helper functions for reading environment variables with fallback
//! to an older variable name, plus the effective `ServiceConfig` for `serve`.

use restless_common::config::ServiceConfig;
use restless_common::error::CommonError;
use std::path::Path;

/// Get an environment variable with fallback to another name
///
/// If `new_name` is set, returns its value. If only `old_name` is set,
/// returns that value and logs a deprecation warning.
///
/// # Example
/// ```
/// use restless::config::get_env_with_fallback;
///
/// let level = get_env_with_fallback("RESTLESS_LOG_LEVEL", "RUST_LOG");
/// ```
pub fn get_env_with_fallback(new_name: &str, old_name: &str) -> Option<String> {
    if let Ok(val) = std::env::var(new_name) {
        return Some(val);
    }
    if let Ok(val) = std::env::var(old_name) {
        tracing::warn!(
            "Environment variable '{}' is deprecated, use '{}' instead",
            old_name,
            new_name
        );
        return Some(val);
    }
    None
}

/// Get an environment variable with fallback and default value
pub fn get_env_with_fallback_or(new_name: &str, old_name: &str, default: &str) -> String {
    get_env_with_fallback(new_name, old_name).unwrap_or_else(|| default.to_string())
}

/// CLI引数による上書き
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    /// バインドアドレス
    pub host: Option<String>,
    /// ポート番号
    pub port: Option<u16>,
    /// データベースURL
    pub database_url: Option<String>,
}

/// 設定ファイル・環境変数・CLI引数の順に重ねて設定を確定し、検証する
///
/// `DATABASE_URL`は`RESTLESS_DATABASE_URL`の旧名として受け付ける。
pub fn load_service_config(
    path: Option<&Path>,
    overrides: Overrides,
) -> Result<ServiceConfig, CommonError> {
    let mut config = ServiceConfig::load(path)?;
    if std::env::var("RESTLESS_DATABASE_URL").is_err() {
        if let Ok(url) = std::env::var("DATABASE_URL") {
            tracing::warn!(
                "Environment variable 'DATABASE_URL' is deprecated, use 'RESTLESS_DATABASE_URL' instead"
            );
            config.database_url = url;
        }
    }
    if let Some(host) = overrides.host {
        config.host = host;
    }
    if let Some(port) = overrides.port {
        config.port = port;
    }
    if let Some(url) = overrides.database_url {
        config.database_url = url;
    }
    config.validate()?;
    Ok(config)
}
