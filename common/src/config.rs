//! 設定管理
//!
//! ServiceConfig, ResourceConfig等の設定構造体と、
//! 設定ファイル＋環境変数（`RESTLESS_*`）からの読み込み

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::error::CommonError;
use crate::types::{BatchMode, BatchResponse, ModelSchema, PatchMode};

/// サービス設定
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// ホストアドレス (デフォルト: "0.0.0.0")
    #[serde(default = "default_host")]
    pub host: String,

    /// ポート番号 (デフォルト: 8000)
    #[serde(default = "default_port")]
    pub port: u16,

    /// データベースURL (デフォルト: "sqlite://restless.db")
    #[serde(default = "default_database_url")]
    pub database_url: String,

    /// 公開するリソース一覧
    #[serde(default)]
    pub resources: Vec<ResourceConfig>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_database_url() -> String {
    "sqlite://restless.db".to_string()
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            database_url: default_database_url(),
            resources: Vec::new(),
        }
    }
}

/// リソース（コレクション＋アイテム）設定
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceConfig {
    /// マウントパス（省略時は `/{model.name}`）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// 公開するモデル
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<ModelSchema>,

    /// フォームに含めるフィールド（省略時は編集可能な全フィールド）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form_fields: Option<Vec<String>>,

    /// フォームから除外するフィールド
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub form_exclude: Vec<String>,

    /// コレクションで許可するHTTPメソッド（省略時は GET, POST）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection_methods: Option<Vec<String>>,

    /// アイテムで許可するHTTPメソッド（省略時は GET, PUT, PATCH, DELETE）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_methods: Option<Vec<String>>,

    /// アイテム検索に使うパスパラメータ名 (デフォルト: "pk")
    #[serde(default = "default_lookup_field")]
    pub lookup_field: String,

    /// 一括作成モード
    #[serde(default)]
    pub batch_mode: BatchMode,

    /// 一括作成成功時のレスポンス
    #[serde(default)]
    pub batch_response: BatchResponse,

    /// PATCH の検証モード
    #[serde(default)]
    pub patch_mode: PatchMode,
}

fn default_lookup_field() -> String {
    "pk".to_string()
}

impl ResourceConfig {
    /// モデルからリソース設定を作成
    pub fn for_model(model: ModelSchema) -> Self {
        Self {
            path: None,
            model: Some(model),
            form_fields: None,
            form_exclude: Vec::new(),
            collection_methods: None,
            item_methods: None,
            lookup_field: default_lookup_field(),
            batch_mode: BatchMode::default(),
            batch_response: BatchResponse::default(),
            patch_mode: PatchMode::default(),
        }
    }

    /// マウントパス
    ///
    /// 先頭の`/`を補い、末尾の`/`を取り除いた形で返す。
    pub fn mount_path(&self) -> Option<String> {
        let raw = match (&self.path, &self.model) {
            (Some(path), _) => path.clone(),
            (None, Some(model)) => model.name.clone(),
            (None, None) => return None,
        };
        let trimmed = raw.trim_matches('/');
        Some(format!("/{}", trimmed))
    }
}

impl ServiceConfig {
    /// 設定を読み込む
    ///
    /// `path`が指定された場合はその設定ファイル（拡張子で形式を判別）を読み、
    /// その後`RESTLESS_`プレフィックスの環境変数で上書きする
    /// （例: `RESTLESS_PORT=9000`）。
    pub fn load(path: Option<&Path>) -> Result<Self, CommonError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }
        builder = builder.add_source(
            config::Environment::with_prefix("RESTLESS")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?.try_deserialize::<ServiceConfig>()?;
        Ok(config)
    }

    /// バインドアドレス
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// 構造的な検証
    ///
    /// モデル未指定、スキーマ不正、マウントパスの重複を起動前に検出する。
    pub fn validate(&self) -> Result<(), CommonError> {
        let mut paths = HashSet::new();
        for (index, resource) in self.resources.iter().enumerate() {
            let Some(model) = &resource.model else {
                return Err(CommonError::Config(format!(
                    "resource #{}: neither model nor form is configured",
                    index
                )));
            };
            model.validate()?;

            if let Some(path) = resource.mount_path() {
                if path == "/" {
                    return Err(CommonError::Config(format!(
                        "resource '{}': mount path must not be '/'",
                        model.name
                    )));
                }
                if !paths.insert(path.clone()) {
                    return Err(CommonError::Config(format!(
                        "resource '{}': duplicate mount path '{}'",
                        model.name, path
                    )));
                }
            }
        }
        Ok(())
    }
}
