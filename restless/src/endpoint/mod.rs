//! エンドポイント基盤
//!
//! HTTPメソッドの許可リスト（`MethodSet`）とゲート関数、
//! エンドポイント設定ビルダー（`EndpointConfig`）。
//! 設定は起動時に一度だけ検証・解決され、以後は不変の`EndpointOptions`として共有される。

pub mod collection;
pub mod item;

pub use collection::{CollectionEndpoint, ModelCollection};
pub use item::{ItemEndpoint, ModelItem};

use axum::http::Method;
use restless_common::error::{CommonError, RestError};
use restless_common::types::{BatchMode, BatchResponse, PatchMode};
use std::collections::BTreeSet;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use crate::form::{Form, ModelForm};
use crate::http::{HttpError, Reply};
use crate::model::{Model, PK_ALIAS};
use crate::serialize::Serializer;

/// 対応するHTTPメソッド
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Verb {
    /// GET
    Get,
    /// POST
    Post,
    /// PUT
    Put,
    /// PATCH
    Patch,
    /// DELETE
    Delete,
}

impl Verb {
    /// 大文字の名前
    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Get => "GET",
            Verb::Post => "POST",
            Verb::Put => "PUT",
            Verb::Patch => "PATCH",
            Verb::Delete => "DELETE",
        }
    }

    /// 名前を解析（大文字小文字は区別しない）
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_uppercase().as_str() {
            "GET" => Some(Verb::Get),
            "POST" => Some(Verb::Post),
            "PUT" => Some(Verb::Put),
            "PATCH" => Some(Verb::Patch),
            "DELETE" => Some(Verb::Delete),
            _ => None,
        }
    }

    /// `Method`から変換
    pub fn from_method(method: &Method) -> Option<Self> {
        match *method {
            Method::GET => Some(Verb::Get),
            Method::POST => Some(Verb::Post),
            Method::PUT => Some(Verb::Put),
            Method::PATCH => Some(Verb::Patch),
            Method::DELETE => Some(Verb::Delete),
            _ => None,
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// HTTPメソッドの許可リスト
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSet {
    verbs: BTreeSet<Verb>,
}

impl MethodSet {
    /// メソッド名の一覧から作成
    ///
    /// 空のリストや未知のメソッド名は設定エラー。
    pub fn parse<S: AsRef<str>>(names: &[S]) -> Result<Self, CommonError> {
        if names.is_empty() {
            return Err(CommonError::Config(
                "methods must not be empty".to_string(),
            ));
        }
        let mut verbs = BTreeSet::new();
        for name in names {
            let name = name.as_ref();
            let verb = Verb::parse(name).ok_or_else(|| {
                CommonError::Config(format!("unsupported HTTP method '{}'", name))
            })?;
            verbs.insert(verb);
        }
        Ok(Self { verbs })
    }

    /// 指定したメソッドのみ
    pub fn of(verbs: impl IntoIterator<Item = Verb>) -> Self {
        Self {
            verbs: verbs.into_iter().collect(),
        }
    }

    /// コレクションのデフォルト（GET, POST）
    pub fn collection_default() -> Self {
        Self::of([Verb::Get, Verb::Post])
    }

    /// アイテムのデフォルト（GET, PUT, PATCH, DELETE）
    pub fn item_default() -> Self {
        Self::of([Verb::Get, Verb::Put, Verb::Patch, Verb::Delete])
    }

    /// 許可されているか
    pub fn contains(&self, method: &Method) -> bool {
        Verb::from_method(method).is_some_and(|verb| self.verbs.contains(&verb))
    }

    /// 許可されているメソッド
    pub fn verbs(&self) -> impl Iterator<Item = Verb> + '_ {
        self.verbs.iter().copied()
    }

    /// `Allow`ヘッダー値
    pub fn allow_header(&self) -> String {
        self.verbs
            .iter()
            .map(Verb::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// メソッドゲート
///
/// 許可リストに無いメソッドは405で打ち切り、許可されていればハンドラーの結果をそのまま返す。
pub async fn gate<F, Fut>(methods: &MethodSet, method: &Method, handler: F) -> Result<Reply, HttpError>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Reply, HttpError>>,
{
    if !methods.contains(method) {
        tracing::debug!(%method, allow = %methods.allow_header(), "Method not allowed");
        return Err(HttpError::method_not_allowed(methods.allow_header()));
    }
    handler().await
}

/// エンドポイント種別
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointKind {
    /// 一覧・作成
    Collection,
    /// 単一リソース
    Item,
}

impl EndpointKind {
    fn as_str(&self) -> &'static str {
        match self {
            EndpointKind::Collection => "collection",
            EndpointKind::Item => "item",
        }
    }
}

/// 解決済みのエンドポイント設定
#[derive(Debug, Clone)]
pub struct EndpointOptions {
    /// 公開するモデル（未設定の場合、検索は常に404）
    pub model: Option<Model>,
    /// 解決済みフォーム
    pub form: Arc<dyn Form>,
    /// 許可メソッド
    pub methods: MethodSet,
    /// 検索フィールド
    pub lookup_field: String,
    /// 一括作成モード
    pub batch_mode: BatchMode,
    /// 一括作成レスポンス
    pub batch_response: BatchResponse,
    /// PATCH 検証モード
    pub patch_mode: PatchMode,
    /// シリアライザ
    pub serializer: Serializer,
}

impl EndpointOptions {
    /// シリアライズに使うモデル
    ///
    /// モデル未設定の場合はフォームのモデルを使う。
    pub fn serialization_model(&self) -> &Model {
        self.model.as_ref().unwrap_or_else(|| self.form.model())
    }
}

/// エンドポイント設定ビルダー
#[derive(Debug, Clone, Default)]
pub struct EndpointConfig {
    model: Option<Model>,
    form: Option<Arc<dyn Form>>,
    methods: Option<Vec<String>>,
    lookup_field: Option<String>,
    batch_mode: BatchMode,
    batch_response: BatchResponse,
    patch_mode: PatchMode,
    serializer: Serializer,
}

impl EndpointConfig {
    /// 空の設定
    pub fn new() -> Self {
        Self::default()
    }

    /// モデルを設定
    pub fn model(mut self, model: Model) -> Self {
        self.model = Some(model);
        self
    }

    /// フォームを設定（省略時はモデルから導出）
    pub fn form(mut self, form: Arc<dyn Form>) -> Self {
        self.form = Some(form);
        self
    }

    /// 許可メソッドを設定
    pub fn methods<S: AsRef<str>>(mut self, methods: &[S]) -> Self {
        self.methods = Some(methods.iter().map(|m| m.as_ref().to_string()).collect());
        self
    }

    /// 検索フィールドを設定
    pub fn lookup_field(mut self, field: impl Into<String>) -> Self {
        self.lookup_field = Some(field.into());
        self
    }

    /// 一括作成モードを設定
    pub fn batch_mode(mut self, mode: BatchMode) -> Self {
        self.batch_mode = mode;
        self
    }

    /// 一括作成レスポンスを設定
    pub fn batch_response(mut self, response: BatchResponse) -> Self {
        self.batch_response = response;
        self
    }

    /// PATCH 検証モードを設定
    pub fn patch_mode(mut self, mode: PatchMode) -> Self {
        self.patch_mode = mode;
        self
    }

    /// シリアライザを設定
    pub fn serializer(mut self, serializer: Serializer) -> Self {
        self.serializer = serializer;
        self
    }

    /// コレクション用に検証・解決
    pub fn build_collection(self) -> Result<EndpointOptions, RestError> {
        self.build(EndpointKind::Collection)
    }

    /// アイテム用に検証・解決
    pub fn build_item(self) -> Result<EndpointOptions, RestError> {
        self.build(EndpointKind::Item)
    }

    fn build(self, kind: EndpointKind) -> Result<EndpointOptions, RestError> {
        let form: Arc<dyn Form> = match (&self.model, self.form) {
            (None, None) => {
                return Err(RestError::config("neither model nor form is configured"));
            }
            (Some(model), None) => Arc::new(ModelForm::derive(model)),
            (Some(model), Some(form)) => {
                if form.model() != model {
                    return Err(RestError::config(format!(
                        "form is bound to model '{}' but the endpoint exposes '{}'",
                        form.model().name(),
                        model.name()
                    )));
                }
                form
            }
            (None, Some(form)) => form,
        };

        let handled = match kind {
            EndpointKind::Collection => MethodSet::collection_default(),
            EndpointKind::Item => MethodSet::item_default(),
        };
        let methods = match &self.methods {
            Some(names) => {
                let methods = MethodSet::parse(names)?;
                if let Some(verb) = methods.verbs().find(|v| !handled.verbs.contains(v)) {
                    return Err(RestError::config(format!(
                        "{} endpoint has no handler for {} (supported: {})",
                        kind.as_str(),
                        verb,
                        handled.allow_header()
                    )));
                }
                methods
            }
            None => handled,
        };

        let lookup_field = self.lookup_field.unwrap_or_else(|| PK_ALIAS.to_string());
        if kind == EndpointKind::Item {
            if let Some(model) = &self.model {
                if model.lookup_column(&lookup_field).is_none() {
                    return Err(RestError::config(format!(
                        "lookup field '{}' is not a searchable field of '{}'",
                        lookup_field,
                        model.name()
                    )));
                }
            }
        }

        Ok(EndpointOptions {
            model: self.model,
            form,
            methods,
            lookup_field,
            batch_mode: self.batch_mode,
            batch_response: self.batch_response,
            patch_mode: self.patch_mode,
            serializer: self.serializer,
        })
    }
}
