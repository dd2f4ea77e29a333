//! アイテムエンドポイント
//!
//! 単一リソースの取得・更新・部分更新・削除。
//! 更新系はすべて、先にインスタンスを解決してから検証・変更する。

use async_trait::async_trait;
use axum::http::Method;
use restless_common::protocol::{push_error, FieldErrors, NON_FIELD_ERRORS};
use restless_common::types::{FieldKind, PatchMode};
use serde_json::Value;
use std::sync::Arc;

use super::{gate, EndpointOptions};
use crate::db::ModelStore;
use crate::form::BoundForm;
use crate::http::{HttpError, Reply, INVALID_UPDATE};
use crate::model::{Record, Values};
use crate::request::ResourceRequest;

/// 単一リソースエンドポイント
#[async_trait]
pub trait ItemEndpoint: Send + Sync {
    /// 解決済み設定
    fn options(&self) -> &EndpointOptions;

    /// ストア
    fn store(&self) -> &dyn ModelStore;

    /// パスパラメータから対象インスタンスを解決
    ///
    /// モデル未設定、パラメータ欠落、型変換失敗、該当なしはすべて404。
    async fn resolve_instance(&self, request: &ResourceRequest) -> Result<Record, HttpError> {
        let options = self.options();
        let Some(model) = &options.model else {
            return Err(HttpError::not_found());
        };
        let raw = request
            .param(&options.lookup_field)
            .ok_or_else(HttpError::not_found)?;
        let lookup = model
            .lookup(&options.lookup_field, raw)
            .ok_or_else(HttpError::not_found)?;
        self.store()
            .get(model, &lookup)
            .await?
            .ok_or_else(HttpError::not_found)
    }

    /// シリアライズ
    fn serialize(&self, record: &Record) -> Value {
        let options = self.options();
        options
            .serializer
            .record(options.serialization_model(), record)
    }

    /// GET
    async fn handle_get(&self, request: &ResourceRequest) -> Result<Reply, HttpError> {
        let instance = self.resolve_instance(request).await?;
        Ok(Reply::Ok(self.serialize(&instance)))
    }

    /// PUT
    ///
    /// フォームに含まれないフィールドは変更しない。
    async fn handle_put(&self, request: &ResourceRequest) -> Result<Reply, HttpError> {
        let instance = self.resolve_instance(request).await?;
        let form = self.options().form.as_ref();
        let record = BoundForm::new(form, &request.data, &request.files, Some(&instance))
            .save(self.store())
            .await
            .map_err(|e| HttpError::from_form(e, INVALID_UPDATE))?;
        Ok(Reply::Ok(self.serialize(&record)))
    }

    /// PATCH
    async fn handle_patch(&self, request: &ResourceRequest) -> Result<Reply, HttpError> {
        let instance = self.resolve_instance(request).await?;
        let record = match self.options().patch_mode {
            PatchMode::Unvalidated => self.assign_fields(&instance, request).await?,
            PatchMode::Partial => {
                let form = self.options().form.as_ref();
                BoundForm::partial(form, &request.data, &request.files, &instance)
                    .save(self.store())
                    .await
                    .map_err(|e| HttpError::from_form(e, INVALID_UPDATE))?
            }
        };
        Ok(Reply::Ok(self.serialize(&record)))
    }

    /// 検証なしでモデルフィールドへ直接代入する
    ///
    /// 主キーとモデルに無いキーは無視する。
    async fn assign_fields(&self, instance: &Record, request: &ResourceRequest) -> Result<Record, HttpError> {
        let options = self.options();
        let model = options.serialization_model();
        let mut values = Values::new();

        match &request.data {
            Value::Object(map) => {
                for (key, value) in map {
                    if model.is_primary_key(key) {
                        tracing::debug!(model = model.name(), key = %key, "Ignoring primary key in patch");
                        continue;
                    }
                    if model.field(key).is_none() {
                        tracing::debug!(model = model.name(), key = %key, "Ignoring unknown patch key");
                        continue;
                    }
                    values.insert(key.clone(), value.clone());
                }
            }
            Value::Null => {}
            _ => {
                let mut errors = FieldErrors::new();
                push_error(&mut errors, NON_FIELD_ERRORS, "Expected a JSON object.");
                return Err(HttpError::invalid(INVALID_UPDATE, errors));
            }
        }

        for (name, file) in &request.files {
            if model.field(name).is_some_and(|f| f.kind == FieldKind::File) {
                values.insert(name.clone(), file.to_value());
            }
        }

        self.store()
            .update(model, instance.pk, &values)
            .await
            .map_err(|e| HttpError::from_store(e, INVALID_UPDATE))
    }

    /// DELETE
    async fn handle_delete(&self, request: &ResourceRequest) -> Result<Reply, HttpError> {
        let instance = self.resolve_instance(request).await?;
        let model = self.options().serialization_model();
        if !self.store().delete(model, instance.pk).await? {
            return Err(HttpError::not_found());
        }
        Ok(Reply::Empty)
    }

    /// メソッドゲートを通してハンドラーへ振り分ける
    async fn dispatch(&self, request: ResourceRequest) -> Result<Reply, HttpError> {
        let methods = &self.options().methods;
        gate(methods, &request.method, || async {
            match request.method {
                Method::GET => self.handle_get(&request).await,
                Method::PUT => self.handle_put(&request).await,
                Method::PATCH => self.handle_patch(&request).await,
                Method::DELETE => self.handle_delete(&request).await,
                _ => Err(HttpError::method_not_allowed(methods.allow_header())),
            }
        })
        .await
    }
}

/// モデルを公開する標準のアイテムエンドポイント
pub struct ModelItem {
    options: EndpointOptions,
    store: Arc<dyn ModelStore>,
}

impl ModelItem {
    /// 作成
    pub fn new(options: EndpointOptions, store: Arc<dyn ModelStore>) -> Self {
        Self { options, store }
    }
}

impl ItemEndpoint for ModelItem {
    fn options(&self) -> &EndpointOptions {
        &self.options
    }

    fn store(&self) -> &dyn ModelStore {
        self.store.as_ref()
    }
}
