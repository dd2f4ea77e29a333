//! コレクションエンドポイント
//!
//! `GET`で一覧、`POST`でオブジェクトまたは配列から作成する。
//! 各ステップはtraitのデフォルトメソッドなので、個別に差し替えられる。

use async_trait::async_trait;
use axum::http::Method;
use restless_common::types::{BatchMode, BatchResponse};
use serde_json::{json, Value};
use std::sync::Arc;

use super::{gate, EndpointOptions};
use crate::db::ModelStore;
use crate::form::{BoundForm, Files};
use crate::http::{HttpError, Reply, INVALID_CREATE};
use crate::model::Record;
use crate::request::ResourceRequest;

/// 一覧・作成エンドポイント
#[async_trait]
pub trait CollectionEndpoint: Send + Sync {
    /// 解決済み設定
    fn options(&self) -> &EndpointOptions;

    /// ストア
    fn store(&self) -> &dyn ModelStore;

    /// 対象レコードを取得（主キー順）
    async fn resolve_collection(&self, _request: &ResourceRequest) -> Result<Vec<Record>, HttpError> {
        let Some(model) = &self.options().model else {
            return Err(HttpError::not_found());
        };
        Ok(self.store().all(model).await?)
    }

    /// 一覧をシリアライズ
    fn serialize(&self, records: &[Record]) -> Value {
        let options = self.options();
        options
            .serializer
            .records(options.serialization_model(), records)
    }

    /// 1件をシリアライズ
    fn serialize_one(&self, record: &Record) -> Value {
        let options = self.options();
        options
            .serializer
            .record(options.serialization_model(), record)
    }

    /// GET
    async fn handle_get(&self, request: &ResourceRequest) -> Result<Reply, HttpError> {
        let records = self.resolve_collection(request).await?;
        Ok(Reply::Ok(self.serialize(&records)))
    }

    /// POST
    ///
    /// 配列ペイロードは一括作成。入れ子の配列は平坦化して扱う。
    async fn handle_post(&self, request: &ResourceRequest) -> Result<Reply, HttpError> {
        match &request.data {
            Value::Array(items) => {
                let mut flat = Vec::with_capacity(items.len());
                flatten(items, &mut flat);
                let created = match self.options().batch_mode {
                    BatchMode::Atomic => self.create_atomic(&flat, &request.files).await?,
                    BatchMode::Sequential => {
                        self.create_sequential(&flat, &request.files).await?
                    }
                };
                tracing::debug!(count = created.len(), "Batch created");
                let body = match self.options().batch_response {
                    BatchResponse::Empty => json!({}),
                    BatchResponse::Created => self.serialize(&created),
                };
                Ok(Reply::Created(body))
            }
            data => {
                let record = self.create_one(data, &request.files).await?;
                Ok(Reply::Created(self.serialize_one(&record)))
            }
        }
    }

    /// 1件を検証して作成
    async fn create_one(&self, data: &Value, files: &Files) -> Result<Record, HttpError> {
        let form = self.options().form.as_ref();
        BoundForm::new(form, data, files, None)
            .save(self.store())
            .await
            .map_err(|e| HttpError::from_form(e, INVALID_CREATE))
    }

    /// 要素ごとに作成し、最初の失敗で中断する
    ///
    /// 失敗より前に作成した行は残る。
    async fn create_sequential(&self, items: &[&Value], files: &Files) -> Result<Vec<Record>, HttpError> {
        let mut created = Vec::with_capacity(items.len());
        for item in items {
            created.push(self.create_one(item, files).await?);
        }
        Ok(created)
    }

    /// 全要素を検証してから単一トランザクションで作成する
    async fn create_atomic(&self, items: &[&Value], files: &Files) -> Result<Vec<Record>, HttpError> {
        let form = self.options().form.as_ref();
        let mut rows = Vec::with_capacity(items.len());
        for item in items {
            let values = BoundForm::new(form, item, files, None)
                .into_result()
                .map_err(|errors| HttpError::invalid(INVALID_CREATE, errors))?;
            rows.push(values);
        }
        Ok(self.store().insert_many(form.model(), &rows).await?)
    }

    /// メソッドゲートを通してハンドラーへ振り分ける
    async fn dispatch(&self, request: ResourceRequest) -> Result<Reply, HttpError> {
        let methods = &self.options().methods;
        gate(methods, &request.method, || async {
            match request.method {
                Method::GET => self.handle_get(&request).await,
                Method::POST => self.handle_post(&request).await,
                _ => Err(HttpError::method_not_allowed(methods.allow_header())),
            }
        })
        .await
    }
}

fn flatten<'a>(items: &'a [Value], out: &mut Vec<&'a Value>) {
    for item in items {
        match item {
            Value::Array(nested) => flatten(nested, out),
            other => out.push(other),
        }
    }
}

/// モデルを公開する標準のコレクションエンドポイント
pub struct ModelCollection {
    options: EndpointOptions,
    store: Arc<dyn ModelStore>,
}

impl ModelCollection {
    /// 作成
    pub fn new(options: EndpointOptions, store: Arc<dyn ModelStore>) -> Self {
        Self { options, store }
    }
}

impl CollectionEndpoint for ModelCollection {
    fn options(&self) -> &EndpointOptions {
        &self.options
    }

    fn store(&self) -> &dyn ModelStore {
        self.store.as_ref()
    }
}
