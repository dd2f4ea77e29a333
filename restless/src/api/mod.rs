//! HTTPルーター
//!
//! エンドポイントごとのルーターと、`ServiceConfig`からのアプリ組み立て

use axum::extract::State;
use axum::routing::any;
use axum::Router;
use restless_common::config::{ResourceConfig, ServiceConfig};
use restless_common::error::RestError;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::db::ModelStore;
use crate::endpoint::{CollectionEndpoint, EndpointConfig, ItemEndpoint, ModelCollection, ModelItem};
use crate::form::{Form, ModelForm};
use crate::http::{HttpError, Reply};
use crate::model::Model;
use crate::request::ResourceRequest;

async fn collection_handler<E>(
    State(endpoint): State<Arc<E>>,
    request: ResourceRequest,
) -> Result<Reply, HttpError>
where
    E: CollectionEndpoint + 'static,
{
    endpoint.dispatch(request).await
}

async fn item_handler<E>(
    State(endpoint): State<Arc<E>>,
    request: ResourceRequest,
) -> Result<Reply, HttpError>
where
    E: ItemEndpoint + 'static,
{
    endpoint.dispatch(request).await
}

/// コレクションエンドポイントを`path`にマウントしたルーター
///
/// すべてのメソッドを受け付け、許可判定はエンドポイント側で行う。
pub fn collection_router<E>(path: &str, endpoint: Arc<E>) -> Router
where
    E: CollectionEndpoint + 'static,
{
    Router::new()
        .route(path, any(collection_handler::<E>))
        .with_state(endpoint)
}

/// アイテムエンドポイントを`{base}/:{lookup_field}`にマウントしたルーター
pub fn item_router<E>(base: &str, lookup_field: &str, endpoint: Arc<E>) -> Router
where
    E: ItemEndpoint + 'static,
{
    let path = format!("{}/:{}", base.trim_end_matches('/'), lookup_field);
    Router::new()
        .route(&path, any(item_handler::<E>))
        .with_state(endpoint)
}

/// リソース設定からフォームを解決
fn resource_form(model: &Model, resource: &ResourceConfig) -> Result<Arc<dyn Form>, RestError> {
    let form = match &resource.form_fields {
        Some(fields) => ModelForm::with_fields(model, fields)?,
        None => ModelForm::derive(model),
    };
    Ok(Arc::new(form.exclude(&resource.form_exclude)))
}

/// 設定されたリソースをすべてマウントしたルーターを作成
///
/// 設定の検証、テーブル作成、エンドポイント設定の解決はここで一度だけ行う。
pub async fn build_resources(
    store: Arc<dyn ModelStore>,
    config: &ServiceConfig,
) -> Result<Router, RestError> {
    config.validate()?;

    let mut router = Router::new();
    for resource in &config.resources {
        let (Some(schema), Some(base)) = (resource.model.clone(), resource.mount_path()) else {
            return Err(RestError::config("neither model nor form is configured"));
        };
        let model = Model::new(schema)?;
        store.ensure_table(&model).await?;
        let form = resource_form(&model, resource)?;

        let mut collection = EndpointConfig::new()
            .model(model.clone())
            .form(form.clone())
            .batch_mode(resource.batch_mode)
            .batch_response(resource.batch_response);
        if let Some(methods) = &resource.collection_methods {
            collection = collection.methods(methods);
        }
        let collection = collection.build_collection()?;

        let mut item = EndpointConfig::new()
            .model(model.clone())
            .form(form)
            .lookup_field(resource.lookup_field.clone())
            .patch_mode(resource.patch_mode);
        if let Some(methods) = &resource.item_methods {
            item = item.methods(methods);
        }
        let item = item.build_item()?;

        tracing::info!(
            model = model.name(),
            path = %base,
            collection_methods = %collection.methods.allow_header(),
            item_methods = %item.methods.allow_header(),
            "Mounted resource"
        );

        let lookup_field = item.lookup_field.clone();
        router = router
            .merge(collection_router(
                &base,
                Arc::new(ModelCollection::new(collection, store.clone())),
            ))
            .merge(item_router(
                &base,
                &lookup_field,
                Arc::new(ModelItem::new(item, store.clone())),
            ));
    }
    Ok(router)
}

/// ルーターにフォールバックとトレースレイヤーを付けてアプリを作成
pub fn create_app(router: Router) -> Router {
    router
        .fallback(|| async { HttpError::not_found() })
        .layer(TraceLayer::new_for_http())
}
