//! Validator/Form レイヤー
//!
//! モデルに紐付くフォーム。`ModelForm::derive`はモデルの編集可能な
//! 全フィールドから自動導出し、`ModelForm::with_fields`は対象を絞る。
//! リクエストごとに`BoundForm`を作り、検証・保存したら捨てる。

use base64::{engine::general_purpose::STANDARD, Engine as _};
use restless_common::error::CommonError;
use restless_common::protocol::{push_error, FieldErrors, NON_FIELD_ERRORS};
use restless_common::types::{Field, FieldKind};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::db::{ModelStore, StoreError};
use crate::model::{normalize_datetime, Model, Record, Values};

/// 必須エラーメッセージ
pub const REQUIRED: &str = "This field is required.";

/// アップロードされたファイル
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedFile {
    /// クライアント側のファイル名
    pub name: String,
    /// Content-Type
    pub content_type: Option<String>,
    /// 内容
    pub data: Vec<u8>,
}

impl UploadedFile {
    /// 保存・シリアライズ用のJSON表現
    pub fn to_value(&self) -> Value {
        json!({
            "name": self.name,
            "content_type": self.content_type,
            "size": self.data.len(),
            "data": STANDARD.encode(&self.data),
        })
    }
}

/// フィールド名 → アップロードファイル
pub type Files = HashMap<String, UploadedFile>;

/// フォーム
///
/// 対象フィールドの一覧と、フィールド単位の検証後に呼ばれる`clean`フックを持つ。
pub trait Form: Send + Sync + fmt::Debug {
    /// 紐付くモデル
    fn model(&self) -> &Model;

    /// フォームが扱うフィールド名
    fn fields(&self) -> &[String];

    /// フォーム全体の追加検証
    ///
    /// フィールド単位の検証後に必ず呼ばれる。`cleaned`には検証を通った
    /// フィールドのみが入っている。
    fn clean(&self, _cleaned: &mut Values, _errors: &mut FieldErrors) {}
}

/// `clean`フック
pub type CleanHook = Arc<dyn Fn(&mut Values, &mut FieldErrors) + Send + Sync>;

/// モデルから導出されるフォーム
#[derive(Clone)]
pub struct ModelForm {
    model: Model,
    fields: Vec<String>,
    clean_hook: Option<CleanHook>,
}

impl fmt::Debug for ModelForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelForm")
            .field("model", &self.model.name())
            .field("fields", &self.fields)
            .field("clean_hook", &self.clean_hook.is_some())
            .finish()
    }
}

impl ModelForm {
    /// 編集可能な全フィールドからフォームを導出
    pub fn derive(model: &Model) -> Self {
        Self {
            model: model.clone(),
            fields: model.editable_fields().map(|f| f.name.clone()).collect(),
            clean_hook: None,
        }
    }

    /// 指定フィールドのみのフォーム
    ///
    /// 読み取り専用フィールドも明示すれば含められる。
    pub fn with_fields<S: AsRef<str>>(model: &Model, fields: &[S]) -> Result<Self, CommonError> {
        let mut names = Vec::with_capacity(fields.len());
        for name in fields {
            let name = name.as_ref();
            if model.field(name).is_none() {
                return Err(CommonError::Config(format!(
                    "form for '{}' references unknown field '{}'",
                    model.name(),
                    name
                )));
            }
            if !names.iter().any(|n: &String| n == name) {
                names.push(name.to_string());
            }
        }
        Ok(Self {
            model: model.clone(),
            fields: names,
            clean_hook: None,
        })
    }

    /// フィールドを除外
    pub fn exclude<S: AsRef<str>>(mut self, names: &[S]) -> Self {
        self.fields
            .retain(|f| !names.iter().any(|n| n.as_ref() == f.as_str()));
        self
    }

    /// `clean`フックを設定
    pub fn with_clean<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut Values, &mut FieldErrors) + Send + Sync + 'static,
    {
        self.clean_hook = Some(Arc::new(hook));
        self
    }
}

impl Form for ModelForm {
    fn model(&self) -> &Model {
        &self.model
    }

    fn fields(&self) -> &[String] {
        &self.fields
    }

    fn clean(&self, cleaned: &mut Values, errors: &mut FieldErrors) {
        if let Some(hook) = &self.clean_hook {
            hook(cleaned, errors);
        }
    }
}

/// フォーム保存のエラー
#[derive(Debug, Error)]
pub enum FormError {
    /// 検証エラー
    #[error("form is not valid")]
    Invalid(FieldErrors),
    /// ストアエラー
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BindMode {
    Create,
    Update,
    Partial,
}

/// 1リクエスト分のデータを束縛したフォーム
#[derive(Debug)]
pub struct BoundForm<'a> {
    form: &'a dyn Form,
    instance: Option<&'a Record>,
    cleaned: Values,
    errors: FieldErrors,
}

impl<'a> BoundForm<'a> {
    /// データを束縛して検証する
    ///
    /// `instance`がある場合は更新（省略されたデフォルト付きフィールドや
    /// ファイルは既存値のまま）、無い場合は作成として扱う。
    pub fn new(
        form: &'a dyn Form,
        data: &Value,
        files: &Files,
        instance: Option<&'a Record>,
    ) -> Self {
        let mode = if instance.is_some() {
            BindMode::Update
        } else {
            BindMode::Create
        };
        Self::bind(form, data, files, instance, mode)
    }

    /// 送信されたキーのみを検証する（部分更新）
    pub fn partial(form: &'a dyn Form, data: &Value, files: &Files, instance: &'a Record) -> Self {
        Self::bind(form, data, files, Some(instance), BindMode::Partial)
    }

    fn bind(
        form: &'a dyn Form,
        data: &Value,
        files: &Files,
        instance: Option<&'a Record>,
        mode: BindMode,
    ) -> Self {
        let mut cleaned = Values::new();
        let mut errors = FieldErrors::new();
        let empty = Values::new();

        let data = match data {
            Value::Object(map) => map,
            Value::Null => &empty,
            _ => {
                push_error(&mut errors, NON_FIELD_ERRORS, "Expected a JSON object.");
                return Self {
                    form,
                    instance,
                    cleaned,
                    errors,
                };
            }
        };

        let model = form.model();
        for name in form.fields() {
            let Some(field) = model.field(name) else {
                tracing::warn!(model = model.name(), field = %name, "Form field is not on the model");
                continue;
            };
            let raw = data.get(name);
            let file = files.get(name);
            if mode == BindMode::Partial && raw.is_none() && file.is_none() {
                continue;
            }
            match clean_field(field, raw, file, mode == BindMode::Create) {
                Ok(Some(value)) => {
                    cleaned.insert(name.clone(), value);
                }
                Ok(None) => {}
                Err(message) => push_error(&mut errors, name, message),
            }
        }

        form.clean(&mut cleaned, &mut errors);

        Self {
            form,
            instance,
            cleaned,
            errors,
        }
    }

    /// 検証結果を取り出す
    pub fn into_result(self) -> Result<Values, FieldErrors> {
        if self.errors.is_empty() {
            Ok(self.cleaned)
        } else {
            Err(self.errors)
        }
    }

    /// 検証済みの値を保存する
    ///
    /// 作成時は新しい行を、更新時は既存行の対象フィールドのみを書き込む。
    pub async fn save(self, store: &dyn ModelStore) -> Result<Record, FormError> {
        if !self.errors.is_empty() {
            return Err(FormError::Invalid(self.errors));
        }
        let model = self.form.model();
        let record = match self.instance {
            Some(instance) => store.update(model, instance.pk, &self.cleaned).await?,
            None => store.insert(model, &self.cleaned).await?,
        };
        Ok(record)
    }
}

fn is_empty(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}

/// 1フィールドを検証・正規化する
///
/// `Ok(None)`はそのフィールドを書き込まない（既存値を維持する）ことを表す。
fn clean_field(
    field: &Field,
    raw: Option<&Value>,
    file: Option<&UploadedFile>,
    creating: bool,
) -> Result<Option<Value>, String> {
    if field.kind == FieldKind::File {
        if let Some(file) = file {
            return Ok(Some(file.to_value()));
        }
        if !creating {
            // 明示的な null はクリア
            if matches!(raw, Some(Value::Null)) && (field.null || field.blank) {
                return Ok(Some(Value::Null));
            }
            return Ok(None);
        }
        return empty_value(field, creating);
    }

    if field.kind == FieldKind::Boolean && is_empty(raw) {
        // デフォルト付きは他のフィールドと同じく更新時に維持する
        return match (&field.default, creating) {
            (Some(default), true) => Ok(Some(default.clone())),
            (Some(_), false) => Ok(None),
            (None, _) => Ok(Some(Value::Bool(false))),
        };
    }

    let raw = match raw {
        Some(value) if !is_empty(Some(value)) => value,
        _ => return empty_value(field, creating),
    };

    let value = convert(field.kind, raw)?;

    if let (FieldKind::Text, Some(max), Value::String(s)) = (field.kind, field.max_length, &value) {
        let len = s.chars().count();
        if len > max {
            return Err(format!(
                "Ensure this value has at most {} characters (it has {}).",
                max, len
            ));
        }
    }

    if let Some(choices) = &field.choices {
        if !choices.contains(&value) {
            let shown = match &value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            return Err(format!(
                "Select a valid choice. {} is not one of the available choices.",
                shown
            ));
        }
    }

    Ok(Some(value))
}

fn empty_value(field: &Field, creating: bool) -> Result<Option<Value>, String> {
    if let Some(default) = &field.default {
        return Ok(if creating { Some(default.clone()) } else { None });
    }
    if field.kind == FieldKind::Text && field.blank && !field.null {
        return Ok(Some(Value::String(String::new())));
    }
    if field.null || field.blank {
        return Ok(Some(Value::Null));
    }
    Err(REQUIRED.to_string())
}

fn convert(kind: FieldKind, raw: &Value) -> Result<Value, String> {
    match kind {
        FieldKind::Text => match raw {
            Value::String(s) => Ok(Value::String(s.clone())),
            Value::Number(n) => Ok(Value::String(n.to_string())),
            Value::Bool(b) => Ok(Value::String(b.to_string())),
            _ => Err("Enter a valid value.".to_string()),
        },
        FieldKind::Integer => {
            let parsed = match raw {
                Value::Number(n) => n.as_i64().or_else(|| {
                    n.as_f64()
                        .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                        .map(|f| f as i64)
                }),
                Value::String(s) => s.trim().parse::<i64>().ok(),
                _ => None,
            };
            parsed
                .map(Value::from)
                .ok_or_else(|| "Enter a whole number.".to_string())
        }
        FieldKind::Real => {
            let parsed = match raw {
                Value::Number(n) => n.as_f64(),
                Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
                _ => None,
            };
            parsed
                .map(Value::from)
                .ok_or_else(|| "Enter a number.".to_string())
        }
        FieldKind::Boolean => {
            let parsed = match raw {
                Value::Bool(b) => Some(*b),
                Value::Number(n) => match n.as_i64() {
                    Some(0) => Some(false),
                    Some(1) => Some(true),
                    _ => None,
                },
                Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                    "true" | "1" | "on" | "yes" => Some(true),
                    "false" | "0" | "off" | "no" => Some(false),
                    _ => None,
                },
                _ => None,
            };
            parsed
                .map(Value::Bool)
                .ok_or_else(|| "Enter a valid boolean.".to_string())
        }
        FieldKind::Datetime => match raw {
            Value::String(s) => normalize_datetime(s)
                .map(Value::String)
                .ok_or_else(|| "Enter a valid date/time.".to_string()),
            _ => Err("Enter a valid date/time.".to_string()),
        },
        FieldKind::Uuid => {
            let Value::String(s) = raw else {
                return Err("Enter a valid UUID.".to_string());
            };
            uuid::Uuid::parse_str(s.trim())
                .map(|id| Value::String(id.hyphenated().to_string()))
                .map_err(|_| "Enter a valid UUID.".to_string())
        }
        FieldKind::Json => Ok(raw.clone()),
        // ファイルは files から取るため、ここに来るのは本文に書かれた値
        FieldKind::File => Err("No file was submitted.".to_string()),
    }
}
