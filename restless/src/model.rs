//! Resource Model
//!
//! 検証済みスキーマをラップし、フィールド検索・主キー解決・
//! 検索キーの型変換を提供する。行は`Record`で表す。

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use restless_common::error::CommonError;
use restless_common::types::{Field, FieldKind, ModelSchema};
use serde_json::{Map, Value};
use std::sync::Arc;

/// フィールド名 → JSON値
pub type Values = Map<String, Value>;

/// 主キーの別名
pub const PK_ALIAS: &str = "pk";

/// Resource Model
///
/// 安価にcloneできる（スキーマは`Arc`で共有）。
#[derive(Debug, Clone)]
pub struct Model {
    schema: Arc<ModelSchema>,
}

impl PartialEq for Model {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.schema, &other.schema) || *self.schema == *other.schema
    }
}

impl Model {
    /// スキーマを検証してモデルを作成
    pub fn new(schema: ModelSchema) -> Result<Self, CommonError> {
        schema.validate()?;
        Ok(Self {
            schema: Arc::new(schema),
        })
    }

    /// モデル名
    pub fn name(&self) -> &str {
        &self.schema.name
    }

    /// テーブル名
    pub fn table(&self) -> &str {
        self.schema.table_name()
    }

    /// 主キーカラム名
    pub fn primary_key(&self) -> &str {
        &self.schema.primary_key
    }

    /// フィールド一覧（宣言順）
    pub fn fields(&self) -> &[Field] {
        &self.schema.fields
    }

    /// 名前でフィールドを取得
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.schema.fields.iter().find(|f| f.name == name)
    }

    /// `pk`または主キーカラム名か
    pub fn is_primary_key(&self, name: &str) -> bool {
        name == PK_ALIAS || name == self.primary_key()
    }

    /// 自動導出フォームの対象フィールド
    pub fn editable_fields(&self) -> impl Iterator<Item = &Field> {
        self.schema.fields.iter().filter(|f| f.editable)
    }

    /// 検索フィールド名を解決する
    ///
    /// JSON・ファイルフィールドは検索に使えない。
    pub fn lookup_column(&self, lookup_field: &str) -> Option<LookupColumn<'_>> {
        if self.is_primary_key(lookup_field) {
            return Some(LookupColumn::PrimaryKey);
        }
        match self.field(lookup_field) {
            Some(field) if !matches!(field.kind, FieldKind::Json | FieldKind::File) => {
                Some(LookupColumn::Field(field))
            }
            _ => None,
        }
    }

    /// パスパラメータの生文字列から検索条件を組み立てる
    ///
    /// フィールドが解決できない、または値が型に合わない場合は`None`。
    pub fn lookup(&self, lookup_field: &str, raw: &str) -> Option<Lookup> {
        let column = self.lookup_column(lookup_field)?;
        let value = column.coerce(raw)?;
        let column = match column {
            LookupColumn::PrimaryKey => self.primary_key().to_string(),
            LookupColumn::Field(field) => field.name.clone(),
        };
        Some(Lookup { column, value })
    }
}

/// 検索に使うカラム
#[derive(Debug, Clone, Copy)]
pub enum LookupColumn<'a> {
    /// 主キー
    PrimaryKey,
    /// 通常フィールド
    Field(&'a Field),
}

impl LookupColumn<'_> {
    /// 生文字列をカラムの型へ変換
    pub fn coerce(&self, raw: &str) -> Option<Value> {
        let kind = match self {
            LookupColumn::PrimaryKey => FieldKind::Integer,
            LookupColumn::Field(field) => field.kind,
        };
        match kind {
            FieldKind::Integer => raw.trim().parse::<i64>().ok().map(Value::from),
            FieldKind::Real => raw.trim().parse::<f64>().ok().map(Value::from),
            FieldKind::Boolean => match raw.trim().to_ascii_lowercase().as_str() {
                "true" | "1" => Some(Value::Bool(true)),
                "false" | "0" => Some(Value::Bool(false)),
                _ => None,
            },
            FieldKind::Uuid => uuid::Uuid::parse_str(raw)
                .ok()
                .map(|id| Value::String(id.hyphenated().to_string())),
            FieldKind::Datetime => normalize_datetime(raw).map(Value::String),
            FieldKind::Text => Some(Value::String(raw.to_string())),
            FieldKind::Json | FieldKind::File => None,
        }
    }
}

/// 単一行の検索条件
#[derive(Debug, Clone, PartialEq)]
pub struct Lookup {
    /// カラム名
    pub column: String,
    /// 比較値
    pub value: Value,
}

impl Lookup {
    /// 主キー検索
    pub fn primary_key(model: &Model, pk: i64) -> Self {
        Self {
            column: model.primary_key().to_string(),
            value: Value::from(pk),
        }
    }
}

/// 永続化済みの1行
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// 主キー
    pub pk: i64,
    /// フィールド値
    pub values: Values,
}

impl Record {
    /// フィールド値を取得
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }
}

/// 日時文字列をUTCのRFC 3339表記へ正規化する
///
/// RFC 3339 と`%Y-%m-%d %H:%M:%S`（UTCとみなす）を受け付ける。
pub fn normalize_datetime(raw: &str) -> Option<String> {
    let raw = raw.trim();
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|dt| dt.and_utc()))
        .ok()
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::AutoSi, true))
}
