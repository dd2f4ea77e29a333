//! シリアライズヘルパー
//!
//! `Record`をJSONオブジェクトへ変換する。主キーは主キーカラム名で出力する。

use serde_json::{Map, Value};

use crate::model::{Model, Record};

/// レコードのシリアライザ
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Serializer {
    include: Option<Vec<String>>,
    exclude: Vec<String>,
}

impl Serializer {
    /// 全フィールドを出力するシリアライザ
    pub fn new() -> Self {
        Self::default()
    }

    /// 出力するフィールドを限定する（主キーは常に出力）
    pub fn include<S: Into<String>>(mut self, fields: impl IntoIterator<Item = S>) -> Self {
        self.include = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// 出力しないフィールド
    pub fn exclude<S: Into<String>>(mut self, fields: impl IntoIterator<Item = S>) -> Self {
        self.exclude = fields.into_iter().map(Into::into).collect();
        self
    }

    fn wants(&self, name: &str) -> bool {
        if self.exclude.iter().any(|f| f == name) {
            return false;
        }
        match &self.include {
            Some(include) => include.iter().any(|f| f == name),
            None => true,
        }
    }

    /// 1レコードをシリアライズ
    pub fn record(&self, model: &Model, record: &Record) -> Value {
        let mut object = Map::new();
        object.insert(model.primary_key().to_string(), Value::from(record.pk));
        for field in model.fields() {
            if !self.wants(&field.name) {
                continue;
            }
            let value = record.get(&field.name).cloned().unwrap_or(Value::Null);
            object.insert(field.name.clone(), value);
        }
        Value::Object(object)
    }

    /// 複数レコードをJSON配列へ
    pub fn records(&self, model: &Model, records: &[Record]) -> Value {
        Value::Array(records.iter().map(|r| self.record(model, r)).collect())
    }
}
