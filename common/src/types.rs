//! モデルスキーマ型
//!
//! Resource Model（テーブル・主キー・フィールド）の宣言的な記述と、
//! エンドポイントの動作モード

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

use crate::error::CommonError;

/// フィールド種別
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// 文字列
    Text,
    /// 整数
    Integer,
    /// 浮動小数点数
    Real,
    /// 真偽値
    Boolean,
    /// 日時（RFC 3339）
    Datetime,
    /// UUID
    Uuid,
    /// 任意のJSON値
    Json,
    /// アップロードファイル
    File,
}

impl FieldKind {
    /// 文字列表現を取得
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Integer => "integer",
            FieldKind::Real => "real",
            FieldKind::Boolean => "boolean",
            FieldKind::Datetime => "datetime",
            FieldKind::Uuid => "uuid",
            FieldKind::Json => "json",
            FieldKind::File => "file",
        }
    }

    /// SQLiteのカラム型（型アフィニティ）
    pub fn sql_type(&self) -> &'static str {
        match self {
            FieldKind::Integer | FieldKind::Boolean => "INTEGER",
            FieldKind::Real => "REAL",
            FieldKind::Text
            | FieldKind::Datetime
            | FieldKind::Uuid
            | FieldKind::Json
            | FieldKind::File => "TEXT",
        }
    }
}

fn default_true() -> bool {
    true
}

/// モデルフィールド
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    /// フィールド名（カラム名）
    pub name: String,
    /// 種別
    pub kind: FieldKind,
    /// NULLを許容するか
    #[serde(default)]
    pub null: bool,
    /// 省略・空値を許容するか
    #[serde(default)]
    pub blank: bool,
    /// デフォルト値
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// 最大文字数（text のみ）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    /// 選択肢
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<Value>>,
    /// 自動導出フォームに含めるか
    #[serde(default = "default_true")]
    pub editable: bool,
    /// 一意制約
    #[serde(default)]
    pub unique: bool,
}

impl Field {
    /// 指定種別のフィールドを作成
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            null: false,
            blank: false,
            default: None,
            max_length: None,
            choices: None,
            editable: true,
            unique: false,
        }
    }

    /// 文字列フィールド
    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Text)
    }

    /// 整数フィールド
    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Integer)
    }

    /// 浮動小数点数フィールド
    pub fn real(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Real)
    }

    /// 真偽値フィールド
    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Boolean)
    }

    /// 日時フィールド
    pub fn datetime(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Datetime)
    }

    /// UUIDフィールド
    pub fn uuid(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Uuid)
    }

    /// JSONフィールド
    pub fn json(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Json)
    }

    /// ファイルフィールド
    pub fn file(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::File)
    }

    /// NULLを許容する
    pub fn nullable(mut self) -> Self {
        self.null = true;
        self
    }

    /// 省略を許容する
    pub fn blank(mut self) -> Self {
        self.blank = true;
        self
    }

    /// デフォルト値を設定
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// 最大文字数を設定
    pub fn max_length(mut self, max: usize) -> Self {
        self.max_length = Some(max);
        self
    }

    /// 選択肢を設定
    pub fn choices<I, V>(mut self, choices: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.choices = Some(choices.into_iter().map(Into::into).collect());
        self
    }

    /// 自動導出フォームから除外する
    pub fn read_only(mut self) -> Self {
        self.editable = false;
        self
    }

    /// 一意制約を付与
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }
}

fn default_primary_key() -> String {
    "id".to_string()
}

/// モデルスキーマ
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSchema {
    /// モデル名（エラーメッセージ等で使用）
    pub name: String,
    /// テーブル名（省略時はモデル名）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    /// 主キーカラム名（INTEGER、自動採番）
    #[serde(default = "default_primary_key")]
    pub primary_key: String,
    /// フィールド一覧（宣言順）
    #[serde(default)]
    pub fields: Vec<Field>,
}

impl ModelSchema {
    /// 空のスキーマを作成
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: None,
            primary_key: default_primary_key(),
            fields: Vec::new(),
        }
    }

    /// テーブル名を設定
    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    /// 主キーカラム名を設定
    pub fn primary_key(mut self, column: impl Into<String>) -> Self {
        self.primary_key = column.into();
        self
    }

    /// フィールドを追加
    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// 実際のテーブル名
    pub fn table_name(&self) -> &str {
        self.table.as_deref().unwrap_or(&self.name)
    }

    /// スキーマを検証する
    ///
    /// 識別子の形式、フィールド名の重複、予約名`pk`の使用を検査する。
    pub fn validate(&self) -> Result<(), CommonError> {
        if !is_identifier(&self.name) {
            return Err(CommonError::Config(format!(
                "invalid model name '{}'",
                self.name
            )));
        }
        if !is_identifier(self.table_name()) {
            return Err(CommonError::Config(format!(
                "model '{}': invalid table name '{}'",
                self.name,
                self.table_name()
            )));
        }
        if !is_identifier(&self.primary_key) {
            return Err(CommonError::Config(format!(
                "model '{}': invalid primary key column '{}'",
                self.name, self.primary_key
            )));
        }

        let mut seen = HashSet::new();
        for field in &self.fields {
            if !is_identifier(&field.name) {
                return Err(CommonError::Config(format!(
                    "model '{}': invalid field name '{}'",
                    self.name, field.name
                )));
            }
            if field.name == "pk" || field.name == self.primary_key {
                return Err(CommonError::Config(format!(
                    "model '{}': field name '{}' is reserved for the primary key",
                    self.name, field.name
                )));
            }
            if !seen.insert(field.name.as_str()) {
                return Err(CommonError::Config(format!(
                    "model '{}': duplicate field '{}'",
                    self.name, field.name
                )));
            }
            if field.max_length.is_some() && field.kind != FieldKind::Text {
                return Err(CommonError::Config(format!(
                    "model '{}': max_length is only valid on text fields ('{}' is {})",
                    self.name,
                    field.name,
                    field.kind.as_str()
                )));
            }
        }
        Ok(())
    }
}

/// SQL識別子として使える名前か
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// 配列ペイロードの一括作成モード
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BatchMode {
    /// 全要素を検証してから単一トランザクションで作成（失敗時は何も残さない）
    #[default]
    Atomic,
    /// 要素ごとに検証・作成し、最初の失敗で中断（作成済みの行は残る）
    Sequential,
}

/// 一括作成成功時のレスポンス本体
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BatchResponse {
    /// 空オブジェクト `{}`
    #[default]
    Empty,
    /// 作成したリソースの配列
    Created,
}

/// PATCH の検証モード
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PatchMode {
    /// フォームを通さずモデルフィールドへ直接代入
    #[default]
    Unvalidated,
    /// 送信されたキーのみフォームの規則で検証
    Partial,
}
