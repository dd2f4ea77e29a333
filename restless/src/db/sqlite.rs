//! SQLite実装
//!
//! スキーマから動的にSQLを組み立てる。識別子はスキーマ検証済みだが、
//! 念のため常にダブルクォートで囲む。

use async_trait::async_trait;
use restless_common::types::{Field, FieldKind};
use serde_json::Value;
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{Row, Sqlite, SqlitePool, TypeInfo, ValueRef};

use super::traits::{ModelStore, StoreError};
use crate::model::{Lookup, Model, Record, Values};

type SqliteQuery<'q> = sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>;

/// SQLiteを使った`ModelStore`
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// 接続プールからストアを作成
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// バインド用のSQLite値
#[derive(Debug, Clone, PartialEq)]
enum SqlValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

fn quote(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

fn select_list(model: &Model) -> String {
    std::iter::once(model.primary_key())
        .chain(model.fields().iter().map(|f| f.name.as_str()))
        .map(quote)
        .collect::<Vec<_>>()
        .join(", ")
}

/// JSON値を保存形式へ変換する
///
/// JSON・ファイルフィールドは常にJSON文字列として保存する。
fn to_sql(kind: FieldKind, value: &Value) -> SqlValue {
    match (kind, value) {
        (_, Value::Null) => SqlValue::Null,
        (FieldKind::Json | FieldKind::File, v) => SqlValue::Text(v.to_string()),
        (_, Value::Bool(b)) => SqlValue::Integer(i64::from(*b)),
        (_, Value::Number(n)) => match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => SqlValue::Real(n.as_f64().unwrap_or_default()),
        },
        (_, Value::String(s)) => SqlValue::Text(s.clone()),
        (_, v) => SqlValue::Text(v.to_string()),
    }
}

fn bind_value(query: SqliteQuery<'_>, value: SqlValue) -> SqliteQuery<'_> {
    match value {
        SqlValue::Null => query.bind(None::<String>),
        SqlValue::Integer(i) => query.bind(i),
        SqlValue::Real(f) => query.bind(f),
        SqlValue::Text(s) => query.bind(s),
    }
}

/// 保存値をフィールド種別に応じてJSONへ戻す
fn from_storage(kind: FieldKind, value: Value) -> Value {
    match (kind, value) {
        (FieldKind::Boolean, Value::Number(n)) => Value::Bool(n.as_i64().unwrap_or(0) != 0),
        (FieldKind::Json | FieldKind::File, Value::String(s)) => {
            serde_json::from_str(&s).unwrap_or(Value::String(s))
        }
        (_, other) => other,
    }
}

/// 列の実際のストレージクラスで読み出す
///
/// PATCHで型に合わない値が入っていても読み出せるよう、宣言型ではなく
/// 値の型を見る。
fn read_column(row: &SqliteRow, index: usize) -> Result<Value, sqlx::Error> {
    let raw = row.try_get_raw(index)?;
    if raw.is_null() {
        return Ok(Value::Null);
    }
    let storage = raw.type_info().name().to_string();
    let value = match storage.as_str() {
        "INTEGER" => Value::from(row.try_get_unchecked::<i64, _>(index)?),
        "REAL" => Value::from(row.try_get_unchecked::<f64, _>(index)?),
        "BLOB" => {
            let bytes = row.try_get_unchecked::<Vec<u8>, _>(index)?;
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        }
        _ => Value::String(row.try_get_unchecked::<String, _>(index)?),
    };
    Ok(value)
}

fn decode_row(model: &Model, row: &SqliteRow) -> Result<Record, StoreError> {
    let pk: i64 = row.try_get(0)?;
    let mut values = Values::new();
    for (offset, field) in model.fields().iter().enumerate() {
        let value = read_column(row, offset + 1)?;
        values.insert(field.name.clone(), from_storage(field.kind, value));
    }
    Ok(Record { pk, values })
}

fn map_write_error(model: &Model, err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &err {
        let message = db.message();
        if db.is_unique_violation() || message.contains("UNIQUE constraint failed") {
            // "UNIQUE constraint failed: article.slug"
            let field = message
                .rsplit('.')
                .next()
                .unwrap_or_default()
                .trim()
                .to_string();
            return StoreError::UniqueViolation {
                model: model.name().to_string(),
                field,
            };
        }
    }
    StoreError::Database(err)
}

fn column_definition(field: &Field) -> String {
    let mut def = format!("{} {}", quote(&field.name), field.kind.sql_type());
    // blank な text は空文字で保存するため NOT NULL のまま
    let nullable = field.null || (field.blank && field.kind != FieldKind::Text);
    if !nullable {
        def.push_str(" NOT NULL");
    }
    if field.unique {
        def.push_str(" UNIQUE");
    }
    if let Some(default) = &field.default {
        let literal = match to_sql(field.kind, default) {
            SqlValue::Null => "NULL".to_string(),
            SqlValue::Integer(i) => i.to_string(),
            SqlValue::Real(f) => f.to_string(),
            SqlValue::Text(s) => format!("'{}'", s.replace('\'', "''")),
        };
        def.push_str(" DEFAULT ");
        def.push_str(&literal);
    } else if field.kind == FieldKind::Boolean && !nullable {
        // フォーム外の真偽値は false
        def.push_str(" DEFAULT 0");
    } else if field.kind == FieldKind::Text && field.blank && !nullable {
        def.push_str(" DEFAULT ''");
    }
    def
}

/// テーブル作成DDL
fn create_table_sql(model: &Model) -> String {
    let mut columns = vec![format!(
        "{} INTEGER PRIMARY KEY AUTOINCREMENT",
        quote(model.primary_key())
    )];
    columns.extend(model.fields().iter().map(column_definition));
    format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        quote(model.table()),
        columns.join(", ")
    )
}

async fn insert_row<'e, E>(executor: E, model: &Model, values: &Values) -> Result<Record, StoreError>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let fields: Vec<&Field> = model
        .fields()
        .iter()
        .filter(|f| values.contains_key(&f.name))
        .collect();

    let sql = if fields.is_empty() {
        format!(
            "INSERT INTO {} DEFAULT VALUES RETURNING {}",
            quote(model.table()),
            select_list(model)
        )
    } else {
        let columns = fields
            .iter()
            .map(|f| quote(&f.name))
            .collect::<Vec<_>>()
            .join(", ");
        let placeholders = vec!["?"; fields.len()].join(", ");
        format!(
            "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
            quote(model.table()),
            columns,
            placeholders,
            select_list(model)
        )
    };

    let mut query = sqlx::query(&sql);
    for field in &fields {
        query = bind_value(query, to_sql(field.kind, &values[&field.name]));
    }

    let row = query
        .fetch_one(executor)
        .await
        .map_err(|e| map_write_error(model, e))?;
    decode_row(model, &row)
}

#[async_trait]
impl ModelStore for SqliteStore {
    async fn ensure_table(&self, model: &Model) -> Result<(), StoreError> {
        let sql = create_table_sql(model);
        tracing::debug!(table = model.table(), %sql, "Ensuring table");
        sqlx::query(&sql).execute(&self.pool).await?;
        Ok(())
    }

    async fn all(&self, model: &Model) -> Result<Vec<Record>, StoreError> {
        let sql = format!(
            "SELECT {} FROM {} ORDER BY {}",
            select_list(model),
            quote(model.table()),
            quote(model.primary_key())
        );
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        rows.iter().map(|row| decode_row(model, row)).collect()
    }

    async fn get(&self, model: &Model, lookup: &Lookup) -> Result<Option<Record>, StoreError> {
        let kind = model
            .field(&lookup.column)
            .map(|f| f.kind)
            .unwrap_or(FieldKind::Integer);
        let sql = format!(
            "SELECT {} FROM {} WHERE {} = ? LIMIT 2",
            select_list(model),
            quote(model.table()),
            quote(&lookup.column)
        );
        let query = bind_value(sqlx::query(&sql), to_sql(kind, &lookup.value));
        let rows = query.fetch_all(&self.pool).await?;

        match rows.as_slice() {
            [] => Ok(None),
            [row] => decode_row(model, row).map(Some),
            _ => Err(StoreError::MultipleObjectsReturned(model.name().to_string())),
        }
    }

    async fn insert(&self, model: &Model, values: &Values) -> Result<Record, StoreError> {
        insert_row(&self.pool, model, values).await
    }

    async fn insert_many(&self, model: &Model, rows: &[Values]) -> Result<Vec<Record>, StoreError> {
        let mut tx = self.pool.begin().await?;
        let mut created = Vec::with_capacity(rows.len());
        for values in rows {
            // エラー時は tx が drop されロールバックされる
            created.push(insert_row(&mut *tx, model, values).await?);
        }
        tx.commit().await?;
        Ok(created)
    }

    async fn update(&self, model: &Model, pk: i64, values: &Values) -> Result<Record, StoreError> {
        let fields: Vec<&Field> = model
            .fields()
            .iter()
            .filter(|f| values.contains_key(&f.name))
            .collect();

        if fields.is_empty() {
            return self
                .get(model, &Lookup::primary_key(model, pk))
                .await?
                .ok_or_else(|| StoreError::DoesNotExist {
                    model: model.name().to_string(),
                    pk,
                });
        }

        let assignments = fields
            .iter()
            .map(|f| format!("{} = ?", quote(&f.name)))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "UPDATE {} SET {} WHERE {} = ? RETURNING {}",
            quote(model.table()),
            assignments,
            quote(model.primary_key()),
            select_list(model)
        );

        let mut query = sqlx::query(&sql);
        for field in &fields {
            query = bind_value(query, to_sql(field.kind, &values[&field.name]));
        }
        let row = query
            .bind(pk)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_write_error(model, e))?;

        match row {
            Some(row) => decode_row(model, &row),
            None => Err(StoreError::DoesNotExist {
                model: model.name().to_string(),
                pk,
            }),
        }
    }

    async fn delete(&self, model: &Model, pk: i64) -> Result<bool, StoreError> {
        let sql = format!(
            "DELETE FROM {} WHERE {} = ?",
            quote(model.table()),
            quote(model.primary_key())
        );
        let result = sqlx::query(&sql).bind(pk).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }
}
