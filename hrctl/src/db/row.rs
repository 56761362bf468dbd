//! Column conversion between result rows and entity fields.
//!
//! Rows are read through [`RowAccess`], which yields a typed [`Value`] for a column label; the
//! [`ColumnValue`] trait turns that into a field type. A SQL NULL always becomes `None`: every
//! scalar field is optional. Reading a column as a type it does not hold is a mapping bug and
//! surfaces as [`DbError::ColumnMismatch`] instead of being coerced.

use crate::db::errors::{DbError, Result};
use crate::db::models::Language;
use crate::db::schema::{ColumnKey, ColumnType};
use chrono::{DateTime, Utc};
use sqlx::Row;
use sqlx::postgres::PgRow;
use std::collections::HashMap;

/// A single column value, tagged with its stored type. `None` is SQL NULL.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    BigInt(Option<i64>),
    Text(Option<String>),
    Timestamp(Option<DateTime<Utc>>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        match self {
            Value::BigInt(v) => v.is_none(),
            Value::Text(v) => v.is_none(),
            Value::Timestamp(v) => v.is_none(),
        }
    }

    /// Parse a textual value (query string filter) as the given column type.
    pub fn parse(ty: ColumnType, raw: &str) -> std::result::Result<Self, String> {
        match ty {
            ColumnType::BigInt => raw
                .parse::<i64>()
                .map(|v| Value::BigInt(Some(v)))
                .map_err(|_| format!("'{raw}' is not an integer")),
            ColumnType::Text => Ok(Value::Text(Some(raw.to_string()))),
            ColumnType::Timestamp => DateTime::parse_from_rfc3339(raw)
                .map(|v| Value::Timestamp(Some(v.with_timezone(&Utc))))
                .map_err(|_| format!("'{raw}' is not an RFC 3339 timestamp")),
            ColumnType::Language => raw
                .parse::<Language>()
                .map(|v| Value::Text(Some(v.as_str().to_string()))),
        }
    }
}

/// Read access to one result row by column label.
pub trait RowAccess {
    /// Fetch `label` as the storage representation of `ty`.
    fn value(&self, label: &str, ty: ColumnType) -> Result<Value>;
}

impl RowAccess for PgRow {
    fn value(&self, label: &str, ty: ColumnType) -> Result<Value> {
        let mismatch = |err: sqlx::Error| match err {
            sqlx::Error::ColumnNotFound(_) | sqlx::Error::ColumnDecode { .. } => DbError::ColumnMismatch {
                column: label.to_string(),
                expected: ty.name(),
            },
            other => DbError::from(other),
        };

        let value = match ty {
            ColumnType::BigInt => Value::BigInt(self.try_get::<Option<i64>, _>(label).map_err(mismatch)?),
            ColumnType::Text | ColumnType::Language => Value::Text(self.try_get::<Option<String>, _>(label).map_err(mismatch)?),
            ColumnType::Timestamp => Value::Timestamp(self.try_get::<Option<DateTime<Utc>>, _>(label).map_err(mismatch)?),
        };
        Ok(value)
    }
}

/// Row held in memory, keyed by label. Used to map rows without a live store.
#[derive(Debug, Clone, Default)]
pub struct MemoryRow {
    values: HashMap<String, Value>,
}

impl MemoryRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: ColumnKey, value: Value) -> Self {
        self.values.insert(key.label(), value);
        self
    }
}

impl RowAccess for MemoryRow {
    fn value(&self, label: &str, ty: ColumnType) -> Result<Value> {
        self.values.get(label).cloned().ok_or_else(|| DbError::ColumnMismatch {
            column: label.to_string(),
            expected: ty.name(),
        })
    }
}

/// A field type that can be read from and written to a column.
pub trait ColumnValue: Sized {
    const TYPE: ColumnType;

    /// Convert a stored value. `Ok(None)` for NULL, `Err` when the value holds another type.
    fn from_value(value: Value) -> std::result::Result<Option<Self>, Value>;

    /// Storage representation of an optional field.
    fn to_value(field: Option<&Self>) -> Value;
}

impl ColumnValue for i64 {
    const TYPE: ColumnType = ColumnType::BigInt;

    fn from_value(value: Value) -> std::result::Result<Option<Self>, Value> {
        match value {
            Value::BigInt(v) => Ok(v),
            other => Err(other),
        }
    }

    fn to_value(field: Option<&Self>) -> Value {
        Value::BigInt(field.copied())
    }
}

impl ColumnValue for String {
    const TYPE: ColumnType = ColumnType::Text;

    fn from_value(value: Value) -> std::result::Result<Option<Self>, Value> {
        match value {
            Value::Text(v) => Ok(v),
            other => Err(other),
        }
    }

    fn to_value(field: Option<&Self>) -> Value {
        Value::Text(field.cloned())
    }
}

impl ColumnValue for DateTime<Utc> {
    const TYPE: ColumnType = ColumnType::Timestamp;

    fn from_value(value: Value) -> std::result::Result<Option<Self>, Value> {
        match value {
            Value::Timestamp(v) => Ok(v),
            other => Err(other),
        }
    }

    fn to_value(field: Option<&Self>) -> Value {
        Value::Timestamp(field.copied())
    }
}

impl ColumnValue for Language {
    const TYPE: ColumnType = ColumnType::Language;

    fn from_value(value: Value) -> std::result::Result<Option<Self>, Value> {
        match value {
            Value::Text(None) => Ok(None),
            Value::Text(Some(text)) => match text.parse() {
                Ok(language) => Ok(Some(language)),
                Err(_) => Err(Value::Text(Some(text))),
            },
            other => Err(other),
        }
    }

    fn to_value(field: Option<&Self>) -> Value {
        Value::Text(field.map(|l| l.as_str().to_string()))
    }
}

/// Read the column at `key` as `T`.
pub fn convert<T: ColumnValue>(row: &impl RowAccess, key: ColumnKey) -> Result<Option<T>> {
    let label = key.label();
    let value = row.value(&label, T::TYPE)?;
    T::from_value(value).map_err(|_| DbError::ColumnMismatch {
        column: label,
        expected: T::TYPE.name(),
    })
}
