//! Dynamic SQL values
//!
//! [`Value`] is the bridge between Rust values and MySQL: caller-supplied
//! values travel into statements exclusively as bound parameters built from
//! `Value`, and fetched rows decode back into `Value` by column type.

use crate::error::Result;
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use sqlx::mysql::{MySql, MySqlArguments, MySqlRow};
use sqlx::{Column, Row, TypeInfo};

/// One dynamically typed SQL value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// SQL NULL
    Null,
    /// Integer types (TINYINT through BIGINT)
    Int(i64),
    /// FLOAT / DOUBLE
    Float(f64),
    /// TINYINT(1) / BOOLEAN
    Bool(bool),
    /// Character types
    Str(String),
    /// DATETIME / TIMESTAMP
    DateTime(NaiveDateTime),
    /// DECIMAL
    Decimal(Decimal),
    /// A list of values; only meaningful inside an `IN` condition
    List(Vec<Value>),
}

impl Value {
    /// Whether this value is SQL NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Integer view of this value.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            Value::Bool(v) => Some(i64::from(*v)),
            _ => None,
        }
    }

    /// Float view of this value.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// String view of this value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(v) => Some(v),
            _ => None,
        }
    }

    /// Boolean view of this value. Integers read as `!= 0` because MySQL
    /// stores booleans as TINYINT(1).
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            Value::Int(v) => Some(*v != 0),
            _ => None,
        }
    }

    /// Datetime view of this value.
    pub fn as_datetime(&self) -> Option<&NaiveDateTime> {
        match self {
            Value::DateTime(v) => Some(v),
            _ => None,
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(f64::from(v))
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::DateTime(v)
    }
}

impl From<Decimal> for Value {
    fn from(v: Decimal) -> Self {
        Value::Decimal(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

/// Query type bound to the MySQL driver
pub(crate) type MySqlQuery<'q> = sqlx::query::Query<'q, MySql, MySqlArguments>;

/// Bind a value as a statement parameter. Lists flatten into one bind per
/// element (matching the pluralized placeholders of an `IN` predicate).
pub(crate) fn bind_value(query: MySqlQuery<'_>, value: Value) -> MySqlQuery<'_> {
    match value {
        Value::Null => query.bind(None::<String>),
        Value::Int(v) => query.bind(v),
        Value::Float(v) => query.bind(v),
        Value::Bool(v) => query.bind(v),
        Value::Str(v) => query.bind(v),
        Value::DateTime(v) => query.bind(v),
        Value::Decimal(v) => query.bind(v),
        Value::List(items) => items.into_iter().fold(query, bind_value),
    }
}

/// Decode every column of a fetched row into `(name, Value)` pairs, in
/// cursor order.
pub(crate) fn decode_row(row: &MySqlRow) -> Result<Vec<(String, Value)>> {
    let mut out = Vec::with_capacity(row.columns().len());

    for column in row.columns() {
        let index = column.ordinal();
        let type_name = column.type_info().name();

        let value = match type_name {
            "BOOLEAN" => row
                .try_get::<Option<bool>, _>(index)?
                .map(Value::Bool),
            "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" => row
                .try_get::<Option<i64>, _>(index)?
                .map(Value::Int),
            "TINYINT UNSIGNED" | "SMALLINT UNSIGNED" | "MEDIUMINT UNSIGNED" | "INT UNSIGNED"
            | "BIGINT UNSIGNED" => row
                .try_get::<Option<u64>, _>(index)?
                .map(|v| Value::Int(v as i64)),
            "FLOAT" => row
                .try_get::<Option<f32>, _>(index)?
                .map(|v| Value::Float(f64::from(v))),
            "DOUBLE" => row
                .try_get::<Option<f64>, _>(index)?
                .map(Value::Float),
            "DECIMAL" => row
                .try_get::<Option<Decimal>, _>(index)?
                .map(Value::Decimal),
            "DATETIME" | "TIMESTAMP" => row
                .try_get::<Option<NaiveDateTime>, _>(index)?
                .map(Value::DateTime),
            // Character types and anything else decode as text
            _ => row
                .try_get::<Option<String>, _>(index)?
                .map(Value::Str),
        };

        out.push((column.name().to_string(), value.unwrap_or(Value::Null)));
    }

    Ok(out)
}
