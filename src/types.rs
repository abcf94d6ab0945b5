use chrono::NaiveDateTime;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Values that can be bound as statement parameters or read back from a column.
///
/// Every typed parameter is lowered into one of these before it reaches the engine:
/// ```rust
/// use sql_stream::prelude::*;
///
/// let params = vec![
///     SqlValue::Int(1),
///     SqlValue::Text("alice".into()),
///     SqlValue::Bool(true),
/// ];
/// # let _ = params;
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub enum SqlValue {
    /// Integer value (64-bit)
    Int(i64),
    /// Floating point value (64-bit)
    Float(f64),
    /// Text/string value
    Text(String),
    /// Boolean value, stored as 0 or 1
    Bool(bool),
    /// Timestamp value, stored as `YYYY-MM-DD HH:MM:SS[.fff]` text
    Timestamp(NaiveDateTime),
    /// NULL value
    #[default]
    Null,
    /// JSON value, stored as text
    JSON(JsonValue),
    /// Binary data
    Blob(Vec<u8>),
}

impl SqlValue {
    /// Check if this value is NULL
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            SqlValue::Int(i) => Some(*i),
            SqlValue::Bool(b) => Some(i64::from(*b)),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            SqlValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Booleans come back from the engine as integers, so `0` and `1` count too.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SqlValue::Bool(b) => Some(*b),
            SqlValue::Int(0) => Some(false),
            SqlValue::Int(1) => Some(true),
            _ => None,
        }
    }

    /// Timestamps are stored as text; either form is accepted.
    #[must_use]
    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        match self {
            SqlValue::Timestamp(dt) => Some(*dt),
            SqlValue::Text(s) => crate::column::parse_timestamp(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            SqlValue::Float(f) => Some(*f),
            SqlValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_blob(&self) -> Option<&[u8]> {
        match self {
            SqlValue::Blob(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Lower into the engine's value type.
    #[must_use]
    pub fn to_sqlite_value(&self) -> rusqlite::types::Value {
        use rusqlite::types::Value;

        match self {
            SqlValue::Int(i) => Value::Integer(*i),
            SqlValue::Float(f) => Value::Real(*f),
            SqlValue::Text(s) => Value::Text(s.clone()),
            SqlValue::Bool(b) => Value::Integer(i64::from(*b)),
            SqlValue::Timestamp(dt) => Value::Text(dt.format("%F %T%.f").to_string()),
            SqlValue::Null => Value::Null,
            SqlValue::JSON(jval) => Value::Text(jval.to_string()),
            SqlValue::Blob(bytes) => Value::Blob(bytes.clone()),
        }
    }
}

impl std::fmt::Display for SqlValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SqlValue::Int(i) => write!(f, "{i}"),
            SqlValue::Float(v) => f.write_str(&crate::column::real_to_text(*v)),
            SqlValue::Text(s) => f.write_str(s),
            SqlValue::Bool(b) => write!(f, "{}", i64::from(*b)),
            SqlValue::Timestamp(dt) => write!(f, "{}", dt.format("%F %T%.f")),
            SqlValue::Null => f.write_str("NULL"),
            SqlValue::JSON(j) => write!(f, "{j}"),
            SqlValue::Blob(bytes) => write!(f, "x'{}'", hex::encode(bytes)),
        }
    }
}

/// How a binder reports a failing engine call.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ErrorMode {
    /// Return the error to the caller.
    #[default]
    Raise,
    /// Log the error, set the binder's `error_occurred` flag and carry on.
    Record,
}
