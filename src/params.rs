use chrono::NaiveDateTime;
use serde_json::Value as JsonValue;

use crate::error::SqlStreamError;
use crate::text::{WideString, decode_utf16, strip_terminator};
use crate::types::SqlValue;

/// A value that can be bound to a positional placeholder.
///
/// Every implementation lowers into a [`SqlValue`], so the binder issues a single
/// engine bind call per parameter whatever the source type.
pub trait IntoParam {
    /// Convert into the value handed to the engine.
    ///
    /// # Errors
    ///
    /// Returns `SqlStreamError::ParameterError` if the value cannot be represented,
    /// e.g. wide text that is not valid UTF-16.
    fn into_param(self) -> Result<SqlValue, SqlStreamError>;
}

impl IntoParam for SqlValue {
    fn into_param(self) -> Result<SqlValue, SqlStreamError> {
        Ok(self)
    }
}

impl IntoParam for &SqlValue {
    fn into_param(self) -> Result<SqlValue, SqlStreamError> {
        Ok(self.clone())
    }
}

impl IntoParam for i32 {
    fn into_param(self) -> Result<SqlValue, SqlStreamError> {
        Ok(SqlValue::Int(i64::from(self)))
    }
}

impl IntoParam for i64 {
    fn into_param(self) -> Result<SqlValue, SqlStreamError> {
        Ok(SqlValue::Int(self))
    }
}

impl IntoParam for u32 {
    fn into_param(self) -> Result<SqlValue, SqlStreamError> {
        Ok(SqlValue::Int(i64::from(self)))
    }
}

impl IntoParam for f32 {
    fn into_param(self) -> Result<SqlValue, SqlStreamError> {
        Ok(SqlValue::Float(f64::from(self)))
    }
}

impl IntoParam for f64 {
    fn into_param(self) -> Result<SqlValue, SqlStreamError> {
        Ok(SqlValue::Float(self))
    }
}

impl IntoParam for bool {
    fn into_param(self) -> Result<SqlValue, SqlStreamError> {
        Ok(SqlValue::Bool(self))
    }
}

impl IntoParam for &str {
    fn into_param(self) -> Result<SqlValue, SqlStreamError> {
        Ok(SqlValue::Text(self.to_owned()))
    }
}

impl IntoParam for String {
    fn into_param(self) -> Result<SqlValue, SqlStreamError> {
        Ok(SqlValue::Text(self))
    }
}

impl IntoParam for &String {
    fn into_param(self) -> Result<SqlValue, SqlStreamError> {
        Ok(SqlValue::Text(self.clone()))
    }
}

impl IntoParam for WideString {
    fn into_param(self) -> Result<SqlValue, SqlStreamError> {
        self.to_utf8().map(SqlValue::Text)
    }
}

impl IntoParam for &WideString {
    fn into_param(self) -> Result<SqlValue, SqlStreamError> {
        self.to_utf8().map(SqlValue::Text)
    }
}

/// Treated like wide SQL text and paths: one trailing NUL terminator is dropped.
impl IntoParam for &[u16] {
    fn into_param(self) -> Result<SqlValue, SqlStreamError> {
        decode_utf16(strip_terminator(self)).map(SqlValue::Text)
    }
}

/// Fixed-width UTF-16 literal buffers. One trailing NUL terminator is not part of
/// the text and is dropped before binding.
impl<const N: usize> IntoParam for [u16; N] {
    fn into_param(self) -> Result<SqlValue, SqlStreamError> {
        decode_utf16(strip_terminator(&self)).map(SqlValue::Text)
    }
}

impl<const N: usize> IntoParam for &[u16; N] {
    fn into_param(self) -> Result<SqlValue, SqlStreamError> {
        decode_utf16(strip_terminator(self)).map(SqlValue::Text)
    }
}

impl IntoParam for Vec<u8> {
    fn into_param(self) -> Result<SqlValue, SqlStreamError> {
        Ok(SqlValue::Blob(self))
    }
}

impl IntoParam for &[u8] {
    fn into_param(self) -> Result<SqlValue, SqlStreamError> {
        Ok(SqlValue::Blob(self.to_vec()))
    }
}

impl IntoParam for NaiveDateTime {
    fn into_param(self) -> Result<SqlValue, SqlStreamError> {
        Ok(SqlValue::Timestamp(self))
    }
}

impl IntoParam for JsonValue {
    fn into_param(self) -> Result<SqlValue, SqlStreamError> {
        Ok(SqlValue::JSON(self))
    }
}

impl<T: IntoParam> IntoParam for Option<T> {
    fn into_param(self) -> Result<SqlValue, SqlStreamError> {
        match self {
            Some(value) => value.into_param(),
            None => Ok(SqlValue::Null),
        }
    }
}

/// Parse a CLI-style typed literal: `i:42`, `f:1.5`, `t:text`, `b:true`, `x:00ff`,
/// `j:{"a":1}`, `null`. A value without a recognised prefix binds as text.
///
/// # Errors
///
/// Returns `SqlStreamError::ParameterError` if the payload does not parse as the
/// requested type.
pub fn parse_typed_literal(raw: &str) -> Result<SqlValue, SqlStreamError> {
    if raw.eq_ignore_ascii_case("null") {
        return Ok(SqlValue::Null);
    }
    let Some((tag, payload)) = raw.split_once(':') else {
        return Ok(SqlValue::Text(raw.to_string()));
    };
    let bad = |kind: &str| SqlStreamError::ParameterError(format!("invalid {kind} literal: {payload}"));
    match tag {
        "i" => payload.parse().map(SqlValue::Int).map_err(|_| bad("integer")),
        "f" => payload.parse().map(SqlValue::Float).map_err(|_| bad("float")),
        "t" => Ok(SqlValue::Text(payload.to_string())),
        "b" => payload.parse().map(SqlValue::Bool).map_err(|_| bad("bool")),
        "x" => hex::decode(payload)
            .map(SqlValue::Blob)
            .map_err(|e| SqlStreamError::ParameterError(format!("invalid hex literal: {e}"))),
        "j" => serde_json::from_str(payload)
            .map(SqlValue::JSON)
            .map_err(|_| bad("json")),
        _ => Ok(SqlValue::Text(raw.to_string())),
    }
}
