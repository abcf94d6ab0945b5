//! Column extraction registry.
//!
//! [`FromColumn`] maps a receiver type to the column read that fills it. Conversions
//! follow the engine's own coercion rules as closely as the value type allows: reals
//! truncate into integers, numeric text parses by prefix, and numbers render as text.
//!
//! NULL handling is the part callers need to know about. Plain receivers collapse a
//! NULL cell into their zero or empty value (`0`, `0.0`, `false`, `""`, empty blob),
//! so a NULL is indistinguishable from a stored zero. Wrap the receiver in `Option`
//! when the difference matters.

use chrono::{DateTime, NaiveDateTime};
use rusqlite::Row;
use rusqlite::types::ValueRef;
use serde_json::Value as JsonValue;

use crate::error::SqlStreamError;
use crate::text::WideString;
use crate::types::SqlValue;

/// A type that can be read out of a single result column.
pub trait FromColumn: Sized {
    /// Convert a raw engine value.
    ///
    /// # Errors
    ///
    /// Returns `SqlStreamError::ConversionError` when the value has no sensible
    /// representation in `Self`.
    fn from_value(value: ValueRef<'_>) -> Result<Self, SqlStreamError>;

    /// Read the column at 0-based `idx` of `row`.
    ///
    /// # Errors
    ///
    /// Returns `SqlStreamError::Sqlite` if `idx` is out of range, otherwise whatever
    /// [`FromColumn::from_value`] reports.
    fn from_column(row: &Row<'_>, idx: usize) -> Result<Self, SqlStreamError> {
        let value = row.get_ref(idx)?;
        Self::from_value(value)
    }
}

fn int_of(value: ValueRef<'_>) -> i64 {
    match value {
        ValueRef::Null => 0,
        ValueRef::Integer(i) => i,
        // `as` saturates and maps NaN to 0, same as the engine.
        ValueRef::Real(f) => f as i64,
        ValueRef::Text(t) | ValueRef::Blob(t) => text_to_i64(t),
    }
}

fn real_of(value: ValueRef<'_>) -> f64 {
    match value {
        ValueRef::Null => 0.0,
        ValueRef::Integer(i) => i as f64,
        ValueRef::Real(f) => f,
        ValueRef::Text(t) | ValueRef::Blob(t) => text_to_f64(t),
    }
}

fn text_of(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => String::new(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(f) => real_to_text(f),
        ValueRef::Text(t) | ValueRef::Blob(t) => String::from_utf8_lossy(t).into_owned(),
    }
}

fn skip_space(bytes: &[u8]) -> &[u8] {
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    &bytes[start..]
}

/// Integer prefix of `bytes`, saturating on overflow. Non-numeric text reads as 0.
pub(crate) fn text_to_i64(bytes: &[u8]) -> i64 {
    let bytes = skip_space(bytes);
    let (negative, digits) = match bytes.first() {
        Some(b'-') => (true, &bytes[1..]),
        Some(b'+') => (false, &bytes[1..]),
        _ => (false, bytes),
    };

    let mut acc: i64 = 0;
    for d in digits.iter().take_while(|b| b.is_ascii_digit()) {
        let digit = i64::from(d - b'0');
        acc = if negative {
            acc.saturating_mul(10).saturating_sub(digit)
        } else {
            acc.saturating_mul(10).saturating_add(digit)
        };
    }
    acc
}

/// Length of the longest prefix of `bytes` shaped like a decimal real.
fn numeric_prefix_len(bytes: &[u8]) -> usize {
    let mut i = 0;
    if matches!(bytes.get(i), Some(b'-' | b'+')) {
        i += 1;
    }
    let int_start = i;
    while bytes.get(i).is_some_and(u8::is_ascii_digit) {
        i += 1;
    }
    let mut mantissa_digits = i - int_start;
    if bytes.get(i) == Some(&b'.') {
        let frac_start = i + 1;
        let mut j = frac_start;
        while bytes.get(j).is_some_and(u8::is_ascii_digit) {
            j += 1;
        }
        if mantissa_digits > 0 || j > frac_start {
            mantissa_digits += j - frac_start;
            i = j;
        }
    }
    if mantissa_digits == 0 {
        return 0;
    }
    if matches!(bytes.get(i), Some(b'e' | b'E')) {
        let mut j = i + 1;
        if matches!(bytes.get(j), Some(b'-' | b'+')) {
            j += 1;
        }
        let exp_start = j;
        while bytes.get(j).is_some_and(u8::is_ascii_digit) {
            j += 1;
        }
        if j > exp_start {
            i = j;
        }
    }
    i
}

/// Real-number prefix of `bytes`. Non-numeric text reads as 0.0.
pub(crate) fn text_to_f64(bytes: &[u8]) -> f64 {
    let bytes = skip_space(bytes);
    let len = numeric_prefix_len(bytes);
    std::str::from_utf8(&bytes[..len])
        .ok()
        .and_then(|s| s.parse::<f64>().ok())
        .unwrap_or(0.0)
}

/// Render a REAL the way the engine does: 15 significant digits, exponent form
/// outside `1e-4..1e15`, and always a decimal point (`1.0`, `1.0e+20`).
pub(crate) fn real_to_text(f: f64) -> String {
    if f.is_nan() {
        return "NaN".into();
    }
    if f.is_infinite() {
        return if f > 0.0 { "Inf".into() } else { "-Inf".into() };
    }

    let sci = format!("{f:.14e}");
    let Some((mantissa, exp)) = sci.split_once('e') else {
        return sci;
    };
    let exp: i32 = exp.parse().unwrap_or(0);
    if (-4..15).contains(&exp) {
        let prec = usize::try_from(14 - exp).unwrap_or(0);
        with_point(format!("{f:.prec$}"))
    } else {
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{}e{sign}{:02}", with_point(mantissa.to_string()), exp.abs())
    }
}

/// Drop trailing fraction zeros but keep at least one digit after the point.
fn with_point(mut digits: String) -> String {
    if digits.contains('.') {
        let kept = digits.trim_end_matches('0').len();
        digits.truncate(kept);
    } else {
        digits.push('.');
    }
    if digits.ends_with('.') {
        digits.push('0');
    }
    digits
}

pub(crate) fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
}

fn epoch_plus(secs: i64) -> Result<NaiveDateTime, SqlStreamError> {
    DateTime::from_timestamp(secs, 0)
        .map(|dt| dt.naive_utc())
        .ok_or_else(|| SqlStreamError::ConversionError(format!("timestamp {secs} out of range")))
}

impl FromColumn for i64 {
    fn from_value(value: ValueRef<'_>) -> Result<Self, SqlStreamError> {
        Ok(int_of(value))
    }
}

impl FromColumn for i32 {
    fn from_value(value: ValueRef<'_>) -> Result<Self, SqlStreamError> {
        // Lower 32 bits, like sqlite3_column_int.
        Ok(int_of(value) as i32)
    }
}

impl FromColumn for f64 {
    fn from_value(value: ValueRef<'_>) -> Result<Self, SqlStreamError> {
        Ok(real_of(value))
    }
}

impl FromColumn for f32 {
    fn from_value(value: ValueRef<'_>) -> Result<Self, SqlStreamError> {
        Ok(real_of(value) as f32)
    }
}

impl FromColumn for bool {
    fn from_value(value: ValueRef<'_>) -> Result<Self, SqlStreamError> {
        Ok(int_of(value) != 0)
    }
}

impl FromColumn for String {
    fn from_value(value: ValueRef<'_>) -> Result<Self, SqlStreamError> {
        Ok(text_of(value))
    }
}

impl FromColumn for WideString {
    fn from_value(value: ValueRef<'_>) -> Result<Self, SqlStreamError> {
        Ok(WideString::from(text_of(value)))
    }
}

impl FromColumn for Vec<u8> {
    fn from_value(value: ValueRef<'_>) -> Result<Self, SqlStreamError> {
        Ok(match value {
            ValueRef::Text(b) | ValueRef::Blob(b) => b.to_vec(),
            other => text_of(other).into_bytes(),
        })
    }
}

impl FromColumn for NaiveDateTime {
    fn from_value(value: ValueRef<'_>) -> Result<Self, SqlStreamError> {
        match value {
            ValueRef::Null => epoch_plus(0),
            ValueRef::Integer(secs) => epoch_plus(secs),
            ValueRef::Real(secs) => epoch_plus(secs as i64),
            ValueRef::Text(t) => {
                let s = String::from_utf8_lossy(t);
                parse_timestamp(&s).ok_or_else(|| {
                    SqlStreamError::ConversionError(format!("unrecognised timestamp: {s}"))
                })
            }
            ValueRef::Blob(_) => Err(SqlStreamError::ConversionError(
                "blob cannot be read as a timestamp".into(),
            )),
        }
    }
}

impl FromColumn for JsonValue {
    fn from_value(value: ValueRef<'_>) -> Result<Self, SqlStreamError> {
        match value {
            ValueRef::Null => Ok(JsonValue::Null),
            ValueRef::Integer(i) => Ok(JsonValue::from(i)),
            ValueRef::Real(f) => Ok(JsonValue::from(f)),
            ValueRef::Text(t) => serde_json::from_slice(t)
                .map_err(|e| SqlStreamError::ConversionError(format!("invalid JSON text: {e}"))),
            ValueRef::Blob(_) => Err(SqlStreamError::ConversionError(
                "blob cannot be read as JSON".into(),
            )),
        }
    }
}

impl FromColumn for SqlValue {
    fn from_value(value: ValueRef<'_>) -> Result<Self, SqlStreamError> {
        Ok(match value {
            ValueRef::Null => SqlValue::Null,
            ValueRef::Integer(i) => SqlValue::Int(i),
            ValueRef::Real(f) => SqlValue::Float(f),
            ValueRef::Text(t) => SqlValue::Text(String::from_utf8_lossy(t).into_owned()),
            ValueRef::Blob(b) => SqlValue::Blob(b.to_vec()),
        })
    }
}

impl<T: FromColumn> FromColumn for Option<T> {
    fn from_value(value: ValueRef<'_>) -> Result<Self, SqlStreamError> {
        match value {
            ValueRef::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}
