//! UTF-16 text and the SQL text inputs a [`Database`](crate::Database) accepts.
//!
//! The engine is driven through UTF-8, so wide inputs are transcoded once on the
//! way in. Transcoding is strict: unpaired surrogates are reported instead of being
//! replaced.

use std::borrow::Cow;
use std::fmt;

use crate::error::SqlStreamError;

/// Owned UTF-16 text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct WideString(Vec<u16>);

impl WideString {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap raw UTF-16 code units without validating them.
    #[must_use]
    pub fn from_units(units: Vec<u16>) -> Self {
        Self(units)
    }

    #[must_use]
    pub fn as_units(&self) -> &[u16] {
        &self.0
    }

    #[must_use]
    pub fn into_units(self) -> Vec<u16> {
        self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Decode into UTF-8.
    ///
    /// # Errors
    ///
    /// Returns `SqlStreamError::ParameterError` if the units are not valid UTF-16.
    pub fn to_utf8(&self) -> Result<String, SqlStreamError> {
        decode_utf16(&self.0)
    }

    #[must_use]
    pub fn to_string_lossy(&self) -> String {
        String::from_utf16_lossy(&self.0)
    }
}

impl From<&str> for WideString {
    fn from(s: &str) -> Self {
        Self(s.encode_utf16().collect())
    }
}

impl From<String> for WideString {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl From<&[u16]> for WideString {
    fn from(units: &[u16]) -> Self {
        Self(units.to_vec())
    }
}

impl fmt::Display for WideString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_lossy())
    }
}

pub(crate) fn decode_utf16(units: &[u16]) -> Result<String, SqlStreamError> {
    String::from_utf16(units)
        .map_err(|e| SqlStreamError::ParameterError(format!("invalid UTF-16 text: {e}")))
}

/// Drop one trailing NUL, the terminator a fixed-width literal buffer carries.
pub(crate) fn strip_terminator(units: &[u16]) -> &[u16] {
    match units.split_last() {
        Some((&0, rest)) => rest,
        _ => units,
    }
}

/// SQL text in any of the accepted encodings.
pub trait SqlText<'a> {
    /// Normalise into the UTF-8 form handed to the engine.
    ///
    /// # Errors
    ///
    /// Returns `SqlStreamError::ParameterError` for wide text that is not valid UTF-16.
    fn into_sql(self) -> Result<Cow<'a, str>, SqlStreamError>;
}

impl<'a> SqlText<'a> for &'a str {
    fn into_sql(self) -> Result<Cow<'a, str>, SqlStreamError> {
        Ok(Cow::Borrowed(self))
    }
}

impl<'a> SqlText<'a> for &'a String {
    fn into_sql(self) -> Result<Cow<'a, str>, SqlStreamError> {
        Ok(Cow::Borrowed(self.as_str()))
    }
}

impl SqlText<'static> for String {
    fn into_sql(self) -> Result<Cow<'static, str>, SqlStreamError> {
        Ok(Cow::Owned(self))
    }
}

impl<'a> SqlText<'a> for &'a [u16] {
    fn into_sql(self) -> Result<Cow<'a, str>, SqlStreamError> {
        decode_utf16(strip_terminator(self)).map(Cow::Owned)
    }
}

impl<'a> SqlText<'a> for &'a WideString {
    fn into_sql(self) -> Result<Cow<'a, str>, SqlStreamError> {
        self.to_utf8().map(Cow::Owned)
    }
}

impl SqlText<'static> for WideString {
    fn into_sql(self) -> Result<Cow<'static, str>, SqlStreamError> {
        self.to_utf8().map(Cow::Owned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wide_round_trip_keeps_non_bmp_text() {
        let original = "h\u{e9}llo \u{1f600}";
        let wide = WideString::from(original);
        assert_eq!(wide.len(), original.encode_utf16().count());
        assert_eq!(wide.to_utf8().unwrap(), original);
    }

    #[test]
    fn unpaired_surrogate_is_rejected() {
        let wide = WideString::from_units(vec![0x0061, 0xD800]);
        let err = wide.to_utf8().unwrap_err();
        assert!(matches!(err, SqlStreamError::ParameterError(_)));
        assert_eq!(wide.to_string_lossy(), "a\u{fffd}");
    }

    #[test]
    fn only_a_single_terminator_is_stripped() {
        assert_eq!(strip_terminator(&[0x61, 0x62, 0]), &[0x61u16, 0x62]);
        assert_eq!(strip_terminator(&[0x61, 0, 0]), &[0x61u16, 0]);
        assert_eq!(strip_terminator(&[0x61]), &[0x61u16]);
        assert!(strip_terminator(&[]).is_empty());
    }

    #[test]
    fn wide_sql_text_decodes() {
        let units: Vec<u16> = "select 1".encode_utf16().chain([0]).collect();
        let sql = units.as_slice().into_sql().unwrap();
        assert_eq!(sql, "select 1");
    }
}
