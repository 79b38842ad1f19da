use chrono::NaiveDateTime;
use serde_json::Value as JsonValue;

use crate::error::SessionError;

/// A single materialized cell value from the backend.
///
/// Drivers decode whatever the wire carries into this enum once, when the
/// result set is built; typed extraction afterwards goes through [`FromCell`]
/// and never touches the driver again.
///
/// ```rust
/// use pg_session::CellValue;
///
/// let cell = CellValue::Int(42);
/// assert_eq!(cell.as_int(), Some(&42));
/// assert!(!cell.is_null());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// Integer value (64-bit)
    Int(i64),
    /// Floating point value (64-bit)
    Float(f64),
    /// Text/string value
    Text(String),
    /// Boolean value
    Bool(bool),
    /// Timestamp value
    Timestamp(NaiveDateTime),
    /// JSON value
    Json(JsonValue),
    /// Binary data
    Bytes(Vec<u8>),
    /// NULL value
    Null,
}

impl CellValue {
    /// Check if this value is NULL.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_int(&self) -> Option<&i64> {
        if let CellValue::Int(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        if let CellValue::Text(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            CellValue::Bool(value) => Some(*value),
            CellValue::Int(0) => Some(false),
            CellValue::Int(1) => Some(true),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        if let CellValue::Float(value) = self {
            Some(*value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        match self {
            CellValue::Timestamp(value) => Some(*value),
            CellValue::Text(s) => parse_timestamp(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_json(&self) -> Option<&JsonValue> {
        if let CellValue::Json(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        if let CellValue::Bytes(value) = self {
            Some(value)
        } else {
            None
        }
    }

    /// Short label for diagnostics, e.g. in conversion error messages.
    #[must_use]
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            CellValue::Int(_) => "integer",
            CellValue::Float(_) => "float",
            CellValue::Text(_) => "text",
            CellValue::Bool(_) => "boolean",
            CellValue::Timestamp(_) => "timestamp",
            CellValue::Json(_) => "json",
            CellValue::Bytes(_) => "bytes",
            CellValue::Null => "null",
        }
    }
}

fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
}

/// Decode a [`CellValue`] into a concrete Rust type.
///
/// Implementations fail with [`SessionError::ConversionError`] when the stored
/// representation cannot be read as the requested type: non-numeric text asked
/// for as an integer, NULL asked for as a non-optional target, and so on.
/// Decoding a NULL as `Option<T>` yields `None`.
pub trait FromCell: Sized {
    fn from_cell(value: &CellValue) -> Result<Self, SessionError>;
}

fn conversion_error(value: &CellValue, target: &str) -> SessionError {
    SessionError::ConversionError(format!(
        "cannot read {} value as {target}",
        value.kind()
    ))
}

impl FromCell for i64 {
    fn from_cell(value: &CellValue) -> Result<Self, SessionError> {
        match value {
            CellValue::Int(v) => Ok(*v),
            CellValue::Text(s) => s
                .parse()
                .map_err(|_| SessionError::ConversionError(format!("invalid integer text {s:?}"))),
            other => Err(conversion_error(other, "i64")),
        }
    }
}

impl FromCell for i32 {
    fn from_cell(value: &CellValue) -> Result<Self, SessionError> {
        let wide = i64::from_cell(value)?;
        i32::try_from(wide)
            .map_err(|_| SessionError::ConversionError(format!("integer {wide} out of range for i32")))
    }
}

impl FromCell for i16 {
    fn from_cell(value: &CellValue) -> Result<Self, SessionError> {
        let wide = i64::from_cell(value)?;
        i16::try_from(wide)
            .map_err(|_| SessionError::ConversionError(format!("integer {wide} out of range for i16")))
    }
}

impl FromCell for f64 {
    fn from_cell(value: &CellValue) -> Result<Self, SessionError> {
        match value {
            CellValue::Float(v) => Ok(*v),
            #[allow(clippy::cast_precision_loss)]
            CellValue::Int(v) => Ok(*v as f64),
            CellValue::Text(s) => s
                .parse()
                .map_err(|_| SessionError::ConversionError(format!("invalid float text {s:?}"))),
            other => Err(conversion_error(other, "f64")),
        }
    }
}

impl FromCell for f32 {
    #[allow(clippy::cast_possible_truncation)]
    fn from_cell(value: &CellValue) -> Result<Self, SessionError> {
        f64::from_cell(value).map(|v| v as f32)
    }
}

impl FromCell for bool {
    fn from_cell(value: &CellValue) -> Result<Self, SessionError> {
        match value {
            CellValue::Text(s) => match s.as_str() {
                "t" | "true" => Ok(true),
                "f" | "false" => Ok(false),
                other => Err(SessionError::ConversionError(format!(
                    "invalid boolean text {other:?}"
                ))),
            },
            other => other
                .as_bool()
                .ok_or_else(|| conversion_error(other, "bool")),
        }
    }
}

impl FromCell for String {
    fn from_cell(value: &CellValue) -> Result<Self, SessionError> {
        match value {
            CellValue::Text(s) => Ok(s.clone()),
            CellValue::Int(v) => Ok(v.to_string()),
            CellValue::Float(v) => Ok(v.to_string()),
            CellValue::Bool(v) => Ok(if *v { "t" } else { "f" }.to_string()),
            CellValue::Timestamp(v) => Ok(v.format("%Y-%m-%d %H:%M:%S%.f").to_string()),
            CellValue::Json(v) => Ok(v.to_string()),
            other => Err(conversion_error(other, "String")),
        }
    }
}

impl FromCell for NaiveDateTime {
    fn from_cell(value: &CellValue) -> Result<Self, SessionError> {
        value
            .as_timestamp()
            .ok_or_else(|| conversion_error(value, "NaiveDateTime"))
    }
}

impl FromCell for JsonValue {
    fn from_cell(value: &CellValue) -> Result<Self, SessionError> {
        match value {
            CellValue::Json(v) => Ok(v.clone()),
            CellValue::Text(s) => serde_json::from_str(s)
                .map_err(|e| SessionError::ConversionError(format!("invalid json text: {e}"))),
            other => Err(conversion_error(other, "serde_json::Value")),
        }
    }
}

impl FromCell for Vec<u8> {
    fn from_cell(value: &CellValue) -> Result<Self, SessionError> {
        match value {
            CellValue::Bytes(v) => Ok(v.clone()),
            CellValue::Text(s) => Ok(s.clone().into_bytes()),
            other => Err(conversion_error(other, "Vec<u8>")),
        }
    }
}

impl<T: FromCell> FromCell for Option<T> {
    fn from_cell(value: &CellValue) -> Result<Self, SessionError> {
        if value.is_null() {
            Ok(None)
        } else {
            T::from_cell(value).map(Some)
        }
    }
}
