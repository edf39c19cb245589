//! Wire formats for endpoint payloads.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

/// Errors from encoding or decoding a payload.
#[derive(Debug, Error)]
pub enum SerializerError {
    /// The value could not be encoded.
    #[error("Failed to serialize payload: {0}")]
    Encode(String),
    /// The bytes could not be decoded.
    #[error("Failed to deserialize payload: {0}")]
    Decode(String),
}

/// Converts handler results to bytes and request bodies to values.
pub trait Serializer: Send + Sync + fmt::Debug {
    /// Value written to the `Content-Type` response header.
    fn content_type(&self) -> &'static str;

    /// Encode a handler result.
    ///
    /// # Errors
    ///
    /// Returns [`SerializerError::Encode`] if the value cannot be represented.
    fn serialize(&self, value: &Value) -> Result<Vec<u8>, SerializerError>;

    /// Decode a request body.
    ///
    /// # Errors
    ///
    /// Returns [`SerializerError::Decode`] if the bytes are not valid for this format.
    fn deserialize(&self, bytes: &[u8]) -> Result<Value, SerializerError>;
}

/// JSON wire format (`application/json`).
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSerializer;

impl Serializer for JsonSerializer {
    fn content_type(&self) -> &'static str {
        "application/json"
    }

    fn serialize(&self, value: &Value) -> Result<Vec<u8>, SerializerError> {
        serde_json::to_vec(value).map_err(|e| SerializerError::Encode(e.to_string()))
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<Value, SerializerError> {
        serde_json::from_slice(bytes).map_err(|e| SerializerError::Decode(e.to_string()))
    }
}

/// Plain text (`text/plain`).
///
/// A string value is written as is; any other value is written as its JSON
/// text. Request bodies decode to a string value.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextSerializer;

impl Serializer for TextSerializer {
    fn content_type(&self) -> &'static str {
        "text/plain"
    }

    fn serialize(&self, value: &Value) -> Result<Vec<u8>, SerializerError> {
        raw_text(value)
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<Value, SerializerError> {
        utf8_text(bytes)
    }
}

/// JavaScript source (`application/javascript`), with the same encoding rules
/// as [`TextSerializer`].
#[derive(Debug, Clone, Copy, Default)]
pub struct JavaScriptSerializer;

impl Serializer for JavaScriptSerializer {
    fn content_type(&self) -> &'static str {
        "application/javascript"
    }

    fn serialize(&self, value: &Value) -> Result<Vec<u8>, SerializerError> {
        raw_text(value)
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<Value, SerializerError> {
        utf8_text(bytes)
    }
}

fn raw_text(value: &Value) -> Result<Vec<u8>, SerializerError> {
    match value {
        Value::String(text) => Ok(text.as_bytes().to_vec()),
        other => serde_json::to_vec(other).map_err(|e| SerializerError::Encode(e.to_string())),
    }
}

fn utf8_text(bytes: &[u8]) -> Result<Value, SerializerError> {
    std::str::from_utf8(bytes)
        .map(|text| Value::String(text.to_string()))
        .map_err(|e| SerializerError::Decode(e.to_string()))
}

/// Named serializer choice, as used in configuration and by
/// [`Endpoint::with_format`](crate::Endpoint::with_format).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// [`JsonSerializer`]
    #[default]
    Json,
    /// [`TextSerializer`]
    Text,
    /// [`JavaScriptSerializer`]
    #[serde(alias = "js")]
    JavaScript,
}

impl Format {
    /// Instantiate the serializer for this format.
    #[must_use]
    pub fn serializer(self) -> Arc<dyn Serializer> {
        match self {
            Self::Json => Arc::new(JsonSerializer),
            Self::Text => Arc::new(TextSerializer),
            Self::JavaScript => Arc::new(JavaScriptSerializer),
        }
    }

    /// Configuration name of the format.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Text => "text",
            Self::JavaScript => "javascript",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The format name is not one of the registered serializers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Unknown serializer format: {0}")]
pub struct UnknownFormat(pub String);

impl FromStr for Format {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "text" => Ok(Self::Text),
            "javascript" | "js" => Ok(Self::JavaScript),
            _ => Err(UnknownFormat(s.to_string())),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_content_type() {
        assert_eq!(JsonSerializer.content_type(), "application/json");
    }

    #[test]
    fn test_json_serialize() {
        let bytes = JsonSerializer
            .serialize(&json!([{"id": 1, "task": "Do the laundry"}]))
            .unwrap();
        assert_eq!(bytes, br#"[{"id":1,"task":"Do the laundry"}]"#);
    }

    #[test]
    fn test_json_deserialize_rejects_garbage() {
        let err = JsonSerializer.deserialize(b"{not json").unwrap_err();
        assert!(matches!(err, SerializerError::Decode(_)));
    }

    #[test]
    fn test_json_keeps_number_types() {
        let value = json!({"decimal": 22.755, "float": 88.322, "int": 882});
        let bytes = JsonSerializer.serialize(&value).unwrap();
        let back = JsonSerializer.deserialize(&bytes).unwrap();

        assert_eq!(back["decimal"].as_f64(), Some(22.755));
        assert_eq!(back["float"].as_f64(), Some(88.322));
        assert_eq!(back["int"].as_u64(), Some(882));
    }

    #[test]
    fn test_text_writes_strings_raw() {
        let script = json!("window.ReallyImportantVariable = XXX-XXX-001;");

        assert_eq!(
            TextSerializer.serialize(&script).unwrap(),
            b"window.ReallyImportantVariable = XXX-XXX-001;"
        );
        assert_eq!(TextSerializer.content_type(), "text/plain");
    }

    #[test]
    fn test_text_writes_other_values_as_json() {
        assert_eq!(TextSerializer.serialize(&json!({"id": 1})).unwrap(), br#"{"id":1}"#);
        assert_eq!(TextSerializer.serialize(&json!(3)).unwrap(), b"3");
    }

    #[test]
    fn test_text_deserialize() {
        assert_eq!(TextSerializer.deserialize(b"hello").unwrap(), json!("hello"));
        assert!(matches!(
            TextSerializer.deserialize(&[0xff, 0xfe]),
            Err(SerializerError::Decode(_))
        ));
    }

    #[test]
    fn test_javascript_serializer() {
        let script = json!("window.ReallyImportantVariable = XXX-XXX-002;");

        assert_eq!(JavaScriptSerializer.content_type(), "application/javascript");
        assert_eq!(
            JavaScriptSerializer.serialize(&script).unwrap(),
            b"window.ReallyImportantVariable = XXX-XXX-002;"
        );
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!("json".parse::<Format>(), Ok(Format::Json));
        assert_eq!("JSON".parse::<Format>(), Ok(Format::Json));
        assert_eq!("text".parse::<Format>(), Ok(Format::Text));
        assert_eq!("javascript".parse::<Format>(), Ok(Format::JavaScript));
        assert_eq!("js".parse::<Format>(), Ok(Format::JavaScript));
        assert_eq!(
            "non-existent".parse::<Format>(),
            Err(UnknownFormat("non-existent".to_string()))
        );
    }

    #[test]
    fn test_format_serializer() {
        assert_eq!(Format::Json.serializer().content_type(), "application/json");
        assert_eq!(Format::Text.serializer().content_type(), "text/plain");
        assert_eq!(
            Format::JavaScript.serializer().content_type(),
            "application/javascript"
        );
    }

    #[test]
    fn test_format_names_round_trip_through_display() {
        for format in [Format::Json, Format::Text, Format::JavaScript] {
            assert_eq!(format.to_string().parse::<Format>(), Ok(format));
        }
    }

    #[test]
    fn test_format_deserialize() {
        let format: Format = serde_json::from_str(r#""javascript""#).unwrap();
        assert_eq!(format, Format::JavaScript);
        let format: Format = serde_json::from_str(r#""text""#).unwrap();
        assert_eq!(format, Format::Text);
        assert!(serde_json::from_str::<Format>(r#""non-existent""#).is_err());
    }
}
