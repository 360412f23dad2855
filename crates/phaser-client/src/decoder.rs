//! Line-to-document decoding.

use serde_json::{Map, Value};
use thiserror::Error;

/// A decoded protocol message: a JSON object keyed by field name.
pub type Document = Map<String, Value>;

/// Errors raised when an inbound line is not a JSON object.
///
/// These are fatal to the connection; the transport closes the socket rather
/// than trying to resynchronise with the server.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The line is not well-formed JSON.
    #[error("malformed JSON message: {0}")]
    Malformed(#[from] serde_json::Error),

    /// The line is valid JSON but not an object.
    #[error("expected a JSON object, found {found}")]
    NotAnObject {
        /// JSON type that was found instead.
        found: &'static str,
    },
}

/// Decodes one framed line into a [`Document`].
///
/// # Errors
///
/// Returns [`DecodeError::Malformed`] for invalid JSON and
/// [`DecodeError::NotAnObject`] when the top-level value is not an object.
pub fn decode_line(line: &str) -> Result<Document, DecodeError> {
    match serde_json::from_str::<Value>(line)? {
        Value::Object(document) => Ok(document),
        other => Err(DecodeError::NotAnObject {
            found: json_type_name(&other),
        }),
    }
}

/// Human-readable name of a JSON value's type, used in error messages.
pub(crate) const fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
