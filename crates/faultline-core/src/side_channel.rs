//! Side-channel fields: free-form JSON stored as text.
//!
//! Context, headers, cookies and similar attachments are persisted as
//! serialized JSON text. Rows written before these fields were structured may
//! hold arbitrary plain text, so decoding never fails: unparseable text is
//! kept as [`OpaqueJson::Raw`] and projected as a single-key object.

use serde_json::{Map, Value};

/// A stored side-channel value, decoded lazily at the projection boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum OpaqueJson {
    /// Text that parsed as JSON.
    Parsed(Value),
    /// Text that did not parse; kept verbatim.
    Raw(String),
}

impl OpaqueJson {
    /// Decodes stored text. Never fails.
    #[must_use]
    pub fn decode(stored: &str) -> Self {
        match serde_json::from_str(stored) {
            Ok(value) => Self::Parsed(value),
            Err(_) => Self::Raw(stored.to_owned()),
        }
    }

    /// Produces the response value. Raw text is wrapped as `{field: text}`.
    #[must_use]
    pub fn into_value(self, field: &str) -> Value {
        match self {
            Self::Parsed(value) => value,
            Self::Raw(text) => {
                let mut wrapper = Map::with_capacity(1);
                wrapper.insert(field.to_owned(), Value::String(text));
                Value::Object(wrapper)
            }
        }
    }
}

/// Projects an optional stored field. Absent or empty text yields `None`.
#[must_use]
pub fn project(field: &str, stored: Option<&str>) -> Option<Value> {
    stored
        .filter(|s| !s.is_empty())
        .map(|s| OpaqueJson::decode(s).into_value(field))
}

/// Encodes an inbound value for storage.
///
/// A JSON string is stored verbatim, so clients that already send
/// JSON-encoded text are not double-encoded. `null` is treated as absent.
#[must_use]
pub fn encode(value: Option<Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

/// Serializes an inbound value for storage, strings included, so that
/// [`project`] returns exactly the value that was sent. `null` is treated as
/// absent.
#[must_use]
pub fn encode_value(value: Option<Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_valid_json_is_parsed() {
        let value = project("context", Some(r#"{"userId": 123}"#));

        assert_eq!(value, Some(json!({"userId": 123})));
    }

    #[test]
    fn test_plain_text_falls_back_to_single_key_object() {
        let value = project("Context", Some("not json"));

        assert_eq!(value, Some(json!({"Context": "not json"})));
    }

    #[test]
    fn test_absent_and_empty_fields_project_to_none() {
        assert_eq!(project("headers", None), None);
        assert_eq!(project("headers", Some("")), None);
    }

    #[test]
    fn test_scalar_json_is_kept_as_scalar() {
        assert_eq!(project("env", Some("42")), Some(json!(42)));
        assert_eq!(project("env", Some(r#""prod""#)), Some(json!("prod")));
    }

    #[test]
    fn test_decode_is_deterministic_for_malformed_input() {
        assert_eq!(OpaqueJson::decode("{oops"), OpaqueJson::decode("{oops"));
        assert_eq!(
            OpaqueJson::decode("{oops"),
            OpaqueJson::Raw("{oops".to_owned())
        );
    }

    #[test]
    fn test_encode_keeps_strings_verbatim_and_serializes_the_rest() {
        assert_eq!(encode(Some(json!("{\"a\":1}"))), Some("{\"a\":1}".to_owned()));
        assert_eq!(encode(Some(json!({"a": 1}))), Some("{\"a\":1}".to_owned()));
        assert_eq!(encode(Some(Value::Null)), None);
        assert_eq!(encode(None), None);
    }

    #[test]
    fn test_encode_value_round_trips_strings_as_strings() {
        for sent in [json!("42"), json!("user logged in"), json!("{\"a\":1}")] {
            let stored = encode_value(Some(sent.clone()));

            assert_eq!(project("context", stored.as_deref()), Some(sent));
        }
        assert_eq!(encode_value(Some(json!({"a": 1}))), Some("{\"a\":1}".to_owned()));
        assert_eq!(encode_value(Some(Value::Null)), None);
    }
}
