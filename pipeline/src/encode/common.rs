//! Shared encoding helpers for OTLP wire messages.
//!
//! Attribute conversion is deliberately best-effort: only simple primitive
//! values (strings, booleans, integers, floats) are encoded, and anything
//! else is silently dropped rather than rejected.

use crate::models::Level;
use chrono::{DateTime, Utc};
use opentelemetry_proto::tonic::common::v1::{any_value, AnyValue, KeyValue};

/// Expected byte length of an OTLP trace id.
pub const TRACE_ID_LEN: usize = 16;

/// Expected byte length of an OTLP span id.
pub const SPAN_ID_LEN: usize = 8;

/// Converts a JSON value into an OTLP `AnyValue`.
///
/// Returns `None` for nulls, arrays, objects, and numbers that fit neither
/// `i64` nor `f64`; callers drop such attributes.
#[must_use]
pub fn to_any_value(value: &serde_json::Value) -> Option<AnyValue> {
    let value = match value {
        serde_json::Value::String(s) => any_value::Value::StringValue(s.clone()),
        serde_json::Value::Bool(b) => any_value::Value::BoolValue(*b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                any_value::Value::IntValue(i)
            } else {
                any_value::Value::DoubleValue(n.as_f64()?)
            }
        }
        _ => return None,
    };
    Some(AnyValue { value: Some(value) })
}

/// Converts named properties into OTLP key-value pairs, dropping entries
/// whose values are not simple primitives.
pub fn to_key_values<'a>(
    properties: impl IntoIterator<Item = (&'a String, &'a serde_json::Value)>,
) -> Vec<KeyValue> {
    properties
        .into_iter()
        .filter_map(|(key, value)| {
            to_any_value(value).map(|v| KeyValue {
                key: key.clone(),
                value: Some(v),
            })
        })
        .collect()
}

/// Maps a severity level to the OTLP severity number and text.
///
/// Numbers follow the OTLP log data model: each level maps to the first
/// value of its severity range.
#[must_use]
pub fn severity(level: Level) -> (i32, &'static str) {
    match level {
        Level::Trace => (1, "Trace"),
        Level::Debug => (5, "Debug"),
        Level::Info => (9, "Information"),
        Level::Warn => (13, "Warning"),
        Level::Error => (17, "Error"),
        Level::Fatal => (21, "Fatal"),
    }
}

/// Converts a timestamp to OTLP nanoseconds since the Unix epoch.
///
/// Pre-epoch or out-of-range timestamps encode as zero.
#[must_use]
pub fn to_unix_nanos(timestamp: &DateTime<Utc>) -> u64 {
    timestamp
        .timestamp_nanos_opt()
        .and_then(|n| u64::try_from(n).ok())
        .unwrap_or(0)
}

/// Decodes a hex trace/span id to wire bytes.
///
/// Returns an empty vector (the OTLP "unset" encoding) when the id is
/// absent, malformed, or of the wrong length; id handling is best-effort
/// like attribute conversion.
#[must_use]
pub fn decode_id(id: Option<&str>, expected_len: usize) -> Vec<u8> {
    id.and_then(|hex_id| hex::decode(hex_id).ok())
        .filter(|bytes| bytes.len() == expected_len)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_primitive_values_are_encoded() {
        assert_eq!(
            to_any_value(&json!("hello")).unwrap().value,
            Some(any_value::Value::StringValue("hello".to_string()))
        );
        assert_eq!(
            to_any_value(&json!(true)).unwrap().value,
            Some(any_value::Value::BoolValue(true))
        );
        assert_eq!(
            to_any_value(&json!(42)).unwrap().value,
            Some(any_value::Value::IntValue(42))
        );
        assert_eq!(
            to_any_value(&json!(2.5)).unwrap().value,
            Some(any_value::Value::DoubleValue(2.5))
        );
    }

    #[test]
    fn test_non_primitive_values_are_dropped() {
        assert!(to_any_value(&json!(null)).is_none());
        assert!(to_any_value(&json!([1, 2, 3])).is_none());
        assert!(to_any_value(&json!({"nested": "object"})).is_none());
    }

    #[test]
    fn test_key_values_filter_non_primitives() {
        let properties = std::collections::HashMap::from([
            ("name".to_string(), json!("value")),
            ("list".to_string(), json!([1])),
        ]);
        let encoded = to_key_values(&properties);
        assert_eq!(encoded.len(), 1);
        assert_eq!(encoded[0].key, "name");
    }

    #[test]
    fn test_severity_mapping() {
        assert_eq!(severity(Level::Trace), (1, "Trace"));
        assert_eq!(severity(Level::Debug), (5, "Debug"));
        assert_eq!(severity(Level::Info), (9, "Information"));
        assert_eq!(severity(Level::Warn), (13, "Warning"));
        assert_eq!(severity(Level::Error), (17, "Error"));
        assert_eq!(severity(Level::Fatal), (21, "Fatal"));
    }

    #[test]
    fn test_unix_nanos_conversion() {
        let ts = DateTime::parse_from_rfc3339("1970-01-01T00:00:01Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(to_unix_nanos(&ts), 1_000_000_000);
    }

    #[test]
    fn test_decode_id_valid() {
        let bytes = decode_id(Some("0123456789abcdef"), SPAN_ID_LEN);
        assert_eq!(bytes.len(), SPAN_ID_LEN);
    }

    #[test]
    fn test_decode_id_rejects_bad_input() {
        assert!(decode_id(None, SPAN_ID_LEN).is_empty());
        assert!(decode_id(Some("not-hex"), SPAN_ID_LEN).is_empty());
        assert!(decode_id(Some("0011"), SPAN_ID_LEN).is_empty());
    }
}
