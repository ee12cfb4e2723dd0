//! Telemetry event data model.
//!
//! Defines the core `TelemetryEvent` structure accepted by the export
//! pipeline. An event is either a log record or a span, depending on
//! whether it carries span-defining fields (see [`TelemetryEvent::is_span`]).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use validator::Validate;

/// Property key carrying the emitting component's identity.
///
/// Events that set this property are grouped under an OTLP instrumentation
/// scope of the same name; events without it share a single null-scope group.
pub const SOURCE_CONTEXT: &str = "source_context";

/// Event severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    /// Detailed debug information.
    Trace,
    /// Debug information.
    Debug,
    /// Informational messages.
    Info,
    /// Warning conditions.
    Warn,
    /// Error conditions.
    Error,
    /// Critical/fatal conditions.
    Fatal,
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Trace => write!(f, "trace"),
            Self::Debug => write!(f, "debug"),
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
            Self::Fatal => write!(f, "fatal"),
        }
    }
}

impl Default for Level {
    fn default() -> Self {
        Self::Info
    }
}

/// OTLP span kind carried by span-shaped events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpanKind {
    /// Internal operation within an application.
    Internal,
    /// Server-side handling of a remote request.
    Server,
    /// Client-side of a remote call.
    Client,
    /// Initiator of an asynchronous message.
    Producer,
    /// Consumer of an asynchronous message.
    Consumer,
}

impl SpanKind {
    /// Returns the OTLP wire value for this span kind.
    #[must_use]
    pub fn otlp_value(self) -> i32 {
        match self {
            Self::Internal => 1,
            Self::Server => 2,
            Self::Client => 3,
            Self::Producer => 4,
            Self::Consumer => 5,
        }
    }
}

/// A telemetry event accepted by the pipeline.
///
/// Immutable once created; ownership passes to a sink on emission. Events
/// carrying a [`span_start`](TelemetryEvent::span_start) timestamp are
/// treated as spans and routed to the traces sink; all other events are
/// log records.
///
/// # Example
///
/// ```
/// use pipeline::models::{Level, TelemetryEvent};
///
/// let event = TelemetryEvent::new(Level::Info, "User {user_id} logged in")
///     .with_property("user_id", "12345")
///     .with_source_context("auth::sessions");
///
/// assert!(!event.is_span());
/// assert_eq!(event.scope(), Some("auth::sessions"));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TelemetryEvent {
    /// Timestamp when the event occurred. For spans, this is the end time.
    pub timestamp: DateTime<Utc>,

    /// Severity level.
    #[serde(default)]
    pub level: Level,

    /// The message template text.
    #[validate(length(min = 1, message = "Message template cannot be empty"))]
    pub message: String,

    /// Named properties attached to the event. Only primitive values
    /// (strings, booleans, integers, floats) are exported; others are
    /// silently dropped during encoding.
    #[serde(default)]
    pub properties: HashMap<String, serde_json::Value>,

    /// Optional hex-encoded trace id for distributed tracing correlation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,

    /// Optional hex-encoded span id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span_id: Option<String>,

    /// Span start timestamp. Presence marks the event as a span.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span_start: Option<DateTime<Utc>>,

    /// Optional hex-encoded parent span id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_span_id: Option<String>,

    /// Span kind; meaningful only for span-shaped events.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span_kind: Option<SpanKind>,
}

/// Errors that can occur during event validation.
#[derive(Debug, Error)]
pub enum EventValidationError {
    /// The message template is empty.
    #[error("Message template cannot be empty")]
    EmptyMessage,

    /// Validation failed with details.
    #[error("Validation failed: {0}")]
    ValidationError(#[from] validator::ValidationErrors),
}

impl TelemetryEvent {
    /// Creates a new log-shaped event with the current timestamp.
    #[must_use]
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            message: message.into(),
            properties: HashMap::new(),
            trace_id: None,
            span_id: None,
            span_start: None,
            parent_span_id: None,
            span_kind: None,
        }
    }

    /// Adds a named property to the event.
    ///
    /// # Example
    ///
    /// ```
    /// use pipeline::models::{Level, TelemetryEvent};
    ///
    /// let event = TelemetryEvent::new(Level::Info, "Request processed")
    ///     .with_property("request_id", "abc-123")
    ///     .with_property("duration_ms", 150);
    ///
    /// assert!(event.properties.contains_key("request_id"));
    /// ```
    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        self.properties.insert(
            key.into(),
            serde_json::to_value(value).unwrap_or(serde_json::Value::Null),
        );
        self
    }

    /// Sets the source context, used as the instrumentation scope name.
    #[must_use]
    pub fn with_source_context(self, context: impl Into<String>) -> Self {
        self.with_property(SOURCE_CONTEXT, context.into())
    }

    /// Sets the hex-encoded trace id.
    #[must_use]
    pub fn with_trace_id(mut self, trace_id: impl Into<String>) -> Self {
        self.trace_id = Some(trace_id.into());
        self
    }

    /// Sets the hex-encoded span id.
    #[must_use]
    pub fn with_span_id(mut self, span_id: impl Into<String>) -> Self {
        self.span_id = Some(span_id.into());
        self
    }

    /// Marks the event as a span starting at the given timestamp.
    #[must_use]
    pub fn with_span_start(mut self, start: DateTime<Utc>) -> Self {
        self.span_start = Some(start);
        self
    }

    /// Sets the hex-encoded parent span id.
    #[must_use]
    pub fn with_parent_span_id(mut self, parent: impl Into<String>) -> Self {
        self.parent_span_id = Some(parent.into());
        self
    }

    /// Sets the span kind.
    #[must_use]
    pub fn with_span_kind(mut self, kind: SpanKind) -> Self {
        self.span_kind = Some(kind);
        self
    }

    /// Returns true when the event carries span-defining fields and should
    /// be exported as a span rather than a log record.
    #[must_use]
    pub fn is_span(&self) -> bool {
        self.span_start.is_some()
    }

    /// Returns the instrumentation scope name, if the event carries one.
    #[must_use]
    pub fn scope(&self) -> Option<&str> {
        self.properties.get(SOURCE_CONTEXT).and_then(|v| v.as_str())
    }

    /// Validates the event.
    ///
    /// # Errors
    ///
    /// Returns an error if the message template is empty.
    pub fn validate_event(&self) -> Result<(), EventValidationError> {
        if self.message.is_empty() {
            return Err(EventValidationError::EmptyMessage);
        }
        self.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_new() {
        let event = TelemetryEvent::new(Level::Info, "Test message");

        assert_eq!(event.level, Level::Info);
        assert_eq!(event.message, "Test message");
        assert!(event.properties.is_empty());
        assert!(event.trace_id.is_none());
        assert!(!event.is_span());
    }

    #[test]
    fn test_event_with_properties() {
        let event = TelemetryEvent::new(Level::Debug, "Debug log")
            .with_property("user_id", "123")
            .with_property("count", 42)
            .with_property("enabled", true);

        assert_eq!(event.properties.len(), 3);
        assert_eq!(event.properties.get("user_id"), Some(&json!("123")));
        assert_eq!(event.properties.get("count"), Some(&json!(42)));
        assert_eq!(event.properties.get("enabled"), Some(&json!(true)));
    }

    #[test]
    fn test_event_scope_from_source_context() {
        let event = TelemetryEvent::new(Level::Info, "Hello").with_source_context("auth::login");
        assert_eq!(event.scope(), Some("auth::login"));

        let plain = TelemetryEvent::new(Level::Info, "Hello");
        assert_eq!(plain.scope(), None);
    }

    #[test]
    fn test_event_span_shape() {
        let event = TelemetryEvent::new(Level::Info, "GET /orders")
            .with_trace_id("0123456789abcdef0123456789abcdef")
            .with_span_id("0123456789abcdef")
            .with_span_start(Utc::now())
            .with_span_kind(SpanKind::Server);

        assert!(event.is_span());
        assert_eq!(event.span_kind, Some(SpanKind::Server));
    }

    #[test]
    fn test_event_serialization() {
        let event = TelemetryEvent::new(Level::Error, "Something failed")
            .with_property("error_code", "E001");

        let json = serde_json::to_string(&event).unwrap();

        assert!(json.contains("\"level\":\"error\""));
        assert!(json.contains("\"message\":\"Something failed\""));
        assert!(json.contains("\"error_code\":\"E001\""));
        assert!(!json.contains("span_start"));
    }

    #[test]
    fn test_event_deserialization_defaults() {
        let json = r#"{
            "timestamp": "2024-01-15T10:30:00Z",
            "message": "Simple log"
        }"#;

        let event: TelemetryEvent = serde_json::from_str(json).unwrap();

        assert_eq!(event.level, Level::Info); // default
        assert!(event.properties.is_empty()); // default
        assert!(!event.is_span());
    }

    #[test]
    fn test_event_validation_empty_message() {
        let event = TelemetryEvent::new(Level::Info, "");
        assert!(matches!(
            event.validate_event().unwrap_err(),
            EventValidationError::EmptyMessage
        ));
    }

    #[test]
    fn test_level_ordering() {
        assert!(Level::Trace < Level::Debug);
        assert!(Level::Warn < Level::Error);
        assert!(Level::Error < Level::Fatal);
    }

    #[test]
    fn test_span_kind_otlp_values() {
        assert_eq!(SpanKind::Internal.otlp_value(), 1);
        assert_eq!(SpanKind::Server.otlp_value(), 2);
        assert_eq!(SpanKind::Client.otlp_value(), 3);
        assert_eq!(SpanKind::Producer.otlp_value(), 4);
        assert_eq!(SpanKind::Consumer.otlp_value(), 5);
    }

    #[test]
    fn test_event_roundtrip() {
        let original = TelemetryEvent::new(Level::Info, "Roundtrip test")
            .with_property("key", "value")
            .with_trace_id("00112233445566778899aabbccddeeff")
            .with_span_id("0011223344556677");

        let json = serde_json::to_string(&original).unwrap();
        let deserialized: TelemetryEvent = serde_json::from_str(&json).unwrap();

        assert_eq!(original.level, deserialized.level);
        assert_eq!(original.message, deserialized.message);
        assert_eq!(original.properties, deserialized.properties);
        assert_eq!(original.trace_id, deserialized.trace_id);
        assert_eq!(original.span_id, deserialized.span_id);
    }
}
