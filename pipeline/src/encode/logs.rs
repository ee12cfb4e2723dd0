//! Log record encoding.
//!
//! Converts a batch of telemetry events into a single
//! `ExportLogsServiceRequest`: one resource, one scope group per distinct
//! source context (in first-seen order), records in emission order.

use crate::config::IncludedData;
use crate::encode::common::{
    decode_id, severity, to_any_value, to_key_values, to_unix_nanos, SPAN_ID_LEN, TRACE_ID_LEN,
};
use crate::encode::scope_groups;
use crate::models::{TelemetryEvent, SOURCE_CONTEXT};
use opentelemetry_proto::tonic::collector::logs::v1::ExportLogsServiceRequest;
use opentelemetry_proto::tonic::common::v1::{any_value, AnyValue, KeyValue};
use opentelemetry_proto::tonic::logs::v1::{LogRecord, ResourceLogs, ScopeLogs};
use opentelemetry_proto::tonic::resource::v1::Resource;

/// Attribute carrying the literal message template text.
pub const MESSAGE_TEMPLATE_TEXT: &str = "message_template.text";

/// Builds one resource-scoped OTLP logs request from a batch of events.
#[must_use]
pub fn build_logs_request(
    events: &[TelemetryEvent],
    resource: &Resource,
    included: IncludedData,
) -> ExportLogsServiceRequest {
    let mut groups: Vec<(Option<String>, Vec<LogRecord>)> = Vec::new();
    for event in events {
        scope_groups::push(&mut groups, event.scope(), to_log_record(event, included));
    }

    let scope_logs = groups
        .into_iter()
        .map(|(scope, log_records)| ScopeLogs {
            scope: scope_groups::to_scope(scope),
            log_records,
            ..Default::default()
        })
        .collect();

    ExportLogsServiceRequest {
        resource_logs: vec![ResourceLogs {
            resource: Some(resource.clone()),
            scope_logs,
            ..Default::default()
        }],
    }
}

/// Encodes a single event as an OTLP log record.
fn to_log_record(event: &TelemetryEvent, included: IncludedData) -> LogRecord {
    let (severity_number, severity_text) = severity(event.level);
    let nanos = to_unix_nanos(&event.timestamp);

    // The source context becomes the scope name, not a record attribute.
    let mut attributes = to_key_values(
        event
            .properties
            .iter()
            .filter(|(key, _)| key.as_str() != SOURCE_CONTEXT),
    );
    if included.message_template_text {
        attributes.push(KeyValue {
            key: MESSAGE_TEMPLATE_TEXT.to_string(),
            value: to_any_value(&serde_json::Value::String(event.message.clone())),
        });
    }

    LogRecord {
        time_unix_nano: nanos,
        observed_time_unix_nano: nanos,
        severity_number,
        severity_text: severity_text.to_string(),
        body: Some(AnyValue {
            value: Some(any_value::Value::StringValue(event.message.clone())),
        }),
        attributes,
        trace_id: if included.trace_id {
            decode_id(event.trace_id.as_deref(), TRACE_ID_LEN)
        } else {
            Vec::new()
        },
        span_id: if included.span_id {
            decode_id(event.span_id.as_deref(), SPAN_ID_LEN)
        } else {
            Vec::new()
        },
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Level;

    fn request_of(events: &[TelemetryEvent]) -> ExportLogsServiceRequest {
        build_logs_request(events, &Resource::default(), IncludedData::default())
    }

    #[test]
    fn test_default_scope_is_null() {
        let events = vec![TelemetryEvent::new(Level::Info, "Hello, world!")];
        let request = request_of(&events);

        assert_eq!(request.resource_logs.len(), 1);
        let scope_logs = &request.resource_logs[0].scope_logs;
        assert_eq!(scope_logs.len(), 1);
        assert!(scope_logs[0].scope.is_none());
    }

    #[test]
    fn test_source_context_is_instrumentation_scope() {
        let events = vec![
            TelemetryEvent::new(Level::Info, "Hello, world!").with_source_context("orders::api")
        ];
        let request = request_of(&events);

        let scope_logs = &request.resource_logs[0].scope_logs;
        assert_eq!(scope_logs.len(), 1);
        assert_eq!(
            scope_logs[0].scope.as_ref().map(|s| s.name.as_str()),
            Some("orders::api")
        );
    }

    #[test]
    fn test_scope_logs_are_grouped_in_first_seen_order() {
        let events = vec![
            TelemetryEvent::new(Level::Info, "Hello, world!").with_source_context("A"),
            TelemetryEvent::new(Level::Info, "Hello, world!").with_source_context("B"),
            TelemetryEvent::new(Level::Info, "Hello, world!").with_source_context("A"),
            TelemetryEvent::new(Level::Info, "Hello, world!"),
        ];
        let request = request_of(&events);

        let scope_logs = &request.resource_logs[0].scope_logs;
        assert_eq!(scope_logs.len(), 3);
        assert_eq!(
            scope_logs
                .iter()
                .map(|s| s.log_records.len())
                .sum::<usize>(),
            4
        );
        assert_eq!(
            scope_logs[0].scope.as_ref().map(|s| s.name.as_str()),
            Some("A")
        );
        assert_eq!(scope_logs[0].log_records.len(), 2);
        assert_eq!(
            scope_logs[1].scope.as_ref().map(|s| s.name.as_str()),
            Some("B")
        );
        assert_eq!(scope_logs[1].log_records.len(), 1);
        assert!(scope_logs[2].scope.is_none());
        assert_eq!(scope_logs[2].log_records.len(), 1);
    }

    #[test]
    fn test_absent_ids_are_omitted_even_when_requested() {
        let events = vec![TelemetryEvent::new(Level::Info, "No correlation")];
        let request = request_of(&events);

        let record = &request.resource_logs[0].scope_logs[0].log_records[0];
        assert!(record.trace_id.is_empty());
        assert!(record.span_id.is_empty());
    }

    #[test]
    fn test_present_ids_are_encoded_when_requested() {
        let events = vec![TelemetryEvent::new(Level::Info, "Correlated")
            .with_trace_id("00112233445566778899aabbccddeeff")
            .with_span_id("0011223344556677")];
        let request = request_of(&events);

        let record = &request.resource_logs[0].scope_logs[0].log_records[0];
        assert_eq!(record.trace_id.len(), TRACE_ID_LEN);
        assert_eq!(record.span_id.len(), SPAN_ID_LEN);
    }

    #[test]
    fn test_ids_are_omitted_when_not_requested() {
        let included = IncludedData {
            trace_id: false,
            span_id: false,
            ..IncludedData::default()
        };
        let events = vec![TelemetryEvent::new(Level::Info, "Correlated")
            .with_trace_id("00112233445566778899aabbccddeeff")
            .with_span_id("0011223344556677")];
        let request = build_logs_request(&events, &Resource::default(), included);

        let record = &request.resource_logs[0].scope_logs[0].log_records[0];
        assert!(record.trace_id.is_empty());
        assert!(record.span_id.is_empty());
    }

    #[test]
    fn test_message_template_attribute_follows_flag() {
        let events = vec![TelemetryEvent::new(Level::Info, "Hello {name}")];

        let with_template = request_of(&events);
        let record = &with_template.resource_logs[0].scope_logs[0].log_records[0];
        assert!(record
            .attributes
            .iter()
            .any(|kv| kv.key == MESSAGE_TEMPLATE_TEXT));

        let included = IncludedData {
            message_template_text: false,
            ..IncludedData::default()
        };
        let without = build_logs_request(&events, &Resource::default(), included);
        let record = &without.resource_logs[0].scope_logs[0].log_records[0];
        assert!(!record
            .attributes
            .iter()
            .any(|kv| kv.key == MESSAGE_TEMPLATE_TEXT));
    }

    #[test]
    fn test_severity_and_body() {
        let events = vec![TelemetryEvent::new(Level::Warn, "High memory usage")];
        let request = request_of(&events);

        let record = &request.resource_logs[0].scope_logs[0].log_records[0];
        assert_eq!(record.severity_number, 13);
        assert_eq!(record.severity_text, "Warning");
        assert_eq!(
            record.body.as_ref().and_then(|b| b.value.as_ref()),
            Some(&any_value::Value::StringValue(
                "High memory usage".to_string()
            ))
        );
    }

    #[test]
    fn test_source_context_is_not_a_record_attribute() {
        let events =
            vec![TelemetryEvent::new(Level::Info, "Hello").with_source_context("orders::api")];
        let request = request_of(&events);

        let record = &request.resource_logs[0].scope_logs[0].log_records[0];
        assert!(!record.attributes.iter().any(|kv| kv.key == SOURCE_CONTEXT));
    }

    #[test]
    fn test_non_primitive_properties_are_dropped() {
        let events = vec![TelemetryEvent::new(Level::Info, "Hello")
            .with_property("ok", "yes")
            .with_property("nested", serde_json::json!({"a": 1}))];
        let request = request_of(&events);

        let record = &request.resource_logs[0].scope_logs[0].log_records[0];
        assert!(record.attributes.iter().any(|kv| kv.key == "ok"));
        assert!(!record.attributes.iter().any(|kv| kv.key == "nested"));
    }
}
