//! Span encoding.
//!
//! Converts span-shaped telemetry events into a single
//! `ExportTraceServiceRequest`, grouped by instrumentation scope exactly
//! like the logs encoder.

use crate::config::IncludedData;
use crate::encode::common::{
    decode_id, to_key_values, to_unix_nanos, SPAN_ID_LEN, TRACE_ID_LEN,
};
use crate::encode::scope_groups;
use crate::models::{Level, SpanKind, TelemetryEvent, SOURCE_CONTEXT};
use opentelemetry_proto::tonic::collector::trace::v1::ExportTraceServiceRequest;
use opentelemetry_proto::tonic::resource::v1::Resource;
use opentelemetry_proto::tonic::trace::v1::{status, ResourceSpans, ScopeSpans, Span, Status};

/// Builds one resource-scoped OTLP traces request from a batch of events.
#[must_use]
pub fn build_traces_request(
    events: &[TelemetryEvent],
    resource: &Resource,
    included: IncludedData,
) -> ExportTraceServiceRequest {
    let mut groups: Vec<(Option<String>, Vec<Span>)> = Vec::new();
    for event in events {
        scope_groups::push(&mut groups, event.scope(), to_span(event, included));
    }

    let scope_spans = groups
        .into_iter()
        .map(|(scope, spans)| ScopeSpans {
            scope: scope_groups::to_scope(scope),
            spans,
            ..Default::default()
        })
        .collect();

    ExportTraceServiceRequest {
        resource_spans: vec![ResourceSpans {
            resource: Some(resource.clone()),
            scope_spans,
            ..Default::default()
        }],
    }
}

/// Encodes a single span-shaped event as an OTLP span.
///
/// The event timestamp is the span end time; the start time comes from the
/// span start field that marked the event as a span in the first place.
fn to_span(event: &TelemetryEvent, included: IncludedData) -> Span {
    let start = event
        .span_start
        .as_ref()
        .map_or(0, to_unix_nanos);

    Span {
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
        parent_span_id: decode_id(event.parent_span_id.as_deref(), SPAN_ID_LEN),
        name: event.message.clone(),
        kind: event.span_kind.map_or(0, SpanKind::otlp_value),
        start_time_unix_nano: start,
        end_time_unix_nano: to_unix_nanos(&event.timestamp),
        attributes: to_key_values(
            event
                .properties
                .iter()
                .filter(|(key, _)| key.as_str() != SOURCE_CONTEXT),
        ),
        status: span_status(event),
        ..Default::default()
    }
}

/// Maps error-level events to an error span status; other levels leave the
/// status unset.
fn span_status(event: &TelemetryEvent) -> Option<Status> {
    (event.level >= Level::Error).then(|| Status {
        code: status::StatusCode::Error as i32,
        message: String::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn span_event(name: &str) -> TelemetryEvent {
        TelemetryEvent::new(Level::Info, name)
            .with_trace_id("00112233445566778899aabbccddeeff")
            .with_span_id("0011223344556677")
            .with_span_start(Utc::now() - Duration::milliseconds(150))
    }

    fn request_of(events: &[TelemetryEvent]) -> ExportTraceServiceRequest {
        build_traces_request(events, &Resource::default(), IncludedData::default())
    }

    #[test]
    fn test_span_shape() {
        let event = span_event("GET /orders")
            .with_parent_span_id("8877665544332211")
            .with_span_kind(SpanKind::Server);
        let request = request_of(&[event]);

        assert_eq!(request.resource_spans.len(), 1);
        let span = &request.resource_spans[0].scope_spans[0].spans[0];
        assert_eq!(span.name, "GET /orders");
        assert_eq!(span.kind, 2);
        assert_eq!(span.trace_id.len(), TRACE_ID_LEN);
        assert_eq!(span.span_id.len(), SPAN_ID_LEN);
        assert_eq!(span.parent_span_id.len(), SPAN_ID_LEN);
        assert!(span.start_time_unix_nano > 0);
        assert!(span.end_time_unix_nano >= span.start_time_unix_nano);
    }

    #[test]
    fn test_spans_group_by_scope_in_first_seen_order() {
        let events = vec![
            span_event("a").with_source_context("svc::a"),
            span_event("b").with_source_context("svc::b"),
            span_event("c").with_source_context("svc::a"),
        ];
        let request = request_of(&events);

        let scope_spans = &request.resource_spans[0].scope_spans;
        assert_eq!(scope_spans.len(), 2);
        assert_eq!(
            scope_spans[0].scope.as_ref().map(|s| s.name.as_str()),
            Some("svc::a")
        );
        assert_eq!(scope_spans[0].spans.len(), 2);
        assert_eq!(scope_spans[0].spans[0].name, "a");
        assert_eq!(scope_spans[0].spans[1].name, "c");
        assert_eq!(scope_spans[1].spans.len(), 1);
    }

    #[test]
    fn test_error_level_sets_error_status() {
        let mut event = span_event("failed op");
        event.level = Level::Error;
        let request = request_of(&[event]);

        let span = &request.resource_spans[0].scope_spans[0].spans[0];
        assert_eq!(
            span.status.as_ref().map(|s| s.code),
            Some(status::StatusCode::Error as i32)
        );
    }

    #[test]
    fn test_non_error_level_leaves_status_unset() {
        let request = request_of(&[span_event("fine")]);
        let span = &request.resource_spans[0].scope_spans[0].spans[0];
        assert!(span.status.is_none());
    }

    #[test]
    fn test_default_kind_is_unspecified() {
        let request = request_of(&[span_event("no kind")]);
        let span = &request.resource_spans[0].scope_spans[0].spans[0];
        assert_eq!(span.kind, 0);
    }
}
