//! Traces signal sink.

use crate::config::IncludedData;
use crate::encode::{add_defaults, build_resource, build_traces_request};
use crate::exporters::{ExportError, Exporter};
use crate::fallback::FileFallback;
use crate::models::TelemetryEvent;
use crate::sinks::BatchSink;
use opentelemetry_proto::tonic::resource::v1::Resource;
use std::collections::HashMap;
use std::sync::Arc;

/// Exports batches of span-shaped events as OTLP traces requests, routing
/// failures to the fallback writer.
pub struct OtlpTracesSink {
    exporter: Arc<dyn Exporter>,
    resource: Resource,
    included: IncludedData,
    fallback: FileFallback,
}

impl OtlpTracesSink {
    /// Creates the sink; resource attribute defaulting mirrors the logs
    /// sink.
    #[must_use]
    pub fn new(
        exporter: Arc<dyn Exporter>,
        resource_attributes: HashMap<String, serde_json::Value>,
        included: IncludedData,
        fallback: FileFallback,
    ) -> Self {
        let attributes = if included.spec_required_resource_attributes {
            add_defaults(resource_attributes)
        } else {
            resource_attributes
        };
        Self {
            exporter,
            resource: build_resource(&attributes),
            included,
            fallback,
        }
    }
}

#[tonic::async_trait]
impl BatchSink for OtlpTracesSink {
    async fn emit_batch(&self, events: &[TelemetryEvent]) -> Result<(), ExportError> {
        if events.is_empty() {
            return Ok(());
        }
        let request = build_traces_request(events, &self.resource, self.included);
        let result = self.exporter.export_traces(&request).await;
        self.fallback.log_to_fallback(result, &request).await
    }
}
