//! Logs signal sink.

use crate::config::IncludedData;
use crate::encode::{add_defaults, build_logs_request, build_resource};
use crate::exporters::{ExportError, Exporter};
use crate::fallback::FileFallback;
use crate::models::TelemetryEvent;
use crate::sinks::BatchSink;
use opentelemetry_proto::tonic::resource::v1::Resource;
use std::collections::HashMap;
use std::sync::Arc;

/// Exports batches of log-shaped events as OTLP logs requests, routing
/// failures to the fallback writer.
pub struct OtlpLogsSink {
    exporter: Arc<dyn Exporter>,
    resource: Resource,
    included: IncludedData,
    fallback: FileFallback,
}

impl OtlpLogsSink {
    /// Creates the sink. Required resource attributes are defaulted here,
    /// once, when the corresponding included-data flag is set.
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
impl BatchSink for OtlpLogsSink {
    async fn emit_batch(&self, events: &[TelemetryEvent]) -> Result<(), ExportError> {
        if events.is_empty() {
            return Ok(());
        }
        let request = build_logs_request(events, &self.resource, self.included);
        let result = self.exporter.export_logs(&request).await;
        self.fallback.log_to_fallback(result, &request).await
    }
}
