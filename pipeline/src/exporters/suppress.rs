//! Instrumentation-suppressing exporter decorator.
//!
//! Host applications that auto-instrument outbound HTTP or gRPC calls would
//! otherwise generate recursive telemetry for the pipeline's own export
//! requests. This decorator invokes a caller-supplied hook before
//! delegating and holds the returned guard until the wrapped call finishes.

use crate::config::SuppressionHook;
use crate::exporters::{ExportResult, Exporter};
use opentelemetry_proto::tonic::collector::logs::v1::ExportLogsServiceRequest;
use opentelemetry_proto::tonic::collector::trace::v1::ExportTraceServiceRequest;

/// Wraps an exporter, suppressing instrumentation for the duration of each
/// export call.
pub struct SuppressingExporter {
    inner: Box<dyn Exporter>,
    on_begin_suppression: SuppressionHook,
}

impl SuppressingExporter {
    /// Creates the decorator around an owned inner exporter.
    #[must_use]
    pub fn new(inner: Box<dyn Exporter>, on_begin_suppression: SuppressionHook) -> Self {
        Self {
            inner,
            on_begin_suppression,
        }
    }
}

#[tonic::async_trait]
impl Exporter for SuppressingExporter {
    async fn export_logs(&self, request: &ExportLogsServiceRequest) -> ExportResult {
        let _guard = (self.on_begin_suppression)();
        self.inner.export_logs(request).await
    }

    async fn export_traces(&self, request: &ExportTraceServiceRequest) -> ExportResult {
        let _guard = (self.on_begin_suppression)();
        self.inner.export_traces(request).await
    }
}
