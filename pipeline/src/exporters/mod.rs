//! Transport exporters.
//!
//! Every transport implements the same [`Exporter`] contract: export calls
//! never fail with `Err`; outcomes are captured into an [`ExportResult`]
//! so sinks can route failures to fallback uniformly. Construction picks
//! HTTP or gRPC from the configured protocol and optionally wraps the
//! transport in the instrumentation-suppressing decorator.

pub mod grpc;
pub mod http;
pub mod result;
pub mod suppress;

pub use grpc::GrpcExporter;
pub use http::HttpExporter;
pub use result::{ExportError, ExportResult};
pub use suppress::SuppressingExporter;

use crate::config::{ConfigError, Protocol, SinkOptions};
use opentelemetry_proto::tonic::collector::logs::v1::ExportLogsServiceRequest;
use opentelemetry_proto::tonic::collector::trace::v1::ExportTraceServiceRequest;
use std::sync::Arc;

/// Common export contract shared by all transports.
///
/// Requests are borrowed so the caller can persist the same wire message to
/// fallback after a failed attempt.
#[tonic::async_trait]
pub trait Exporter: Send + Sync {
    /// Delivers a logs request to the collector.
    async fn export_logs(&self, request: &ExportLogsServiceRequest) -> ExportResult;

    /// Delivers a traces request to the collector.
    async fn export_traces(&self, request: &ExportTraceServiceRequest) -> ExportResult;
}

/// Constructs the exporter selected by the configured protocol, wrapped in
/// the suppression decorator when a hook is configured.
///
/// # Errors
///
/// Returns a fatal configuration error when no endpoint is configured for
/// either signal, or when an endpoint or header is invalid for the selected
/// transport.
pub fn create_exporter(options: &SinkOptions) -> Result<Arc<dyn Exporter>, ConfigError> {
    let logs_endpoint = options.logs_endpoint();
    let traces_endpoint = options.traces_endpoint();
    if logs_endpoint.is_none() && traces_endpoint.is_none() {
        return Err(ConfigError::MissingEndpoint);
    }

    let transport: Box<dyn Exporter> = match options.protocol {
        Protocol::HttpProtobuf => Box::new(HttpExporter::new(
            logs_endpoint,
            traces_endpoint,
            &options.headers,
        )?),
        Protocol::Grpc => Box::new(GrpcExporter::new(
            logs_endpoint,
            traces_endpoint,
            &options.headers,
        )?),
    };

    Ok(match options.suppress_instrumentation.clone() {
        Some(hook) => Arc::new(SuppressingExporter::new(transport, hook)),
        None => Arc::from(transport),
    })
}
