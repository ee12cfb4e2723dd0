//! OTLP/gRPC exporter.
//!
//! Calls the standard OTLP collector service methods over a lazily
//! connected tonic channel, with configured headers applied as call
//! metadata.

use crate::config::ConfigError;
use crate::exporters::{ExportError, ExportResult, Exporter};
use opentelemetry_proto::tonic::collector::logs::v1::logs_service_client::LogsServiceClient;
use opentelemetry_proto::tonic::collector::logs::v1::ExportLogsServiceRequest;
use opentelemetry_proto::tonic::collector::trace::v1::trace_service_client::TraceServiceClient;
use opentelemetry_proto::tonic::collector::trace::v1::ExportTraceServiceRequest;
use std::collections::HashMap;
use tonic::metadata::{MetadataKey, MetadataMap, MetadataValue};
use tonic::transport::{Channel, Endpoint};

/// Sends OTLP export requests over gRPC.
#[derive(Debug)]
pub struct GrpcExporter {
    logs: Option<LogsServiceClient<Channel>>,
    traces: Option<TraceServiceClient<Channel>>,
    metadata: MetadataMap,
}

impl GrpcExporter {
    /// Creates an exporter for the given per-signal endpoints. The channel
    /// is shared when both signals target the same endpoint and connects
    /// lazily on first use.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when an endpoint is not a valid URI
    /// or a header is not valid gRPC metadata.
    pub fn new(
        logs_endpoint: Option<String>,
        traces_endpoint: Option<String>,
        headers: &HashMap<String, String>,
    ) -> Result<Self, ConfigError> {
        let metadata = build_metadata(headers)?;

        let logs_channel = logs_endpoint
            .as_deref()
            .map(make_channel)
            .transpose()?;
        let traces_channel = match (&traces_endpoint, &logs_endpoint) {
            (Some(traces), Some(logs)) if traces == logs => logs_channel.clone(),
            (Some(traces), _) => Some(make_channel(traces)?),
            (None, _) => None,
        };

        Ok(Self {
            logs: logs_channel.map(LogsServiceClient::new),
            traces: traces_channel.map(TraceServiceClient::new),
            metadata,
        })
    }

    /// Wraps a wire message in a tonic request carrying the configured
    /// metadata.
    fn to_request<T>(&self, message: T) -> tonic::Request<T> {
        let mut request = tonic::Request::new(message);
        *request.metadata_mut() = self.metadata.clone();
        request
    }
}

#[tonic::async_trait]
impl Exporter for GrpcExporter {
    async fn export_logs(&self, request: &ExportLogsServiceRequest) -> ExportResult {
        let Some(client) = &self.logs else {
            return ExportResult::failure_with(ExportError::MissingEndpoint { signal: "logs" });
        };

        match client.clone().export(self.to_request(request.clone())).await {
            Ok(_) => ExportResult::success(),
            Err(status) => {
                tracing::debug!(%status, "OTLP gRPC logs export failed");
                ExportResult::failure_with(status)
            }
        }
    }

    async fn export_traces(&self, request: &ExportTraceServiceRequest) -> ExportResult {
        let Some(client) = &self.traces else {
            return ExportResult::failure_with(ExportError::MissingEndpoint { signal: "traces" });
        };

        match client.clone().export(self.to_request(request.clone())).await {
            Ok(_) => ExportResult::success(),
            Err(status) => {
                tracing::debug!(%status, "OTLP gRPC traces export failed");
                ExportResult::failure_with(status)
            }
        }
    }
}

/// Builds a lazily connecting channel for an endpoint URI.
fn make_channel(endpoint: &str) -> Result<Channel, ConfigError> {
    Endpoint::from_shared(endpoint.to_string())
        .map(|e| e.connect_lazy())
        .map_err(|e| ConfigError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            message: e.to_string(),
        })
}

/// Converts configured headers to gRPC call metadata.
fn build_metadata(headers: &HashMap<String, String>) -> Result<MetadataMap, ConfigError> {
    let mut metadata = MetadataMap::new();
    for (name, value) in headers {
        let key = MetadataKey::from_bytes(name.to_ascii_lowercase().as_bytes()).map_err(|e| {
            ConfigError::InvalidHeader {
                name: name.clone(),
                message: e.to_string(),
            }
        })?;
        let value = MetadataValue::try_from(value.as_str()).map_err(|e| {
            ConfigError::InvalidHeader {
                name: name.clone(),
                message: e.to_string(),
            }
        })?;
        metadata.insert(key, value);
    }
    Ok(metadata)
}
