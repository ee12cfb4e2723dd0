//! OTLP/HTTP exporter.
//!
//! Serializes requests to protobuf bytes and POSTs them to the configured
//! per-signal endpoints with an `application/x-protobuf` content type.

use crate::config::ConfigError;
use crate::exporters::{ExportError, ExportResult, Exporter};
use opentelemetry_proto::tonic::collector::logs::v1::ExportLogsServiceRequest;
use opentelemetry_proto::tonic::collector::trace::v1::ExportTraceServiceRequest;
use prost::Message;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use std::collections::HashMap;

/// Content type for OTLP/HTTP protobuf payloads.
const CONTENT_TYPE_PROTOBUF: &str = "application/x-protobuf";

/// Sends OTLP export requests over HTTP with protobuf encoding.
#[derive(Debug)]
pub struct HttpExporter {
    client: reqwest::Client,
    logs_endpoint: Option<String>,
    traces_endpoint: Option<String>,
}

impl HttpExporter {
    /// Creates an exporter posting to the given full per-signal endpoints,
    /// attaching the configured static headers to every request.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when a header name or value is not
    /// valid for HTTP, or the underlying client cannot be constructed.
    pub fn new(
        logs_endpoint: Option<String>,
        traces_endpoint: Option<String>,
        headers: &HashMap<String, String>,
    ) -> Result<Self, ConfigError> {
        let mut default_headers = HeaderMap::new();
        for (name, value) in headers {
            let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                ConfigError::InvalidHeader {
                    name: name.clone(),
                    message: e.to_string(),
                }
            })?;
            let header_value =
                HeaderValue::from_str(value).map_err(|e| ConfigError::InvalidHeader {
                    name: name.clone(),
                    message: e.to_string(),
                })?;
            default_headers.insert(header_name, header_value);
        }

        let client = reqwest::Client::builder()
            .default_headers(default_headers)
            .build()
            .map_err(ConfigError::HttpClient)?;

        Ok(Self {
            client,
            logs_endpoint,
            traces_endpoint,
        })
    }

    /// Posts encoded protobuf bytes to one signal endpoint, capturing any
    /// transport error or non-success status into the result.
    async fn send(&self, endpoint: Option<&str>, signal: &'static str, body: Vec<u8>) -> ExportResult {
        let Some(endpoint) = endpoint else {
            return ExportResult::failure_with(ExportError::MissingEndpoint { signal });
        };

        let response = self
            .client
            .post(endpoint)
            .header(CONTENT_TYPE, CONTENT_TYPE_PROTOBUF)
            .body(body)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status);

        match response {
            Ok(_) => ExportResult::success(),
            Err(error) => {
                tracing::debug!(%endpoint, signal, %error, "OTLP HTTP export failed");
                ExportResult::failure_with(error)
            }
        }
    }
}

#[tonic::async_trait]
impl Exporter for HttpExporter {
    async fn export_logs(&self, request: &ExportLogsServiceRequest) -> ExportResult {
        self.send(self.logs_endpoint.as_deref(), "logs", request.encode_to_vec())
            .await
    }

    async fn export_traces(&self, request: &ExportTraceServiceRequest) -> ExportResult {
        self.send(
            self.traces_endpoint.as_deref(),
            "traces",
            request.encode_to_vec(),
        )
        .await
    }
}
