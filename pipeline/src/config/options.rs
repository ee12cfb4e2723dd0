//! Sink configuration options.
//!
//! [`SinkOptions`] is built mutably at startup, then consumed by sink and
//! exporter construction. Nothing in the pipeline mutates it afterwards, so
//! the constructed sinks share configuration read-only across concurrent
//! emissions.

use crate::config::ConfigError;
use crate::fallback::FallbackFormat;
use crate::models::Level;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// Default OTLP collector endpoint.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:4317";

/// Standard OTLP path suffix for the logs signal.
const LOGS_PATH: &str = "/v1/logs";

/// Standard OTLP path suffix for the traces signal.
const TRACES_PATH: &str = "/v1/traces";

/// An opaque guard returned by the instrumentation-suppression hook.
///
/// Dropping the guard ends the suppression scope.
pub type SuppressionGuard = Box<dyn std::any::Any + Send>;

/// Callback invoked before each export call to suppress recursive
/// instrumentation of the outbound request; the returned guard is held for
/// the duration of the call.
pub type SuppressionHook =
    std::sync::Arc<dyn Fn() -> SuppressionGuard + Send + Sync>;

/// The OTLP transport protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Protocol {
    /// OTLP over gRPC.
    Grpc,
    /// OTLP over HTTP with protobuf payloads.
    HttpProtobuf,
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Grpc => write!(f, "grpc"),
            Self::HttpProtobuf => write!(f, "http/protobuf"),
        }
    }
}

impl std::str::FromStr for Protocol {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "grpc" => Ok(Self::Grpc),
            "http/protobuf" | "http-protobuf" => Ok(Self::HttpProtobuf),
            other => Err(ConfigError::UnsupportedProtocol(other.to_string())),
        }
    }
}

/// Flags controlling which optional fields are included in encoded records.
///
/// Fields not requested here are omitted from the wire message, never
/// zero-valued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IncludedData {
    /// Include the trace id field when the event carries one.
    pub trace_id: bool,
    /// Include the span id field when the event carries one.
    pub span_id: bool,
    /// Include the message template text as a literal attribute.
    pub message_template_text: bool,
    /// Fill in OTLP-spec-required resource attributes before encoding.
    pub spec_required_resource_attributes: bool,
}

impl Default for IncludedData {
    fn default() -> Self {
        Self {
            trace_id: true,
            span_id: true,
            message_template_text: true,
            spec_required_resource_attributes: true,
        }
    }
}

/// Batching parameters consumed by the batched delivery mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchingOptions {
    /// Maximum number of events per export request.
    pub max_batch_size: usize,
    /// How long to wait before flushing a partial batch.
    pub flush_period: Duration,
    /// Capacity of the bounded queue between callers and the worker.
    pub queue_capacity: usize,
}

impl Default for BatchingOptions {
    fn default() -> Self {
        Self {
            max_batch_size: 1000,
            flush_period: Duration::from_secs(2),
            queue_capacity: 100_000,
        }
    }
}

/// Fallback configuration for a single signal stream.
///
/// Disabled unless a destination path is set.
#[derive(Debug, Clone, Default)]
pub struct FallbackOptions {
    /// Destination file for failed wire requests, or `None` to disable.
    pub path: Option<PathBuf>,
    /// Serialization format for persisted records.
    pub format: FallbackFormat,
}

impl FallbackOptions {
    /// Enables fallback to the given file in the given format.
    #[must_use]
    pub fn to_file(path: impl Into<PathBuf>, format: FallbackFormat) -> Self {
        Self {
            path: Some(path.into()),
            format,
        }
    }

    /// True when a destination is configured.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.path.is_some()
    }
}

/// Configuration for the export pipeline.
///
/// The shared base endpoint is normalized on assignment: surrounding
/// whitespace and trailing slashes are trimmed, and an accidentally
/// included `/v1/logs` or `/v1/traces` suffix is stripped so per-signal
/// endpoints can be derived from it.
#[derive(Clone)]
pub struct SinkOptions {
    endpoint: Option<String>,
    logs_endpoint: Option<String>,
    traces_endpoint: Option<String>,

    /// The OTLP transport protocol. Defaults to gRPC.
    pub protocol: Protocol,

    /// Static headers sent with every network request.
    pub headers: HashMap<String, String>,

    /// Attributes of the resource attached to exported telemetry. Values
    /// must be simple primitives; others are silently ignored.
    pub resource_attributes: HashMap<String, serde_json::Value>,

    /// Optional field inclusion flags.
    pub included_data: IncludedData,

    /// Minimum level for events passed through the sink.
    pub min_level: Level,

    /// Batching parameters for the batched delivery mode.
    pub batching: BatchingOptions,

    /// Fallback configuration for the logs stream.
    pub logs_fallback: FallbackOptions,

    /// Fallback configuration for the traces stream.
    pub traces_fallback: FallbackOptions,

    /// Optional hook suppressing instrumentation of outbound export calls.
    pub suppress_instrumentation: Option<SuppressionHook>,
}

impl Default for SinkOptions {
    fn default() -> Self {
        Self {
            endpoint: Some(DEFAULT_ENDPOINT.to_string()),
            logs_endpoint: None,
            traces_endpoint: None,
            protocol: Protocol::Grpc,
            headers: HashMap::new(),
            resource_attributes: HashMap::new(),
            included_data: IncludedData::default(),
            min_level: Level::Trace,
            batching: BatchingOptions::default(),
            logs_fallback: FallbackOptions::default(),
            traces_fallback: FallbackOptions::default(),
            suppress_instrumentation: None,
        }
    }
}

impl std::fmt::Debug for SinkOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SinkOptions")
            .field("endpoint", &self.endpoint)
            .field("logs_endpoint", &self.logs_endpoint)
            .field("traces_endpoint", &self.traces_endpoint)
            .field("protocol", &self.protocol)
            .field("headers", &self.headers)
            .field("resource_attributes", &self.resource_attributes)
            .field("included_data", &self.included_data)
            .field("min_level", &self.min_level)
            .field("batching", &self.batching)
            .field("logs_fallback", &self.logs_fallback)
            .field("traces_fallback", &self.traces_fallback)
            .field(
                "suppress_instrumentation",
                &self.suppress_instrumentation.is_some(),
            )
            .finish()
    }
}

impl SinkOptions {
    /// Sets the shared base endpoint, normalizing it.
    ///
    /// An empty or whitespace-only value clears the endpoint; set a
    /// per-signal endpoint instead when only one signal is desired.
    pub fn set_endpoint(&mut self, value: impl AsRef<str>) {
        let trimmed = value.as_ref().trim();
        if trimmed.is_empty() {
            self.endpoint = None;
            return;
        }

        let mut endpoint = trimmed.trim_end_matches('/');
        if let Some(stripped) = endpoint.strip_suffix(LOGS_PATH) {
            endpoint = stripped;
        } else if let Some(stripped) = endpoint.strip_suffix(TRACES_PATH) {
            endpoint = stripped;
        }
        self.endpoint = Some(endpoint.to_string());
    }

    /// Overrides the logs endpoint with a full URL, including any path
    /// components such as `/v1/logs` for the HTTP protocol.
    pub fn set_logs_endpoint(&mut self, value: impl AsRef<str>) {
        let trimmed = value.as_ref().trim();
        self.logs_endpoint = (!trimmed.is_empty()).then(|| trimmed.to_string());
    }

    /// Overrides the traces endpoint with a full URL, including any path
    /// components such as `/v1/traces` for the HTTP protocol.
    pub fn set_traces_endpoint(&mut self, value: impl AsRef<str>) {
        let trimmed = value.as_ref().trim();
        self.traces_endpoint = (!trimmed.is_empty()).then(|| trimmed.to_string());
    }

    /// The effective logs endpoint: the override if set, otherwise derived
    /// from the base endpoint (with the `/v1/logs` path appended for HTTP).
    #[must_use]
    pub fn logs_endpoint(&self) -> Option<String> {
        if let Some(ref explicit) = self.logs_endpoint {
            return Some(explicit.clone());
        }
        self.endpoint.as_ref().map(|base| match self.protocol {
            Protocol::HttpProtobuf => format!("{base}{LOGS_PATH}"),
            Protocol::Grpc => base.clone(),
        })
    }

    /// The effective traces endpoint: the override if set, otherwise
    /// derived from the base endpoint (with the `/v1/traces` path appended
    /// for HTTP).
    #[must_use]
    pub fn traces_endpoint(&self) -> Option<String> {
        if let Some(ref explicit) = self.traces_endpoint {
            return Some(explicit.clone());
        }
        self.endpoint.as_ref().map(|base| match self.protocol {
            Protocol::HttpProtobuf => format!("{base}{TRACES_PATH}"),
            Protocol::Grpc => base.clone(),
        })
    }
}
