//! Standard OTLP exporter environment variable overrides.
//!
//! When enabled, the [standard OTLP exporter configuration
//! variables](https://opentelemetry.io/docs/languages/sdk-configuration/otlp-exporter/)
//! override endpoint, protocol, headers, and resource attributes. Values are
//! read once, before exporter construction, through an injectable getter so
//! the logic stays testable without touching the process environment.

use crate::config::{ConfigError, SinkOptions};

const ENDPOINT: &str = "OTEL_EXPORTER_OTLP_ENDPOINT";
const LOGS_ENDPOINT: &str = "OTEL_EXPORTER_OTLP_LOGS_ENDPOINT";
const TRACES_ENDPOINT: &str = "OTEL_EXPORTER_OTLP_TRACES_ENDPOINT";
const PROTOCOL: &str = "OTEL_EXPORTER_OTLP_PROTOCOL";
const HEADERS: &str = "OTEL_EXPORTER_OTLP_HEADERS";
const RESOURCE_ATTRIBUTES: &str = "OTEL_RESOURCE_ATTRIBUTES";
const SERVICE_NAME: &str = "OTEL_SERVICE_NAME";

/// Applies OTLP environment variable overrides to the given options.
///
/// `get` supplies the value for a variable name, typically
/// `|name| std::env::var(name).ok()`.
///
/// # Errors
///
/// Returns an error when `OTEL_EXPORTER_OTLP_PROTOCOL` names an unsupported
/// protocol or a header/attribute list entry is not a `key=value` pair.
pub fn apply(
    options: &mut SinkOptions,
    get: impl Fn(&str) -> Option<String>,
) -> Result<(), ConfigError> {
    if let Some(endpoint) = get(ENDPOINT) {
        options.set_endpoint(endpoint);
    }
    if let Some(logs) = get(LOGS_ENDPOINT) {
        options.set_logs_endpoint(logs);
    }
    if let Some(traces) = get(TRACES_ENDPOINT) {
        options.set_traces_endpoint(traces);
    }
    if let Some(protocol) = get(PROTOCOL) {
        options.protocol = protocol.parse()?;
    }
    if let Some(headers) = get(HEADERS) {
        for (key, value) in parse_pairs(&headers, HEADERS)? {
            options.headers.insert(key, value);
        }
    }
    if let Some(attributes) = get(RESOURCE_ATTRIBUTES) {
        for (key, value) in parse_pairs(&attributes, RESOURCE_ATTRIBUTES)? {
            options
                .resource_attributes
                .insert(key, serde_json::Value::String(value));
        }
    }
    if let Some(service_name) = get(SERVICE_NAME) {
        options
            .resource_attributes
            .insert("service.name".to_string(), serde_json::Value::String(service_name));
    }
    Ok(())
}

/// Parses a comma-separated `key=value` list.
fn parse_pairs(raw: &str, variable: &str) -> Result<Vec<(String, String)>, ConfigError> {
    raw.split(',')
        .filter(|entry| !entry.trim().is_empty())
        .map(|entry| {
            entry
                .split_once('=')
                .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
                .ok_or_else(|| ConfigError::InvalidKeyValueList {
                    variable: variable.to_string(),
                    entry: entry.trim().to_string(),
                })
        })
        .collect()
}
