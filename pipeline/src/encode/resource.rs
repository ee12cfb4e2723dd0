//! Resource encoding and required-attribute defaulting.
//!
//! OTLP requires a small set of resource attributes to be present on every
//! export. User-supplied values are always preserved verbatim; defaults
//! only fill the gaps.

use crate::encode::common::to_key_values;
use opentelemetry_proto::tonic::resource::v1::Resource;
use std::collections::HashMap;

/// Resource attribute naming the emitting service.
pub const SERVICE_NAME: &str = "service.name";

/// Resource attribute naming the telemetry SDK.
pub const TELEMETRY_SDK_NAME: &str = "telemetry.sdk.name";

/// Resource attribute naming the SDK implementation language.
pub const TELEMETRY_SDK_LANGUAGE: &str = "telemetry.sdk.language";

/// Resource attribute carrying the SDK version.
pub const TELEMETRY_SDK_VERSION: &str = "telemetry.sdk.version";

/// Fills in OTLP-spec-required resource attributes that the user did not
/// supply.
///
/// `service.name` defaults to `unknown_service:<executable>` derived from
/// the running executable's identity (bare `unknown_service` when that
/// cannot be determined); the `telemetry.sdk.*` group defaults to this
/// pipeline's identity.
#[must_use]
pub fn add_defaults(
    mut attributes: HashMap<String, serde_json::Value>,
) -> HashMap<String, serde_json::Value> {
    attributes
        .entry(SERVICE_NAME.to_string())
        .or_insert_with(|| serde_json::Value::String(default_service_name()));
    attributes
        .entry(TELEMETRY_SDK_NAME.to_string())
        .or_insert_with(|| serde_json::Value::String("otelpipe".to_string()));
    attributes
        .entry(TELEMETRY_SDK_LANGUAGE.to_string())
        .or_insert_with(|| serde_json::Value::String("rust".to_string()));
    attributes
        .entry(TELEMETRY_SDK_VERSION.to_string())
        .or_insert_with(|| {
            serde_json::Value::String(env!("CARGO_PKG_VERSION").to_string())
        });
    attributes
}

/// Derives the default service name from the running executable.
fn default_service_name() -> String {
    std::env::current_exe()
        .ok()
        .and_then(|path| {
            path.file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
        })
        .map_or_else(
            || "unknown_service".to_string(),
            |exe| format!("unknown_service:{exe}"),
        )
}

/// Encodes resource attributes into an OTLP `Resource`, dropping values
/// that are not simple primitives.
#[must_use]
pub fn build_resource(attributes: &HashMap<String, serde_json::Value>) -> Resource {
    Resource {
        attributes: to_key_values(attributes),
        ..Default::default()
    }
}
