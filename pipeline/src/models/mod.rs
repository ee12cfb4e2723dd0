//! Data models for the export pipeline.
//!
//! This module contains the telemetry event structure that callers hand to
//! the pipeline's sinks.

pub mod event;

pub use event::{EventValidationError, Level, SpanKind, TelemetryEvent, SOURCE_CONTEXT};
