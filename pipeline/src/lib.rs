//! Otelpipe Core Library
//!
//! A resilient telemetry-export pipeline: structured log/trace events are
//! batched, encoded as OpenTelemetry Protocol (OTLP) wire messages, and
//! delivered to a collector over HTTP or gRPC, with a durable on-disk
//! fallback when delivery fails.
//!
//! # Modules
//!
//! - [`models`] - The telemetry event accepted by the pipeline
//! - [`config`] - Sink options and OTLP environment overrides
//! - [`encode`] - Event-to-OTLP request builders
//! - [`exporters`] - HTTP and gRPC transports behind a common contract
//! - [`fallback`] - On-failure persistence of outbound wire messages
//! - [`sinks`] - Batched and audit delivery orchestration
//!
//! # Example
//!
//! ```no_run
//! use pipeline::config::SinkOptions;
//! use pipeline::models::{Level, TelemetryEvent};
//! use pipeline::sinks::OtlpSink;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut options = SinkOptions::default();
//!     options.set_endpoint("http://localhost:4317");
//!
//!     let sink = OtlpSink::batched(options)?;
//!     sink.emit(TelemetryEvent::new(Level::Info, "Pipeline started"))
//!         .await?;
//!     sink.close().await;
//!     Ok(())
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod encode;
pub mod exporters;
pub mod fallback;
pub mod models;
pub mod sinks;

/// Re-export common dependencies for convenience.
pub use chrono;
pub use serde;
pub use serde_json;
