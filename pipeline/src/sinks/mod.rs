//! Sink orchestration.
//!
//! Per-signal sinks ([`OtlpLogsSink`], [`OtlpTracesSink`]) build one wire
//! request per batch, invoke the exporter once, and route failures to the
//! fallback writer. The composite [`OtlpSink`] dispatches each event to
//! the logs or traces sink by shape and supports two delivery modes:
//!
//! - **Batched**: fire-and-forget; events accumulate behind a bounded
//!   queue, failures are absorbed after the fallback write.
//! - **Audit**: every emission is exported inline on the caller's task so
//!   failures propagate to the caller.

pub mod batch;
pub mod logs;
pub mod traces;

pub use batch::BatchedSink;
pub use logs::OtlpLogsSink;
pub use traces::OtlpTracesSink;

use crate::config::{ConfigError, SinkOptions};
use crate::exporters::{create_exporter, ExportError, Exporter};
use crate::fallback::FileFallback;
use crate::models::{Level, TelemetryEvent};
use std::sync::Arc;

/// A sink that exports a batch of events as one wire request.
#[tonic::async_trait]
pub trait BatchSink: Send + Sync {
    /// Builds and exports one request for the batch, routing failures to
    /// fallback.
    ///
    /// # Errors
    ///
    /// Returns the original captured export error after a fallback write.
    async fn emit_batch(&self, events: &[TelemetryEvent]) -> Result<(), ExportError>;
}

/// A per-signal sink in one of the two delivery modes.
enum SignalSink {
    Batched(BatchedSink),
    Audit(Arc<dyn BatchSink>),
}

/// The top-level composite sink.
///
/// Events carrying span-defining fields are dispatched to the traces sink,
/// all others to the logs sink; events below the configured minimum level
/// are discarded. A signal without an endpoint has no sink and silently
/// drops its events.
pub struct OtlpSink {
    logs: Option<SignalSink>,
    traces: Option<SignalSink>,
    min_level: Level,
}

impl OtlpSink {
    /// Builds a batched-mode pipeline from frozen options.
    ///
    /// Spawns one background worker per configured signal; must be called
    /// within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns a fatal configuration error from exporter or fallback
    /// construction.
    pub fn batched(options: SinkOptions) -> Result<Self, ConfigError> {
        Self::build(options, true)
    }

    /// Builds an audit-mode pipeline from frozen options.
    ///
    /// Every emission is exported inline and failures propagate to the
    /// caller.
    ///
    /// # Errors
    ///
    /// Returns a fatal configuration error from exporter or fallback
    /// construction.
    pub fn audit(options: SinkOptions) -> Result<Self, ConfigError> {
        Self::build(options, false)
    }

    fn build(options: SinkOptions, batched: bool) -> Result<Self, ConfigError> {
        let exporter = create_exporter(&options)?;

        let logs = options
            .logs_endpoint()
            .is_some()
            .then(|| {
                Self::signal_sink(
                    OtlpLogsSink::new(
                        Arc::clone(&exporter),
                        options.resource_attributes.clone(),
                        options.included_data,
                        FileFallback::new(&options.logs_fallback)?,
                    ),
                    &options,
                    batched,
                )
            })
            .transpose()?;

        let traces = options
            .traces_endpoint()
            .is_some()
            .then(|| {
                Self::signal_sink(
                    OtlpTracesSink::new(
                        Arc::clone(&exporter),
                        options.resource_attributes.clone(),
                        options.included_data,
                        FileFallback::new(&options.traces_fallback)?,
                    ),
                    &options,
                    batched,
                )
            })
            .transpose()?;

        Ok(Self {
            logs,
            traces,
            min_level: options.min_level,
        })
    }

    fn signal_sink(
        sink: impl BatchSink + 'static,
        options: &SinkOptions,
        batched: bool,
    ) -> Result<SignalSink, ConfigError> {
        let sink: Arc<dyn BatchSink> = Arc::new(sink);
        Ok(if batched {
            SignalSink::Batched(BatchedSink::start(sink, options.batching))
        } else {
            SignalSink::Audit(sink)
        })
    }

    /// Emits one event into the pipeline.
    ///
    /// In batched mode this enqueues and returns immediately; in audit
    /// mode it blocks on the export (and fallback write on failure) so the
    /// caller observes the original error.
    ///
    /// # Errors
    ///
    /// In audit mode, returns the captured export error after fallback
    /// persistence; batched mode never returns an error.
    pub async fn emit(&self, event: TelemetryEvent) -> Result<(), ExportError> {
        if event.level < self.min_level {
            return Ok(());
        }

        let target = if event.is_span() {
            &self.traces
        } else {
            &self.logs
        };

        match target {
            None => Ok(()),
            Some(SignalSink::Batched(batched)) => {
                batched.emit(event);
                Ok(())
            }
            Some(SignalSink::Audit(sink)) => sink.emit_batch(std::slice::from_ref(&event)).await,
        }
    }

    /// Drains in-flight batches and joins background workers.
    ///
    /// A no-op for audit-mode pipelines.
    pub async fn close(self) {
        if let Some(SignalSink::Batched(batched)) = self.logs {
            batched.close().await;
        }
        if let Some(SignalSink::Batched(batched)) = self.traces {
            batched.close().await;
        }
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::{CollectingExporter, FailingExporter};
    use super::*;
    use crate::config::{FallbackOptions, IncludedData};
    use crate::fallback::FallbackFormat;
    use chrono::Utc;
    use std::collections::HashMap;

    fn audit_sink_with(exporter: Arc<dyn Exporter>) -> OtlpSink {
        let logs = OtlpLogsSink::new(
            Arc::clone(&exporter),
            HashMap::new(),
            IncludedData::default(),
            FileFallback::disabled(),
        );
        let traces = OtlpTracesSink::new(
            exporter,
            HashMap::new(),
            IncludedData::default(),
            FileFallback::disabled(),
        );
        OtlpSink {
            logs: Some(SignalSink::Audit(Arc::new(logs))),
            traces: Some(SignalSink::Audit(Arc::new(traces))),
            min_level: Level::Trace,
        }
    }

    #[tokio::test]
    async fn test_events_dispatch_by_shape() {
        let exporter = Arc::new(CollectingExporter::default());
        let sink = audit_sink_with(Arc::clone(&exporter) as Arc<dyn Exporter>);

        sink.emit(TelemetryEvent::new(Level::Info, "a log line"))
            .await
            .unwrap();
        sink.emit(
            TelemetryEvent::new(Level::Info, "an operation").with_span_start(Utc::now()),
        )
        .await
        .unwrap();

        assert_eq!(exporter.logs_requests().len(), 1);
        assert_eq!(exporter.traces_requests().len(), 1);
    }

    #[tokio::test]
    async fn test_min_level_filters_events() {
        let exporter = Arc::new(CollectingExporter::default());
        let mut sink = audit_sink_with(Arc::clone(&exporter) as Arc<dyn Exporter>);
        sink.min_level = Level::Warn;

        sink.emit(TelemetryEvent::new(Level::Debug, "too quiet"))
            .await
            .unwrap();
        sink.emit(TelemetryEvent::new(Level::Error, "loud enough"))
            .await
            .unwrap();

        assert_eq!(exporter.logs_requests().len(), 1);
    }

    #[tokio::test]
    async fn test_audit_mode_propagates_failures() {
        let sink = audit_sink_with(Arc::new(FailingExporter));
        let err = sink
            .emit(TelemetryEvent::new(Level::Info, "doomed"))
            .await
            .unwrap_err();
        assert!(matches!(err, ExportError::Grpc(_)));
    }

    #[tokio::test]
    async fn test_audit_mode_writes_fallback_then_propagates() {
        let path = std::env::temp_dir().join(format!(
            "otelpipe-audit-fallback-{}.ndjson",
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);

        let logs = OtlpLogsSink::new(
            Arc::new(FailingExporter),
            HashMap::new(),
            IncludedData::default(),
            FileFallback::new(&FallbackOptions::to_file(&path, FallbackFormat::Ndjson)).unwrap(),
        );
        let sink = OtlpSink {
            logs: Some(SignalSink::Audit(Arc::new(logs))),
            traces: None,
            min_level: Level::Trace,
        };

        let outcome = sink.emit(TelemetryEvent::new(Level::Info, "doomed")).await;
        assert!(outcome.is_err());
        assert_eq!(
            std::fs::read_to_string(&path).unwrap().lines().count(),
            1
        );
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn test_batched_mode_absorbs_failures_and_closes() {
        let logs = OtlpLogsSink::new(
            Arc::new(FailingExporter),
            HashMap::new(),
            IncludedData::default(),
            FileFallback::disabled(),
        );
        let sink = OtlpSink {
            logs: Some(SignalSink::Batched(BatchedSink::start(
                Arc::new(logs),
                crate::config::BatchingOptions::default(),
            ))),
            traces: None,
            min_level: Level::Trace,
        };

        sink.emit(TelemetryEvent::new(Level::Info, "doomed"))
            .await
            .unwrap();
        sink.close().await;
    }

    #[tokio::test]
    async fn test_build_from_options() {
        let sink = OtlpSink::batched(SinkOptions::default()).unwrap();
        sink.close().await;

        let audit = OtlpSink::audit(SinkOptions::default());
        assert!(audit.is_ok());
    }

    #[tokio::test]
    async fn test_signal_without_endpoint_drops_events() {
        let exporter = Arc::new(CollectingExporter::default());
        let logs = OtlpLogsSink::new(
            Arc::clone(&exporter) as Arc<dyn Exporter>,
            HashMap::new(),
            IncludedData::default(),
            FileFallback::disabled(),
        );
        let sink = OtlpSink {
            logs: Some(SignalSink::Audit(Arc::new(logs))),
            traces: None,
            min_level: Level::Trace,
        };

        // Span-shaped event with no traces sink: silently dropped.
        sink.emit(TelemetryEvent::new(Level::Info, "span").with_span_start(Utc::now()))
            .await
            .unwrap();
        assert!(exporter.traces_requests().is_empty());
    }
}
