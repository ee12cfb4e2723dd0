//! Batched delivery mode.
//!
//! A bounded queue decouples callers from a single background worker that
//! drains it into batches; at most one flush is in flight per sink. A
//! failed flush is absorbed after the fallback write and the batch is
//! dropped from the live pipeline.

use crate::config::BatchingOptions;
use crate::models::TelemetryEvent;
use crate::sinks::BatchSink;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

/// Fire-and-forget wrapper around a signal sink.
#[derive(Debug)]
pub struct BatchedSink {
    tx: mpsc::Sender<TelemetryEvent>,
    worker: tokio::task::JoinHandle<()>,
}

impl BatchedSink {
    /// Starts the background worker. Must be called within a tokio
    /// runtime.
    #[must_use]
    pub fn start(sink: Arc<dyn BatchSink>, options: BatchingOptions) -> Self {
        let (tx, rx) = mpsc::channel(options.queue_capacity.max(1));
        let worker = tokio::spawn(run_worker(sink, rx, options));
        Self { tx, worker }
    }

    /// Enqueues an event without blocking the caller.
    ///
    /// When the bounded queue is full (or the sink is closing) the event is
    /// dropped with a warning; batched mode never surfaces errors to
    /// callers.
    pub fn emit(&self, event: TelemetryEvent) {
        if self.tx.try_send(event).is_err() {
            tracing::warn!("telemetry queue full or closed; dropping event");
        }
    }

    /// Closes the queue, drains remaining events, and joins the worker.
    pub async fn close(self) {
        drop(self.tx);
        if let Err(error) = self.worker.await {
            tracing::warn!(%error, "batch worker terminated abnormally");
        }
    }
}

/// Drains the queue into batches bounded by size and flush period.
async fn run_worker(
    sink: Arc<dyn BatchSink>,
    mut rx: mpsc::Receiver<TelemetryEvent>,
    options: BatchingOptions,
) {
    let max_batch_size = options.max_batch_size.max(1);
    let mut buffer: Vec<TelemetryEvent> = Vec::with_capacity(max_batch_size);
    let period = options.flush_period.max(Duration::from_millis(1));
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            received = rx.recv() => match received {
                Some(event) => {
                    buffer.push(event);
                    if buffer.len() >= max_batch_size {
                        flush(&sink, &mut buffer).await;
                    }
                }
                None => break,
            },
            _ = ticker.tick() => {
                flush(&sink, &mut buffer).await;
            }
        }
    }

    // Drain in-flight events on shutdown.
    while let Ok(event) = rx.try_recv() {
        buffer.push(event);
    }
    flush(&sink, &mut buffer).await;
}

/// Sends one batch; failures were already persisted by the sink's fallback
/// path, so here the batch is dropped and the failure only logged.
async fn flush(sink: &Arc<dyn BatchSink>, buffer: &mut Vec<TelemetryEvent>) {
    if buffer.is_empty() {
        return;
    }
    let batch = std::mem::take(buffer);
    if let Err(error) = sink.emit_batch(&batch).await {
        tracing::warn!(
            %error,
            dropped = batch.len(),
            "batch export failed; batch dropped from live pipeline"
        );
    }
}
