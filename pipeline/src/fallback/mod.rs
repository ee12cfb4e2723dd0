//! On-failure persistence of outbound wire messages.
//!
//! When live export fails and a fallback destination is configured, the
//! raw request is appended to a local file so no telemetry is silently
//! lost. The write is best-effort: its own failure is logged and never
//! masks the original export error, which is always the one the caller
//! observes.

pub mod format;

pub use format::FallbackFormat;

use crate::config::{ConfigError, FallbackOptions};
use crate::exporters::{ExportError, ExportResult};
use serde::Serialize;
use std::path::PathBuf;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// Appends failed export requests to a local file.
///
/// Concurrent appends serialize through an internal mutex so records are
/// never interleaved.
#[derive(Debug)]
pub struct FileFallback {
    inner: Option<Writer>,
}

#[derive(Debug)]
struct Writer {
    file: Mutex<tokio::fs::File>,
    format: FallbackFormat,
    path: PathBuf,
}

impl FileFallback {
    /// A no-op fallback used when no destination is configured.
    #[must_use]
    pub fn disabled() -> Self {
        Self { inner: None }
    }

    /// Creates a fallback writer for the given options; disabled options
    /// yield a no-op.
    ///
    /// # Errors
    ///
    /// Returns a fatal configuration error when the destination file
    /// cannot be opened for appending.
    pub fn new(options: &FallbackOptions) -> Result<Self, ConfigError> {
        let Some(path) = &options.path else {
            return Ok(Self::disabled());
        };

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|source| ConfigError::Fallback {
                path: path.clone(),
                source,
            })?;

        Ok(Self {
            inner: Some(Writer {
                file: Mutex::new(tokio::fs::File::from_std(file)),
                format: options.format,
                path: path.clone(),
            }),
        })
    }

    /// True when a destination is configured.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.inner.is_some()
    }

    /// Routes an export outcome through the fallback path.
    ///
    /// On success this is a no-op. On failure the wire message is appended
    /// (when enabled) and the captured error is surfaced so audit-mode
    /// callers still observe the original failure; batched callers swallow
    /// the `Err` after noting it.
    ///
    /// # Errors
    ///
    /// Returns the original captured export error, if any.
    pub async fn log_to_fallback<M>(
        &self,
        result: ExportResult,
        message: &M,
    ) -> Result<(), ExportError>
    where
        M: prost::Message + Serialize + Sync,
    {
        if result.is_failure() {
            self.write(message).await;
        }
        result.match_result(|| Ok(()), ExportResult::rethrow)
    }

    /// Appends one rendered record, logging (not propagating) any write
    /// error.
    async fn write<M>(&self, message: &M)
    where
        M: prost::Message + Serialize + Sync,
    {
        let Some(writer) = &self.inner else {
            return;
        };

        let record = writer.format.render(message);
        if record.is_empty() {
            return;
        }

        let mut file = writer.file.lock().await;
        let outcome = async {
            file.write_all(&record).await?;
            file.flush().await
        }
        .await;

        if let Err(error) = outcome {
            tracing::warn!(
                path = %writer.path.display(),
                %error,
                "fallback write failed; original export error is preserved"
            );
        }
    }
}
