//! Export outcome type shared by every transport.
//!
//! [`ExportResult`] is a tri-state outcome: success, failure, or failure
//! with a captured error. Exporters never return `Err` from their public
//! methods; transport problems are captured into the result so that
//! batched and audit call sites can route fallback logic through the same
//! [`ExportResult::match_result`] combinator.

use thiserror::Error;

/// Errors captured by a failed export attempt.
///
/// The original transport error is carried intact so audit-mode callers
/// observe the same failure the transport produced.
#[derive(Debug, Error)]
pub enum ExportError {
    /// HTTP transport error or non-success status.
    #[error("HTTP export failed: {0}")]
    Http(#[from] reqwest::Error),

    /// gRPC call failed.
    #[error("gRPC export failed: {0}")]
    Grpc(#[from] tonic::Status),

    /// No endpoint is configured for the signal being exported.
    #[error("no {signal} endpoint configured")]
    MissingEndpoint {
        /// The signal ("logs" or "traces") lacking an endpoint.
        signal: &'static str,
    },
}

/// The tri-state outcome of an export call.
///
/// Invariant: a captured error implies failure; [`ExportResult::is_success`]
/// is true only when the success flag is set and no error was captured.
#[derive(Debug)]
pub struct ExportResult {
    success: bool,
    error: Option<ExportError>,
}

impl ExportResult {
    /// A successful export.
    #[must_use]
    pub fn success() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    /// A failed export with no captured error.
    #[must_use]
    pub fn failure() -> Self {
        Self {
            success: false,
            error: None,
        }
    }

    /// A failed export carrying the original transport error.
    #[must_use]
    pub fn failure_with(error: impl Into<ExportError>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
        }
    }

    /// True iff the export succeeded and no error was captured.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.success
    }

    /// The complement of [`ExportResult::is_success`].
    #[must_use]
    pub fn is_failure(&self) -> bool {
        !self.is_success()
    }

    /// Surfaces the captured error, preserving its original identity.
    ///
    /// A no-op (`Ok(())`) when no error was captured, including for plain
    /// failures constructed with [`ExportResult::failure`].
    ///
    /// # Errors
    ///
    /// Returns the captured transport error, if any.
    pub fn rethrow(self) -> Result<(), ExportError> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    /// Routes the result to one of two handlers.
    ///
    /// `on_failure` receives the result itself so it can persist state and
    /// then [`ExportResult::rethrow`] the captured error. Used uniformly by
    /// batched and audit call sites.
    pub fn match_result<T>(
        self,
        on_success: impl FnOnce() -> T,
        on_failure: impl FnOnce(Self) -> T,
    ) -> T {
        if self.is_success() {
            on_success()
        } else {
            on_failure(self)
        }
    }
}
