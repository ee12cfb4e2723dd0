//! Pipeline configuration.
//!
//! Options are assembled mutably (directly or via the environment override
//! in [`env`]), then frozen by handing them to sink construction.

pub mod env;
pub mod options;

pub use options::{
    BatchingOptions, FallbackOptions, IncludedData, Protocol, SinkOptions, SuppressionGuard,
    SuppressionHook, DEFAULT_ENDPOINT,
};

use std::path::PathBuf;
use thiserror::Error;

/// Fatal configuration errors, raised at setup and never retried.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The protocol value is not a supported OTLP protocol.
    #[error("unsupported OTLP protocol: {0}")]
    UnsupportedProtocol(String),

    /// Neither a base endpoint nor any per-signal endpoint is configured.
    #[error("no endpoint configured")]
    MissingEndpoint,

    /// The endpoint is not a valid URI for the selected transport.
    #[error("invalid endpoint {endpoint}: {message}")]
    InvalidEndpoint {
        /// The offending endpoint value.
        endpoint: String,
        /// Transport-reported reason.
        message: String,
    },

    /// A configured header name or value is not valid for the transport.
    #[error("invalid header {name}: {message}")]
    InvalidHeader {
        /// The offending header name.
        name: String,
        /// Transport-reported reason.
        message: String,
    },

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),

    /// The fallback destination could not be opened.
    #[error("failed to open fallback file {path}: {source}")]
    Fallback {
        /// The configured fallback destination.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// An environment variable list entry is not a `key=value` pair.
    #[error("malformed entry {entry:?} in {variable}")]
    InvalidKeyValueList {
        /// The environment variable being parsed.
        variable: String,
        /// The malformed entry.
        entry: String,
    },
}
