//! Otelpipe CLI
//!
//! Reads newline-delimited JSON telemetry events from stdin and forwards
//! them to an OTLP collector through the export pipeline.
//!
//! # Usage
//!
//! ```bash
//! otelpipe --help
//! some-producer | otelpipe --endpoint http://localhost:4317
//! some-producer | otelpipe --audit --logs-fallback /var/log/otelpipe/failed.ndjson
//! ```

#![deny(unsafe_code)]

use anyhow::{bail, Context, Result};
use clap::Parser;
use pipeline::config::{self, FallbackOptions, Protocol, SinkOptions};
use pipeline::fallback::FallbackFormat;
use pipeline::models::{Level, TelemetryEvent};
use pipeline::sinks::OtlpSink;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Otelpipe - forward telemetry events to an OTLP collector
#[derive(Parser)]
#[command(name = "otelpipe")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// OTLP collector base endpoint
    #[arg(short, long, default_value = "http://localhost:4317")]
    endpoint: String,

    /// OTLP transport protocol (grpc | http/protobuf)
    #[arg(short, long, default_value = "grpc")]
    protocol: Protocol,

    /// Static header sent with every request, as key=value (repeatable)
    #[arg(long = "header", value_name = "KEY=VALUE")]
    headers: Vec<String>,

    /// Resource attribute, as key=value (repeatable)
    #[arg(long = "resource", value_name = "KEY=VALUE")]
    resource_attributes: Vec<String>,

    /// Minimum level for forwarded events
    #[arg(long, default_value = "trace", value_parser = parse_level)]
    min_level: Level,

    /// Deliver synchronously and fail loudly instead of batching
    #[arg(long)]
    audit: bool,

    /// Fallback file for failed logs exports
    #[arg(long, value_name = "PATH")]
    logs_fallback: Option<PathBuf>,

    /// Fallback file for failed traces exports
    #[arg(long, value_name = "PATH")]
    traces_fallback: Option<PathBuf>,

    /// Serialization format for fallback records (ndjson | protobuf)
    #[arg(long, default_value = "ndjson")]
    fallback_format: FallbackFormat,

    /// Maximum number of events per batch
    #[arg(long, default_value_t = 1000)]
    max_batch_size: usize,

    /// Flush period for partial batches, in milliseconds
    #[arg(long, default_value_t = 2000)]
    flush_period_ms: u64,

    /// Ignore the standard OTLP exporter environment variables
    #[arg(long)]
    ignore_environment: bool,
}

fn parse_level(value: &str) -> Result<Level, String> {
    match value.to_ascii_lowercase().as_str() {
        "trace" => Ok(Level::Trace),
        "debug" => Ok(Level::Debug),
        "info" => Ok(Level::Info),
        "warn" => Ok(Level::Warn),
        "error" => Ok(Level::Error),
        "fatal" => Ok(Level::Fatal),
        other => Err(format!("unknown level: {other}")),
    }
}

fn parse_pair(entry: &str) -> Result<(String, String)> {
    entry
        .split_once('=')
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .with_context(|| format!("expected key=value, got {entry:?}"))
}

fn build_options(cli: &Cli) -> Result<SinkOptions> {
    let mut options = SinkOptions::default();
    options.set_endpoint(&cli.endpoint);
    options.protocol = cli.protocol;
    options.min_level = cli.min_level;
    options.batching.max_batch_size = cli.max_batch_size;
    options.batching.flush_period = Duration::from_millis(cli.flush_period_ms);

    for entry in &cli.headers {
        let (key, value) = parse_pair(entry)?;
        options.headers.insert(key, value);
    }
    for entry in &cli.resource_attributes {
        let (key, value) = parse_pair(entry)?;
        options
            .resource_attributes
            .insert(key, serde_json::Value::String(value));
    }

    if let Some(path) = &cli.logs_fallback {
        options.logs_fallback = FallbackOptions::to_file(path, cli.fallback_format);
    }
    if let Some(path) = &cli.traces_fallback {
        options.traces_fallback = FallbackOptions::to_file(path, cli.fallback_format);
    }

    if !cli.ignore_environment {
        config::env::apply(&mut options, |name| std::env::var(name).ok())?;
    }

    Ok(options)
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let options = build_options(&cli)?;

    let sink = if cli.audit {
        OtlpSink::audit(options)?
    } else {
        OtlpSink::batched(options)?
    };

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut failed_exports: u64 = 0;
    let mut malformed_lines: u64 = 0;

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let event: TelemetryEvent = match serde_json::from_str(&line) {
            Ok(event) => event,
            Err(error) => {
                malformed_lines += 1;
                tracing::warn!(%error, "skipping malformed event line");
                continue;
            }
        };

        if let Err(error) = sink.emit(event).await {
            failed_exports += 1;
            tracing::error!(%error, "export failed");
        }
    }

    sink.close().await;

    if malformed_lines > 0 {
        tracing::warn!(malformed_lines, "some input lines were skipped");
    }
    if failed_exports > 0 {
        bail!("{failed_exports} export(s) failed");
    }
    Ok(())
}
