//! # docqa-telemetry
//!
//! Logging setup for docqa services.
//!
//! [`init_telemetry`] installs the process-wide `tracing` subscriber: an
//! `EnvFilter` (honouring `RUST_LOG`), a stdout layer in text or JSON format,
//! and an optional plain-text file sink. The [`capture`] module provides an
//! in-memory layer that records events so tests can assert what was logged.
//!
//! ```rust,ignore
//! use docqa_telemetry::{TelemetryConfig, init_telemetry};
//!
//! init_telemetry(&TelemetryConfig::new("docqa-server").with_log_file("app.log"))?;
//! tracing::info!("ready");
//! ```

pub mod capture;

#[cfg(test)]
mod test_capture;

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::Subscriber;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub use capture::{CapturedEvent, CapturedEvents, EventCaptureLayer};

// Keeps the file writer flushing for the lifetime of the process
static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Errors raised while installing the subscriber.
#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("invalid log format '{0}', expected 'text' or 'json'")]
    InvalidFormat(String),

    #[error("failed to prepare log file {path}: {message}")]
    LogFile { path: String, message: String },

    #[error("failed to install tracing subscriber: {0}")]
    Init(String),
}

/// Output format of the stdout layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = TelemetryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(TelemetryError::InvalidFormat(other.to_string())),
        }
    }
}

/// Settings for [`init_telemetry`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryConfig {
    pub service_name: String,
    /// Filter used when `RUST_LOG` is unset or invalid.
    pub default_filter: String,
    pub format: LogFormat,
    /// Plain-text copy of every log line; `None` logs to stdout only.
    pub log_file: Option<PathBuf>,
}

impl TelemetryConfig {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            default_filter: "info".to_string(),
            format: LogFormat::Text,
            log_file: None,
        }
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_log_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_file = Some(path.into());
        self
    }

    pub fn with_default_filter(mut self, filter: impl Into<String>) -> Self {
        self.default_filter = filter.into();
        self
    }
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_filter));

    let (text_layer, json_layer) = match config.format {
        LogFormat::Text => (Some(fmt::layer().with_target(true)), None),
        LogFormat::Json => (None, Some(fmt::layer().json().with_current_span(true))),
    };

    let file_layer = match &config.log_file {
        Some(path) => {
            let writer = file_writer(path)?;
            Some(fmt::layer().with_ansi(false).with_writer(writer))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(text_layer)
        .with(json_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| TelemetryError::Init(e.to_string()))?;

    tracing::info!(
        service = %config.service_name,
        format = ?config.format,
        log_file = ?config.log_file,
        "telemetry initialized"
    );
    Ok(())
}

fn file_writer(path: &Path) -> Result<tracing_appender::non_blocking::NonBlocking, TelemetryError> {
    let file_name = path.file_name().ok_or_else(|| TelemetryError::LogFile {
        path: path.display().to_string(),
        message: "path has no file name".to_string(),
    })?;

    let directory = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => {
            std::fs::create_dir_all(dir).map_err(|e| TelemetryError::LogFile {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
            dir.to_path_buf()
        }
        _ => PathBuf::from("."),
    };

    let appender = tracing_appender::rolling::never(directory, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let _ = LOG_GUARD.set(guard);
    Ok(writer)
}

/// A subscriber that records every event into `storage`.
///
/// Meant for `tracing::subscriber::set_default` / `with_default` in tests, so
/// capture is scoped to the current thread and does not touch the global
/// subscriber.
pub fn capturing_subscriber(storage: &CapturedEvents) -> impl Subscriber + Send + Sync + use<> {
    tracing_subscriber::registry().with(EventCaptureLayer::new(storage.clone()))
}
