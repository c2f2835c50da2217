//! Tracing subscriber setup.

use std::{fs::OpenOptions, io, path::PathBuf, sync::Mutex};

use thiserror::Error;
use tracing_subscriber::{
    EnvFilter,
    fmt::writer::{BoxMakeWriter, MakeWriterExt},
};

use crate::config::{LogConfig, LogFormat};

/// Errors raised while installing the global subscriber.
#[derive(Debug, Error)]
pub enum LoggingError {
    /// The log file could not be opened for appending.
    #[error("Failed to open log file {path}: {source}")]
    File {
        /// Path that failed to open.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// A global subscriber was already installed.
    #[error("Failed to install tracing subscriber: {0}")]
    Init(String),
}

/// Builds the writer for the configured sinks. Console lines go to stdout,
/// or stderr when `stderr` is set. With neither console nor a file enabled,
/// log lines are discarded.
pub fn make_writer(config: &LogConfig) -> Result<BoxMakeWriter, LoggingError> {
    let file = match &config.file {
        Some(path) => Some(
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|source| LoggingError::File { path: path.clone(), source })?,
        ),
        None => None,
    };

    let writer = match (config.stdout, config.stderr, file) {
        (true, false, Some(file)) => BoxMakeWriter::new(io::stdout.and(Mutex::new(file))),
        (true, true, Some(file)) => BoxMakeWriter::new(io::stderr.and(Mutex::new(file))),
        (true, false, None) => BoxMakeWriter::new(io::stdout),
        (true, true, None) => BoxMakeWriter::new(io::stderr),
        (false, _, Some(file)) => BoxMakeWriter::new(Mutex::new(file)),
        (false, _, None) => BoxMakeWriter::new(io::sink),
    };
    Ok(writer)
}

/// Installs the global tracing subscriber. The filter comes from `RUST_LOG`
/// and defaults to `info`.
pub fn init_tracing(config: &LogConfig) -> Result<(), LoggingError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder =
        tracing_subscriber::fmt().with_env_filter(filter).with_writer(make_writer(config)?);

    let result = match config.format {
        LogFormat::Json => builder.json().flatten_event(true).with_current_span(false).try_init(),
        LogFormat::Text => builder.try_init(),
    };
    result.map_err(|e| LoggingError::Init(e.to_string()))
}
