//! Logging setup for the `sans` binary using `tracing-subscriber`.
//!
//! The library crates only emit `tracing` events. This module installs the
//! single global subscriber that renders them.
//!
//! # Log Levels
//!
//! - `error`: fatal errors
//! - `warn`: suspicious but accepted input (e.g. a property bag without version)
//! - `info`: factory selection, command progress
//! - `debug`: builder and codec activity
//! - `trace`: everything else

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, MakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// Configuration for logging behavior.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Level applied to the workspace crates.
    pub level_filter: LevelFilter,
    /// Let `RUST_LOG` override `level_filter`.
    pub use_env_filter: bool,
    /// Whether to include timestamps in log output.
    pub with_timestamps: bool,
    /// Whether to include target (module path) in log output.
    pub with_target: bool,
    /// Whether to use ANSI colors in output.
    pub with_ansi: bool,
    pub format: LogFormat,
    /// When set, logs are appended to this file instead of stderr.
    pub log_file: Option<PathBuf>,
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable multi-field format.
    #[default]
    Pretty,
    /// Compact single-line format.
    Compact,
    /// JSON lines for machine parsing.
    Json,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level_filter: LevelFilter::WARN,
            use_env_filter: true,
            with_timestamps: false,
            with_target: false,
            with_ansi: true,
            format: LogFormat::default(),
            log_file: None,
        }
    }
}

/// Initialize the global tracing subscriber.
///
/// # Errors
///
/// Returns an error if the log file cannot be opened.
pub fn init_logging(config: &LogConfig) -> io::Result<()> {
    if let Some(path) = &config.log_file {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        init_logging_with_writer(config, SharedFileWriter::new(file));
    } else {
        init_logging_with_writer(config, io::stderr);
    }
    Ok(())
}

/// Initialize logging with a custom writer.
pub fn init_logging_with_writer<W>(config: &LogConfig, writer: W)
where
    W: for<'writer> MakeWriter<'writer> + Send + Sync + 'static,
{
    let filter = build_env_filter(config);

    match config.format {
        LogFormat::Json => {
            let layer = fmt::layer()
                .json()
                .with_writer(writer)
                .with_target(config.with_target)
                .with_span_events(fmt::format::FmtSpan::CLOSE);
            tracing_subscriber::registry()
                .with(filter)
                .with(layer)
                .init();
        }
        LogFormat::Compact => {
            let layer = fmt::layer()
                .compact()
                .with_writer(writer)
                .with_ansi(config.with_ansi)
                .with_target(config.with_target);
            if config.with_timestamps {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(layer)
                    .init();
            } else {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(layer.without_time())
                    .init();
            }
        }
        LogFormat::Pretty => {
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(config.with_ansi)
                .with_target(config.with_target);
            if config.with_timestamps {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(layer)
                    .init();
            } else {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(layer.without_time())
                    .init();
            }
        }
    }
}

#[derive(Clone)]
struct SharedFileWriter {
    file: Arc<Mutex<std::fs::File>>,
}

impl SharedFileWriter {
    fn new(file: std::fs::File) -> Self {
        Self {
            file: Arc::new(Mutex::new(file)),
        }
    }
}

struct SharedFileGuard {
    file: Arc<Mutex<std::fs::File>>,
}

impl Write for SharedFileGuard {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut guard = self
            .file
            .lock()
            .map_err(|_| io::Error::other("log file lock poisoned"))?;
        guard.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut guard = self
            .file
            .lock()
            .map_err(|_| io::Error::other("log file lock poisoned"))?;
        guard.flush()
    }
}

impl<'a> MakeWriter<'a> for SharedFileWriter {
    type Writer = SharedFileGuard;

    fn make_writer(&'a self) -> Self::Writer {
        SharedFileGuard {
            file: Arc::clone(&self.file),
        }
    }
}

/// Directive string for the configured level; other crates stay at warn.
pub fn default_directives(level: LevelFilter) -> String {
    let level = level.to_string().to_lowercase();
    format!("warn,sans_cli={level},sans_model={level},sans_state={level}")
}

fn build_env_filter(config: &LogConfig) -> EnvFilter {
    let fallback = || EnvFilter::new(default_directives(config.level_filter));
    if config.use_env_filter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| fallback())
    } else {
        fallback()
    }
}
