//! Structured logging for Kshetra
//!
//! Compact, pretty or JSONL output on stderr, per-crate levels that `-v`
//! raises for the engine crates, and optional rotated JSONL files. Spans opened under a [`UserContextGuard`] carry the
//! signed-in user, so a navigation session can be followed through the
//! selection controller and the report aggregator.
//!
//! # Quick Start
//!
//! ```ignore
//! use kshetra_logging::{KshetraSubscriberBuilder, LogConfig};
//!
//! // Warnings only, one line per event on stderr
//! let _guard = KshetraSubscriberBuilder::new().init()?;
//!
//! // Engine crates at debug, everything else from the config file
//! let _guard = KshetraSubscriberBuilder::new()
//!     .with_config(config.logging)
//!     .with_verbosity(1)
//!     .init()?;
//! ```
//!
//! # User Context
//!
//! ```ignore
//! use kshetra_logging::UserContextGuard;
//!
//! let _ctx = UserContextGuard::new(&auth);
//! tracing::info!("selection mounted");
//! ```

pub mod config;
pub mod context;
pub mod layers;

pub use config::{ConsoleFormat, ENGINE_TARGETS, FileConfig, LogConfig, RotationStrategy};
pub use context::{UserContextData, UserContextGuard, user_span};
pub use layers::{UserContextExtension, UserContextLayer};

use std::io::IsTerminal;

use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, registry::Registry};

/// Errors raised while installing the global subscriber
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("invalid log filter: {0}")]
    Filter(#[from] tracing_subscriber::filter::ParseError),

    #[error("cannot open log file: {0}")]
    File(#[from] tracing_appender::rolling::InitError),

    #[error("subscriber already installed: {0}")]
    Init(#[from] tracing_subscriber::util::TryInitError),
}

/// Builder for the Kshetra tracing subscriber
pub struct KshetraSubscriberBuilder {
    config: LogConfig,
}

impl KshetraSubscriberBuilder {
    pub fn new() -> Self {
        Self {
            config: LogConfig::default(),
        }
    }

    /// Use custom configuration
    pub fn with_config(mut self, config: LogConfig) -> Self {
        self.config = config;
        self
    }

    /// Turn up the engine crates, see [`LogConfig::with_verbosity`]
    pub fn with_verbosity(mut self, verbose: u8) -> Self {
        self.config = self.config.with_verbosity(verbose);
        self
    }

    /// Write JSONL to rotated files under `directory`
    pub fn with_file_output(mut self, directory: impl Into<std::path::PathBuf>) -> Self {
        self.config.file = Some(FileConfig {
            directory: directory.into(),
            ..self.config.file.unwrap_or_default()
        });
        self
    }

    pub fn config(&self) -> &LogConfig {
        &self.config
    }

    /// `RUST_LOG` when set, the configured directives otherwise
    pub fn env_filter(&self) -> Result<EnvFilter, LoggingError> {
        match EnvFilter::try_from_default_env() {
            Ok(filter) => Ok(filter),
            Err(_) => Ok(EnvFilter::try_new(self.config.directives())?),
        }
    }

    /// Install the subscriber globally
    ///
    /// The returned guard flushes the file writer on drop and must be held
    /// for as long as logging is wanted. It is `None` without file output.
    pub fn init(self) -> Result<Option<WorkerGuard>, LoggingError> {
        use tracing_subscriber::util::SubscriberInitExt;

        let env_filter = self.env_filter()?;
        let console = self.config.console;

        let compact = (console == ConsoleFormat::Compact).then(|| {
            fmt::layer()
                .compact()
                .with_target(true)
                .with_ansi(false)
                .with_writer(std::io::stderr)
        });

        let pretty = (console == ConsoleFormat::Pretty).then(|| {
            fmt::layer()
                .pretty()
                .with_ansi(std::io::stderr().is_terminal())
                .with_writer(std::io::stderr)
        });

        let json = (console == ConsoleFormat::Json).then(|| {
            fmt::layer()
                .json()
                .flatten_event(true)
                .with_current_span(true)
                .with_span_list(true)
                .with_writer(std::io::stderr)
        });

        let (file_layer, guard) = match &self.config.file {
            Some(file) => {
                let (writer, guard) = tracing_appender::non_blocking(file_appender(file)?);
                let layer = fmt::layer()
                    .json()
                    .flatten_event(true)
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_ansi(false)
                    .with_writer(writer);
                (Some(layer), Some(guard))
            }
            None => (None, None),
        };

        Registry::default()
            .with(env_filter)
            .with(UserContextLayer::new())
            .with(compact)
            .with(pretty)
            .with(json)
            .with(file_layer)
            .try_init()?;

        Ok(guard)
    }
}

impl Default for KshetraSubscriberBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn file_appender(file: &FileConfig) -> Result<RollingFileAppender, LoggingError> {
    let rotation = match file.rotation {
        RotationStrategy::Daily => Rotation::DAILY,
        RotationStrategy::Hourly => Rotation::HOURLY,
        RotationStrategy::Never => Rotation::NEVER,
    };
    let mut builder = RollingFileAppender::builder()
        .rotation(rotation)
        .filename_prefix(&file.prefix)
        .filename_suffix("jsonl");
    if let Some(max) = file.max_files {
        builder = builder.max_log_files(max);
    }
    Ok(builder.build(&file.directory)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_applies_verbosity_over_config() {
        let mut config = LogConfig::default();
        config.components.insert("kshetra_cli".into(), "info".into());

        let builder = KshetraSubscriberBuilder::new()
            .with_config(config)
            .with_verbosity(2);
        let components = &builder.config().components;
        assert_eq!(components["kshetra_cli"], "info");
        assert_eq!(components["kshetra_report"], "trace");
    }

    #[test]
    fn test_with_file_output_keeps_existing_settings() {
        let config = LogConfig {
            file: Some(FileConfig {
                rotation: RotationStrategy::Hourly,
                max_files: Some(30),
                ..FileConfig::default()
            }),
            ..LogConfig::default()
        };
        let builder = KshetraSubscriberBuilder::new()
            .with_config(config)
            .with_file_output("/tmp/b");
        let file = builder.config().file.clone().unwrap();
        assert_eq!(file.directory, std::path::PathBuf::from("/tmp/b"));
        assert_eq!(file.rotation, RotationStrategy::Hourly);
        assert_eq!(file.max_files, Some(30));
    }

    #[test]
    fn test_bad_directive_is_an_error() {
        let mut config = LogConfig::default();
        config.components.insert("kshetra_cache".into(), "loud".into());
        let builder = KshetraSubscriberBuilder::new().with_config(config);
        if std::env::var_os("RUST_LOG").is_none() {
            assert!(matches!(builder.env_filter(), Err(LoggingError::Filter(_))));
        }
    }

    #[test]
    fn test_file_appender_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let file = FileConfig {
            directory: dir.path().join("nested"),
            rotation: RotationStrategy::Never,
            ..FileConfig::default()
        };
        file_appender(&file).unwrap();
        assert!(dir.path().join("nested").is_dir());
    }
}
