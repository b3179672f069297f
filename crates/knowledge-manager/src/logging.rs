//! Logging configuration for knowledge-manager.
//!
//! This module provides initialization for the tracing-based logging system.
//! Log lines go to stderr and, optionally, are appended to a log file.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Verbosity level for logging output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Suppress all output except errors.
    Quiet,
    /// Normal output level (info and above).
    #[default]
    Normal,
    /// Verbose output (debug and above).
    Verbose,
    /// Very verbose output (trace level).
    Trace,
}

impl Verbosity {
    /// Convert verbosity to tracing level filter.
    #[must_use]
    pub fn to_level_filter(&self) -> Level {
        match self {
            Self::Quiet => Level::ERROR,
            Self::Normal => Level::INFO,
            Self::Verbose => Level::DEBUG,
            Self::Trace => Level::TRACE,
        }
    }
}

/// Initialize the logging system.
///
/// The level comes from `verbosity` unless `RUST_LOG` is set. When
/// `log_file` is given, lines are also appended to it without ANSI colors;
/// if the file cannot be opened, logging continues on stderr only.
///
/// # Examples
///
/// ```no_run
/// use knowledge_manager::{init_logging, logging::Verbosity};
///
/// init_logging(Verbosity::Verbose, None);
/// ```
pub fn init_logging(verbosity: Verbosity, log_file: Option<&Path>) {
    // Ignore the error if a subscriber is already installed
    let _ = build_subscriber(verbosity, log_file).try_init();
}

/// The subscriber installed by [`init_logging`].
fn build_subscriber(
    verbosity: Verbosity,
    log_file: Option<&Path>,
) -> impl tracing::Subscriber + Send + Sync + 'static {
    let default_filter = format!("knowledge_manager={}", verbosity.to_level_filter());

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&default_filter));

    let file_layer = log_file.and_then(|path| {
        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_target(true)
                    .with_writer(Mutex::new(file)),
            ),
            Err(e) => {
                eprintln!(
                    "failed to open log file {} ({e}); continuing without file log",
                    path.display()
                );
                None
            }
        }
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false),
        )
        .with(file_layer)
}

/// Initialize logging for tests.
#[cfg(test)]
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("warn")
        .with_test_writer()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_to_level() {
        assert_eq!(Verbosity::Quiet.to_level_filter(), Level::ERROR);
        assert_eq!(Verbosity::Normal.to_level_filter(), Level::INFO);
        assert_eq!(Verbosity::Verbose.to_level_filter(), Level::DEBUG);
        assert_eq!(Verbosity::Trace.to_level_filter(), Level::TRACE);
    }

    #[test]
    fn test_verbosity_default() {
        assert_eq!(Verbosity::default(), Verbosity::Normal);
    }

    #[test]
    fn test_file_sink_receives_events() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kman.log");

        let subscriber = build_subscriber(Verbosity::Normal, Some(&path));
        tracing::subscriber::with_default(subscriber, || {
            tracing::error!(feed = "https://example.com/rss", "feed fetch failed");
            tracing::trace!("below the configured level");
        });

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("feed fetch failed"));
        assert!(contents.contains("feed=\"https://example.com/rss\""));
        assert!(!contents.contains("below the configured level"));
        assert!(!contents.contains('\u{1b}'));
    }

    #[test]
    fn test_init_logging_with_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kman.log");
        init_logging(Verbosity::Normal, Some(&path));
        assert!(path.exists());
        // Only the first initialization in the test binary installs a subscriber.
        init_logging(Verbosity::Trace, None);
    }

    #[test]
    fn test_init_logging_with_unwritable_file() {
        init_logging(
            Verbosity::Quiet,
            Some(Path::new("/nonexistent/dir/kman.log")),
        );
    }

    #[test]
    fn test_init_test_logging_does_not_panic() {
        init_test_logging();
    }
}
