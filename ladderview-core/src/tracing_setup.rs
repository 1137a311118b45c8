//! Tracing setup for Ladderview
//!
//! Console logs go to stderr at a user-chosen level. When a logs directory
//! is given, every event down to `trace` is also written to a file there,
//! so a session that mislabelled a menu can be replayed afterwards.

use std::fs::{File, create_dir_all};
use std::path::{Path, PathBuf};

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

/// File name of the per-run trace log inside the logs directory.
pub const LOG_FILE_NAME: &str = "ladderview-last-run.log";

/// Path of the trace log for `logs_dir`.
pub fn log_file_path(logs_dir: &Path) -> PathBuf {
    logs_dir.join(LOG_FILE_NAME)
}

/// Console filter: `RUST_LOG` when set, else `console_level`.
fn console_filter(console_level: Level) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(console_level.as_str()))
}

/// Installs the global subscriber.
///
/// With `logs_dir` set, a second layer writes the full trace to
/// [`LOG_FILE_NAME`] in that directory, replacing the previous run's file.
///
/// # Errors
///
/// - Logs directory or file cannot be created
/// - A global subscriber is already installed
pub fn init_tracing(
    console_level: Level,
    logs_dir: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(console_filter(console_level));

    let Some(logs_dir) = logs_dir else {
        tracing_subscriber::registry().with(console_layer).try_init()?;
        return Ok(());
    };

    create_dir_all(logs_dir)?;
    let path = log_file_path(logs_dir);
    let log_file = File::create(&path)?;

    let file_layer = fmt::layer()
        .with_writer(log_file)
        .with_ansi(false)
        .with_file(true)
        .with_line_number(true)
        .with_filter(EnvFilter::new("trace"));

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .try_init()?;

    tracing::debug!(console = %console_level, trace_file = %path.display(), "Tracing initialized");
    Ok(())
}

/// Console verbosity accepted by `--log-level`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CliLogLevel {
    /// Only errors
    Error,
    /// Rejected play requests and missing player plugins
    Warn,
    /// Source changes, selector activation and quality levels
    Info,
    /// Skipped relabels, swallowed play failures, stale deferred tasks
    Debug,
    /// Every player event and scheduled task
    Trace,
}

impl CliLogLevel {
    /// Converts CLI log level to tracing Level enum.
    ///
    /// # Examples
    /// ```
    /// use ladderview_core::tracing_setup::CliLogLevel;
    ///
    /// let level = CliLogLevel::Info.as_tracing_level();
    /// assert_eq!(level, tracing::Level::INFO);
    /// ```
    pub fn as_tracing_level(self) -> Level {
        match self {
            CliLogLevel::Error => Level::ERROR,
            CliLogLevel::Warn => Level::WARN,
            CliLogLevel::Info => Level::INFO,
            CliLogLevel::Debug => Level::DEBUG,
            CliLogLevel::Trace => Level::TRACE,
        }
    }
}
