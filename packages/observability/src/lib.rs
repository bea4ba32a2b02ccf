//! # Observability
//!
//! Logging layer for the polkit agent.
//!
//! The agent is a log producer: it calls [`init_with_config`] once at startup
//! and uses standard `tracing` macros everywhere else. Every event is written
//! as a single line to an append-only file, either as a timestamped text line
//! or as JSONL.
//!
//! ```rust,ignore
//! fn main() {
//!     observability::init_with_config(observability::LogConfig {
//!         service_name: "polkit-agent".into(),
//!         log_path: "/tmp/polkit-agent.log".into(),
//!         ..Default::default()
//!     })
//!     .expect("log file");
//!
//!     tracing::info!("agent started");
//! }
//! ```
//!
//! Fields whose name looks like a secret (`password`, `credential`, ...) are
//! redacted before they reach the file.

mod layer;
mod writer;

use std::io;
use std::path::PathBuf;
use std::str::FromStr;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

pub use layer::{LineLayer, LogEntry};
pub use writer::{AppendLogWriter, WriterFactory};

/// Default log file name, created under the system temporary directory.
pub const DEFAULT_LOG_FILE_NAME: &str = "polkit-agent.log";

/// On-disk line format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// `2024-01-15T10:30:00.000000Z  INFO target: message key=value`
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "plain" => Ok(Self::Text),
            "json" | "jsonl" => Ok(Self::Json),
            other => Err(format!("unknown log format: {other}")),
        }
    }
}

/// Configuration for the logging system.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Name of the service, included in JSON lines.
    pub service_name: String,

    /// Default log level filter (e.g., "debug", "info", "warn").
    /// Can be overridden by `RUST_LOG` environment variable.
    pub default_level: String,

    /// Log file path. Opened in append mode, created if missing.
    pub log_path: PathBuf,

    /// Line format written to the file.
    pub format: LogFormat,

    /// Also emit logs to stderr for immediate feedback.
    pub also_stderr: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            service_name: "unknown".into(),
            default_level: "info".into(),
            log_path: default_log_path(),
            format: LogFormat::Text,
            also_stderr: false,
        }
    }
}

/// `<tmp>/polkit-agent.log`.
pub fn default_log_path() -> PathBuf {
    std::env::temp_dir().join(DEFAULT_LOG_FILE_NAME)
}

/// Initialize the logging subscriber.
///
/// Returns the path of the opened log file. Fails if the file cannot be
/// created or opened for appending; a subscriber installed earlier in the
/// process is left in place.
pub fn init_with_config(config: LogConfig) -> io::Result<PathBuf> {
    let writer = AppendLogWriter::new(&config.log_path)?;
    let file_layer = LineLayer::new(
        config.service_name.clone(),
        config.format,
        WriterFactory::new(writer),
    );

    let stderr_layer = if config.also_stderr {
        Some(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .compact()
                .with_writer(io::stderr)
                .with_ansi(true),
        )
    } else {
        None
    };

    let _ = tracing_subscriber::registry()
        .with(file_layer.with_filter(env_filter(&config.default_level)))
        .with(stderr_layer.map(|l| l.with_filter(env_filter(&config.default_level))))
        .try_init();

    tracing::info!(
        log_path = %config.log_path.display(),
        service = %config.service_name,
        "observability initialized"
    );

    Ok(config.log_path)
}

fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LogConfig::default();
        assert_eq!(config.service_name, "unknown");
        assert_eq!(config.default_level, "info");
        assert_eq!(config.format, LogFormat::Text);
        assert!(!config.also_stderr);
        assert!(config.log_path.ends_with(DEFAULT_LOG_FILE_NAME));
    }

    #[test]
    fn test_log_format_parse() {
        assert_eq!("text".parse::<LogFormat>().unwrap(), LogFormat::Text);
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("jsonl".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_init_fails_when_log_path_is_a_directory() {
        let dir = tempfile::tempdir().unwrap();
        let result = init_with_config(LogConfig {
            log_path: dir.path().to_path_buf(),
            ..Default::default()
        });
        assert!(result.is_err());
    }
}
