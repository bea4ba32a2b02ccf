//! Logging initialization for the agent.
//!
//! Wraps the observability crate so the binary only deals with `Config`.

use crate::{Config, CoreError, CoreResult, Paths};
use observability::LogConfig;
use std::path::PathBuf;

const SERVICE_NAME: &str = "polkit-agent";

/// Open the agent's append-only log file and install the tracing subscriber.
///
/// Returns the log file path. Failure to open the file is fatal to bootstrap.
pub fn init_logging(config: &Config, paths: &Paths, also_stderr: bool) -> CoreResult<PathBuf> {
    let log_path = config.log_file(paths);
    observability::init_with_config(LogConfig {
        service_name: SERVICE_NAME.into(),
        default_level: parse_level(&config.log_level).to_string().to_lowercase(),
        log_path: log_path.clone(),
        format: config.log_format()?,
        also_stderr,
    })
    .map_err(|source| CoreError::LogFile {
        path: log_path.display().to_string(),
        source,
    })
}

/// Parse a log level string into a tracing Level.
pub fn parse_level(level: &str) -> tracing::Level {
    match level.to_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "info" => tracing::Level::INFO,
        "warn" | "warning" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_level_all_variants() {
        assert_eq!(parse_level("trace"), tracing::Level::TRACE);
        assert_eq!(parse_level("debug"), tracing::Level::DEBUG);
        assert_eq!(parse_level("info"), tracing::Level::INFO);
        assert_eq!(parse_level("warn"), tracing::Level::WARN);
        assert_eq!(parse_level("warning"), tracing::Level::WARN);
        assert_eq!(parse_level("error"), tracing::Level::ERROR);
    }

    #[test]
    fn parse_level_case_insensitive() {
        assert_eq!(parse_level("TRACE"), tracing::Level::TRACE);
        assert_eq!(parse_level("Debug"), tracing::Level::DEBUG);
        assert_eq!(parse_level("WARNING"), tracing::Level::WARN);
    }

    #[test]
    fn parse_level_unknown_defaults_to_info() {
        assert_eq!(parse_level(""), tracing::Level::INFO);
        assert_eq!(parse_level("verbose"), tracing::Level::INFO);
    }

    #[test]
    fn init_logging_reports_unopenable_log_file() {
        let dir = tempfile::tempdir().unwrap();
        let paths = Paths::with_base_dir(dir.path().to_path_buf());
        let config = Config {
            log_file: Some(dir.path().to_path_buf()),
            ..Config::default()
        };
        let result = init_logging(&config, &paths, false);
        assert!(matches!(result, Err(CoreError::LogFile { .. })));
    }
}
