//! Configuration management for the agent.

use crate::{CoreError, CoreResult, Paths};
use observability::LogFormat;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Well-known bus name claimed by the agent.
pub const DEFAULT_BUS_NAME: &str = "org.example.PolicyKit1.AuthenticationAgent";

/// Locale sent to the authority when neither config nor `LANG` provide one.
pub const DEFAULT_LOCALE: &str = "en_US.UTF-8";

pub const DEFAULT_PROMPT_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_VERIFY_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_SESSION_QUERY_TIMEOUT_SECS: u64 = 5;

/// Main agent configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
    /// "text" or "json".
    pub log_format: String,
    /// Log file; `<tmp>/polkit-agent.log` when unset.
    pub log_file: Option<PathBuf>,
    /// Well-known bus name claimed without queueing.
    pub bus_name: String,
    /// Locale passed at registration; falls back to `LANG`, then en_US.UTF-8.
    pub locale: Option<String>,
    /// Program and arguments that print the password on stdout.
    pub prompt_command: Vec<String>,
    /// Privilege-switch program; invoked as `<cmd> <user> -c true`.
    pub verify_command: String,
    pub prompt_timeout_secs: u64,
    pub verify_timeout_secs: u64,
    pub session_query_timeout_secs: u64,
    /// Refuse to respond when the verified user is not among the offered identities.
    pub enforce_offered_identities: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            log_format: "text".to_string(),
            log_file: None,
            bus_name: DEFAULT_BUS_NAME.to_string(),
            locale: None,
            prompt_command: vec!["walker".to_string(), "--password".to_string()],
            verify_command: "su".to_string(),
            prompt_timeout_secs: DEFAULT_PROMPT_TIMEOUT_SECS,
            verify_timeout_secs: DEFAULT_VERIFY_TIMEOUT_SECS,
            session_query_timeout_secs: DEFAULT_SESSION_QUERY_TIMEOUT_SECS,
            enforce_offered_identities: false,
        }
    }
}

impl Config {
    /// Load configuration from the default config file, falling back to
    /// defaults when it does not exist, then apply environment overrides.
    pub fn load(paths: &Paths) -> CoreResult<Self> {
        let config_path = paths.config_file();
        let mut config = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            Self::default()
        };
        config.load_from_env();
        config.validate()?;
        Ok(config)
    }

    /// Load an explicitly named config file, which must exist, then apply
    /// environment overrides.
    pub fn load_explicit(path: &Path) -> CoreResult<Self> {
        let mut config = Self::load_from_file(path)?;
        config.load_from_env();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    fn load_from_env(&mut self) {
        if let Ok(log_level) = std::env::var("POLKIT_AGENT_LOG_LEVEL") {
            if !log_level.trim().is_empty() {
                self.log_level = log_level;
            }
        }
    }

    /// Reject configurations the agent cannot run with.
    pub fn validate(&self) -> CoreResult<()> {
        if self.prompt_command.is_empty() || self.prompt_command[0].trim().is_empty() {
            return Err(CoreError::Config("prompt_command must not be empty".into()));
        }
        if self.verify_command.trim().is_empty() {
            return Err(CoreError::Config("verify_command must not be empty".into()));
        }
        if self.bus_name.trim().is_empty() {
            return Err(CoreError::Config("bus_name must not be empty".into()));
        }
        self.log_format()?;
        Ok(())
    }

    pub fn log_format(&self) -> CoreResult<LogFormat> {
        self.log_format.parse().map_err(CoreError::Config)
    }

    /// Log file to append to.
    pub fn log_file(&self, paths: &Paths) -> PathBuf {
        self.log_file
            .clone()
            .unwrap_or_else(|| paths.default_log_file())
    }

    /// Locale for agent registration.
    pub fn locale(&self) -> String {
        self.locale
            .clone()
            .filter(|l| !l.trim().is_empty())
            .or_else(|| std::env::var("LANG").ok().filter(|l| !l.trim().is_empty()))
            .unwrap_or_else(|| DEFAULT_LOCALE.to_string())
    }

    pub fn prompt_timeout(&self) -> Duration {
        Duration::from_secs(self.prompt_timeout_secs)
    }

    pub fn verify_timeout(&self) -> Duration {
        Duration::from_secs(self.verify_timeout_secs)
    }

    pub fn session_query_timeout(&self) -> Duration {
        Duration::from_secs(self.session_query_timeout_secs)
    }
}
