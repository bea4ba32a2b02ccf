//! File system paths for the agent.

use crate::{CoreError, CoreResult};
use std::path::{Path, PathBuf};

/// Directory name under the user's config directory.
const APP_DIR_NAME: &str = "polkit-agent";

/// Manages file system paths for the agent.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Config directory ($XDG_CONFIG_HOME/polkit-agent)
    config_dir: PathBuf,
    /// Directory holding the log file (system temp dir)
    log_dir: PathBuf,
}

impl Paths {
    /// Create a new Paths instance.
    ///
    /// Uses `$XDG_CONFIG_HOME/polkit-agent` for configuration and the system
    /// temporary directory for the log file.
    pub fn new() -> CoreResult<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| CoreError::Path("Could not determine config directory".to_string()))?
            .join(APP_DIR_NAME);

        Ok(Self {
            config_dir,
            log_dir: std::env::temp_dir(),
        })
    }

    /// Create a new Paths instance rooted at a custom directory (config and logs).
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self {
            log_dir: base_dir.clone(),
            config_dir: base_dir,
        }
    }

    /// Get the config directory.
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Get the config file path (<config_dir>/config.json).
    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.json")
    }

    /// Get the default log file path (<log_dir>/polkit-agent.log).
    pub fn default_log_file(&self) -> PathBuf {
        self.log_dir.join(observability::DEFAULT_LOG_FILE_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_with_base_dir() {
        let base = PathBuf::from("/tmp/test-polkit-agent");
        let paths = Paths::with_base_dir(base.clone());

        assert_eq!(paths.config_dir(), base.as_path());
        assert_eq!(paths.config_file(), base.join("config.json"));
        assert_eq!(paths.default_log_file(), base.join("polkit-agent.log"));
    }

    #[test]
    fn test_default_log_file_is_under_temp_dir() {
        let paths = Paths::new().unwrap();
        assert!(paths.default_log_file().starts_with(std::env::temp_dir()));
        assert!(paths.config_file().ends_with("polkit-agent/config.json"));
    }
}
