//! systemd-logind queries through `loginctl`.

use crate::SessionManager;
use async_trait::async_trait;
use command_runner::{CommandError, CommandRunner};
use std::time::Duration;
use tracing::{debug, warn};

/// [`SessionManager`] backed by the `loginctl` binary.
#[derive(Debug, Clone)]
pub struct Loginctl {
    program: String,
    runner: CommandRunner,
}

impl Loginctl {
    pub fn new(timeout: Duration) -> Self {
        Self::with_program("loginctl", timeout)
    }

    fn with_program(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            runner: CommandRunner::new(timeout),
        }
    }

    /// Run `loginctl args...` and return stdout on success.
    async fn query(&self, args: &[&str]) -> Option<String> {
        let args: Vec<String> = args.iter().map(|arg| arg.to_string()).collect();
        match self.runner.run_checked(&self.program, &args, None).await {
            Ok(output) => Some(String::from_utf8_lossy(&output.stdout).into_owned()),
            Err(err @ CommandError::Timeout { .. }) => {
                warn!(args = ?args, error = %err, "loginctl timed out");
                None
            }
            Err(err) => {
                debug!(args = ?args, error = %err, "loginctl failed");
                None
            }
        }
    }
}

#[async_trait]
impl SessionManager for Loginctl {
    async fn current_session_id(&self) -> Option<String> {
        let stdout = self
            .query(&["show-session", "self", "--property=Id"])
            .await?;
        parse_show_session_id(&stdout)
    }

    async fn list_session_ids(&self) -> Vec<String> {
        match self.query(&["list-sessions", "--no-legend"]).await {
            Some(stdout) => parse_list_sessions(&stdout),
            None => Vec::new(),
        }
    }
}

/// Parse `Id=<id>` output of `show-session --property=Id`.
pub fn parse_show_session_id(stdout: &str) -> Option<String> {
    let line = stdout.lines().map(str::trim).find(|l| !l.is_empty())?;
    let id = line.strip_prefix("Id=").unwrap_or(line).trim();
    (!id.is_empty()).then(|| id.to_string())
}

/// Parse session ids from `list-sessions --no-legend`: the first
/// whitespace-separated field of each non-empty line.
pub fn parse_list_sessions(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .filter_map(|line| line.split_whitespace().next())
        .map(str::to_string)
        .collect()
}
