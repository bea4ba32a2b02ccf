//! Subprocess execution with a wall-clock budget.
//!
//! Used for the password prompt, the privilege-switch check, and `loginctl`.

use secrecy::zeroize::Zeroizing;
use std::fmt;
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

/// Failures to run an external program.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("{program} is not installed")]
    NotInstalled { program: String },

    #[error("failed to execute {command}: {source}")]
    Io {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{command} timed out after {timeout_secs}s")]
    Timeout { command: String, timeout_secs: u64 },

    #[error("{command} exited with code {exit_code:?}: {stderr}")]
    Failed {
        command: String,
        exit_code: Option<i32>,
        stderr: String,
    },
}

/// Captured output of a finished subprocess.
///
/// Either stream may carry a password, so both are wiped when dropped and
/// never printed by `Debug`.
pub struct CommandOutput {
    pub exit_code: Option<i32>,
    pub success: bool,
    pub stdout: Zeroizing<Vec<u8>>,
    pub stderr: Zeroizing<Vec<u8>>,
}

impl CommandOutput {
    /// Stdout followed by stderr.
    pub fn combined(&self) -> Zeroizing<Vec<u8>> {
        let mut out = Zeroizing::new(Vec::with_capacity(self.stdout.len() + self.stderr.len()));
        out.extend_from_slice(&self.stdout);
        out.extend_from_slice(&self.stderr);
        out
    }

    /// Stderr as trimmed text, for diagnostics.
    pub fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.stderr).trim().to_string()
    }
}

impl fmt::Debug for CommandOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandOutput")
            .field("exit_code", &self.exit_code)
            .field("success", &self.success)
            .field("stdout_len", &self.stdout.len())
            .field("stderr_len", &self.stderr.len())
            .finish()
    }
}

/// Runs external programs with a bounded wall-clock budget.
///
/// Children are killed if the returned future is dropped, so a timeout or an
/// outer cancellation never leaves a prompt lingering on screen.
#[derive(Debug, Clone)]
pub struct CommandRunner {
    timeout: Duration,
}

impl CommandRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Run `program args...`, optionally feeding `stdin`, and return its
    /// output whatever the exit status.
    pub async fn run(
        &self,
        program: &str,
        args: &[String],
        stdin: Option<&[u8]>,
    ) -> Result<CommandOutput, CommandError> {
        let command_repr = program.to_string();

        let mut cmd = Command::new(program);
        cmd.args(args);
        cmd.stdin(if stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        });
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|err| {
            if err.kind() == std::io::ErrorKind::NotFound {
                CommandError::NotInstalled {
                    program: program.to_string(),
                }
            } else {
                CommandError::Io {
                    command: command_repr.clone(),
                    source: err,
                }
            }
        })?;

        let input = stdin.map(|bytes| Zeroizing::new(bytes.to_vec()));
        let pipe = child.stdin.take();
        let work = async move {
            if let (Some(mut pipe), Some(input)) = (pipe, input) {
                // The child may exit before reading; its status decides the outcome.
                if let Err(err) = pipe.write_all(&input).await {
                    debug!(error = %err, "stdin write to child failed");
                }
                drop(pipe);
            }
            child.wait_with_output().await
        };

        let output = match timeout(self.timeout, work).await {
            Err(_) => {
                return Err(CommandError::Timeout {
                    command: command_repr,
                    timeout_secs: self.timeout.as_secs(),
                });
            }
            Ok(Err(err)) => {
                return Err(CommandError::Io {
                    command: command_repr,
                    source: err,
                });
            }
            Ok(Ok(output)) => output,
        };

        Ok(CommandOutput {
            exit_code: output.status.code(),
            success: output.status.success(),
            stdout: Zeroizing::new(output.stdout),
            stderr: Zeroizing::new(output.stderr),
        })
    }

    /// Like [`run`](Self::run) but a non-zero exit is an error.
    pub async fn run_checked(
        &self,
        program: &str,
        args: &[String],
        stdin: Option<&[u8]>,
    ) -> Result<CommandOutput, CommandError> {
        let output = self.run(program, args, stdin).await?;
        if output.success {
            return Ok(output);
        }
        Err(CommandError::Failed {
            command: program.to_string(),
            exit_code: output.exit_code,
            stderr: output.stderr_text(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sh(script: &str) -> Vec<String> {
        vec!["-c".to_string(), script.to_string()]
    }

    #[tokio::test]
    async fn run_captures_stdout() {
        let runner = CommandRunner::new(Duration::from_secs(5));
        let out = runner.run("sh", &sh("printf hello"), None).await.unwrap();
        assert!(out.success);
        assert_eq!(out.stdout.as_slice(), b"hello");
    }

    #[tokio::test]
    async fn run_feeds_stdin() {
        let runner = CommandRunner::new(Duration::from_secs(5));
        let out = runner
            .run("sh", &sh("cat"), Some(b"secret\n".as_slice()))
            .await
            .unwrap();
        assert_eq!(out.stdout.as_slice(), b"secret\n");
    }

    #[tokio::test]
    async fn run_reports_non_zero_exit_without_error() {
        let runner = CommandRunner::new(Duration::from_secs(5));
        let out = runner
            .run("sh", &sh("echo nope >&2; exit 3"), None)
            .await
            .unwrap();
        assert!(!out.success);
        assert_eq!(out.exit_code, Some(3));
        assert_eq!(out.stderr_text(), "nope");
    }

    #[tokio::test]
    async fn combined_appends_stderr_to_stdout() {
        let runner = CommandRunner::new(Duration::from_secs(5));
        let out = runner
            .run("sh", &sh("printf out; printf err >&2"), None)
            .await
            .unwrap();
        assert_eq!(out.combined().as_slice(), b"outerr");
    }

    #[test]
    fn debug_hides_output() {
        let out = CommandOutput {
            exit_code: Some(0),
            success: true,
            stdout: Zeroizing::new(b"hunter2".to_vec()),
            stderr: Zeroizing::new(b"hunter2".to_vec()),
        };
        assert!(!format!("{out:?}").contains("hunter2"));
    }

    #[tokio::test]
    async fn run_checked_rejects_non_zero_exit() {
        let runner = CommandRunner::new(Duration::from_secs(5));
        let err = runner
            .run_checked("sh", &sh("exit 1"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, CommandError::Failed { exit_code: Some(1), .. }));
    }

    #[tokio::test]
    async fn run_times_out() {
        let runner = CommandRunner::new(Duration::from_millis(100));
        let err = runner.run("sh", &sh("sleep 5"), None).await.unwrap_err();
        assert!(matches!(err, CommandError::Timeout { .. }));
    }

    #[tokio::test]
    async fn missing_program_is_not_installed() {
        let runner = CommandRunner::new(Duration::from_secs(5));
        let err = runner
            .run("definitely-not-a-real-program-xyz", &[], None)
            .await
            .unwrap_err();
        assert!(matches!(err, CommandError::NotInstalled { .. }));
    }
}
