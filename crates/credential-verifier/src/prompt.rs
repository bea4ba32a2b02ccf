use command_runner::CommandRunner;
use crate::{VerifyError, VerifyResult};
use async_trait::async_trait;
use secrecy::SecretString;
use std::time::Duration;
use tracing::debug;

/// Obtains a password for a user.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn obtain(&self, username: &str) -> VerifyResult<SecretString>;
}

/// Asks an external prompt program (e.g. `walker --password`) for the
/// password and reads it from the program's combined stdout and stderr.
///
/// A prompt that exits zero with no output yields an empty password, which
/// the checker then rejects.
#[derive(Debug, Clone)]
pub struct CommandCredentialProvider {
    program: String,
    args: Vec<String>,
    runner: CommandRunner,
}

impl CommandCredentialProvider {
    pub fn new(program: impl Into<String>, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args,
            runner: CommandRunner::new(timeout),
        }
    }

    /// Build from a `[program, args...]` command line.
    pub fn from_command_line(command: &[String], timeout: Duration) -> VerifyResult<Self> {
        let (program, args) = command
            .split_first()
            .ok_or_else(|| VerifyError::PasswordRetrievalFailed {
                reason: "no prompt command configured".to_string(),
            })?;
        Ok(Self::new(program.clone(), args.to_vec(), timeout))
    }
}

#[async_trait]
impl CredentialProvider for CommandCredentialProvider {
    async fn obtain(&self, username: &str) -> VerifyResult<SecretString> {
        debug!(username = %username, program = %self.program, "Prompting for password");
        let output = self
            .runner
            .run_checked(&self.program, &self.args, None)
            .await
            .map_err(|err| VerifyError::PasswordRetrievalFailed {
                reason: err.to_string(),
            })?;

        extract_password(&output.combined())
    }
}

/// Decode prompt output, dropping a single trailing line terminator.
fn extract_password(output: &[u8]) -> VerifyResult<SecretString> {
    let text = std::str::from_utf8(output).map_err(|_| VerifyError::PasswordRetrievalFailed {
        reason: "prompt output is not valid UTF-8".to_string(),
    })?;
    let text = text
        .strip_suffix("\r\n")
        .or_else(|| text.strip_suffix('\n'))
        .unwrap_or(text);
    Ok(SecretString::from(text))
}
