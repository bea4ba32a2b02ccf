use async_trait::async_trait;
use command_runner::CommandRunner;
use secrecy::zeroize::Zeroizing;
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;
use tracing::{debug, warn};

/// Decides whether a password is correct for a user.
///
/// Any failure to run the check counts as a rejection.
#[async_trait]
pub trait CredentialChecker: Send + Sync {
    async fn check(&self, username: &str, password: &SecretString) -> bool;
}

/// Checks a password by running `su <user> -c true` with the password on
/// stdin. Exit status zero means the password was accepted.
#[derive(Debug, Clone)]
pub struct SuCredentialChecker {
    program: String,
    runner: CommandRunner,
}

impl SuCredentialChecker {
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            runner: CommandRunner::new(timeout),
        }
    }

    fn args(username: &str) -> Vec<String> {
        vec![username.to_string(), "-c".to_string(), "true".to_string()]
    }
}

impl Default for SuCredentialChecker {
    fn default() -> Self {
        Self::new("su", Duration::from_secs(30))
    }
}

#[async_trait]
impl CredentialChecker for SuCredentialChecker {
    async fn check(&self, username: &str, password: &SecretString) -> bool {
        if username.starts_with('-') {
            warn!(username = %username, "Refusing option-like username");
            return false;
        }

        let mut input = Zeroizing::new(Vec::with_capacity(password.expose_secret().len() + 1));
        input.extend_from_slice(password.expose_secret().as_bytes());
        input.push(b'\n');

        match self
            .runner
            .run(&self.program, &Self::args(username), Some(input.as_slice()))
            .await
        {
            Ok(output) => {
                debug!(username = %username, exit_code = ?output.exit_code, "Credential check finished");
                output.success
            }
            Err(err) => {
                warn!(username = %username, error = %err, "Credential check could not run");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_run_true_as_user() {
        assert_eq!(SuCredentialChecker::args("alice"), vec!["alice", "-c", "true"]);
    }

    #[tokio::test]
    async fn missing_program_rejects() {
        let checker = SuCredentialChecker::new("no-such-su-xyz", Duration::from_secs(1));
        assert!(!checker.check("alice", &SecretString::from("pw")).await);
    }

    #[tokio::test]
    async fn option_like_username_rejects() {
        let checker = SuCredentialChecker::new("true", Duration::from_secs(1));
        assert!(!checker.check("-c", &SecretString::from("pw")).await);
    }

    #[tokio::test]
    async fn zero_exit_accepts() {
        // `true` ignores its arguments and stdin.
        let checker = SuCredentialChecker::new("true", Duration::from_secs(5));
        assert!(checker.check("alice", &SecretString::from("pw")).await);
    }

    #[tokio::test]
    async fn non_zero_exit_rejects() {
        let checker = SuCredentialChecker::new("false", Duration::from_secs(5));
        assert!(!checker.check("alice", &SecretString::from("pw")).await);
    }
}
