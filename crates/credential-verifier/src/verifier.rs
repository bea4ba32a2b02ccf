use crate::{
    ActingUserHints, CommandCredentialProvider, CredentialChecker, CredentialProvider,
    NssUserDirectory, SuCredentialChecker, UserDirectory, VerifyResult,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Resolves the acting user and checks their password.
#[derive(Clone)]
pub struct CredentialVerifier {
    hints: ActingUserHints,
    directory: Arc<dyn UserDirectory>,
    provider: Arc<dyn CredentialProvider>,
    checker: Arc<dyn CredentialChecker>,
}

impl CredentialVerifier {
    pub fn new(
        hints: ActingUserHints,
        directory: Arc<dyn UserDirectory>,
        provider: Arc<dyn CredentialProvider>,
        checker: Arc<dyn CredentialChecker>,
    ) -> Self {
        Self {
            hints,
            directory,
            provider,
            checker,
        }
    }

    /// Verifier backed by the system user database, the given prompt
    /// command line, and the given privilege-switch program.
    pub fn system(
        hints: ActingUserHints,
        prompt_command: &[String],
        verify_program: &str,
        prompt_timeout: Duration,
        verify_timeout: Duration,
    ) -> VerifyResult<Self> {
        let provider = CommandCredentialProvider::from_command_line(prompt_command, prompt_timeout)?;
        Ok(Self::new(
            hints,
            Arc::new(NssUserDirectory::new()),
            Arc::new(provider),
            Arc::new(SuCredentialChecker::new(verify_program, verify_timeout)),
        ))
    }

    /// The username requests are authenticated as.
    pub fn acting_user(&self) -> VerifyResult<String> {
        self.hints.resolve()
    }

    pub async fn lookup_uid(&self, username: &str) -> VerifyResult<u32> {
        self.directory.lookup_uid(username).await
    }

    /// Prompt for a password and check it. The password is dropped (and
    /// wiped) before this returns, whatever the outcome.
    pub async fn check_password(&self, username: &str) -> VerifyResult<bool> {
        let password = self.provider.obtain(username).await?;
        let accepted = self.checker.check(username, &password).await;
        drop(password);
        debug!(username = %username, accepted, "Password checked");
        Ok(accepted)
    }

    /// Full single-factor verification of `username`.
    ///
    /// `Ok(false)` means the password was wrong; errors mean verification
    /// could not be attempted.
    pub async fn verify(&self, username: &str) -> VerifyResult<bool> {
        let uid = self.lookup_uid(username).await?;
        info!(username = %username, uid, "Verifying credentials");
        self.check_password(username).await
    }
}

impl std::fmt::Debug for CredentialVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialVerifier")
            .field("hints", &self.hints)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ExposeSecret, SecretString, VerifyError};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeDirectory(HashMap<String, u32>);

    #[async_trait]
    impl UserDirectory for FakeDirectory {
        async fn lookup_uid(&self, username: &str) -> VerifyResult<u32> {
            self.0
                .get(username)
                .copied()
                .ok_or_else(|| VerifyError::UserLookupFailed {
                    username: username.to_string(),
                    reason: "unknown user".to_string(),
                })
        }
    }

    struct FakeProvider {
        answer: Option<&'static str>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl CredentialProvider for FakeProvider {
        async fn obtain(&self, _username: &str) -> VerifyResult<SecretString> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.answer
                .map(SecretString::from)
                .ok_or(VerifyError::PasswordRetrievalFailed {
                    reason: "walker exited with code Some(1)".to_string(),
                })
        }
    }

    struct FakeChecker {
        expected: &'static str,
    }

    #[async_trait]
    impl CredentialChecker for FakeChecker {
        async fn check(&self, _username: &str, password: &SecretString) -> bool {
            password.expose_secret() == self.expected
        }
    }

    fn verifier(answer: Option<&'static str>) -> (CredentialVerifier, Arc<FakeProvider>) {
        let provider = Arc::new(FakeProvider {
            answer,
            calls: AtomicUsize::new(0),
        });
        let verifier = CredentialVerifier::new(
            ActingUserHints::new(Some("alice".into()), Some("root".into())),
            Arc::new(FakeDirectory(HashMap::from([("alice".to_string(), 1000)]))),
            provider.clone(),
            Arc::new(FakeChecker { expected: "hunter2" }),
        );
        (verifier, provider)
    }

    #[tokio::test]
    async fn correct_password_verifies() {
        let (verifier, _) = verifier(Some("hunter2"));
        assert!(verifier.verify("alice").await.unwrap());
    }

    #[tokio::test]
    async fn wrong_password_is_false_not_error() {
        let (verifier, _) = verifier(Some("wrong"));
        assert!(!verifier.verify("alice").await.unwrap());
    }

    #[tokio::test]
    async fn unknown_user_fails_before_prompting() {
        let (verifier, provider) = verifier(Some("hunter2"));
        let err = verifier.verify("mallory").await.unwrap_err();
        assert!(matches!(err, VerifyError::UserLookupFailed { .. }));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failed_prompt_is_retrieval_failure() {
        let (verifier, _) = verifier(None);
        let err = verifier.verify("alice").await.unwrap_err();
        assert!(matches!(err, VerifyError::PasswordRetrievalFailed { .. }));
    }

    #[tokio::test]
    async fn empty_password_is_rejected_not_error() {
        let (verifier, provider) = verifier(Some(""));
        assert!(!verifier.verify("alice").await.unwrap());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn acting_user_prefers_elevated_user() {
        let (verifier, _) = verifier(None);
        assert_eq!(verifier.acting_user().unwrap(), "alice");
    }

    #[test]
    fn system_requires_prompt_command() {
        let err = CredentialVerifier::system(
            ActingUserHints::default(),
            &[],
            "su",
            Duration::from_secs(1),
            Duration::from_secs(1),
        )
        .unwrap_err();
        assert!(matches!(err, VerifyError::PasswordRetrievalFailed { .. }));
    }
}
