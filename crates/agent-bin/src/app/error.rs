use agent_config_and_utils::CoreError;
use agent_lifecycle::LifecycleError;
use authority_client::AuthorityError;
use credential_verifier::VerifyError;
use session_resolver::ResolveError;
use thiserror::Error;

/// Fatal startup failures. Each one ends the process with a non-zero status.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] CoreError),

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    #[error("Failed to resolve login session: {0}")]
    Session(#[from] ResolveError),

    #[error("Failed to set up credential verification: {0}")]
    Verifier(#[from] VerifyError),

    #[error(transparent)]
    Authority(#[from] AuthorityError),
}

impl BootstrapError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Config(e) => e.code(),
            Self::Lifecycle(e) => e.code(),
            Self::Session(e) => e.code(),
            Self::Verifier(e) => e.code(),
            Self::Authority(e) => e.code(),
        }
    }
}
