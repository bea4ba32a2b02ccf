use thiserror::Error;

/// Error taxonomy for credential verification.
///
/// A wrong password is not an error: verification reports it as `Ok(false)`.
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("Could not determine the acting user")]
    NoUser,

    #[error("Failed to look up user '{username}': {reason}")]
    UserLookupFailed { username: String, reason: String },

    #[error("Failed to parse uid '{raw}' for user '{username}'")]
    UidParseFailed { username: String, raw: String },

    #[error("Failed to get password: {reason}")]
    PasswordRetrievalFailed { reason: String },
}

impl VerifyError {
    /// Stable machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NoUser => "no_user",
            Self::UserLookupFailed { .. } => "user_lookup_failed",
            Self::UidParseFailed { .. } => "uid_parse_failed",
            Self::PasswordRetrievalFailed { .. } => "password_retrieval_failed",
        }
    }
}

pub type VerifyResult<T> = Result<T, VerifyError>;
