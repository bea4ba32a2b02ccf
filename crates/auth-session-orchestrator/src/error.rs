use credential_verifier::VerifyError;
use thiserror::Error;

/// Why a single authentication request did not produce a response.
///
/// Each variant ends the request in the `Failed` state except
/// [`Cancelled`](Self::Cancelled).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthenticationFailure {
    #[error("Could not determine the acting user")]
    NoUser,

    #[error("Failed to look up user '{username}': {reason}")]
    UserLookupFailed { username: String, reason: String },

    #[error("Failed to parse uid '{raw}' for user '{username}'")]
    UidParseFailed { username: String, raw: String },

    #[error("Failed to get password: {reason}")]
    PasswordRetrievalFailed { reason: String },

    #[error("Invalid password for user '{username}'")]
    InvalidCredential { username: String },

    #[error("User '{username}' (uid {uid}) is not among the offered identities")]
    IdentityNotOffered { username: String, uid: u32 },

    #[error("Failed to send authentication response: {reason}")]
    ResponseSendFailed { reason: String },

    #[error("Authentication was cancelled")]
    Cancelled,
}

impl AuthenticationFailure {
    pub fn code(&self) -> &'static str {
        match self {
            Self::NoUser => "no_user",
            Self::UserLookupFailed { .. } => "user_lookup_failed",
            Self::UidParseFailed { .. } => "uid_parse_failed",
            Self::PasswordRetrievalFailed { .. } => "password_retrieval_failed",
            Self::InvalidCredential { .. } => "invalid_credential",
            Self::IdentityNotOffered { .. } => "identity_not_offered",
            Self::ResponseSendFailed { .. } => "response_send_failed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

impl From<VerifyError> for AuthenticationFailure {
    fn from(err: VerifyError) -> Self {
        match err {
            VerifyError::NoUser => Self::NoUser,
            VerifyError::UserLookupFailed { username, reason } => {
                Self::UserLookupFailed { username, reason }
            }
            VerifyError::UidParseFailed { username, raw } => Self::UidParseFailed { username, raw },
            VerifyError::PasswordRetrievalFailed { reason } => {
                Self::PasswordRetrievalFailed { reason }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_errors_keep_their_code() {
        let err = VerifyError::PasswordRetrievalFailed {
            reason: "dismissed".into(),
        };
        let code = err.code();
        assert_eq!(AuthenticationFailure::from(err).code(), code);
        assert_eq!(AuthenticationFailure::from(VerifyError::NoUser).code(), "no_user");
    }

    #[test]
    fn invalid_credential_is_distinct_from_retrieval() {
        let invalid = AuthenticationFailure::InvalidCredential {
            username: "alice".into(),
        };
        assert_eq!(invalid.code(), "invalid_credential");
        assert_eq!(invalid.to_string(), "Invalid password for user 'alice'");
        assert!(!invalid.is_cancelled());
        assert!(AuthenticationFailure::Cancelled.is_cancelled());
    }
}
