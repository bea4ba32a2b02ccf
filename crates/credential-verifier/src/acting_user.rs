use crate::{VerifyError, VerifyResult};

/// Environment hints naming the user to authenticate as.
///
/// An elevated invocation (`SUDO_USER`) names the real user behind the
/// elevation and wins over the plain login name (`USER`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActingUserHints {
    pub elevated_user: Option<String>,
    pub current_user: Option<String>,
}

impl ActingUserHints {
    pub fn new(elevated_user: Option<String>, current_user: Option<String>) -> Self {
        Self {
            elevated_user,
            current_user,
        }
    }

    /// Read `SUDO_USER` and `USER` from the process environment.
    pub fn from_env() -> Self {
        Self {
            elevated_user: std::env::var("SUDO_USER").ok(),
            current_user: std::env::var("USER").ok(),
        }
    }

    /// The username to authenticate. Empty values count as unset.
    pub fn resolve(&self) -> VerifyResult<String> {
        [&self.elevated_user, &self.current_user]
            .into_iter()
            .flatten()
            .map(|name| name.trim())
            .find(|name| !name.is_empty())
            .map(str::to_string)
            .ok_or(VerifyError::NoUser)
    }
}
