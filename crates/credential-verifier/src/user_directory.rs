use crate::{VerifyError, VerifyResult};
use async_trait::async_trait;
use nix::unistd::User;
use tracing::debug;

/// Maps usernames to numeric user ids.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn lookup_uid(&self, username: &str) -> VerifyResult<u32>;
}

/// Looks users up in the system user database through `getpwnam_r`, so
/// NSS sources such as LDAP or systemd-homed are consulted too.
#[derive(Debug, Clone, Copy, Default)]
pub struct NssUserDirectory;

impl NssUserDirectory {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl UserDirectory for NssUserDirectory {
    async fn lookup_uid(&self, username: &str) -> VerifyResult<u32> {
        let lookup_failed = |reason: String| VerifyError::UserLookupFailed {
            username: username.to_string(),
            reason,
        };

        if username.is_empty() || username.contains('\0') {
            return Err(lookup_failed("invalid username".to_string()));
        }

        // NSS modules may block on the network.
        let name = username.to_string();
        let entry = tokio::task::spawn_blocking(move || User::from_name(&name))
            .await
            .map_err(|err| lookup_failed(err.to_string()))?
            .map_err(|errno| lookup_failed(errno.desc().to_string()))?;

        match entry {
            Some(user) => {
                let uid = user.uid.as_raw();
                debug!(username = %username, uid, "Resolved user");
                Ok(uid)
            }
            None => Err(lookup_failed("unknown user".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn root_resolves_to_uid_zero() {
        assert_eq!(NssUserDirectory::new().lookup_uid("root").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn unknown_user_is_lookup_failure() {
        let err = NssUserDirectory::new()
            .lookup_uid("no-such-user-xyz")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            VerifyError::UserLookupFailed { ref reason, .. } if reason == "unknown user"
        ));
    }

    #[tokio::test]
    async fn option_like_username_is_not_found() {
        let err = NssUserDirectory::new().lookup_uid("--help").await.unwrap_err();
        assert!(matches!(err, VerifyError::UserLookupFailed { .. }));
    }

    #[tokio::test]
    async fn empty_username_is_rejected() {
        let err = NssUserDirectory::new().lookup_uid("").await.unwrap_err();
        assert!(matches!(err, VerifyError::UserLookupFailed { ref reason, .. } if reason == "invalid username"));
    }
}
