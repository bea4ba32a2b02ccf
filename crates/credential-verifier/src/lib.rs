//! # Credential verifier
//!
//! Single-factor password verification for the polkit agent.
//!
//! The verifier resolves the acting user, maps the username to a uid through
//! the OS user database (NSS), obtains a password from an external prompt program,
//! and checks it by asking the privilege-switch program to assume that user.
//! Each external step sits behind a narrow trait ([`UserDirectory`],
//! [`CredentialProvider`], [`CredentialChecker`]) so tests can substitute
//! canned answers for real subprocesses.

mod acting_user;
mod checker;
mod error;
mod prompt;
mod user_directory;
mod verifier;

pub use acting_user::ActingUserHints;
pub use checker::{CredentialChecker, SuCredentialChecker};
pub use error::{VerifyError, VerifyResult};
pub use prompt::{CommandCredentialProvider, CredentialProvider};
pub use secrecy::{ExposeSecret, SecretString};
pub use user_directory::{NssUserDirectory, UserDirectory};
pub use verifier::CredentialVerifier;
