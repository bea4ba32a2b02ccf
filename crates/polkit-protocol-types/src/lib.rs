//! PolicyKit authentication-agent protocol types.
//!
//! Well-known names and paths, the typed [`Subject`] model with its
//! `(sa{sv})` wire records, and the inbound [`AuthenticationRequest`].

mod request;
mod subject;

pub use request::AuthenticationRequest;
pub use subject::{
    build_identity, build_session_subject, Identity, OwnedSubjectRecord, Subject, SubjectError,
    SubjectRecord,
};

/// Interface implemented by the exported agent object.
pub const AGENT_INTERFACE: &str = "org.freedesktop.PolicyKit1.AuthenticationAgent";

/// Object path the agent is exported at.
pub const AGENT_OBJECT_PATH: &str = "/org/freedesktop/PolicyKit1/AuthenticationAgent";

/// Bus name of the PolicyKit authority.
pub const AUTHORITY_SERVICE: &str = "org.freedesktop.PolicyKit1";

/// Object path of the PolicyKit authority.
pub const AUTHORITY_OBJECT_PATH: &str = "/org/freedesktop/PolicyKit1/Authority";

/// Interface of the PolicyKit authority.
pub const AUTHORITY_INTERFACE: &str = "org.freedesktop.PolicyKit1.Authority";

/// Prefix for error names returned by the agent.
pub const ERROR_PREFIX: &str = "org.freedesktop.PolicyKit1.Error";
