//! Inbound authentication challenge.

use crate::{OwnedSubjectRecord, Subject};
use std::collections::HashMap;
use tracing::warn;

/// A `BeginAuthentication` call, decoded.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthenticationRequest {
    pub action_id: String,
    pub message: String,
    pub icon_name: String,
    pub details: HashMap<String, String>,
    /// Correlates this challenge with the eventual response.
    pub cookie: String,
    /// Identities the authority will accept.
    pub identities: Vec<Subject>,
    /// Number of identity records on the wire, including any that did not
    /// decode.
    pub offered_identities: usize,
}

impl AuthenticationRequest {
    /// Decode the raw method arguments.
    ///
    /// Identity records that do not decode are dropped with a warning; they
    /// can never match the identity the agent responds with.
    pub fn from_wire(
        action_id: String,
        message: String,
        icon_name: String,
        details: HashMap<String, String>,
        cookie: String,
        identities: &[OwnedSubjectRecord],
    ) -> Self {
        let offered_identities = identities.len();
        let identities = identities
            .iter()
            .filter_map(|record| match Subject::try_from(record) {
                Ok(subject) => Some(subject),
                Err(e) => {
                    warn!(cookie = %cookie, error = %e, "Ignoring malformed identity");
                    None
                }
            })
            .collect();

        Self {
            action_id,
            message,
            icon_name,
            details,
            cookie,
            identities,
            offered_identities,
        }
    }

    /// Whether the authority restricted the request to specific identities.
    ///
    /// True even when none of the records decoded.
    pub fn has_offered_identities(&self) -> bool {
        self.offered_identities > 0
    }

    /// Whether `uid` appears among the offered `unix-user` identities.
    pub fn offers_user(&self, uid: u32) -> bool {
        self.identities
            .iter()
            .any(|identity| matches!(identity, Subject::UnixUser { uid: offered } if *offered == uid))
    }
}
