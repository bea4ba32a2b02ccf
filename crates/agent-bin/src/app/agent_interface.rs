//! The exported `org.freedesktop.PolicyKit1.AuthenticationAgent` object.

use auth_session_orchestrator::{AuthenticationFailure, AuthenticationOrchestrator};
use polkit_protocol_types::{AuthenticationRequest, OwnedSubjectRecord};
use std::collections::HashMap;
use tracing::debug;
use zbus::interface;

/// Faults returned to the authority for a failed request.
#[derive(Debug, zbus::DBusError)]
#[zbus(prefix = "org.freedesktop.PolicyKit1.Error")]
pub enum AgentFault {
    #[zbus(error)]
    ZBus(zbus::Error),
    Failed(String),
    Cancelled(String),
}

impl From<AuthenticationFailure> for AgentFault {
    fn from(failure: AuthenticationFailure) -> Self {
        match failure {
            AuthenticationFailure::Cancelled => Self::Cancelled(failure.to_string()),
            other => Self::Failed(other.to_string()),
        }
    }
}

pub struct AuthenticationAgent {
    orchestrator: AuthenticationOrchestrator,
}

impl AuthenticationAgent {
    pub fn new(orchestrator: AuthenticationOrchestrator) -> Self {
        Self { orchestrator }
    }
}

#[interface(name = "org.freedesktop.PolicyKit1.AuthenticationAgent")]
impl AuthenticationAgent {
    async fn begin_authentication(
        &self,
        action_id: String,
        message: String,
        icon_name: String,
        details: HashMap<String, String>,
        cookie: String,
        identities: Vec<OwnedSubjectRecord>,
    ) -> Result<(), AgentFault> {
        let request = AuthenticationRequest::from_wire(
            action_id, message, icon_name, details, cookie, &identities,
        );
        self.orchestrator
            .begin_authentication(&request)
            .await
            .map(|_| ())
            .map_err(AgentFault::from)
    }

    async fn cancel_authentication(&self, cookie: String) {
        let pending = self.orchestrator.cancel_authentication(&cookie);
        debug!(cookie = %cookie, pending, "CancelAuthentication handled");
    }
}
