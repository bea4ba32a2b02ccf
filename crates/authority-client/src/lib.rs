//! # Authority client
//!
//! Client side of the PolicyKit authority: registering the agent for a
//! session, sending `AuthenticationAgentResponse2`, and unregistering on
//! shutdown. [`Authority`] is the seam the rest of the agent talks to;
//! [`AuthorityClient`] implements it over a zbus connection.

mod proxy;

use async_trait::async_trait;
use polkit_protocol_types::{
    Identity, Subject, AUTHORITY_INTERFACE, AUTHORITY_OBJECT_PATH, AUTHORITY_SERVICE,
};
use proxy::PolkitAuthorityProxy;
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, info, warn};
use zbus::proxy::CacheProperties;
use zbus::zvariant::OwnedValue;
use zbus::Connection;

/// Options dictionary for `RegisterAuthenticationAgentWithOptions`.
pub type RegistrationOptions = HashMap<String, OwnedValue>;

/// Errors from calls to the authority.
#[derive(Error, Debug)]
pub enum AuthorityError {
    #[error("Failed to reach the PolicyKit authority: {0}")]
    Connect(#[source] zbus::Error),

    #[error("Failed to register authentication agent: {0}")]
    RegistrationFailed(#[source] zbus::Error),

    #[error("Failed to register authentication agent with options: {0}")]
    RegistrationWithOptionsFailed(#[source] zbus::Error),

    #[error("Failed to send authentication response: {0}")]
    ResponseSendFailed(#[source] zbus::Error),

    #[error("Failed to unregister authentication agent: {0}")]
    UnregisterFailed(#[source] zbus::Error),
}

impl AuthorityError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Connect(_) => "authority_connect_failed",
            Self::RegistrationFailed(_) => "registration_failed",
            Self::RegistrationWithOptionsFailed(_) => "registration_with_options_failed",
            Self::ResponseSendFailed(_) => "response_send_failed",
            Self::UnregisterFailed(_) => "unregister_failed",
        }
    }
}

/// Outbound calls the agent makes to the authority.
#[async_trait]
pub trait Authority: Send + Sync {
    async fn register_agent(
        &self,
        subject: &Subject,
        locale: &str,
        agent_path: &str,
    ) -> Result<(), AuthorityError>;

    async fn register_agent_with_options(
        &self,
        subject: &Subject,
        locale: &str,
        agent_path: &str,
        options: &RegistrationOptions,
    ) -> Result<(), AuthorityError>;

    async fn send_authentication_response(
        &self,
        uid: u32,
        cookie: &str,
        identity: &Identity,
    ) -> Result<(), AuthorityError>;

    async fn unregister_agent(&self, subject: &Subject, agent_path: &str)
        -> Result<(), AuthorityError>;
}

/// [`Authority`] over a system-bus connection.
#[derive(Clone)]
pub struct AuthorityClient {
    proxy: PolkitAuthorityProxy<'static>,
}

impl AuthorityClient {
    pub async fn new(connection: &Connection) -> Result<Self, AuthorityError> {
        let proxy = PolkitAuthorityProxy::builder(connection)
            .destination(AUTHORITY_SERVICE)
            .and_then(|b| b.path(AUTHORITY_OBJECT_PATH))
            .and_then(|b| b.interface(AUTHORITY_INTERFACE))
            .map_err(AuthorityError::Connect)?
            .cache_properties(CacheProperties::No)
            .build()
            .await
            .map_err(AuthorityError::Connect)?;
        Ok(Self { proxy })
    }
}

#[async_trait]
impl Authority for AuthorityClient {
    async fn register_agent(
        &self,
        subject: &Subject,
        locale: &str,
        agent_path: &str,
    ) -> Result<(), AuthorityError> {
        self.proxy
            .register_authentication_agent(&subject.to_record(), locale, agent_path)
            .await
            .map_err(AuthorityError::RegistrationFailed)
    }

    async fn register_agent_with_options(
        &self,
        subject: &Subject,
        locale: &str,
        agent_path: &str,
        options: &RegistrationOptions,
    ) -> Result<(), AuthorityError> {
        self.proxy
            .register_authentication_agent_with_options(
                &subject.to_record(),
                locale,
                agent_path,
                options,
            )
            .await
            .map_err(AuthorityError::RegistrationWithOptionsFailed)
    }

    async fn send_authentication_response(
        &self,
        uid: u32,
        cookie: &str,
        identity: &Identity,
    ) -> Result<(), AuthorityError> {
        self.proxy
            .authentication_agent_response2(uid, cookie, &identity.to_record())
            .await
            .map_err(AuthorityError::ResponseSendFailed)
    }

    async fn unregister_agent(
        &self,
        subject: &Subject,
        agent_path: &str,
    ) -> Result<(), AuthorityError> {
        self.proxy
            .unregister_authentication_agent(&subject.to_record(), agent_path)
            .await
            .map_err(AuthorityError::UnregisterFailed)
    }
}

/// Parameters of an agent registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub subject: Subject,
    pub locale: String,
    pub agent_path: String,
}

/// How far the registration handshake got.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeOutcome {
    /// Both the primary and the options-aware registration succeeded.
    Complete,
    /// Only the primary registration succeeded.
    PrimaryOnly,
}

/// Two-phase registration.
///
/// The primary registration must succeed. The options-aware registration is
/// attempted only afterwards and its failure is logged, not returned.
pub async fn register_agent_handshake<A>(
    authority: &A,
    registration: &Registration,
    options: &RegistrationOptions,
) -> Result<HandshakeOutcome, AuthorityError>
where
    A: Authority + ?Sized,
{
    let Registration {
        subject,
        locale,
        agent_path,
    } = registration;

    authority.register_agent(subject, locale, agent_path).await?;
    info!(
        subject_kind = subject.kind(),
        locale = %locale,
        agent_path = %agent_path,
        "Registered authentication agent"
    );

    match authority
        .register_agent_with_options(subject, locale, agent_path, options)
        .await
    {
        Ok(()) => {
            debug!("Registered authentication agent with options");
            Ok(HandshakeOutcome::Complete)
        }
        Err(err) => {
            warn!(error = %err, code = err.code(), "Options-aware registration failed, continuing");
            Ok(HandshakeOutcome::PrimaryOnly)
        }
    }
}
