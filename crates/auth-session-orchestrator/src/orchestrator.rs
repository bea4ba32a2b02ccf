use crate::registry::InFlightRegistry;
use crate::request_fsm::{RequestInput, RequestMachine, RequestState};
use crate::AuthenticationFailure;
use authority_client::Authority;
use credential_verifier::CredentialVerifier;
use polkit_protocol_types::{build_identity, AuthenticationRequest, Identity};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// What was sent to the authority for a successful request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticationOutcome {
    pub uid: u32,
    pub cookie: String,
    pub identity: Identity,
}

/// Drives `BeginAuthentication` / `CancelAuthentication`.
#[derive(Clone)]
pub struct AuthenticationOrchestrator {
    verifier: CredentialVerifier,
    authority: Arc<dyn Authority>,
    registry: InFlightRegistry,
    enforce_offered_identities: bool,
}

impl AuthenticationOrchestrator {
    pub fn new(verifier: CredentialVerifier, authority: Arc<dyn Authority>) -> Self {
        Self {
            verifier,
            authority,
            registry: InFlightRegistry::new(),
            enforce_offered_identities: false,
        }
    }

    /// Refuse to respond for a user the authority did not offer.
    pub fn with_identity_enforcement(mut self, enforce: bool) -> Self {
        self.enforce_offered_identities = enforce;
        self
    }

    pub fn in_flight(&self) -> usize {
        self.registry.len()
    }

    /// Authenticate the acting user for `request` and, on success, send
    /// exactly one response to the authority.
    pub async fn begin_authentication(
        &self,
        request: &AuthenticationRequest,
    ) -> Result<AuthenticationOutcome, AuthenticationFailure> {
        let mut machine = RequestMachine::new();
        advance(&mut machine, RequestInput::Begin, &request.cookie);
        info!(
            cookie = %request.cookie,
            action_id = %request.action_id,
            identities = request.identities.len(),
            "Authentication requested"
        );

        let guard = self.registry.register(&request.cookie);
        let token = guard.token().clone();
        let result = self.authenticate(request, &token).await;
        drop(guard);

        let input = match &result {
            Ok(_) => RequestInput::ResponseSent,
            Err(AuthenticationFailure::Cancelled) => RequestInput::Cancel,
            Err(_) => RequestInput::Fail,
        };
        let state = advance(&mut machine, input, &request.cookie);

        match &result {
            Ok(outcome) => info!(
                cookie = %request.cookie,
                action_id = %request.action_id,
                uid = outcome.uid,
                state = state.as_str(),
                "Authentication succeeded"
            ),
            Err(failure) => warn!(
                cookie = %request.cookie,
                action_id = %request.action_id,
                code = failure.code(),
                error = %failure,
                state = state.as_str(),
                "Authentication did not complete"
            ),
        }
        result
    }

    /// Cancel the in-flight request for `cookie`. Always succeeds; returns
    /// whether a request was actually pending.
    pub fn cancel_authentication(&self, cookie: &str) -> bool {
        let found = self.registry.cancel(cookie);
        if found {
            info!(cookie = %cookie, "Authentication cancelled");
        } else {
            debug!(cookie = %cookie, "Cancel for unknown cookie");
        }
        found
    }

    /// Verify, then respond. Cancellation is honoured up to the send; once
    /// the response is on the wire it is awaited to completion.
    async fn authenticate(
        &self,
        request: &AuthenticationRequest,
        token: &CancellationToken,
    ) -> Result<AuthenticationOutcome, AuthenticationFailure> {
        // Dropping the losing branch kills any running prompt.
        let uid = tokio::select! {
            biased;
            _ = token.cancelled() => return Err(AuthenticationFailure::Cancelled),
            verified = self.verify(request) => verified?,
        };

        let identity = build_identity(uid);
        if token.is_cancelled() {
            return Err(AuthenticationFailure::Cancelled);
        }

        self.authority
            .send_authentication_response(uid, &request.cookie, &identity)
            .await
            .map_err(|err| {
                error!(cookie = %request.cookie, error = %err, "Failed to send authentication response");
                AuthenticationFailure::ResponseSendFailed {
                    reason: err.to_string(),
                }
            })?;

        Ok(AuthenticationOutcome {
            uid,
            cookie: request.cookie.clone(),
            identity,
        })
    }

    /// Resolve the acting user and check their password. Returns the uid to
    /// respond for.
    async fn verify(&self, request: &AuthenticationRequest) -> Result<u32, AuthenticationFailure> {
        let username = self.verifier.acting_user()?;
        let uid = self.verifier.lookup_uid(&username).await?;

        if self.enforce_offered_identities
            && request.has_offered_identities()
            && !request.offers_user(uid)
        {
            return Err(AuthenticationFailure::IdentityNotOffered { username, uid });
        }

        match self.verifier.check_password(&username).await {
            Ok(true) => Ok(uid),
            Ok(false) => {
                warn!(
                    username = %username,
                    cookie = %request.cookie,
                    action_id = %request.action_id,
                    "Invalid credential"
                );
                Err(AuthenticationFailure::InvalidCredential { username })
            }
            Err(err) => {
                warn!(
                    username = %username,
                    cookie = %request.cookie,
                    action_id = %request.action_id,
                    error = %err,
                    "Password retrieval failed"
                );
                Err(err.into())
            }
        }
    }
}

fn advance(machine: &mut RequestMachine, input: RequestInput, cookie: &str) -> RequestState {
    if machine.consume(&input).is_err() {
        error!(cookie = %cookie, ?input, state = ?machine.state(), "Invalid request transition");
    }
    RequestState::from(machine.state())
}
