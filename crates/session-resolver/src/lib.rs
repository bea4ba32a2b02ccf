//! Login-session resolution for the polkit agent.
//!
//! The agent registers for exactly one session, chosen once at startup. The
//! first source that yields a non-empty id wins:
//!
//! 1. `XDG_SESSION_ID` from the environment
//! 2. `loginctl show-session self --property=Id`
//! 3. the first entry of `loginctl list-sessions --no-legend`

mod loginctl;

pub use loginctl::{parse_list_sessions, parse_show_session_id, Loginctl};

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info};

/// Environment variable consulted before any session-manager query.
pub const SESSION_ID_ENV: &str = "XDG_SESSION_ID";

/// Errors that can occur during session resolution.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ResolveError {
    #[error("No login session could be determined")]
    NoSession,
}

impl ResolveError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::NoSession => "no_session",
        }
    }
}

/// Queries a session manager. `None` means the query produced nothing usable.
#[async_trait]
pub trait SessionManager: Send + Sync {
    /// Id of the session the calling process belongs to.
    async fn current_session_id(&self) -> Option<String>;

    /// Ids of all sessions, in the manager's order.
    async fn list_session_ids(&self) -> Vec<String>;
}

/// Where a resolved session id came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionSource {
    Environment,
    CurrentSession,
    SessionList,
}

/// Resolves the caller's login session.
pub struct SessionResolver<M> {
    env_hint: Option<String>,
    manager: M,
}

impl<M: SessionManager> SessionResolver<M> {
    pub fn new(manager: M) -> Self {
        Self {
            env_hint: None,
            manager,
        }
    }

    pub fn with_env_hint(mut self, hint: Option<String>) -> Self {
        self.env_hint = hint;
        self
    }

    /// Resolver seeded with `XDG_SESSION_ID` from the process environment.
    pub fn from_env(manager: M) -> Self {
        Self::new(manager).with_env_hint(std::env::var(SESSION_ID_ENV).ok())
    }

    pub async fn resolve(&self) -> Result<String, ResolveError> {
        self.resolve_with_source().await.map(|(id, _)| id)
    }

    pub async fn resolve_with_source(&self) -> Result<(String, SessionSource), ResolveError> {
        if let Some(id) = non_empty(self.env_hint.as_deref()) {
            info!(session_id = %id, "Session from {}", SESSION_ID_ENV);
            return Ok((id, SessionSource::Environment));
        }

        if let Some(id) = non_empty(self.manager.current_session_id().await.as_deref()) {
            info!(session_id = %id, "Session from session manager");
            return Ok((id, SessionSource::CurrentSession));
        }
        debug!("Current-session query yielded nothing, listing sessions");

        let listed = self.manager.list_session_ids().await;
        if let Some(id) = non_empty(listed.first().map(String::as_str)) {
            info!(session_id = %id, "Session from session list");
            return Ok((id, SessionSource::SessionList));
        }

        Err(ResolveError::NoSession)
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
