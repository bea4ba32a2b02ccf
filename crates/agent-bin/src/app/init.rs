//! Agent bootstrap.

use crate::app::{AuthenticationAgent, BootstrapError};
use agent_config_and_utils::Config;
use agent_lifecycle::{claim_bus_name, connect_system_bus, export_object, wait_for_shutdown_signal};
use auth_session_orchestrator::AuthenticationOrchestrator;
use authority_client::{
    register_agent_handshake, Authority, AuthorityClient, Registration, RegistrationOptions,
};
use credential_verifier::{ActingUserHints, CredentialVerifier};
use polkit_protocol_types::{build_session_subject, AGENT_OBJECT_PATH};
use session_resolver::{Loginctl, SessionResolver};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Run the agent until SIGINT or SIGTERM.
///
/// Every step before serving is fatal on failure. Once registered, a one-line
/// notice naming the session and `log_path` is printed to stdout.
pub async fn run_agent(config: &Config, log_path: &Path) -> Result<(), BootstrapError> {
    let connection = connect_system_bus().await?;
    info!(unique_name = ?connection.unique_name(), "Connected to system bus");

    claim_bus_name(&connection, &config.bus_name).await?;

    let verifier = CredentialVerifier::system(
        ActingUserHints::from_env(),
        &config.prompt_command,
        &config.verify_command,
        config.prompt_timeout(),
        config.verify_timeout(),
    )?;
    let authority: Arc<dyn Authority> = Arc::new(AuthorityClient::new(&connection).await?);
    let orchestrator = AuthenticationOrchestrator::new(verifier, authority.clone())
        .with_identity_enforcement(config.enforce_offered_identities);
    export_object(
        &connection,
        AGENT_OBJECT_PATH,
        AuthenticationAgent::new(orchestrator),
    )
    .await?;

    let session_id = session_resolver(config).resolve().await?;
    let registration = Registration {
        subject: build_session_subject(session_id.clone()),
        locale: config.locale(),
        agent_path: AGENT_OBJECT_PATH.to_string(),
    };
    let outcome =
        register_agent_handshake(authority.as_ref(), &registration, &RegistrationOptions::new())
            .await?;
    info!(
        session_id = %session_id,
        bus_name = %config.bus_name,
        handshake = ?outcome,
        "Authentication agent ready"
    );
    println!("{}", startup_notice(&session_id, log_path));

    wait_for_shutdown_signal().await?;

    if let Err(e) = authority
        .unregister_agent(&registration.subject, &registration.agent_path)
        .await
    {
        warn!(error = %e, code = e.code(), "Failed to unregister on shutdown");
    }
    info!("Authentication agent stopped");
    Ok(())
}

/// Print the session id and where it came from.
pub async fn print_session(config: &Config) -> Result<(), BootstrapError> {
    let (session_id, source) = session_resolver(config).resolve_with_source().await?;
    info!(session_id = %session_id, ?source, "Resolved session");
    println!("{session_id}");
    Ok(())
}

fn session_resolver(config: &Config) -> SessionResolver<Loginctl> {
    SessionResolver::from_env(Loginctl::new(config.session_query_timeout()))
}

fn startup_notice(session_id: &str, log_path: &Path) -> String {
    format!(
        "polkit-agent registered for session {session_id}; logging to {}",
        log_path.display()
    )
}
