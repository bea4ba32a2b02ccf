//! Agent lifecycle management for the polkit agent.
//!
//! Handles the system-bus connection, singleton enforcement through a
//! well-known bus name, object export, and graceful shutdown.

use thiserror::Error;
use tracing::info;
use zbus::fdo::{RequestNameFlags, RequestNameReply};
use zbus::names::WellKnownName;
use zbus::object_server::Interface;
use zbus::Connection;

/// Errors from lifecycle management.
#[derive(Error, Debug)]
pub enum LifecycleError {
    #[error("Failed to connect to the system bus: {0}")]
    BusConnect(#[source] zbus::Error),
    #[error("Invalid bus name '{name}': {reason}")]
    InvalidBusName { name: String, reason: String },
    #[error("Bus name '{name}' is already owned by another process")]
    BusNameUnavailable { name: String },
    #[error("Failed to export object at {path}: {reason}")]
    ExportFailed { path: String, reason: String },
    #[error("Bus error: {0}")]
    Bus(#[from] zbus::Error),
    #[error("Failed to install signal handler: {0}")]
    Signal(#[source] std::io::Error),
}

impl LifecycleError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::BusConnect(_) => "bus_connect_failed",
            Self::InvalidBusName { .. } => "invalid_bus_name",
            Self::BusNameUnavailable { .. } => "bus_name_unavailable",
            Self::ExportFailed { .. } => "export_failed",
            Self::Bus(_) => "bus_error",
            Self::Signal(_) => "signal_handler_failed",
        }
    }
}

/// Result of a do-not-queue name request.
#[derive(Debug, PartialEq, Eq)]
pub enum NameClaim {
    /// The name is ours now.
    Acquired,
    /// The name was already ours.
    AlreadyOwned,
    /// Another connection owns the name.
    Unavailable,
}

/// Classify a `RequestName` reply.
///
/// With do-not-queue semantics `InQueue` should never come back; if it does
/// the name is still not ours.
pub fn classify_name_reply(reply: RequestNameReply) -> NameClaim {
    match reply {
        RequestNameReply::PrimaryOwner => NameClaim::Acquired,
        RequestNameReply::AlreadyOwner => NameClaim::AlreadyOwned,
        RequestNameReply::InQueue | RequestNameReply::Exists => NameClaim::Unavailable,
    }
}

/// Connect to the system bus.
pub async fn connect_system_bus() -> Result<Connection, LifecycleError> {
    Connection::system().await.map_err(LifecycleError::BusConnect)
}

/// Claim `name` without queueing. An existing owner is an immediate
/// [`LifecycleError::BusNameUnavailable`].
pub async fn claim_bus_name(connection: &Connection, name: &str) -> Result<NameClaim, LifecycleError> {
    WellKnownName::try_from(name).map_err(|e| LifecycleError::InvalidBusName {
        name: name.to_string(),
        reason: e.to_string(),
    })?;

    let reply = connection
        .request_name_with_flags(name, RequestNameFlags::DoNotQueue.into())
        .await;

    let claim = match reply {
        Ok(reply) => classify_name_reply(reply),
        Err(zbus::Error::NameTaken) => NameClaim::Unavailable,
        Err(e) => return Err(LifecycleError::Bus(e)),
    };

    match claim {
        NameClaim::Unavailable => Err(LifecycleError::BusNameUnavailable {
            name: name.to_string(),
        }),
        claim => {
            info!(bus_name = %name, ?claim, "Claimed bus name");
            Ok(claim)
        }
    }
}

/// Export `iface` at `path`. A path that already hosts the interface is an
/// [`LifecycleError::ExportFailed`].
pub async fn export_object<I>(connection: &Connection, path: &str, iface: I) -> Result<(), LifecycleError>
where
    I: Interface,
{
    let added = connection
        .object_server()
        .at(path, iface)
        .await
        .map_err(|e| LifecycleError::ExportFailed {
            path: path.to_string(),
            reason: e.to_string(),
        })?;

    if !added {
        return Err(LifecycleError::ExportFailed {
            path: path.to_string(),
            reason: format!("interface {} already exported", I::name()),
        });
    }
    info!(path = %path, interface = %I::name(), "Exported object");
    Ok(())
}

/// Which signal ended the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownSignal {
    Interrupt,
    Terminate,
}

/// Wait for SIGINT or SIGTERM.
pub async fn wait_for_shutdown_signal() -> Result<ShutdownSignal, LifecycleError> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut interrupt = signal(SignalKind::interrupt()).map_err(LifecycleError::Signal)?;
    let mut terminate = signal(SignalKind::terminate()).map_err(LifecycleError::Signal)?;

    let received = tokio::select! {
        _ = interrupt.recv() => ShutdownSignal::Interrupt,
        _ = terminate.recv() => ShutdownSignal::Terminate,
    };
    info!(signal = ?received, "Received shutdown signal");
    Ok(received)
}
