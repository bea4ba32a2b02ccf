//! Application wiring and lifecycle management.

mod agent_interface;
mod error;
mod init;

pub use agent_interface::AuthenticationAgent;
pub use error::BootstrapError;
pub use init::{print_session, run_agent};
