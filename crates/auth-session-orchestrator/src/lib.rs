//! # Authentication session orchestrator
//!
//! Handles one PolicyKit authentication challenge end to end: acting-user
//! resolution, uid lookup, password prompt and check, identity construction,
//! and the single response to the authority. Each request runs its own
//! [`RequestMachine`]; in-flight requests are tracked by cookie so
//! `CancelAuthentication` can abort them.

mod error;
mod orchestrator;
mod registry;
mod request_fsm;

pub use error::AuthenticationFailure;
pub use orchestrator::{AuthenticationOrchestrator, AuthenticationOutcome};
pub use registry::{InFlightGuard, InFlightRegistry};
pub use request_fsm::{RequestInput, RequestMachine, RequestMachineState, RequestState};
