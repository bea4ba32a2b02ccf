//! Per-request authentication state machine.
//!
//! ```text
//! Idle ──Begin──► Authenticating ──ResponseSent──► Responded
//!                        │
//!                        ├──Fail──────► Failed
//!                        └──Cancel────► Cancelled
//! ```
//!
//! Every `BeginAuthentication` call drives its own machine. Terminal states
//! accept no input.

use rust_fsm::*;

state_machine! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub request_machine(Idle)

    Idle => {
        Begin => Authenticating
    },
    Authenticating => {
        ResponseSent => Responded,
        Fail => Failed,
        Cancel => Cancelled
    }
}

pub use request_machine::Input as RequestInput;
pub use request_machine::State as RequestMachineState;
pub use request_machine::StateMachine as RequestMachine;

/// Stable view of a request's state for logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    Idle,
    Authenticating,
    Responded,
    Failed,
    Cancelled,
}

impl RequestState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Authenticating => "authenticating",
            Self::Responded => "responded",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Responded | Self::Failed | Self::Cancelled)
    }
}

impl From<&RequestMachineState> for RequestState {
    fn from(state: &RequestMachineState) -> Self {
        match state {
            RequestMachineState::Idle => Self::Idle,
            RequestMachineState::Authenticating => Self::Authenticating,
            RequestMachineState::Responded => Self::Responded,
            RequestMachineState::Failed => Self::Failed,
            RequestMachineState::Cancelled => Self::Cancelled,
        }
    }
}
