// Error taxonomy for calls to the telemetry server
use crate::domain::simulator::SimulatorState;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientError {
    /// Network unreachable, connection dropped, timeout or a non-2xx answer.
    #[error("transport error: {0}")]
    Transport(String),

    /// Malformed JSON or a missing required field.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The server disagrees with the requested transition.
    #[error("state conflict: {0}")]
    StateConflict(String),
}

/// Outbound call currently awaiting its response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingCall {
    Start,
    Stop,
    Status,
}

impl fmt::Display for PendingCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PendingCall::Start => f.write_str("start"),
            PendingCall::Stop => f.write_str("stop"),
            PendingCall::Status => f.write_str("status"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ControlError {
    #[error("a {0} request is still in flight")]
    InFlight(PendingCall),

    #[error("cannot {action} while the simulator is {state}")]
    Unavailable {
        action: &'static str,
        state: SimulatorState,
    },

    #[error(transparent)]
    Client(#[from] ClientError),
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigEditError {
    #[error("'{raw}' is not a number for {field}")]
    InvalidNumber { field: String, raw: String },
}
