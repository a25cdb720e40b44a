//! Errors raised by the registry, the engine and the threaded wrapper.

use crate::core::StateFailure;
use thiserror::Error;

/// Every failure the engine reports.
///
/// Usage and configuration errors are never folded into a queue exit, and a
/// state body's own failure is carried through as [`EngineError::StateFailed`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("State '{state}' is not registered")]
    UnknownState { state: String },

    #[error("State '{state}' is already registered")]
    DuplicateState { state: String },

    #[error("State identifier must not be empty")]
    EmptyStateId,

    #[error("Starting state not set. Call set_starting_state() before starting the queue")]
    MissingStartingState,

    #[error("Exit state not set. Empty results repeat, so the queue needs an exit state to stop")]
    MissingExitState,

    #[error("Cannot {operation} while the state queue is running")]
    EngineBusy { operation: &'static str },

    #[error("State queue must be started before stepping")]
    NotRunning,

    #[error("The {0} state pointer is not set")]
    PointerUnset(&'static str),

    #[error("State '{state}' has not finished yet")]
    NotDone { state: String },

    #[error("State '{state}' was already started")]
    AlreadyStarted { state: String },

    #[error("Failed to spawn a thread for state '{state}': {reason}")]
    SpawnFailed { state: String, reason: String },

    #[error("State '{state}' failed: {source}")]
    StateFailed {
        state: String,
        #[source]
        source: StateFailure,
    },

    #[error("State '{state}' panicked")]
    StatePanicked { state: String },
}
