//! Construction-time configuration for a [`StateMachine`](super::StateMachine).

use crate::core::{DuplicatePolicy, OnEmptyResult};
use serde::{Deserialize, Serialize};

/// Default number of step records an engine keeps.
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Knobs fixed when an engine is created.
///
/// Missing fields take their defaults when deserialized, so a partial
/// document such as `{"on_empty": "terminate"}` is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineOptions {
    /// Meaning of a state returning no next state
    pub on_empty: OnEmptyResult,

    /// What registering an identifier twice does
    pub duplicates: DuplicatePolicy,

    /// Make plain `step` stop the queue when the exit state is returned
    pub auto_exit: bool,

    /// Adopt the first registered state as the starting state when none is set
    pub adopt_first_state: bool,

    /// Maximum step records retained
    pub history_limit: usize,
}

impl Default for MachineOptions {
    fn default() -> Self {
        Self {
            on_empty: OnEmptyResult::Repeat,
            duplicates: DuplicatePolicy::Reject,
            auto_exit: false,
            adopt_first_state: false,
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

impl MachineOptions {
    /// Whether the queue needs an exit state before it can start.
    pub fn requires_exit_state(&self) -> bool {
        self.on_empty == OnEmptyResult::Repeat
    }
}
