//! The state queue engine.
//!
//! Owns the registry and the current/next/starting/exit pointers, and exposes
//! the run-loop API (`start`, `step`, `stop`, `reset`) next to the manual
//! override API (`run_state`, `set_current_state`, `run_next_state`, ...).

mod machine;
mod options;

pub use machine::{QueueStatus, StateMachine};
pub use options::{MachineOptions, DEFAULT_HISTORY_LIMIT};
