//! Statequeue: a callback-driven finite state machine engine
//!
//! Register named states, each bound to a callback that does the state's work
//! and returns the identifier of the state to run next. The engine keeps the
//! current and next state, and runs a "state queue" with explicit start, stop
//! and reset semantics, optionally stopping by itself when an exit state is
//! reached.
//!
//! # Core Concepts
//!
//! - **State identifiers**: any comparable, hashable value via the `StateId` trait
//! - **State bodies**: callbacks returning the next identifier, or nothing
//! - **Empty-result discipline**: nothing means "repeat" or "terminate", fixed per engine
//! - **State queue**: `Idle → Running → Stopped/Finished`, advanced one `step` at a time
//! - **Threaded states**: one body on its own thread, polled for completion
//!
//! # Example
//!
//! ```rust
//! use statequeue::{state_ids, OnEmptyResult, StateMachineBuilder};
//!
//! state_ids! {
//!     enum Counter {
//!         Count,
//!         Done,
//!     }
//! }
//!
//! let mut count = 0;
//! let mut machine = StateMachineBuilder::new()
//!     .on_empty(OnEmptyResult::Terminate)
//!     .state(Counter::Count, move |current: &Counter| {
//!         count += 1;
//!         Ok(Some(if count < 3 { *current } else { Counter::Done }))
//!     })
//!     .state(Counter::Done, |_| Ok(None))
//!     .starting(Counter::Count)
//!     .build()
//!     .unwrap();
//!
//! machine.start().unwrap();
//! while machine.is_running() {
//!     machine.step().unwrap();
//! }
//! assert_eq!(machine.current_state(), Some(&Counter::Done));
//! assert_eq!(machine.steps_taken(), 4);
//! ```

pub mod builder;
pub mod core;
pub mod engine;
pub mod error;
pub mod threaded;

// Re-export commonly used types
pub use builder::StateMachineBuilder;
pub use core::{
    DuplicatePolicy, Next, OnEmptyResult, StateFailure, StateHistory, StateId, StateResult,
    StepRecord,
};
pub use engine::{MachineOptions, QueueStatus, StateMachine};
pub use error::EngineError;
pub use threaded::ThreadedState;
