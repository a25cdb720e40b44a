//! Builder API for ergonomic state machine construction.
//!
//! This module provides a fluent builder, a macro for declaring state
//! identifiers, and small constructors for common state bodies.

pub mod machine;
pub mod macros;

pub use machine::StateMachineBuilder;

use crate::core::{StateId, StateResult};

/// State body that always moves to `to`.
///
/// # Example
///
/// ```
/// use statequeue::builder::{goto, StateMachineBuilder};
///
/// let machine = StateMachineBuilder::new()
///     .state("get", goto("output"))
///     .build()
///     .unwrap();
/// assert!(machine.contains_state(&"get"));
/// ```
pub fn goto<S: StateId>(to: S) -> impl FnMut(&S) -> StateResult<S> + Send + 'static {
    move |_| Ok(Some(to.clone()))
}

/// State body that runs `work` and then moves to `to`.
pub fn then_goto<S, F>(mut work: F, to: S) -> impl FnMut(&S) -> StateResult<S> + Send + 'static
where
    S: StateId,
    F: FnMut() + Send + 'static,
{
    move |_| {
        work();
        Ok(Some(to.clone()))
    }
}
