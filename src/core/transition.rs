//! How a callback's return value becomes the next state.

use serde::{Deserialize, Serialize};

/// Meaning of a state body returning no next state.
///
/// Chosen once per engine at construction and never mixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnEmptyResult {
    /// Stay on the state that just ran. Only a match against the exit state
    /// stops the queue, so an exit state is required to start it.
    #[default]
    Repeat,

    /// Stop the queue. No exit state is required.
    Terminate,
}

/// Resolved outcome of running one state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Next<S> {
    /// Run this state next.
    Goto(S),

    /// The state asked the queue to stop.
    Terminate,
}

impl<S> Next<S> {
    pub fn is_terminate(&self) -> bool {
        matches!(self, Self::Terminate)
    }

    /// The state to run next, if any.
    pub fn state(&self) -> Option<&S> {
        match self {
            Self::Goto(state) => Some(state),
            Self::Terminate => None,
        }
    }

    pub fn into_state(self) -> Option<S> {
        match self {
            Self::Goto(state) => Some(state),
            Self::Terminate => None,
        }
    }
}

impl OnEmptyResult {
    /// Resolve a callback result for the state `current` that produced it.
    ///
    /// # Example
    ///
    /// ```rust
    /// use statequeue::core::{Next, OnEmptyResult};
    ///
    /// assert_eq!(OnEmptyResult::Repeat.resolve(&"a", None), Next::Goto("a"));
    /// assert_eq!(OnEmptyResult::Terminate.resolve(&"a", None), Next::Terminate);
    /// assert_eq!(OnEmptyResult::Terminate.resolve(&"a", Some("b")), Next::Goto("b"));
    /// ```
    pub fn resolve<S: Clone>(self, current: &S, result: Option<S>) -> Next<S> {
        match (result, self) {
            (Some(next), _) => Next::Goto(next),
            (None, Self::Repeat) => Next::Goto(current.clone()),
            (None, Self::Terminate) => Next::Terminate,
        }
    }
}
