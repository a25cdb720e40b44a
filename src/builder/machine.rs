//! Builder for constructing state machines.

use crate::core::{DuplicatePolicy, OnEmptyResult, StateFn, StateId, StateResult};
use crate::engine::{MachineOptions, StateMachine};
use crate::error::EngineError;

/// Builder for constructing state machines with a fluent API.
///
/// States are registered in declaration order when [`build`](Self::build)
/// runs, so registration errors surface there.
pub struct StateMachineBuilder<S: StateId> {
    options: MachineOptions,
    starting: Option<S>,
    exit: Option<S>,
    states: Vec<(S, StateFn<S>)>,
}

impl<S: StateId> StateMachineBuilder<S> {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            options: MachineOptions::default(),
            starting: None,
            exit: None,
            states: Vec::new(),
        }
    }

    /// Replace all options at once.
    pub fn options(mut self, options: MachineOptions) -> Self {
        self.options = options;
        self
    }

    pub fn on_empty(mut self, on_empty: OnEmptyResult) -> Self {
        self.options.on_empty = on_empty;
        self
    }

    pub fn duplicates(mut self, policy: DuplicatePolicy) -> Self {
        self.options.duplicates = policy;
        self
    }

    pub fn auto_exit(mut self, enabled: bool) -> Self {
        self.options.auto_exit = enabled;
        self
    }

    pub fn adopt_first_state(mut self, enabled: bool) -> Self {
        self.options.adopt_first_state = enabled;
        self
    }

    pub fn history_limit(mut self, limit: usize) -> Self {
        self.options.history_limit = limit;
        self
    }

    /// Set the state the queue starts from.
    pub fn starting(mut self, state: S) -> Self {
        self.starting = Some(state);
        self
    }

    /// Set the state whose return stops the queue.
    pub fn exit(mut self, state: S) -> Self {
        self.exit = Some(state);
        self
    }

    /// Bind a callback to a state.
    pub fn state<F>(mut self, id: S, callback: F) -> Self
    where
        F: FnMut(&S) -> StateResult<S> + Send + 'static,
    {
        self.states.push((id, Box::new(callback)));
        self
    }

    /// Build the state machine.
    /// Returns an error if a state cannot be registered.
    pub fn build(self) -> Result<StateMachine<S>, EngineError> {
        let mut machine = StateMachine::with_options(self.options);
        for (id, callback) in self.states {
            machine.register(id, callback)?;
        }
        if let Some(starting) = self.starting {
            machine.set_starting_state(starting);
        }
        if let Some(exit) = self.exit {
            machine.set_exit_state(exit);
        }
        Ok(machine)
    }
}

impl<S: StateId> Default for StateMachineBuilder<S> {
    fn default() -> Self {
        Self::new()
    }
}
