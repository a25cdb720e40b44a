//! State queue engine driving registered callbacks.

use super::options::MachineOptions;
use crate::core::{Next, StateFn, StateHistory, StateId, StateRegistry, StateResult, StepRecord};
use crate::error::EngineError;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

/// Lifecycle of the state queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueStatus {
    /// Never started, or reset since
    Idle,

    /// Accepting steps
    Running,

    /// Stopped by the caller; a plain `start` resumes where it left off
    Stopped,

    /// Stopped by the exit state or a terminate result; a plain `start`
    /// begins again from the starting state unless the pointers were moved
    /// since
    Finished,
}

/// Finite state machine running a queue of caller-registered states.
///
/// Each state is a callback that does its work and names the state to run
/// next. The engine tracks the current and next state, and runs one callback
/// per [`step`](Self::step) until the queue is stopped.
///
/// # Example
///
/// ```rust
/// use statequeue::{state_ids, StateMachine};
///
/// state_ids! {
///     enum Phase {
///         Get,
///         Output,
///         Exit,
///     }
/// }
///
/// let mut machine = StateMachine::new();
/// machine.add_state(Phase::Get, |_| Ok(Some(Phase::Output))).unwrap();
/// machine.add_state(Phase::Output, |_| Ok(Some(Phase::Exit))).unwrap();
/// machine.set_starting_state(Phase::Get);
/// machine.set_exit_state(Phase::Exit);
///
/// machine.start().unwrap();
/// while machine.is_running() {
///     machine.auto_exit_step().unwrap();
/// }
/// assert_eq!(machine.current_state(), Some(&Phase::Output));
/// ```
pub struct StateMachine<S: StateId> {
    registry: StateRegistry<S>,
    options: MachineOptions,
    current: Option<S>,
    next: Option<S>,
    starting: Option<S>,
    exit: Option<S>,
    status: QueueStatus,
    steps: usize,
    history: StateHistory<S>,
}

impl<S: StateId> StateMachine<S> {
    /// Create an engine with default options.
    pub fn new() -> Self {
        Self::with_options(MachineOptions::default())
    }

    pub fn with_options(options: MachineOptions) -> Self {
        Self {
            registry: StateRegistry::new(options.duplicates),
            history: StateHistory::new(options.history_limit),
            options,
            current: None,
            next: None,
            starting: None,
            exit: None,
            status: QueueStatus::Idle,
            steps: 0,
        }
    }

    pub fn options(&self) -> &MachineOptions {
        &self.options
    }

    /// Bind `callback` to `id`.
    ///
    /// Legal at any time; a state added while the queue runs is found on the
    /// next lookup.
    pub fn add_state<F>(&mut self, id: S, callback: F) -> Result<(), EngineError>
    where
        F: FnMut(&S) -> StateResult<S> + Send + 'static,
    {
        self.register(id, Box::new(callback))
    }

    pub(crate) fn register(&mut self, id: S, callback: StateFn<S>) -> Result<(), EngineError> {
        let replaced = self.registry.insert(id.clone(), callback)?;
        tracing::debug!(state = %id.name(), replaced, "registered state");

        if self.options.adopt_first_state && self.starting.is_none() {
            self.starting = self.registry.first().cloned();
            tracing::debug!(state = %id.name(), "adopted first registered state as starting state");
        }
        Ok(())
    }

    pub fn set_starting_state(&mut self, id: S) {
        self.starting = Some(id);
    }

    pub fn set_exit_state(&mut self, id: S) {
        self.exit = Some(id);
    }

    pub fn starting_state(&self) -> Option<&S> {
        self.starting.as_ref()
    }

    pub fn exit_state(&self) -> Option<&S> {
        self.exit.as_ref()
    }

    pub fn current_state(&self) -> Option<&S> {
        self.current.as_ref()
    }

    pub fn next_state(&self) -> Option<&S> {
        self.next.as_ref()
    }

    pub fn is_running(&self) -> bool {
        self.status == QueueStatus::Running
    }

    pub fn status(&self) -> QueueStatus {
        self.status
    }

    pub fn contains_state(&self, id: &S) -> bool {
        self.registry.contains(id)
    }

    pub fn state_count(&self) -> usize {
        self.registry.len()
    }

    /// Pointer-moving executions since the last reset.
    pub fn steps_taken(&self) -> usize {
        self.steps
    }

    pub fn history(&self) -> &StateHistory<S> {
        &self.history
    }

    /// Check every start precondition, collecting all failures.
    ///
    /// # Example
    ///
    /// ```rust
    /// use statequeue::StateMachine;
    /// use stillwater::validation::Validation;
    ///
    /// let machine: StateMachine<&'static str> = StateMachine::new();
    /// match machine.validate() {
    ///     Validation::Failure(errors) => assert_eq!(errors.len(), 2),
    ///     Validation::Success(_) => panic!("nothing is configured"),
    /// }
    /// ```
    pub fn validate(&self) -> Validation<(), NonEmptyVec<EngineError>> {
        let checks: Vec<Validation<(), NonEmptyVec<EngineError>>> = self
            .preflight()
            .into_iter()
            .map(|check| match check {
                Ok(()) => Validation::success(()),
                Err(error) => Validation::fail(error),
            })
            .collect();

        Validation::all_vec(checks).map(|_| ())
    }

    /// Start the queue.
    ///
    /// A queue stopped mid-flight resumes from its stored pointers. A fresh
    /// queue starts from the starting state, and so does a finished one whose
    /// next pointer still names the exit state or nothing. A finished queue
    /// whose next state was overridden resumes from the override. Starting a
    /// running queue does nothing.
    pub fn start(&mut self) -> Result<(), EngineError> {
        self.ensure_startable()?;

        let resume = match self.status {
            QueueStatus::Running => return Ok(()),
            QueueStatus::Finished => self.next.is_some() && self.next != self.exit,
            QueueStatus::Idle | QueueStatus::Stopped => self.next.is_some(),
        };
        if !resume {
            self.rewind();
        }

        self.status = QueueStatus::Running;
        tracing::debug!(
            resumed = resume,
            next = ?self.next,
            "state queue started"
        );
        Ok(())
    }

    /// Start the queue from the starting state, discarding any stored pointers.
    ///
    /// A running queue is left as it is.
    pub fn start_and_reset(&mut self) -> Result<(), EngineError> {
        self.ensure_startable()?;
        if self.is_running() {
            return Ok(());
        }
        self.rewind();
        self.status = QueueStatus::Running;
        tracing::debug!(next = ?self.next, "state queue started from the beginning");
        Ok(())
    }

    /// Stop the queue. Does nothing unless it is running.
    pub fn stop(&mut self) {
        if self.status == QueueStatus::Running {
            self.status = QueueStatus::Stopped;
            tracing::debug!(current = ?self.current, next = ?self.next, "state queue stopped");
        }
    }

    /// Point both current and next at the starting state.
    pub fn reset(&mut self) -> Result<(), EngineError> {
        self.ensure_idle("reset the state queue")?;
        let starting = self
            .starting
            .as_ref()
            .ok_or(EngineError::MissingStartingState)?;
        self.registry.ensure(starting)?;

        self.rewind();
        self.status = QueueStatus::Idle;
        tracing::debug!(next = ?self.next, "state queue reset");
        Ok(())
    }

    /// Run the next state and advance the queue by one.
    ///
    /// Stops the queue on a terminate result, and on the exit state when
    /// `auto_exit` is enabled.
    pub fn step(&mut self) -> Result<Next<S>, EngineError> {
        self.advance(self.options.auto_exit)
    }

    /// Like [`step`](Self::step), but always stops the queue when the exit
    /// state is returned.
    pub fn auto_exit_step(&mut self) -> Result<Next<S>, EngineError> {
        self.advance(true)
    }

    /// Run `id` out of band, discarding its result.
    ///
    /// Never touches the queue pointers and may be called in any status.
    pub fn run_state(&mut self, id: &S) -> Result<(), EngineError> {
        self.run_and_get_state(id).map(|_| ())
    }

    /// Run `id` out of band and return where it would send the queue.
    pub fn run_and_get_state(&mut self, id: &S) -> Result<Next<S>, EngineError> {
        let result = self.registry.invoke(id)?;
        let next = self.options.on_empty.resolve(id, result);
        tracing::trace!(state = %id.name(), next = ?next, "ran state out of band");
        Ok(next)
    }

    pub fn set_current_state(&mut self, id: S) -> Result<(), EngineError> {
        self.ensure_idle("set the current state")?;
        self.registry.ensure(&id)?;
        self.current = Some(id);
        Ok(())
    }

    pub fn set_next_state(&mut self, id: S) -> Result<(), EngineError> {
        self.ensure_idle("set the next state")?;
        self.registry.ensure(&id)?;
        self.next = Some(id);
        Ok(())
    }

    /// Run the current state and store its result as the next state.
    pub fn run_current_state(&mut self) -> Result<Next<S>, EngineError> {
        self.ensure_idle("run the current state")?;
        let state = self
            .current
            .clone()
            .ok_or(EngineError::PointerUnset("current"))?;
        self.registry.ensure(&state)?;
        self.execute(&state)
    }

    /// Move to the next state, run it, and store its result as the next state.
    pub fn run_next_state(&mut self) -> Result<Next<S>, EngineError> {
        self.ensure_idle("run the next state")?;
        let state = self
            .next
            .clone()
            .ok_or(EngineError::PointerUnset("next"))?;
        self.registry.ensure(&state)?;
        self.current = Some(state.clone());
        self.execute(&state)
    }

    fn advance(&mut self, check_exit: bool) -> Result<Next<S>, EngineError> {
        if self.status != QueueStatus::Running {
            return Err(EngineError::NotRunning);
        }

        let state = self
            .next
            .clone()
            .ok_or(EngineError::PointerUnset("next"))?;
        self.registry.ensure(&state)?;
        self.current = Some(state.clone());

        let next = self.execute(&state)?;
        let finished = match &next {
            Next::Goto(target) => check_exit && self.exit.as_ref() == Some(target),
            Next::Terminate => true,
        };
        if finished {
            self.status = QueueStatus::Finished;
            tracing::debug!(state = %state.name(), steps = self.steps, "state queue finished");
        }
        Ok(next)
    }

    // `current` must already point at `state`.
    fn execute(&mut self, state: &S) -> Result<Next<S>, EngineError> {
        let result = self.registry.invoke(state)?;
        let next = self.options.on_empty.resolve(state, result);

        self.next = next.state().cloned();
        self.steps += 1;
        self.history.record(StepRecord {
            state: state.clone(),
            next: next.clone(),
            timestamp: Utc::now(),
            step: self.steps,
        });
        tracing::debug!(state = %state.name(), next = ?next, step = self.steps, "ran state");
        Ok(next)
    }

    fn rewind(&mut self) {
        self.current = self.starting.clone();
        self.next = self.starting.clone();
        self.steps = 0;
        self.history.clear();
    }

    fn preflight(&self) -> Vec<Result<(), EngineError>> {
        let starting = match &self.starting {
            Some(state) => self.registry.ensure(state),
            None => Err(EngineError::MissingStartingState),
        };
        let exit = if self.options.requires_exit_state() && self.exit.is_none() {
            Err(EngineError::MissingExitState)
        } else {
            Ok(())
        };
        vec![starting, exit]
    }

    fn ensure_startable(&self) -> Result<(), EngineError> {
        self.preflight().into_iter().collect()
    }

    fn ensure_idle(&self, operation: &'static str) -> Result<(), EngineError> {
        if self.is_running() {
            Err(EngineError::EngineBusy { operation })
        } else {
            Ok(())
        }
    }
}

impl<S: StateId> Default for StateMachine<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: StateId> fmt::Debug for StateMachine<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateMachine")
            .field("states", &self.registry.len())
            .field("current", &self.current)
            .field("next", &self.next)
            .field("starting", &self.starting)
            .field("exit", &self.exit)
            .field("status", &self.status)
            .field("steps", &self.steps)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{DuplicatePolicy, OnEmptyResult, StateFailure};
    use crate::state_ids;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    state_ids! {
        enum Phase {
            Get,
            Output,
            Exit,
        }
    }

    fn demo_machine() -> StateMachine<Phase> {
        let mut machine = StateMachine::new();
        machine
            .add_state(Phase::Get, |_| Ok(Some(Phase::Output)))
            .unwrap();
        machine
            .add_state(Phase::Output, |_| Ok(Some(Phase::Exit)))
            .unwrap();
        machine.set_starting_state(Phase::Get);
        machine.set_exit_state(Phase::Exit);
        machine
    }

    fn terminate_options() -> MachineOptions {
        MachineOptions {
            on_empty: OnEmptyResult::Terminate,
            ..MachineOptions::default()
        }
    }

    #[test]
    fn new_machine_is_idle_and_empty() {
        let machine: StateMachine<Phase> = StateMachine::new();
        assert_eq!(machine.status(), QueueStatus::Idle);
        assert!(!machine.is_running());
        assert_eq!(machine.current_state(), None);
        assert_eq!(machine.next_state(), None);
        assert_eq!(machine.state_count(), 0);
    }

    #[test]
    fn start_requires_starting_state() {
        let mut machine = demo_machine();
        machine.starting = None;
        assert_eq!(machine.start(), Err(EngineError::MissingStartingState));
        assert!(!machine.is_running());
    }

    #[test]
    fn start_requires_exit_state_in_repeat_mode() {
        let mut machine = demo_machine();
        machine.exit = None;
        assert_eq!(machine.start(), Err(EngineError::MissingExitState));
    }

    #[test]
    fn start_rejects_unregistered_starting_state() {
        let mut machine = demo_machine();
        machine.set_starting_state(Phase::Exit);
        assert_eq!(
            machine.start(),
            Err(EngineError::UnknownState {
                state: "Exit".to_string()
            })
        );
    }

    #[test]
    fn terminate_mode_starts_without_exit_state() {
        let mut machine = StateMachine::with_options(terminate_options());
        machine.add_state("only", |_| Ok(None)).unwrap();
        machine.set_starting_state("only");

        machine.start().unwrap();
        assert!(machine.is_running());
    }

    #[test]
    fn validate_collects_every_failure() {
        let machine: StateMachine<Phase> = StateMachine::new();
        match machine.validate() {
            Validation::Failure(errors) => {
                assert_eq!(errors.len(), 2);
                assert!(errors
                    .iter()
                    .any(|e| matches!(e, EngineError::MissingStartingState)));
                assert!(errors
                    .iter()
                    .any(|e| matches!(e, EngineError::MissingExitState)));
            }
            Validation::Success(_) => panic!("Expected failures, got success"),
        }

        assert!(demo_machine().validate().is_success());
    }

    #[test]
    fn first_start_points_at_starting_state() {
        let mut machine = demo_machine();
        machine.start().unwrap();

        assert_eq!(machine.status(), QueueStatus::Running);
        assert_eq!(machine.current_state(), Some(&Phase::Get));
        assert_eq!(machine.next_state(), Some(&Phase::Get));
    }

    #[test]
    fn step_before_start_is_rejected() {
        let mut machine = demo_machine();
        assert_eq!(machine.step(), Err(EngineError::NotRunning));
        assert_eq!(machine.current_state(), None);
    }

    #[test]
    fn plain_step_does_not_stop_on_exit_state() {
        let mut machine = demo_machine();
        machine.start().unwrap();

        machine.step().unwrap();
        let next = machine.step().unwrap();

        assert_eq!(next, Next::Goto(Phase::Exit));
        assert!(machine.is_running());
        assert_eq!(machine.next_state(), Some(&Phase::Exit));

        // Exit has no callback bound.
        assert_eq!(
            machine.step(),
            Err(EngineError::UnknownState {
                state: "Exit".to_string()
            })
        );
        assert_eq!(machine.current_state(), Some(&Phase::Output));
    }

    #[test]
    fn auto_exit_option_makes_step_stop() {
        let mut machine = StateMachine::with_options(MachineOptions {
            auto_exit: true,
            ..MachineOptions::default()
        });
        machine.add_state(Phase::Get, |_| Ok(Some(Phase::Exit))).unwrap();
        machine.set_starting_state(Phase::Get);
        machine.set_exit_state(Phase::Exit);

        machine.start().unwrap();
        machine.step().unwrap();

        assert_eq!(machine.status(), QueueStatus::Finished);
    }

    #[test]
    fn empty_result_repeats_in_repeat_mode() {
        let mut machine = StateMachine::new();
        machine.add_state(Phase::Get, |_| Ok(None)).unwrap();
        machine.set_starting_state(Phase::Get);
        machine.set_exit_state(Phase::Exit);
        machine.start().unwrap();

        for _ in 0..3 {
            assert_eq!(machine.auto_exit_step(), Ok(Next::Goto(Phase::Get)));
        }
        assert!(machine.is_running());
        assert_eq!(machine.steps_taken(), 3);
    }

    #[test]
    fn empty_result_terminates_in_terminate_mode() {
        let mut machine = StateMachine::with_options(terminate_options());
        machine.add_state("s1", |_| Ok(None)).unwrap();
        machine.set_starting_state("s1");
        machine.start().unwrap();

        assert_eq!(machine.step(), Ok(Next::Terminate));
        assert_eq!(machine.status(), QueueStatus::Finished);
        assert_eq!(machine.current_state(), Some(&"s1"));
        assert_eq!(machine.next_state(), None);
        assert_eq!(machine.step(), Err(EngineError::NotRunning));
    }

    #[test]
    fn stop_then_start_resumes() {
        let mut machine = demo_machine();
        machine.start().unwrap();
        machine.step().unwrap();
        machine.stop();
        assert_eq!(machine.status(), QueueStatus::Stopped);

        machine.start().unwrap();
        assert_eq!(machine.current_state(), Some(&Phase::Get));
        assert_eq!(machine.next_state(), Some(&Phase::Output));

        machine.step().unwrap();
        assert_eq!(machine.current_state(), Some(&Phase::Output));
    }

    #[test]
    fn start_and_reset_rewinds_stopped_queue() {
        let mut machine = demo_machine();
        machine.start().unwrap();
        machine.step().unwrap();
        machine.stop();

        machine.start_and_reset().unwrap();

        assert!(machine.is_running());
        assert_eq!(machine.next_state(), Some(&Phase::Get));
        assert_eq!(machine.steps_taken(), 0);
        assert!(machine.history().is_empty());
    }

    #[test]
    fn start_and_reset_leaves_running_queue_alone() {
        let mut machine = demo_machine();
        machine.start().unwrap();
        machine.step().unwrap();

        assert_eq!(machine.start_and_reset(), Ok(()));
        assert!(machine.is_running());
        assert_eq!(machine.current_state(), Some(&Phase::Get));
        assert_eq!(machine.next_state(), Some(&Phase::Output));
        assert_eq!(machine.steps_taken(), 1);
    }

    #[test]
    fn start_and_reset_rewinds_finished_queue() {
        let mut machine = demo_machine();
        machine.start().unwrap();
        machine.auto_exit_step().unwrap();
        machine.auto_exit_step().unwrap();
        machine.set_next_state(Phase::Output).unwrap();

        machine.start_and_reset().unwrap();

        assert_eq!(machine.next_state(), Some(&Phase::Get));
        assert_eq!(machine.steps_taken(), 0);
    }

    #[test]
    fn finished_queue_restarts_from_beginning() {
        let mut machine = demo_machine();
        machine.start().unwrap();
        machine.auto_exit_step().unwrap();
        machine.auto_exit_step().unwrap();
        assert_eq!(machine.status(), QueueStatus::Finished);
        assert_eq!(machine.next_state(), Some(&Phase::Exit));

        machine.start().unwrap();
        assert_eq!(machine.next_state(), Some(&Phase::Get));
    }

    #[test]
    fn terminated_queue_restarts_from_beginning() {
        let mut machine = StateMachine::with_options(terminate_options());
        machine.add_state("s1", |_| Ok(None)).unwrap();
        machine.set_starting_state("s1");
        machine.start().unwrap();
        machine.step().unwrap();
        assert_eq!(machine.next_state(), None);

        machine.start().unwrap();
        assert_eq!(machine.next_state(), Some(&"s1"));
        assert_eq!(machine.steps_taken(), 0);
    }

    #[test]
    fn finished_queue_resumes_from_manual_override() {
        let mut machine = demo_machine();
        machine.start().unwrap();
        machine.auto_exit_step().unwrap();
        machine.auto_exit_step().unwrap();
        assert_eq!(machine.status(), QueueStatus::Finished);

        machine.set_next_state(Phase::Output).unwrap();
        machine.start().unwrap();

        assert!(machine.is_running());
        assert_eq!(machine.next_state(), Some(&Phase::Output));
        assert_eq!(machine.steps_taken(), 2);

        machine.auto_exit_step().unwrap();
        assert_eq!(machine.current_state(), Some(&Phase::Output));
        assert_eq!(machine.status(), QueueStatus::Finished);
    }

    #[test]
    fn state_added_after_start_is_reachable() {
        let mut machine = StateMachine::new();
        machine
            .add_state(Phase::Get, |_| Ok(Some(Phase::Output)))
            .unwrap();
        machine.set_starting_state(Phase::Get);
        machine.set_exit_state(Phase::Exit);
        machine.start().unwrap();
        machine.auto_exit_step().unwrap();

        machine
            .add_state(Phase::Output, |_| Ok(Some(Phase::Exit)))
            .unwrap();
        assert!(machine.is_running());

        assert_eq!(machine.auto_exit_step(), Ok(Next::Goto(Phase::Exit)));
        assert_eq!(machine.current_state(), Some(&Phase::Output));
        assert_eq!(machine.status(), QueueStatus::Finished);
    }

    #[test]
    fn start_while_running_is_a_no_op() {
        let mut machine = demo_machine();
        machine.start().unwrap();
        machine.step().unwrap();
        machine.start().unwrap();

        assert_eq!(machine.next_state(), Some(&Phase::Output));
    }

    #[test]
    fn stop_is_idempotent() {
        let mut machine = demo_machine();
        machine.stop();
        assert_eq!(machine.status(), QueueStatus::Idle);

        machine.start().unwrap();
        machine.stop();
        machine.stop();
        assert_eq!(machine.status(), QueueStatus::Stopped);
    }

    #[test]
    fn reset_requires_idle_queue_and_starting_state() {
        let mut machine = demo_machine();
        machine.start().unwrap();
        assert!(matches!(
            machine.reset(),
            Err(EngineError::EngineBusy { .. })
        ));

        machine.stop();
        machine.reset().unwrap();
        assert_eq!(machine.status(), QueueStatus::Idle);
        assert_eq!(machine.current_state(), Some(&Phase::Get));

        let mut bare: StateMachine<Phase> = StateMachine::new();
        assert_eq!(bare.reset(), Err(EngineError::MissingStartingState));
    }

    #[test]
    fn manual_queue_operations_are_busy_while_running() {
        let mut machine = demo_machine();
        machine.start().unwrap();
        machine.step().unwrap();

        for result in [machine.run_current_state(), machine.run_next_state()] {
            assert!(matches!(result, Err(EngineError::EngineBusy { .. })));
        }
        assert!(matches!(
            machine.set_current_state(Phase::Output),
            Err(EngineError::EngineBusy { .. })
        ));
        assert!(matches!(
            machine.set_next_state(Phase::Get),
            Err(EngineError::EngineBusy { .. })
        ));
        assert_eq!(machine.current_state(), Some(&Phase::Get));
        assert_eq!(machine.next_state(), Some(&Phase::Output));
    }

    #[test]
    fn run_current_state_updates_next_only() {
        let mut machine = demo_machine();
        machine.set_current_state(Phase::Output).unwrap();

        let next = machine.run_current_state().unwrap();

        assert_eq!(next, Next::Goto(Phase::Exit));
        assert_eq!(machine.current_state(), Some(&Phase::Output));
        assert_eq!(machine.next_state(), Some(&Phase::Exit));
        assert_eq!(machine.status(), QueueStatus::Idle);
    }

    #[test]
    fn run_next_state_moves_current() {
        let mut machine = demo_machine();
        machine.set_next_state(Phase::Get).unwrap();

        machine.run_next_state().unwrap();

        assert_eq!(machine.current_state(), Some(&Phase::Get));
        assert_eq!(machine.next_state(), Some(&Phase::Output));
        assert_eq!(machine.history().len(), 1);
    }

    #[test]
    fn manual_run_needs_pointer() {
        let mut machine = demo_machine();
        assert_eq!(
            machine.run_current_state(),
            Err(EngineError::PointerUnset("current"))
        );
        assert_eq!(
            machine.run_next_state(),
            Err(EngineError::PointerUnset("next"))
        );
    }

    #[test]
    fn setters_reject_unknown_states() {
        let mut machine = demo_machine();
        assert!(matches!(
            machine.set_current_state(Phase::Exit),
            Err(EngineError::UnknownState { .. })
        ));
        assert_eq!(machine.current_state(), None);
    }

    #[test]
    fn stopped_queue_resumes_from_manual_override() {
        let mut machine = demo_machine();
        machine.start().unwrap();
        machine.step().unwrap();
        machine.stop();

        machine.set_next_state(Phase::Get).unwrap();
        machine.start().unwrap();
        machine.step().unwrap();

        assert_eq!(machine.current_state(), Some(&Phase::Get));
    }

    #[test]
    fn run_state_leaves_pointers_alone() {
        let mut machine = demo_machine();
        machine.start().unwrap();
        machine.step().unwrap();

        machine.run_state(&Phase::Output).unwrap();
        assert_eq!(
            machine.run_and_get_state(&Phase::Output),
            Ok(Next::Goto(Phase::Exit))
        );

        assert_eq!(machine.current_state(), Some(&Phase::Get));
        assert_eq!(machine.next_state(), Some(&Phase::Output));
        assert!(machine.is_running());
        assert_eq!(machine.history().len(), 1);
    }

    #[test]
    fn run_and_get_state_applies_discipline() {
        let mut repeat = StateMachine::new();
        repeat.add_state("idle", |_| Ok(None)).unwrap();
        assert_eq!(repeat.run_and_get_state(&"idle"), Ok(Next::Goto("idle")));

        let mut terminate = StateMachine::with_options(terminate_options());
        terminate.add_state("idle", |_| Ok(None)).unwrap();
        assert_eq!(terminate.run_and_get_state(&"idle"), Ok(Next::Terminate));

        assert!(matches!(
            terminate.run_state(&"missing"),
            Err(EngineError::UnknownState { .. })
        ));
    }

    #[test]
    fn body_failure_propagates_and_queue_keeps_running() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&attempts);

        let mut machine = StateMachine::new();
        machine
            .add_state(Phase::Get, move |_| {
                if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(StateFailure::new("no input"))
                } else {
                    Ok(Some(Phase::Output))
                }
            })
            .unwrap();
        machine.set_starting_state(Phase::Get);
        machine.set_exit_state(Phase::Exit);
        machine.start().unwrap();

        assert_eq!(
            machine.step(),
            Err(EngineError::StateFailed {
                state: "Get".to_string(),
                source: StateFailure::new("no input"),
            })
        );
        assert!(machine.is_running());
        assert_eq!(machine.next_state(), Some(&Phase::Get));

        assert_eq!(machine.step(), Ok(Next::Goto(Phase::Output)));
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn adopt_first_state_is_opt_in() {
        let mut strict: StateMachine<Phase> = StateMachine::new();
        strict.add_state(Phase::Output, |_| Ok(None)).unwrap();
        assert_eq!(strict.starting_state(), None);

        let mut lenient = StateMachine::with_options(MachineOptions {
            adopt_first_state: true,
            ..terminate_options()
        });
        lenient.add_state(Phase::Output, |_| Ok(None)).unwrap();
        lenient.add_state(Phase::Get, |_| Ok(None)).unwrap();
        assert_eq!(lenient.starting_state(), Some(&Phase::Output));

        lenient.start().unwrap();
        assert_eq!(lenient.next_state(), Some(&Phase::Output));
    }

    #[test]
    fn duplicate_policy_comes_from_options() {
        let mut strict: StateMachine<Phase> = StateMachine::new();
        strict.add_state(Phase::Get, |_| Ok(None)).unwrap();
        assert!(matches!(
            strict.add_state(Phase::Get, |_| Ok(None)),
            Err(EngineError::DuplicateState { .. })
        ));

        let mut lenient = StateMachine::with_options(MachineOptions {
            duplicates: DuplicatePolicy::Overwrite,
            ..MachineOptions::default()
        });
        lenient.add_state(Phase::Get, |_| Ok(None)).unwrap();
        lenient
            .add_state(Phase::Get, |_| Ok(Some(Phase::Output)))
            .unwrap();
        assert_eq!(
            lenient.run_and_get_state(&Phase::Get),
            Ok(Next::Goto(Phase::Output))
        );
    }

    #[test]
    fn history_tracks_queue_steps() {
        let mut machine = demo_machine();
        machine.start().unwrap();
        machine.auto_exit_step().unwrap();
        machine.auto_exit_step().unwrap();

        let path = machine.history().path();
        assert_eq!(path, vec![&Phase::Get, &Phase::Output, &Phase::Exit]);
        assert_eq!(machine.history().last().map(|r| r.step), Some(2));
    }

    #[test]
    fn debug_shows_pointers() {
        let mut machine = demo_machine();
        machine.start().unwrap();
        let rendered = format!("{machine:?}");
        assert!(rendered.contains("current: Some(Get)"));
        assert!(rendered.contains("status: Running"));
    }
}
