//! Run a single state body on its own thread and poll for the outcome.
//!
//! This is a caller-level convenience for overlapping one state's work with
//! other work. It does not take part in any engine's lifecycle.

use crate::core::{StateId, StateResult};
use crate::error::EngineError;
use std::fmt;
use std::thread::{self, JoinHandle};

type Body<S> = Box<dyn FnOnce(&S) -> StateResult<S> + Send>;

/// One state body running on a dedicated thread.
///
/// [`start`](Self::start) launches it exactly once, [`is_done`](Self::is_done)
/// polls without blocking, and [`result`](Self::result) reads the outcome once
/// the thread has finished. There is no blocking wait, cancellation or timeout.
///
/// # Example
///
/// ```rust
/// use statequeue::ThreadedState;
///
/// let mut task = ThreadedState::new("fetch", |_| Ok(Some("render")));
/// task.start().unwrap();
/// while !task.is_done() {
///     std::thread::yield_now();
/// }
/// assert_eq!(task.result(), Ok(Some("render")));
/// ```
pub struct ThreadedState<S: StateId> {
    state: S,
    body: Option<Body<S>>,
    handle: Option<JoinHandle<StateResult<S>>>,
    outcome: Option<Result<Option<S>, EngineError>>,
}

impl<S: StateId> ThreadedState<S> {
    pub fn new<F>(state: S, body: F) -> Self
    where
        F: FnOnce(&S) -> StateResult<S> + Send + 'static,
    {
        Self {
            state,
            body: Some(Box::new(body)),
            handle: None,
            outcome: None,
        }
    }

    /// The state this wrapper runs.
    pub fn state(&self) -> &S {
        &self.state
    }

    /// Whether `start` has been called successfully.
    pub fn is_started(&self) -> bool {
        self.body.is_none()
    }

    /// Spawn the thread running the body.
    pub fn start(&mut self) -> Result<(), EngineError> {
        let body = self.body.take().ok_or_else(|| EngineError::AlreadyStarted {
            state: self.state.name().to_string(),
        })?;

        let state = self.state.clone();
        let handle = thread::Builder::new()
            .name(format!("{} state", self.state.name()))
            .spawn(move || body(&state))
            .map_err(|error| EngineError::SpawnFailed {
                state: self.state.name().to_string(),
                reason: error.to_string(),
            })?;

        tracing::trace!(state = %self.state.name(), "spawned state thread");
        self.handle = Some(handle);
        Ok(())
    }

    /// Non-blocking completion poll.
    pub fn is_done(&self) -> bool {
        self.outcome.is_some()
            || self
                .handle
                .as_ref()
                .is_some_and(|handle| handle.is_finished())
    }

    /// The body's raw result.
    ///
    /// Fails with [`EngineError::NotDone`] until the thread has finished. The
    /// outcome is kept, so later calls return the same value.
    pub fn result(&mut self) -> Result<Option<S>, EngineError> {
        if self.outcome.is_none() {
            let finished = self
                .handle
                .as_ref()
                .is_some_and(|handle| handle.is_finished());
            let handle = match self.handle.take() {
                Some(handle) if finished => handle,
                pending => {
                    self.handle = pending;
                    return Err(EngineError::NotDone {
                        state: self.state.name().to_string(),
                    });
                }
            };
            self.outcome = Some(self.collect(handle));
        }

        match &self.outcome {
            Some(outcome) => outcome.clone(),
            None => Err(EngineError::NotDone {
                state: self.state.name().to_string(),
            }),
        }
    }

    fn collect(&self, handle: JoinHandle<StateResult<S>>) -> Result<Option<S>, EngineError> {
        let name = self.state.name().to_string();
        let outcome = match handle.join() {
            Ok(result) => result.map_err(|source| EngineError::StateFailed {
                state: name.clone(),
                source,
            }),
            Err(_) => Err(EngineError::StatePanicked {
                state: name.clone(),
            }),
        };
        tracing::trace!(state = %name, ok = outcome.is_ok(), "state thread finished");
        outcome
    }
}

impl<S: StateId> fmt::Debug for ThreadedState<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThreadedState")
            .field("state", &self.state)
            .field("started", &self.is_started())
            .field("done", &self.is_done())
            .finish()
    }
}
