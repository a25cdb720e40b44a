//! Registry mapping state identifiers to their callbacks.

use super::state::{StateFn, StateId};
use crate::error::EngineError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// What registering an identifier twice does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Fail with [`EngineError::DuplicateState`]; the first binding stays.
    #[default]
    Reject,

    /// Replace the existing callback.
    Overwrite,
}

/// Callbacks keyed by state identifier.
///
/// Lookup order is irrelevant, but the first identifier ever registered is
/// remembered so an engine can adopt it as an implicit starting state.
pub struct StateRegistry<S: StateId> {
    states: HashMap<S, StateFn<S>>,
    first: Option<S>,
    policy: DuplicatePolicy,
}

impl<S: StateId> StateRegistry<S> {
    pub fn new(policy: DuplicatePolicy) -> Self {
        Self {
            states: HashMap::new(),
            first: None,
            policy,
        }
    }

    /// Bind `callback` to `id`.
    ///
    /// Returns `true` when an existing binding was overwritten.
    pub fn insert(&mut self, id: S, callback: StateFn<S>) -> Result<bool, EngineError> {
        if id.name().is_empty() {
            return Err(EngineError::EmptyStateId);
        }

        if self.states.contains_key(&id) {
            if self.policy == DuplicatePolicy::Reject {
                return Err(EngineError::DuplicateState {
                    state: id.name().to_string(),
                });
            }
            tracing::warn!(state = %id.name(), "overwriting registered state");
            self.states.insert(id, callback);
            return Ok(true);
        }

        if self.first.is_none() {
            self.first = Some(id.clone());
        }
        self.states.insert(id, callback);
        Ok(false)
    }

    pub fn contains(&self, id: &S) -> bool {
        self.states.contains_key(id)
    }

    /// Fail with [`EngineError::UnknownState`] unless `id` is registered.
    pub fn ensure(&self, id: &S) -> Result<(), EngineError> {
        if self.contains(id) {
            Ok(())
        } else {
            Err(EngineError::UnknownState {
                state: id.name().to_string(),
            })
        }
    }

    /// Run the callback bound to `id`, passing `id` as the active state.
    ///
    /// Returns the raw callback result; a body failure becomes
    /// [`EngineError::StateFailed`].
    pub fn invoke(&mut self, id: &S) -> Result<Option<S>, EngineError> {
        let callback = self
            .states
            .get_mut(id)
            .ok_or_else(|| EngineError::UnknownState {
                state: id.name().to_string(),
            })?;

        callback(id).map_err(|source| EngineError::StateFailed {
            state: id.name().to_string(),
            source,
        })
    }

    /// First identifier ever registered.
    pub fn first(&self) -> Option<&S> {
        self.first.as_ref()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

impl<S: StateId> Default for StateRegistry<S> {
    fn default() -> Self {
        Self::new(DuplicatePolicy::default())
    }
}
