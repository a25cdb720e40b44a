//! State identifiers and the callback contract bound to them.
//!
//! A state is an identifier plus a callback. The identifier is any comparable,
//! hashable value; the callback performs the state's work and reports which
//! state should run next.

use std::error::Error;
use std::fmt::{self, Debug};
use std::hash::Hash;
use std::sync::Arc;

/// Trait for state identifiers.
///
/// Identifiers are opaque keys chosen by the caller. A closed `enum` gives
/// exhaustive, typo-proof keys (see [`state_ids!`](crate::state_ids)); `String`
/// and `&'static str` give an open key space.
///
/// # Example
///
/// ```rust
/// use statequeue::core::StateId;
///
/// #[derive(Clone, PartialEq, Eq, Hash, Debug)]
/// enum Door {
///     Open,
///     Closed,
/// }
///
/// impl StateId for Door {
///     fn name(&self) -> &str {
///         match self {
///             Self::Open => "Open",
///             Self::Closed => "Closed",
///         }
///     }
/// }
///
/// assert_eq!(Door::Open.name(), "Open");
/// assert_eq!("idle".name(), "idle");
/// ```
pub trait StateId: Clone + Eq + Hash + Debug + Send + Sync + 'static {
    /// Human readable name, used in errors and log events.
    ///
    /// An empty name marks an invalid identifier and is rejected at registration.
    fn name(&self) -> &str;
}

impl StateId for String {
    fn name(&self) -> &str {
        self.as_str()
    }
}

impl StateId for &'static str {
    fn name(&self) -> &str {
        self
    }
}

/// Failure raised by a state body while doing its work.
///
/// The engine never swallows it: it reaches the caller of the stepping
/// operation wrapped in [`EngineError::StateFailed`](crate::error::EngineError::StateFailed).
///
/// Two failures are equal when their messages are; the wrapped error, if any,
/// is not compared.
#[derive(Debug, Clone)]
pub struct StateFailure {
    message: String,
    source: Option<Arc<dyn Error + Send + Sync>>,
}

impl StateFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Capture an error raised inside a state body.
    ///
    /// The error stays reachable through [`Error::source`], so its own chain
    /// is not lost.
    pub fn from_error<E>(error: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        Self {
            message: error.to_string(),
            source: Some(Arc::new(error)),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for StateFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl Error for StateFailure {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.source
            .as_deref()
            .map(|error| error as &(dyn Error + 'static))
    }
}

impl PartialEq for StateFailure {
    fn eq(&self, other: &Self) -> bool {
        self.message == other.message
    }
}

impl Eq for StateFailure {}

impl From<String> for StateFailure {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for StateFailure {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

/// What a state body returns.
///
/// - `Ok(Some(id))`: run `id` next (returning the input identifier loops).
/// - `Ok(None)`: the empty result, read through the engine's
///   [`OnEmptyResult`](crate::core::OnEmptyResult) discipline.
/// - `Err(failure)`: the body failed.
pub type StateResult<S> = Result<Option<S>, StateFailure>;

/// Callback bound to a state identifier.
///
/// It receives the identifier of the state being executed.
pub type StateFn<S> = Box<dyn FnMut(&S) -> StateResult<S> + Send>;
