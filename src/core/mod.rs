//! Core state machine types.
//!
//! This module contains the leaf layer the engine is built on:
//! - State identifiers and the callback contract via `StateId` and `StateFn`
//! - The rule turning a callback result into the next state
//! - The registry of bound callbacks
//! - Bounded step history

mod history;
mod registry;
mod state;
mod transition;

pub use history::{StateHistory, StepRecord};
pub use registry::{DuplicatePolicy, StateRegistry};
pub use state::{StateFailure, StateFn, StateId, StateResult};
pub use transition::{Next, OnEmptyResult};
