//! Bounded record of the states executed by an engine.
//!
//! Only executions that move the engine's pointers are recorded; out-of-band
//! runs of a single state leave no trace here.

use super::transition::Next;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Duration;

/// One executed state and what it resolved to.
///
/// # Example
///
/// ```rust
/// use statequeue::core::{Next, StepRecord};
/// use chrono::Utc;
///
/// let record = StepRecord {
///     state: "get",
///     next: Next::Goto("output"),
///     timestamp: Utc::now(),
///     step: 1,
/// };
/// assert_eq!(record.next.state(), Some(&"output"));
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StepRecord<S> {
    /// The state that ran
    pub state: S,
    /// Where it sent the engine
    pub next: Next<S>,
    /// When it finished
    pub timestamp: DateTime<Utc>,
    /// Ordinal of this execution since the last reset, starting at 1
    pub step: usize,
}

/// Most recent [`StepRecord`]s, oldest first.
///
/// Once `limit` records are held, recording a new one drops the oldest.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StateHistory<S> {
    records: VecDeque<StepRecord<S>>,
    limit: usize,
}

impl<S> StateHistory<S> {
    pub fn new(limit: usize) -> Self {
        Self {
            records: VecDeque::new(),
            limit,
        }
    }

    pub fn record(&mut self, record: StepRecord<S>) {
        if self.limit == 0 {
            return;
        }
        if self.records.len() == self.limit {
            self.records.pop_front();
        }
        self.records.push_back(record);
    }

    pub fn records(&self) -> impl Iterator<Item = &StepRecord<S>> {
        self.records.iter()
    }

    pub fn last(&self) -> Option<&StepRecord<S>> {
        self.records.back()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// States in execution order, followed by the last resolved target.
    ///
    /// A run that ended with a terminate result has no trailing target.
    pub fn path(&self) -> Vec<&S> {
        let mut path: Vec<&S> = self.records.iter().map(|r| &r.state).collect();
        if let Some(target) = self.last().and_then(|r| r.next.state()) {
            path.push(target);
        }
        path
    }

    /// Time between the oldest and newest retained record.
    pub fn duration(&self) -> Option<Duration> {
        let (first, last) = (self.records.front()?, self.records.back()?);
        last.timestamp
            .signed_duration_since(first.timestamp)
            .to_std()
            .ok()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}
