//! State transition records and history tracking.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Record of a single completed (or about to complete) transition.
///
/// Passed to transition hooks before and after the new path is written.
/// `exited` lists the states left, innermost first; `entered` lists the
/// states reached, outermost first.
///
/// # Example
///
/// ```rust
/// use statetree::core::StateTransition;
/// use chrono::Utc;
///
/// let transition = StateTransition {
///     from: Some("submitted.awaiting_review".to_string()),
///     to: "submitted.reviewing".to_string(),
///     event: Some("review".to_string()),
///     exited: vec!["submitted.awaiting_review".to_string()],
///     entered: vec!["submitted.reviewing".to_string()],
///     timestamp: Utc::now(),
/// };
/// assert!(!transition.is_noop());
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StateTransition {
    /// Path of the current state before the transition, if there was one
    pub from: Option<String>,
    /// Path of the leaf being transitioned to
    pub to: String,
    /// Event that triggered the transition
    pub event: Option<String>,
    /// Paths of the states exited
    pub exited: Vec<String>,
    /// Paths of the states entered
    pub entered: Vec<String>,
    /// When the transition was executed
    pub timestamp: DateTime<Utc>,
}

impl StateTransition {
    /// A transition to the state that was already current.
    pub fn is_noop(&self) -> bool {
        self.from.as_deref() == Some(self.to.as_str())
    }
}

/// Ordered history of state transitions.
///
/// `record` returns a new history and leaves the receiver untouched. Used
/// as transition hooks it appends every completed transition.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StateHistory {
    transitions: Vec<StateTransition>,
}

impl StateHistory {
    pub fn new() -> Self {
        Self {
            transitions: Vec::new(),
        }
    }

    /// Copy of this history with `transition` appended.
    pub fn record(&self, transition: StateTransition) -> Self {
        let mut next = self.clone();
        next.push(transition);
        next
    }

    pub(crate) fn push(&mut self, transition: StateTransition) {
        self.transitions.push(transition);
    }

    /// Paths traversed: the first known origin, then each target.
    pub fn get_path(&self) -> Vec<&str> {
        let mut path = Vec::new();
        if let Some(from) = self.transitions.first().and_then(|t| t.from.as_deref()) {
            path.push(from);
        }
        for transition in &self.transitions {
            path.push(transition.to.as_str());
        }
        path
    }

    /// Time between the first and last recorded transition.
    pub fn duration(&self) -> Option<Duration> {
        let started = self.transitions.first()?.timestamp;
        let finished = self.transitions.last()?.timestamp;
        (finished - started).to_std().ok()
    }

    pub fn transitions(&self) -> &[StateTransition] {
        &self.transitions
    }

    pub fn last(&self) -> Option<&StateTransition> {
        self.transitions.last()
    }
}
