//! Build errors for specifications.

use thiserror::Error;

/// A single problem found while validating a specification.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SpecViolation {
    #[error("No states defined. Add at least one state")]
    NoStates,

    #[error("State name '{name}' under '{parent}' must be non-empty and contain no '.'")]
    InvalidStateName { parent: String, name: String },

    #[error("Event declared on '{state}' has an empty name")]
    InvalidEventName { state: String },

    #[error("Initial state '{target}' of '{owner}' does not resolve to a descendant")]
    UnknownInitialState { owner: String, target: String },

    #[error("Event '{event}' on '{state}' targets '{target}', which does not resolve from every state it can be sent in")]
    UnresolvableTarget {
        state: String,
        event: String,
        target: String,
    },

    #[error("Event '{event}' on '{state}' targets composite state '{target}'")]
    TargetNotLeaf {
        state: String,
        event: String,
        target: String,
    },

    #[error("States '{first}' and '{second}' share the predicate '{predicate}'")]
    PredicateCollision {
        predicate: String,
        first: String,
        second: String,
    },
}

/// Errors that can occur when building a definition.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Invalid specification: {violations:?}")]
    InvalidSpecification { violations: Vec<SpecViolation> },
}

impl BuildError {
    pub fn violations(&self) -> &[SpecViolation] {
        match self {
            Self::InvalidSpecification { violations } => violations,
        }
    }
}
