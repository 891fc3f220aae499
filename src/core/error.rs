//! Runtime errors raised by transitions and event dispatch.

use thiserror::Error;

/// Errors that can occur while transitioning or dispatching events.
///
/// Every variant leaves the resource's persisted path exactly as it was
/// before the failing call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StateError {
    #[error("State '{path}' not found from the current state or any of its ancestors")]
    StateNotFound { path: String },

    #[error("Cannot transition to '{path}': only leaf states can be current")]
    InvalidTransition { path: String },

    #[error("Event '{event}' is not handled by '{state}' or any of its ancestors")]
    InvalidEvent { event: String, state: String },

    #[error("Transition to '{requested}' attempted before the transition to '{pending}' was committed")]
    DirtyTransition { pending: String, requested: String },

    #[error("Event '{requested}' sent while event '{active}' is still being processed")]
    EventInFlight { active: String, requested: String },

    #[error("Handler for event '{event}' failed: {message}")]
    HandlerFailed { event: String, message: String },
}

impl StateError {
    /// Shorthand used by event handlers to report a failure.
    pub fn handler(event: impl Into<String>, message: impl Into<String>) -> Self {
        Self::HandlerFailed {
            event: event.into(),
            message: message.into(),
        }
    }
}
