//! Statetree: hierarchical state management for persisted resources
//!
//! A resource (a database record, a document, any struct) stores its current
//! state as a single dot-joined path such as `submitted.reviewing`. Statetree
//! interprets that path against a tree of declared states, moves it between
//! leaf states, and runs callbacks and hooks on the way.
//!
//! # Core Concepts
//!
//! - **Specification**: static description of a state's children and events,
//!   assembled with [`StateBuilder`] and validated into a [`Definition`]
//! - **State tree**: per-manager instance of a definition; only leaf states
//!   can be current
//! - **Manager**: [`StateManager`] owns the resource, performs transitions and
//!   dispatches events, bubbling each event from the current state upwards
//! - **Adapters**: [`StateStore`] reads and writes the persisted path,
//!   [`TransitionHooks`] observe every transition
//!
//! # Example
//!
//! ```rust
//! use statetree::builder::StateBuilder;
//! use statetree::core::{EventSpec, StateHistory};
//! use statetree::manager::StateManager;
//!
//! let definition = StateBuilder::<Option<String>>::new()
//!     .initial_state("unsubmitted")
//!     .state("unsubmitted", |s| {
//!         s.event(EventSpec::new("submit").transitions_to("submitted.awaiting_review"))
//!     })
//!     .state("submitted", |s| {
//!         s.state("awaiting_review", |s| {
//!             s.event(EventSpec::new("review").transitions_to("submitted.reviewing"))
//!         })
//!         .state("reviewing", |s| {
//!             s.event(EventSpec::new("accept").transitions_to("active"))
//!                 .event(EventSpec::new("clarify").transitions_to("submitted.clarifying"))
//!         })
//!         .leaf("clarifying")
//!     })
//!     .leaf("active")
//!     .build()?;
//!
//! let mut post = StateManager::with_hooks(definition, None, StateHistory::new())?;
//! assert_eq!(post.current_path().as_deref(), Some("unsubmitted"));
//!
//! post.send_event("submit", &[])?;
//! post.send_event("review", &[])?;
//! assert!(post.in_state("submitted"));
//! assert!(post.is("submitted_reviewing"));
//!
//! post.send_event("accept", &[])?;
//! assert_eq!(post.resource().as_deref(), Some("active"));
//! assert_eq!(
//!     post.hooks().get_path(),
//!     vec!["unsubmitted", "submitted.awaiting_review", "submitted.reviewing", "active"]
//! );
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod adapters;
pub mod builder;
pub mod checkpoint;
pub mod core;
pub mod manager;
pub mod schedule;

// Re-export commonly used types
pub use crate::adapters::{DeferredCommit, Property, StateStore};
pub use crate::builder::{BuildError, StateBuilder};
pub use crate::checkpoint::{Checkpoint, CheckpointError};
pub use crate::core::{Definition, EventSpec, StateError, StateHistory, StateTransition};
pub use crate::manager::{StateManager, TransitionHooks};
pub use crate::schedule::{DelayedEvent, DelayedEvents};
