//! Core state tree types.
//!
//! This module contains the static and runtime halves of the model:
//! - `Specification` and `EventSpec` describe states and events
//! - `Definition` is a validated specification shared by managers
//! - `StateTree` is the per-manager instance of a specification
//! - `StateBehavior` is the per-state lifecycle callback seam
//! - `StateTransition` and `StateHistory` record what happened
//!
//! Nothing in this module performs I/O or invokes callbacks; the manager
//! drives those.

mod behavior;
mod definition;
mod error;
mod event;
mod history;
mod spec;
mod tree;

pub use behavior::{Callbacks, StateBehavior, StateContext};
pub use definition::{Catalog, Definition};
pub use error::StateError;
pub use event::{Delay, DelayFn, EventHandler, EventSpec};
pub use history::{StateHistory, StateTransition};
pub use spec::Specification;
pub use tree::{Ancestors, StateId, StateNode, StateTree};
