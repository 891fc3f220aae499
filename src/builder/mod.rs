//! Builder API for declaring state specifications.
//!
//! States and events are declared through a fluent [`StateBuilder`]; the
//! finished tree is validated as a whole and frozen into a
//! [`Definition`](crate::core::Definition) shared by every manager created
//! from it.

pub mod error;
pub mod state;
pub mod validate;

pub use error::{BuildError, SpecViolation};
pub use state::StateBuilder;
pub use validate::validate;
