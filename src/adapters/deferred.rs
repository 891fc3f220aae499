//! Save-bounded persistence.

use crate::core::{StateError, StateTransition};
use crate::manager::TransitionHooks;

/// Hooks wrapper for resources saved by the host after each transition.
///
/// A manager using these hooks writes the new path and runs the `enter` and
/// `exit` callbacks as usual, then holds the `exited`/`entered` callbacks and
/// the wrapped hooks' `did_transition` until the host has saved the resource
/// and calls [`StateManager::commit`](crate::manager::StateManager::commit).
/// Any transition attempted in between fails with
/// [`StateError::DirtyTransition`].
///
/// # Example
///
/// ```rust
/// use statetree::adapters::DeferredCommit;
/// use statetree::builder::StateBuilder;
/// use statetree::core::{StateError, StateHistory};
/// use statetree::manager::StateManager;
///
/// let definition = StateBuilder::<Option<String>>::new()
///     .leaf("draft")
///     .leaf("review")
///     .leaf("published")
///     .build()?;
///
/// let hooks = DeferredCommit::new(StateHistory::new());
/// let mut post = StateManager::with_hooks(definition, None, hooks)?;
/// post.commit();
///
/// post.transition_to("review")?;
/// let dirty = post.transition_to("published");
/// assert!(matches!(dirty, Err(StateError::DirtyTransition { .. })));
///
/// post.commit();
/// assert_eq!(post.hooks().inner().get_path(), vec!["draft", "review"]);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone, Debug, Default)]
pub struct DeferredCommit<H> {
    inner: H,
}

impl<H> DeferredCommit<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &H {
        &self.inner
    }

    pub fn inner_mut(&mut self) -> &mut H {
        &mut self.inner
    }

    pub fn into_inner(self) -> H {
        self.inner
    }
}

impl<R, H: TransitionHooks<R>> TransitionHooks<R> for DeferredCommit<H> {
    fn begin_transition(
        &mut self,
        resource: &R,
        transition: &StateTransition,
    ) -> Result<(), StateError> {
        self.inner.begin_transition(resource, transition)
    }

    fn will_transition(&mut self, resource: &mut R, transition: &StateTransition) {
        self.inner.will_transition(resource, transition);
    }

    fn did_transition(&mut self, resource: &mut R, transition: &StateTransition) {
        self.inner.did_transition(resource, transition);
    }

    fn defers_after_phase(&self) -> bool {
        true
    }
}
