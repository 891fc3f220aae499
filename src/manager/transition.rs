//! Transition planning.
//!
//! Planning is pure: it resolves the target and works out which states are
//! left and which are reached, without touching the resource or running any
//! callback.

use crate::core::{StateError, StateId, StateTree};

/// States affected by one transition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct TransitionPlan {
    pub(crate) target: StateId,
    /// Innermost first.
    pub(crate) exit: Vec<StateId>,
    /// Outermost first.
    pub(crate) enter: Vec<StateId>,
}

/// Plan a transition to `path`.
///
/// `path` is resolved from `anchor` and then from each of its ancestors in
/// turn; the nearest ancestor with a matching descendant wins. The exit and
/// enter sets are the difference between the chains of `current` and of the
/// target, so states shared by both are neither exited nor entered. With no
/// `current` state every state down to the target is entered, the root
/// included.
pub(crate) fn plan<R>(
    tree: &StateTree<R>,
    anchor: StateId,
    current: Option<StateId>,
    path: &str,
) -> Result<TransitionPlan, StateError> {
    let target = tree
        .ancestors(anchor)
        .find_map(|state| tree.find_state_from(state, path))
        .ok_or_else(|| StateError::StateNotFound {
            path: path.to_string(),
        })?;

    if !tree.is_leaf(target) {
        return Err(StateError::InvalidTransition {
            path: tree.path(target),
        });
    }

    let mut target_chain: Vec<StateId> = tree.ancestors(target).collect();
    target_chain.reverse();

    let current_chain: Vec<StateId> = current
        .map(|state| tree.ancestors(state).collect())
        .unwrap_or_default();

    let exit = current_chain
        .iter()
        .copied()
        .filter(|state| !target_chain.contains(state))
        .collect();
    let enter = target_chain
        .iter()
        .copied()
        .filter(|state| !current_chain.contains(state))
        .collect();

    Ok(TransitionPlan {
        target,
        exit,
        enter,
    })
}
