//! Observers of every transition a manager performs.

use crate::core::{StateError, StateHistory, StateTransition};

/// Host hooks invoked around each transition.
///
/// `begin_transition` runs after the target has been validated and before
/// any callback; returning an error aborts the transition with nothing
/// exited, entered or written. `will_transition` runs before the exit
/// callbacks and `did_transition` after the entered callbacks.
///
/// Hooks returning true from `defers_after_phase` make the manager hold the
/// `exited`/`entered` callbacks and `did_transition` until
/// [`StateManager::commit`](crate::manager::StateManager::commit).
///
/// # Example
///
/// ```rust
/// use statetree::core::StateTransition;
/// use statetree::manager::TransitionHooks;
///
/// #[derive(Default)]
/// struct Audit {
///     lines: Vec<String>,
/// }
///
/// impl TransitionHooks<Option<String>> for Audit {
///     fn did_transition(&mut self, _resource: &mut Option<String>, transition: &StateTransition) {
///         let from = transition.from.as_deref().unwrap_or("-");
///         self.lines.push(format!("{from} -> {}", transition.to));
///     }
/// }
/// ```
pub trait TransitionHooks<R> {
    fn begin_transition(
        &mut self,
        _resource: &R,
        _transition: &StateTransition,
    ) -> Result<(), StateError> {
        Ok(())
    }

    fn will_transition(&mut self, _resource: &mut R, _transition: &StateTransition) {}

    fn did_transition(&mut self, _resource: &mut R, _transition: &StateTransition) {}

    fn defers_after_phase(&self) -> bool {
        false
    }
}

impl<R> TransitionHooks<R> for () {}

/// Both hooks run, the first before the second.
impl<R, A, B> TransitionHooks<R> for (A, B)
where
    A: TransitionHooks<R>,
    B: TransitionHooks<R>,
{
    fn begin_transition(
        &mut self,
        resource: &R,
        transition: &StateTransition,
    ) -> Result<(), StateError> {
        self.0.begin_transition(resource, transition)?;
        self.1.begin_transition(resource, transition)
    }

    fn will_transition(&mut self, resource: &mut R, transition: &StateTransition) {
        self.0.will_transition(resource, transition);
        self.1.will_transition(resource, transition);
    }

    fn did_transition(&mut self, resource: &mut R, transition: &StateTransition) {
        self.0.did_transition(resource, transition);
        self.1.did_transition(resource, transition);
    }

    fn defers_after_phase(&self) -> bool {
        self.0.defers_after_phase() || self.1.defers_after_phase()
    }
}

impl<R> TransitionHooks<R> for StateHistory {
    fn did_transition(&mut self, _resource: &mut R, transition: &StateTransition) {
        self.push(transition.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::DeferredCommit;
    use chrono::Utc;

    fn transition(to: &str) -> StateTransition {
        StateTransition {
            from: None,
            to: to.to_string(),
            event: None,
            exited: Vec::new(),
            entered: vec![to.to_string()],
            timestamp: Utc::now(),
        }
    }

    struct Reject;

    impl TransitionHooks<String> for Reject {
        fn begin_transition(
            &mut self,
            resource: &String,
            transition: &StateTransition,
        ) -> Result<(), StateError> {
            Err(StateError::DirtyTransition {
                pending: resource.clone(),
                requested: transition.to.clone(),
            })
        }
    }

    #[test]
    fn history_records_completed_transitions() {
        let mut history = StateHistory::new();
        let mut resource = String::new();

        TransitionHooks::<String>::did_transition(&mut history, &mut resource, &transition("a"));
        TransitionHooks::<String>::did_transition(&mut history, &mut resource, &transition("b"));

        assert_eq!(history.get_path(), vec!["a", "b"]);
    }

    #[test]
    fn pair_runs_both_and_stops_at_first_rejection() {
        let mut hooks = (StateHistory::new(), Reject);
        let mut resource = "active".to_string();
        let next = transition("closed");

        let result = hooks.begin_transition(&resource, &next);
        assert!(matches!(result, Err(StateError::DirtyTransition { .. })));

        hooks.did_transition(&mut resource, &next);
        assert_eq!(hooks.0.get_path(), vec!["closed"]);
    }

    #[test]
    fn pair_defers_when_either_member_does() {
        let deferring = (StateHistory::new(), DeferredCommit::new(()));
        let immediate = (StateHistory::new(), ());

        assert!(TransitionHooks::<String>::defers_after_phase(&deferring));
        assert!(!TransitionHooks::<String>::defers_after_phase(&immediate));
    }
}
