//! Fluent builder for state specifications.

use crate::builder::error::BuildError;
use crate::core::{Callbacks, Definition, EventSpec, Specification, StateBehavior, StateContext};
use std::sync::Arc;

/// Builder for a state and, recursively, its children.
///
/// The closure passed to [`StateBuilder::state`] receives a fresh builder for
/// the child and returns it once configured.
///
/// # Example
///
/// ```rust
/// use statetree::builder::StateBuilder;
/// use statetree::core::EventSpec;
///
/// let definition = StateBuilder::<Option<String>>::new()
///     .initial_state("unsubmitted")
///     .state("unsubmitted", |s| {
///         s.event(EventSpec::new("submit").transitions_to("submitted.awaiting_review"))
///     })
///     .state("submitted", |s| {
///         s.state("awaiting_review", |s| {
///             s.event(EventSpec::new("review").transitions_to("submitted.reviewing"))
///         })
///         .leaf("reviewing")
///     })
///     .leaf("active")
///     .build()
///     .expect("valid specification");
///
/// assert_eq!(definition.catalog().predicate_path("submitted_reviewing"), Some("submitted.reviewing"));
/// ```
pub struct StateBuilder<R> {
    spec: Specification<R>,
    callbacks: Option<Callbacks<R>>,
}

impl<R: 'static> StateBuilder<R> {
    pub fn new() -> Self {
        Self::from_specification(Specification::new())
    }

    /// Start from a copy of `base`; changes never reach `base`.
    pub fn extend(base: &Specification<R>) -> Self {
        Self::from_specification(Specification::derive(base))
    }

    fn from_specification(spec: Specification<R>) -> Self {
        Self {
            spec,
            callbacks: None,
        }
    }

    /// Set the default child path entered when nothing is persisted.
    pub fn initial_state(mut self, path: impl Into<String>) -> Self {
        self.spec.set_initial_state(path);
        self
    }

    /// Declare a child state, replacing any earlier declaration of `name`.
    pub fn state<F>(mut self, name: impl Into<String>, build: F) -> Self
    where
        F: FnOnce(StateBuilder<R>) -> StateBuilder<R>,
    {
        let child = build(StateBuilder::new()).into_specification();
        self.spec.insert_state(name, Arc::new(child));
        self
    }

    /// Declare a child state starting from a copy of `base`.
    pub fn state_from<F>(
        mut self,
        name: impl Into<String>,
        base: &Specification<R>,
        build: F,
    ) -> Self
    where
        F: FnOnce(StateBuilder<R>) -> StateBuilder<R>,
    {
        let child = build(StateBuilder::extend(base)).into_specification();
        self.spec.insert_state(name, Arc::new(child));
        self
    }

    /// Extend an earlier declaration of `name`, keeping its states and
    /// events. Behaves like [`StateBuilder::state`] when there is none.
    pub fn reopen<F>(self, name: impl Into<String>, build: F) -> Self
    where
        F: FnOnce(StateBuilder<R>) -> StateBuilder<R>,
    {
        let name = name.into();
        let base = self
            .spec
            .state(&name)
            .map(|existing| Specification::derive(existing))
            .unwrap_or_default();
        self.state_from(name, &base, build)
    }

    /// Declare a child with no children of its own.
    pub fn leaf(self, name: impl Into<String>) -> Self {
        self.state(name, |s| s)
    }

    /// Declare an event, replacing any earlier event with the same name.
    pub fn event(mut self, event: EventSpec<R>) -> Self {
        self.spec.add_event(event);
        self
    }

    /// Declare an event configured by `build`.
    ///
    /// Handlers written inside `build` see this builder's resource type, so
    /// they can reach the resource's fields without annotations.
    pub fn event_with<F>(self, name: impl Into<String>, build: F) -> Self
    where
        F: FnOnce(EventSpec<R>) -> EventSpec<R>,
    {
        self.event(build(EventSpec::new(name)))
    }

    /// Attach lifecycle behavior. Replaces closures set with the `on_*`
    /// methods, and is replaced by later calls to them.
    pub fn behavior<B>(mut self, behavior: B) -> Self
    where
        B: StateBehavior<R> + 'static,
    {
        self.callbacks = None;
        self.spec.set_behavior(Arc::new(behavior));
        self
    }

    pub fn on_enter<F>(mut self, callback: F) -> Self
    where
        F: Fn(&mut StateContext<'_, R>) + Send + Sync + 'static,
    {
        self.callbacks_mut().enter = Some(Box::new(callback));
        self
    }

    pub fn on_exit<F>(mut self, callback: F) -> Self
    where
        F: Fn(&mut StateContext<'_, R>) + Send + Sync + 'static,
    {
        self.callbacks_mut().exit = Some(Box::new(callback));
        self
    }

    pub fn on_entered<F>(mut self, callback: F) -> Self
    where
        F: Fn(&mut StateContext<'_, R>) + Send + Sync + 'static,
    {
        self.callbacks_mut().entered = Some(Box::new(callback));
        self
    }

    pub fn on_exited<F>(mut self, callback: F) -> Self
    where
        F: Fn(&mut StateContext<'_, R>) + Send + Sync + 'static,
    {
        self.callbacks_mut().exited = Some(Box::new(callback));
        self
    }

    fn callbacks_mut(&mut self) -> &mut Callbacks<R> {
        self.callbacks.get_or_insert_with(Callbacks::new)
    }

    /// Finish this state without validating it.
    pub fn into_specification(self) -> Specification<R> {
        let mut spec = self.spec;
        if let Some(callbacks) = self.callbacks {
            spec.set_behavior(Arc::new(callbacks));
        }
        spec
    }

    /// Validate the whole tree and produce a shareable definition.
    pub fn build(self) -> Result<Arc<Definition<R>>, BuildError> {
        Definition::new(self.into_specification()).map(Arc::new)
    }
}

impl<R: 'static> Default for StateBuilder<R> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::error::SpecViolation;

    #[derive(Default)]
    struct Comment {
        state: Option<String>,
        flags: u32,
    }

    #[test]
    fn builds_nested_states() {
        let definition = StateBuilder::<Comment>::new()
            .state("unsubmitted", |s| s)
            .state("submitted", |s| s.leaf("awaiting_review").leaf("reviewing"))
            .leaf("active")
            .build()
            .unwrap();

        assert_eq!(
            definition.catalog().paths(),
            &[
                "unsubmitted".to_string(),
                "submitted".to_string(),
                "submitted.awaiting_review".to_string(),
                "submitted.reviewing".to_string(),
                "active".to_string(),
            ]
        );
    }

    #[test]
    fn state_replaces_earlier_declaration() {
        let definition = StateBuilder::<Comment>::new()
            .state("submitted", |s| s.leaf("awaiting_review"))
            .state("submitted", |s| s.leaf("reviewing"))
            .build()
            .unwrap();

        assert!(definition.find("submitted.awaiting_review").is_none());
        assert!(definition.find("submitted.reviewing").is_some());
    }

    #[test]
    fn reopen_merges_with_earlier_declaration() {
        let definition = StateBuilder::<Comment>::new()
            .state("submitted", |s| {
                s.leaf("awaiting_review")
                    .event(EventSpec::new("withdraw").transitions_to("unsubmitted"))
            })
            .leaf("unsubmitted")
            .reopen("submitted", |s| s.leaf("reviewing"))
            .build()
            .unwrap();

        let submitted = definition.find("submitted");
        assert!(submitted.is_some_and(|s| s.has_event("withdraw")));
        assert!(definition.find("submitted.awaiting_review").is_some());
        assert!(definition.find("submitted.reviewing").is_some());
    }

    #[test]
    fn state_from_leaves_base_untouched() {
        let base = StateBuilder::<Comment>::new()
            .leaf("awaiting_review")
            .into_specification();

        let definition = StateBuilder::new()
            .state_from("submitted", &base, |s| s.leaf("clarifying"))
            .build()
            .unwrap();

        assert!(definition.find("submitted.clarifying").is_some());
        assert!(base.state("clarifying").is_none());
    }

    #[test]
    fn on_callbacks_become_behavior() {
        let spec = StateBuilder::<Comment>::new()
            .on_entered(|ctx| ctx.resource_mut().state = Some("seen".to_string()))
            .into_specification();

        assert!(spec.behavior().is_some());
    }

    #[test]
    fn event_with_handlers_reach_resource_fields() {
        let spec = StateBuilder::<Comment>::new()
            .event_with("flag", |e| {
                e.handler(|ctx, _args| {
                    ctx.resource_mut().flags += 1;
                    Ok(())
                })
            })
            .leaf("visible")
            .into_specification();

        let flag = spec.event("flag");
        assert!(flag.is_some_and(|e| e.event_handler().is_some() && e.target().is_none()));
    }

    #[test]
    fn build_reports_violations() {
        let result = StateBuilder::<Comment>::new()
            .initial_state("missing")
            .leaf("active")
            .build();

        let err = result.err().map(|e| e.violations().to_vec());
        assert_eq!(
            err,
            Some(vec![SpecViolation::UnknownInitialState {
                owner: String::new(),
                target: "missing".to_string(),
            }])
        );
    }
}
