//! Static description of a state's children and events.

use crate::core::behavior::StateBehavior;
use crate::core::event::EventSpec;
use std::fmt;
use std::sync::Arc;

/// The static specification of a state: its child states, the events it
/// declares, its default child and its lifecycle behavior.
///
/// Children and events are kept in declaration order. They are shared behind `Arc`
/// and edited copy-on-write, so a specification derived from a base with
/// [`Specification::derive`] can be changed freely without touching the base.
///
/// # Example
///
/// ```rust
/// use statetree::core::{EventSpec, Specification};
///
/// let mut root: Specification<String> = Specification::new();
/// root.add_state("unsubmitted", None)
///     .add_event(EventSpec::new("submit").transitions_to("submitted.awaiting_review"));
/// let submitted = root.add_state("submitted", None);
/// submitted.add_state("awaiting_review", None);
/// submitted.add_state("reviewing", None);
///
/// assert_eq!(
///     root.descendant_paths(),
///     vec!["unsubmitted", "submitted", "submitted.awaiting_review", "submitted.reviewing"]
/// );
/// ```
pub struct Specification<R> {
    states: Vec<(String, Arc<Specification<R>>)>,
    events: Vec<EventSpec<R>>,
    initial_state: Option<String>,
    behavior: Option<Arc<dyn StateBehavior<R>>>,
}

impl<R> Specification<R> {
    pub fn new() -> Self {
        Self {
            states: Vec::new(),
            events: Vec::new(),
            initial_state: None,
            behavior: None,
        }
    }

    /// Structural copy of `base` that can be extended independently.
    pub fn derive(base: &Specification<R>) -> Self {
        base.clone()
    }

    /// Declare a child state, replacing any child with the same name.
    ///
    /// The child starts as a copy of `base` when one is given. Returns the
    /// child so it can be extended in place.
    pub fn add_state(
        &mut self,
        name: impl Into<String>,
        base: Option<&Specification<R>>,
    ) -> &mut Specification<R> {
        let child = base.map(Specification::derive).unwrap_or_default();
        let index = self.upsert_state(name.into(), Arc::new(child));
        Arc::make_mut(&mut self.states[index].1)
    }

    /// Declare a child state from an already shared specification.
    pub fn insert_state(&mut self, name: impl Into<String>, spec: Arc<Specification<R>>) {
        self.upsert_state(name.into(), spec);
    }

    fn upsert_state(&mut self, name: String, spec: Arc<Specification<R>>) -> usize {
        match self.states.iter().position(|(existing, _)| *existing == name) {
            Some(index) => {
                self.states[index].1 = spec;
                index
            }
            None => {
                self.states.push((name, spec));
                self.states.len() - 1
            }
        }
    }

    /// Declare an event, replacing any event with the same name in place.
    pub fn add_event(&mut self, event: EventSpec<R>) -> &mut Self {
        match self.events.iter_mut().find(|existing| existing.name() == event.name()) {
            Some(existing) => *existing = event,
            None => self.events.push(event),
        }
        self
    }

    pub fn set_initial_state(&mut self, path: impl Into<String>) -> &mut Self {
        self.initial_state = Some(path.into());
        self
    }

    pub fn set_behavior(&mut self, behavior: Arc<dyn StateBehavior<R>>) -> &mut Self {
        self.behavior = Some(behavior);
        self
    }

    pub fn state(&self, name: &str) -> Option<&Arc<Specification<R>>> {
        self.states
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, spec)| spec)
    }

    /// Mutable access to a child, copying it first if it is shared.
    pub fn state_mut(&mut self, name: &str) -> Option<&mut Specification<R>> {
        self.states
            .iter_mut()
            .find(|(existing, _)| existing == name)
            .map(|(_, spec)| Arc::make_mut(spec))
    }

    pub fn states(&self) -> impl Iterator<Item = (&str, &Arc<Specification<R>>)> {
        self.states.iter().map(|(name, spec)| (name.as_str(), spec))
    }

    pub fn event(&self, name: &str) -> Option<&EventSpec<R>> {
        self.events.iter().find(|event| event.name() == name)
    }

    pub fn has_event(&self, name: &str) -> bool {
        self.event(name).is_some()
    }

    /// Declared events, in declaration order.
    pub fn events(&self) -> impl Iterator<Item = &EventSpec<R>> {
        self.events.iter()
    }

    pub fn initial_state(&self) -> Option<&str> {
        self.initial_state.as_deref()
    }

    pub fn behavior(&self) -> Option<&Arc<dyn StateBehavior<R>>> {
        self.behavior.as_ref()
    }

    pub fn is_leaf(&self) -> bool {
        self.states.is_empty()
    }

    /// Specification of the descendant at `path`. The empty path is `self`.
    pub fn find(&self, path: &str) -> Option<&Specification<R>> {
        if path.is_empty() {
            return Some(self);
        }
        let mut spec = self;
        for name in path.split('.') {
            spec = spec.state(name)?.as_ref();
        }
        Some(spec)
    }

    /// Dot-joined paths of every descendant, depth first in declaration order.
    pub fn descendant_paths(&self) -> Vec<String> {
        let mut paths = Vec::new();
        for (name, spec) in &self.states {
            paths.push(name.clone());
            paths.extend(
                spec.descendant_paths()
                    .into_iter()
                    .map(|path| format!("{name}.{path}")),
            );
        }
        paths
    }
}

impl<R> Default for Specification<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> Clone for Specification<R> {
    fn clone(&self) -> Self {
        Self {
            states: self.states.clone(),
            events: self.events.clone(),
            initial_state: self.initial_state.clone(),
            behavior: self.behavior.clone(),
        }
    }
}

impl<R> fmt::Debug for Specification<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Specification")
            .field("states", &self.states)
            .field(
                "events",
                &self.events.iter().map(EventSpec::name).collect::<Vec<_>>(),
            )
            .field("initial_state", &self.initial_state)
            .field("behavior", &self.behavior.is_some())
            .finish()
    }
}
