//! State manager: the runtime root of a state tree.
//!
//! A manager is created per resource. It owns its own [`StateTree`], reads
//! and writes the current path through the resource's [`StateStore`], runs
//! per-state callbacks and reports every transition to its
//! [`TransitionHooks`].
//!
//! Everything runs inline on the calling thread: a transition or event
//! dispatch either completes or returns an error before the call returns.

mod dispatch;
mod hooks;
mod transition;
mod view;

pub use dispatch::{Controller, EventContext};
pub use hooks::TransitionHooks;
pub use view::StateRef;

use crate::adapters::StateStore;
use crate::checkpoint::Checkpoint;
use crate::core::{Definition, StateContext, StateError, StateId, StateTransition, StateTree};
use chrono::Utc;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{debug, trace, warn};
use transition::TransitionPlan;

/// Host data shared by callbacks and event handlers; captured by checkpoints.
pub type Context = BTreeMap<String, String>;

#[derive(Clone, Copy, Debug)]
enum Phase {
    Enter,
    Exit,
    Entered,
    Exited,
}

/// A written transition whose after phase has not run yet.
struct Held {
    transition: StateTransition,
    exit: Vec<StateId>,
    enter: Vec<StateId>,
}

/// Manages the hierarchical state of one resource.
///
/// # Example
///
/// ```rust
/// use statetree::builder::StateBuilder;
/// use statetree::core::EventSpec;
/// use statetree::manager::StateManager;
///
/// let definition = StateBuilder::<Option<String>>::new()
///     .state("draft", |s| s.event(EventSpec::new("publish").transitions_to("published")))
///     .leaf("published")
///     .build()?;
///
/// let mut post = StateManager::new(definition, None)?;
/// assert_eq!(post.current_path().as_deref(), Some("draft"));
///
/// post.send_event("publish", &[])?;
/// assert!(post.in_state("published"));
/// assert_eq!(post.resource().as_deref(), Some("published"));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct StateManager<R, H = ()> {
    definition: Arc<Definition<R>>,
    tree: StateTree<R>,
    resource: R,
    hooks: H,
    context: Context,
    current_event: Option<String>,
    held: Option<Held>,
}

impl<R: StateStore> StateManager<R> {
    /// Create a manager without hooks.
    pub fn new(definition: Arc<Definition<R>>, resource: R) -> Result<Self, StateError> {
        Self::with_hooks(definition, resource, ())
    }
}

impl<R: StateStore, H: TransitionHooks<R>> StateManager<R, H> {
    /// Create a manager for `resource`.
    ///
    /// When the resource has no persisted path, or one that does not name a
    /// leaf state, the initial transition runs before this returns.
    pub fn with_hooks(
        definition: Arc<Definition<R>>,
        resource: R,
        hooks: H,
    ) -> Result<Self, StateError> {
        let tree = StateTree::new(Arc::clone(definition.root()));
        let mut manager = Self {
            definition,
            tree,
            resource,
            hooks,
            context: Context::new(),
            current_event: None,
            held: None,
        };

        if manager.current_state().is_none() {
            if let Some(path) = manager.resource.read_state().filter(|path| !path.is_empty()) {
                warn!(path, "Persisted state is not a leaf state, entering initial state");
            }
            manager.enter_initial_state()?;
        }
        Ok(manager)
    }

    fn enter_initial_state(&mut self) -> Result<StateTransition, StateError> {
        let root = self.tree.root();
        let leaf = self
            .tree
            .initial_leaf(root)
            .ok_or_else(|| StateError::StateNotFound {
                path: self
                    .tree
                    .node(root)
                    .spec()
                    .initial_state()
                    .unwrap_or_default()
                    .to_string(),
            })?;
        let path = self.tree.path(leaf);
        self.transition_from(None, &path)
    }

    /// The current leaf state, read from the resource on every call.
    ///
    /// `None` when the persisted path is unset, unknown, or names a
    /// composite state.
    pub fn current_state(&self) -> Option<StateId> {
        let path = self.resource.read_state()?;
        if path.is_empty() {
            return None;
        }
        let state = self.tree.find_state(path)?;
        self.tree.is_leaf(state).then_some(state)
    }

    pub fn current_path(&self) -> Option<String> {
        self.current_state().map(|state| self.tree.path(state))
    }

    /// Transition to `path`, absolute or relative to any ancestor of the
    /// current state.
    ///
    /// # Errors
    ///
    /// - `StateNotFound` when no ancestor has a descendant at `path`
    /// - `InvalidTransition` when `path` names a composite state
    /// - `DirtyTransition` while an earlier transition awaits
    ///   [`commit`](Self::commit)
    /// - whatever the hooks' `begin_transition` returns
    ///
    /// Nothing is exited, entered or written when an error is returned.
    pub fn transition_to(&mut self, path: &str) -> Result<StateTransition, StateError> {
        let origin = self.current_state();
        self.transition_from(origin, path)
    }

    /// Transition resolving `path` from `origin` rather than from the
    /// current state. The exit set still comes from the current state.
    fn transition_from(
        &mut self,
        origin: Option<StateId>,
        path: &str,
    ) -> Result<StateTransition, StateError> {
        let current = self.current_state();
        let anchor = origin.or(current).unwrap_or_else(|| self.tree.root());
        let plan = transition::plan(&self.tree, anchor, current, path)?;
        self.execute(current, plan)
    }

    fn execute(
        &mut self,
        current: Option<StateId>,
        plan: TransitionPlan,
    ) -> Result<StateTransition, StateError> {
        let transition = StateTransition {
            from: current.map(|state| self.tree.path(state)),
            to: self.tree.path(plan.target),
            event: self.current_event.clone(),
            exited: plan.exit.iter().map(|state| self.tree.path(*state)).collect(),
            entered: plan.enter.iter().map(|state| self.tree.path(*state)).collect(),
            timestamp: Utc::now(),
        };

        if let Some(held) = &self.held {
            return Err(StateError::DirtyTransition {
                pending: held.transition.to.clone(),
                requested: transition.to,
            });
        }
        self.hooks.begin_transition(&self.resource, &transition)?;

        debug!(
            from = transition.from.as_deref().unwrap_or_default(),
            to = %transition.to,
            event = transition.event.as_deref().unwrap_or_default(),
            "Transitioning"
        );

        let event = transition.event.as_deref();
        self.hooks.will_transition(&mut self.resource, &transition);
        for (state, path) in plan.exit.iter().zip(&transition.exited) {
            self.run_callback(*state, path, event, Phase::Exit);
        }
        for (state, path) in plan.enter.iter().zip(&transition.entered) {
            self.run_callback(*state, path, event, Phase::Enter);
        }

        self.resource.write_state(&transition.to);

        let held = Held {
            transition,
            exit: plan.exit,
            enter: plan.enter,
        };
        if self.hooks.defers_after_phase() {
            debug!(to = %held.transition.to, "Holding after phase until commit");
            let transition = held.transition.clone();
            self.held = Some(held);
            return Ok(transition);
        }
        self.run_after_phase(&held);
        Ok(held.transition)
    }

    /// `exited` and `entered` callbacks, then `did_transition`.
    fn run_after_phase(&mut self, held: &Held) {
        let transition = &held.transition;
        let event = transition.event.as_deref();
        for (state, path) in held.exit.iter().zip(&transition.exited) {
            self.run_callback(*state, path, event, Phase::Exited);
        }
        for (state, path) in held.enter.iter().zip(&transition.entered) {
            self.run_callback(*state, path, event, Phase::Entered);
        }
        self.hooks.did_transition(&mut self.resource, transition);
    }

    /// Run the after phase of the transition held since the last save.
    ///
    /// Hosts call this once the resource is saved. Returns the transition,
    /// or `None` when nothing was held.
    pub fn commit(&mut self) -> Option<StateTransition> {
        let held = self.held.take()?;
        self.run_after_phase(&held);
        Some(held.transition)
    }

    /// Drop the held after phase without running it. The written path stays.
    pub fn discard(&mut self) -> Option<StateTransition> {
        self.held.take().map(|held| held.transition)
    }

    /// Transition written but not yet committed.
    pub fn pending_commit(&self) -> Option<&StateTransition> {
        self.held.as_ref().map(|held| &held.transition)
    }

    pub fn is_dirty(&self) -> bool {
        self.held.is_some()
    }

    fn run_callback(&mut self, state: StateId, path: &str, event: Option<&str>, phase: Phase) {
        let Some(behavior) = self.tree.node(state).spec().behavior().cloned() else {
            return;
        };
        trace!(state = path, ?phase, "Running state callback");

        let mut ctx = StateContext {
            path,
            event,
            resource: &mut self.resource,
            context: &mut self.context,
        };
        match phase {
            Phase::Enter => behavior.enter(&mut ctx),
            Phase::Exit => behavior.exit(&mut ctx),
            Phase::Entered => behavior.entered(&mut ctx),
            Phase::Exited => behavior.exited(&mut ctx),
        }
    }

    /// True when the current state is `path` or nested under it.
    pub fn in_state(&self, path: &str) -> bool {
        match (self.tree.find_state(path), self.current_state()) {
            (Some(state), Some(current)) => self.tree.is_within(current, state),
            _ => false,
        }
    }

    /// [`in_state`](Self::in_state) by predicate name, `submitted_reviewing`
    /// for `submitted.reviewing`. Unknown predicates are never true.
    pub fn is(&self, predicate: &str) -> bool {
        self.definition
            .catalog()
            .predicate_path(predicate)
            .is_some_and(|path| self.in_state(path))
    }

    /// True when the current state or one of its ancestors declares `event`.
    pub fn respond_to_event(&self, event: &str) -> bool {
        self.event_state(event).is_some()
    }

    /// Every event the current state answers to, by name.
    pub fn available_events(&self) -> BTreeSet<&str> {
        self.tree
            .ancestors(self.dispatch_start())
            .flat_map(|state| self.tree.node(state).spec().events())
            .map(|event| event.name())
            .collect()
    }

    fn dispatch_start(&self) -> StateId {
        self.current_state().unwrap_or_else(|| self.tree.root())
    }

    /// Nearest state, from the current one upwards, declaring `event`.
    fn event_state(&self, event: &str) -> Option<StateId> {
        self.tree
            .ancestors(self.dispatch_start())
            .find(|state| self.tree.node(*state).spec().has_event(event))
    }

    /// Event being dispatched, if any.
    pub fn current_event(&self) -> Option<&str> {
        self.current_event.as_deref()
    }

    /// Capture the current path and context.
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint::capture(self.current_path(), &self.context)
    }
}

impl<R, H> StateManager<R, H> {
    /// Resolve an absolute path.
    pub fn find_state(&self, path: &str) -> Option<StateId> {
        self.tree.find_state(path)
    }

    /// Every state visited resolving `path`, the root first.
    pub fn find_states(&self, path: &str) -> Option<Vec<StateId>> {
        self.tree.find_states(self.tree.root(), path)
    }

    /// View of the state `id`, `None` if it is not part of this manager.
    pub fn state(&self, id: StateId) -> Option<StateRef<'_, R>> {
        (id.index() < self.tree.len()).then(|| StateRef::new(&self.tree, &self.resource, id))
    }

    pub fn tree(&self) -> &StateTree<R> {
        &self.tree
    }

    pub fn definition(&self) -> &Arc<Definition<R>> {
        &self.definition
    }

    pub fn resource(&self) -> &R {
        &self.resource
    }

    pub fn resource_mut(&mut self) -> &mut R {
        &mut self.resource
    }

    pub fn into_resource(self) -> R {
        self.resource
    }

    pub fn hooks(&self) -> &H {
        &self.hooks
    }

    pub fn hooks_mut(&mut self) -> &mut H {
        &mut self.hooks
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut Context {
        &mut self.context
    }
}

impl<R, H: std::fmt::Debug> std::fmt::Debug for StateManager<R, H>
where
    R: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateManager")
            .field("tree", &self.tree)
            .field("resource", &self.resource)
            .field("hooks", &self.hooks)
            .field("context", &self.context)
            .field("current_event", &self.current_event)
            .field("dirty", &self.held.is_some())
            .finish_non_exhaustive()
    }
}
