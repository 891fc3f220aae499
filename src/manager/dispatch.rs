//! Event dispatch.
//!
//! An event bubbles from the current state up through its ancestors until a
//! state declaring it is found. That state's handler runs first; the event's
//! target, if any, is then resolved from the state that was current when
//! the event was sent.

use super::{transition, Context, StateManager, TransitionHooks};
use crate::adapters::StateStore;
use crate::core::{StateError, StateTransition};
use serde_json::Value;
use tracing::debug;

impl<R: StateStore, H: TransitionHooks<R>> StateManager<R, H> {
    /// Dispatch `event` with `args` to the nearest state declaring it.
    ///
    /// # Errors
    ///
    /// - `EventInFlight` when called while another event is being handled
    /// - `InvalidEvent` when neither the current state nor an ancestor
    ///   declares `event`
    /// - `StateNotFound`, `InvalidTransition` or `DirtyTransition` when the
    ///   event's target cannot be reached; checked before the handler runs
    /// - any error returned by the handler or by the follow-up transition
    ///
    /// Transitions the handler makes itself are complete when it returns.
    /// They stay in place if the follow-up transition is then rejected by
    /// the hooks.
    pub fn send_event(&mut self, event: &str, args: &[Value]) -> Result<(), StateError> {
        if let Some(active) = &self.current_event {
            return Err(StateError::EventInFlight {
                active: active.clone(),
                requested: event.to_string(),
            });
        }

        self.current_event = Some(event.to_string());
        let result = self.dispatch(event, args);
        self.current_event = None;
        result
    }

    fn dispatch(&mut self, event: &str, args: &[Value]) -> Result<(), StateError> {
        let origin = self.current_state();
        let Some(declaring) = self.event_state(event) else {
            return Err(StateError::InvalidEvent {
                event: event.to_string(),
                state: self.current_path().unwrap_or_default(),
            });
        };

        let state = self.tree.path(declaring);
        let (handler, target) = match self.tree.node(declaring).spec().event(event) {
            Some(spec) => (
                spec.event_handler().cloned(),
                spec.target().map(str::to_string),
            ),
            None => (None, None),
        };
        debug!(event, state = %state, target = target.as_deref().unwrap_or_default(), "Dispatching event");

        if let Some(target) = &target {
            let anchor = origin.unwrap_or_else(|| self.tree.root());
            let plan = transition::plan(&self.tree, anchor, origin, target)?;
            if let Some(held) = &self.held {
                return Err(StateError::DirtyTransition {
                    pending: held.transition.to.clone(),
                    requested: self.tree.path(plan.target),
                });
            }
        }

        if let Some(handler) = handler {
            let mut ctx = EventContext {
                controller: self,
                state,
                event: event.to_string(),
            };
            handler(&mut ctx, args)?;
        }

        if let Some(target) = target {
            self.transition_from(origin, &target)?;
        }
        Ok(())
    }
}

/// Operations on a manager available to event handlers.
///
/// Object safe so handlers can be stored without naming the manager's
/// hooks type.
pub trait Controller<R> {
    fn resource(&self) -> &R;

    fn resource_mut(&mut self) -> &mut R;

    fn context(&self) -> &Context;

    fn context_mut(&mut self) -> &mut Context;

    fn current_path(&self) -> Option<String>;

    fn in_state(&self, path: &str) -> bool;

    fn transition_to(&mut self, path: &str) -> Result<StateTransition, StateError>;

    fn send_event(&mut self, event: &str, args: &[Value]) -> Result<(), StateError>;
}

impl<R: StateStore, H: TransitionHooks<R>> Controller<R> for StateManager<R, H> {
    fn resource(&self) -> &R {
        StateManager::resource(self)
    }

    fn resource_mut(&mut self) -> &mut R {
        StateManager::resource_mut(self)
    }

    fn context(&self) -> &Context {
        StateManager::context(self)
    }

    fn context_mut(&mut self) -> &mut Context {
        StateManager::context_mut(self)
    }

    fn current_path(&self) -> Option<String> {
        StateManager::current_path(self)
    }

    fn in_state(&self, path: &str) -> bool {
        StateManager::in_state(self, path)
    }

    fn transition_to(&mut self, path: &str) -> Result<StateTransition, StateError> {
        StateManager::transition_to(self, path)
    }

    fn send_event(&mut self, event: &str, args: &[Value]) -> Result<(), StateError> {
        StateManager::send_event(self, event, args)
    }
}

/// What an event handler sees: the manager, the declaring state and the
/// event name.
///
/// # Example
///
/// ```rust
/// use statetree::builder::StateBuilder;
/// use statetree::core::{EventSpec, StateError};
/// use statetree::manager::StateManager;
/// use serde_json::json;
///
/// let definition = StateBuilder::<Option<String>>::new()
///     .state("open", |s| {
///         s.event(EventSpec::new("assign").handler(|ctx, args| {
///             let assignee = args
///                 .first()
///                 .and_then(|v| v.as_str())
///                 .ok_or_else(|| StateError::handler(ctx.event(), "missing assignee"))?;
///             ctx.context_mut().insert("assignee".to_string(), assignee.to_string());
///             ctx.transition_to("assigned").map(|_| ())
///         }))
///     })
///     .leaf("assigned")
///     .build()?;
///
/// let mut ticket = StateManager::new(definition, None)?;
/// ticket.send_event("assign", &[json!("dana")])?;
///
/// assert!(ticket.in_state("assigned"));
/// assert_eq!(ticket.context().get("assignee").map(String::as_str), Some("dana"));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct EventContext<'a, R> {
    controller: &'a mut dyn Controller<R>,
    state: String,
    event: String,
}

impl<'a, R> EventContext<'a, R> {
    /// Path of the state declaring the event.
    pub fn state(&self) -> &str {
        &self.state
    }

    pub fn event(&self) -> &str {
        &self.event
    }

    pub fn resource(&self) -> &R {
        self.controller.resource()
    }

    pub fn resource_mut(&mut self) -> &mut R {
        self.controller.resource_mut()
    }

    pub fn context(&self) -> &Context {
        self.controller.context()
    }

    pub fn context_mut(&mut self) -> &mut Context {
        self.controller.context_mut()
    }

    pub fn current_path(&self) -> Option<String> {
        self.controller.current_path()
    }

    pub fn in_state(&self, path: &str) -> bool {
        self.controller.in_state(path)
    }

    /// Transition immediately, before the handler returns.
    pub fn transition_to(&mut self, path: &str) -> Result<StateTransition, StateError> {
        self.controller.transition_to(path)
    }

    /// Always fails with `EventInFlight` while this handler runs.
    pub fn send_event(&mut self, event: &str, args: &[Value]) -> Result<(), StateError> {
        self.controller.send_event(event, args)
    }
}
