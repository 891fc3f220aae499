//! Delayed event redelivery.
//!
//! Events declared with a delay are queued when their state is entered and
//! sent later as ordinary events. The queue lives outside the manager's
//! transition logic: [`DelayedEvents`] fills it as transition hooks, the
//! host drains it with [`DelayedEvents::take_due`] and hands the result to
//! [`deliver_all`].

use crate::adapters::StateStore;
use crate::core::{Definition, StateError, StateTransition};
use crate::manager::{StateManager, TransitionHooks};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

/// An event waiting to be sent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelayedEvent {
    pub id: Uuid,
    /// Path of the state whose entry scheduled the event.
    pub state: String,
    pub event: String,
    pub run_at: DateTime<Utc>,
}

/// Transition hooks queueing delayed events.
///
/// Entering a state queues every delayed event it declares. Exiting a state
/// cancels whatever it queued.
pub struct DelayedEvents<R> {
    definition: Arc<Definition<R>>,
    queue: Vec<DelayedEvent>,
}

impl<R> DelayedEvents<R> {
    pub fn new(definition: Arc<Definition<R>>) -> Self {
        Self {
            definition,
            queue: Vec::new(),
        }
    }

    /// Queued events in the order they were scheduled.
    pub fn pending(&self) -> &[DelayedEvent] {
        &self.queue
    }

    /// Earliest time at which an event becomes due.
    pub fn next_due(&self) -> Option<DateTime<Utc>> {
        self.queue.iter().map(|event| event.run_at).min()
    }

    /// Remove and return the events due at `now`, earliest first.
    pub fn take_due(&mut self, now: DateTime<Utc>) -> Vec<DelayedEvent> {
        let (mut due, waiting): (Vec<_>, Vec<_>) = std::mem::take(&mut self.queue)
            .into_iter()
            .partition(|event| event.run_at <= now);
        self.queue = waiting;
        due.sort_by_key(|event| event.run_at);
        due
    }

    pub fn cancel(&mut self, id: Uuid) -> Option<DelayedEvent> {
        let index = self.queue.iter().position(|event| event.id == id)?;
        Some(self.queue.remove(index))
    }

    fn schedule(&mut self, resource: &R, state: &str, entered_at: DateTime<Utc>) {
        let Some(spec) = self.definition.find(state) else {
            return;
        };
        for event in spec.events() {
            let Some(delay) = event.delay_spec() else {
                continue;
            };
            let run_at = chrono::Duration::from_std(delay.resolve(resource))
                .ok()
                .and_then(|delay| entered_at.checked_add_signed(delay));
            match run_at {
                Some(run_at) => self.queue.push(DelayedEvent {
                    id: Uuid::new_v4(),
                    state: state.to_string(),
                    event: event.name().to_string(),
                    run_at,
                }),
                None => warn!(state, event = event.name(), "Delay out of range, event not scheduled"),
            }
        }
    }
}

impl<R> TransitionHooks<R> for DelayedEvents<R> {
    fn did_transition(&mut self, resource: &mut R, transition: &StateTransition) {
        self.queue
            .retain(|event| !transition.exited.contains(&event.state));
        for state in &transition.entered {
            self.schedule(resource, state, transition.timestamp);
        }
    }
}

impl<R> std::fmt::Debug for DelayedEvents<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DelayedEvents")
            .field("queue", &self.queue)
            .finish_non_exhaustive()
    }
}

/// Send `event` if it still applies.
///
/// Returns `Ok(false)` without sending when the manager has left the state
/// that scheduled it or no longer answers to the event.
pub fn deliver<R, H>(manager: &mut StateManager<R, H>, event: &DelayedEvent) -> Result<bool, StateError>
where
    R: StateStore,
    H: TransitionHooks<R>,
{
    if !manager.in_state(&event.state) || !manager.respond_to_event(&event.event) {
        debug!(
            id = %event.id,
            state = %event.state,
            event = %event.event,
            "Dropping stale delayed event"
        );
        return Ok(false);
    }
    manager.send_event(&event.event, &[])?;
    Ok(true)
}

/// Deliver `events` in order, returning how many were sent. Stops at the
/// first error.
pub fn deliver_all<R, H, I>(manager: &mut StateManager<R, H>, events: I) -> Result<usize, StateError>
where
    R: StateStore,
    H: TransitionHooks<R>,
    I: IntoIterator<Item = DelayedEvent>,
{
    let mut delivered = 0;
    for event in events {
        if deliver(manager, &event)? {
            delivered += 1;
        }
    }
    Ok(delivered)
}
