//! Event descriptors declared on states.

use crate::core::error::StateError;
use crate::manager::EventContext;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Handler invoked when an event is dispatched to the state declaring it.
pub type EventHandler<R> =
    Arc<dyn Fn(&mut EventContext<'_, R>, &[Value]) -> Result<(), StateError> + Send + Sync>;

/// Function computing a delay from the resource at scheduling time.
pub type DelayFn<R> = Arc<dyn Fn(&R) -> Duration + Send + Sync>;

/// How long to wait before a delayed event is redelivered.
pub enum Delay<R> {
    /// A fixed duration.
    Fixed(Duration),

    /// A duration computed from the resource when the state is entered.
    Computed(DelayFn<R>),
}

impl<R> Delay<R> {
    pub fn resolve(&self, resource: &R) -> Duration {
        match self {
            Self::Fixed(duration) => *duration,
            Self::Computed(compute) => compute(resource),
        }
    }
}

impl<R> Clone for Delay<R> {
    fn clone(&self) -> Self {
        match self {
            Self::Fixed(duration) => Self::Fixed(*duration),
            Self::Computed(compute) => Self::Computed(Arc::clone(compute)),
        }
    }
}

impl<R> fmt::Debug for Delay<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(duration) => f.debug_tuple("Fixed").field(duration).finish(),
            Self::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

/// Declaration of an event on a state.
///
/// An event without a target is a pure action: dispatching it only runs
/// its handler. An event with a target transitions there after the handler
/// returns.
///
/// # Example
///
/// ```rust
/// use statetree::core::EventSpec;
/// use std::time::Duration;
///
/// let remind: EventSpec<String> = EventSpec::new("remind")
///     .transitions_to("reminded")
///     .delay(Duration::from_secs(2 * 60 * 60));
///
/// assert_eq!(remind.name(), "remind");
/// assert_eq!(remind.target(), Some("reminded"));
/// assert!(remind.delay_spec().is_some());
/// ```
pub struct EventSpec<R> {
    name: String,
    transitions_to: Option<String>,
    delay: Option<Delay<R>>,
    handler: Option<EventHandler<R>>,
}

impl<R> EventSpec<R> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transitions_to: None,
            delay: None,
            handler: None,
        }
    }

    /// Set the path to transition to once the handler has run.
    pub fn transitions_to(mut self, path: impl Into<String>) -> Self {
        self.transitions_to = Some(path.into());
        self
    }

    /// Redeliver this event a fixed time after its state is entered.
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = Some(Delay::Fixed(delay));
        self
    }

    /// Redeliver this event after a delay computed from the resource.
    pub fn delay_with<F>(mut self, compute: F) -> Self
    where
        F: Fn(&R) -> Duration + Send + Sync + 'static,
    {
        self.delay = Some(Delay::Computed(Arc::new(compute)));
        self
    }

    /// Attach the handler run on dispatch.
    pub fn handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&mut EventContext<'_, R>, &[Value]) -> Result<(), StateError> + Send + Sync + 'static,
    {
        self.handler = Some(Arc::new(handler));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn target(&self) -> Option<&str> {
        self.transitions_to.as_deref()
    }

    pub fn delay_spec(&self) -> Option<&Delay<R>> {
        self.delay.as_ref()
    }

    pub fn event_handler(&self) -> Option<&EventHandler<R>> {
        self.handler.as_ref()
    }
}

impl<R> Clone for EventSpec<R> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            transitions_to: self.transitions_to.clone(),
            delay: self.delay.clone(),
            handler: self.handler.clone(),
        }
    }
}

impl<R> fmt::Debug for EventSpec<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventSpec")
            .field("name", &self.name)
            .field("transitions_to", &self.transitions_to)
            .field("delay", &self.delay)
            .field("handler", &self.handler.is_some())
            .finish()
    }
}
