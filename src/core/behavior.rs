//! Per-state lifecycle callbacks.
//!
//! A state declares its behavior once, on its `Specification`. Every node
//! instantiated from that specification shares it, so callbacks take `&self`
//! and receive the live data they act on through a [`StateContext`].

use crate::manager::Context;

/// Data visible to a lifecycle callback while a transition runs.
pub struct StateContext<'a, R> {
    pub(crate) path: &'a str,
    pub(crate) event: Option<&'a str>,
    pub(crate) resource: &'a mut R,
    pub(crate) context: &'a mut Context,
}

impl<'a, R> StateContext<'a, R> {
    /// Path of the state whose callback is running.
    pub fn path(&self) -> &str {
        self.path
    }

    /// Event being processed, if the transition was triggered by one.
    pub fn event(&self) -> Option<&str> {
        self.event
    }

    pub fn resource(&self) -> &R {
        &*self.resource
    }

    pub fn resource_mut(&mut self) -> &mut R {
        &mut *self.resource
    }

    pub fn context(&self) -> &Context {
        &*self.context
    }

    pub fn context_mut(&mut self) -> &mut Context {
        &mut *self.context
    }
}

/// Callbacks run for a state as transitions leave or reach it.
///
/// `exit` and `enter` run before the new path is written to the resource,
/// `exited` and `entered` run after. All default to no-ops.
///
/// # Example
///
/// ```rust
/// use statetree::core::{StateBehavior, StateContext};
///
/// struct Post {
///     title: String,
///     state: Option<String>,
/// }
///
/// struct Published;
///
/// impl StateBehavior<Post> for Published {
///     fn entered(&self, ctx: &mut StateContext<'_, Post>) {
///         let title = ctx.resource().title.clone();
///         ctx.context_mut().insert("published_title".to_string(), title);
///     }
/// }
/// ```
pub trait StateBehavior<R>: Send + Sync {
    fn enter(&self, _ctx: &mut StateContext<'_, R>) {}

    fn exit(&self, _ctx: &mut StateContext<'_, R>) {}

    fn entered(&self, _ctx: &mut StateContext<'_, R>) {}

    fn exited(&self, _ctx: &mut StateContext<'_, R>) {}
}

type Callback<R> = Box<dyn Fn(&mut StateContext<'_, R>) + Send + Sync>;

/// Closure-backed behavior assembled by the builder's `on_*` methods.
pub struct Callbacks<R> {
    pub(crate) enter: Option<Callback<R>>,
    pub(crate) exit: Option<Callback<R>>,
    pub(crate) entered: Option<Callback<R>>,
    pub(crate) exited: Option<Callback<R>>,
}

impl<R> Callbacks<R> {
    pub fn new() -> Self {
        Self {
            enter: None,
            exit: None,
            entered: None,
            exited: None,
        }
    }
}

impl<R> Default for Callbacks<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> StateBehavior<R> for Callbacks<R> {
    fn enter(&self, ctx: &mut StateContext<'_, R>) {
        if let Some(callback) = &self.enter {
            callback(ctx);
        }
    }

    fn exit(&self, ctx: &mut StateContext<'_, R>) {
        if let Some(callback) = &self.exit {
            callback(ctx);
        }
    }

    fn entered(&self, ctx: &mut StateContext<'_, R>) {
        if let Some(callback) = &self.entered {
            callback(ctx);
        }
    }

    fn exited(&self, ctx: &mut StateContext<'_, R>) {
        if let Some(callback) = &self.exited {
            callback(ctx);
        }
    }
}
