//! Persistence adapters.
//!
//! A manager reads and writes the current path through [`StateStore`]. The
//! stored value is a single dot-joined path string; how and when it reaches
//! durable storage is up to the implementation.

pub mod deferred;

pub use deferred::DeferredCommit;

/// Where a resource keeps its current state path.
///
/// `write_state` may defer durable storage, but the value must be visible to
/// the next `read_state` call.
pub trait StateStore {
    /// The persisted path, or `None` when unset. An empty path counts as
    /// unset.
    fn read_state(&self) -> Option<&str>;

    fn write_state(&mut self, path: &str);
}

impl StateStore for String {
    fn read_state(&self) -> Option<&str> {
        (!self.is_empty()).then_some(self.as_str())
    }

    fn write_state(&mut self, path: &str) {
        self.clear();
        self.push_str(path);
    }
}

impl StateStore for Option<String> {
    fn read_state(&self) -> Option<&str> {
        self.as_deref().filter(|path| !path.is_empty())
    }

    fn write_state(&mut self, path: &str) {
        *self = Some(path.to_string());
    }
}

impl<T: StateStore + ?Sized> StateStore for &mut T {
    fn read_state(&self) -> Option<&str> {
        (**self).read_state()
    }

    fn write_state(&mut self, path: &str) {
        (**self).write_state(path)
    }
}

/// A resource paired with accessors naming the field that holds its path.
///
/// # Example
///
/// ```rust
/// use statetree::adapters::{Property, StateStore};
///
/// struct Ticket {
///     status: Option<String>,
/// }
///
/// fn status(ticket: &Ticket) -> Option<&str> {
///     ticket.status.as_deref()
/// }
///
/// fn set_status(ticket: &mut Ticket, path: &str) {
///     ticket.status = Some(path.to_string());
/// }
///
/// let mut store = Property::new(Ticket { status: None }, status, set_status);
/// store.write_state("open.triaged");
/// assert_eq!(store.read_state(), Some("open.triaged"));
/// assert_eq!(store.into_inner().status.as_deref(), Some("open.triaged"));
/// ```
pub struct Property<T> {
    resource: T,
    get: fn(&T) -> Option<&str>,
    set: fn(&mut T, &str),
}

impl<T> Property<T> {
    pub fn new(resource: T, get: fn(&T) -> Option<&str>, set: fn(&mut T, &str)) -> Self {
        Self { resource, get, set }
    }

    pub fn resource(&self) -> &T {
        &self.resource
    }

    pub fn resource_mut(&mut self) -> &mut T {
        &mut self.resource
    }

    pub fn into_inner(self) -> T {
        self.resource
    }
}

impl<T> StateStore for Property<T> {
    fn read_state(&self) -> Option<&str> {
        (self.get)(&self.resource).filter(|path| !path.is_empty())
    }

    fn write_state(&mut self, path: &str) {
        (self.set)(&mut self.resource, path)
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Property<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Property")
            .field("resource", &self.resource)
            .finish_non_exhaustive()
    }
}
