//! Read-only view of a single state node.

use crate::core::{Specification, StateId, StateTree};

/// A state node together with the resource of the manager that owns it.
pub struct StateRef<'a, R> {
    tree: &'a StateTree<R>,
    resource: &'a R,
    id: StateId,
}

impl<'a, R> StateRef<'a, R> {
    pub(crate) fn new(tree: &'a StateTree<R>, resource: &'a R, id: StateId) -> Self {
        Self { tree, resource, id }
    }

    pub fn id(&self) -> StateId {
        self.id
    }

    /// Local name, `None` for the root.
    pub fn name(&self) -> Option<&'a str> {
        self.tree.node(self.id).name()
    }

    pub fn path(&self) -> String {
        self.tree.path(self.id)
    }

    pub fn is_leaf(&self) -> bool {
        self.tree.is_leaf(self.id)
    }

    pub fn spec(&self) -> &'a Specification<R> {
        self.tree.node(self.id).spec()
    }

    pub fn parent(&self) -> Option<StateRef<'a, R>> {
        self.tree
            .parent(self.id)
            .map(|parent| StateRef::new(self.tree, self.resource, parent))
    }

    pub fn children(&self) -> Vec<StateRef<'a, R>> {
        self.tree
            .node(self.id)
            .children()
            .map(|(_, child)| StateRef::new(self.tree, self.resource, child))
            .collect()
    }

    /// The resource of the manager this state belongs to.
    pub fn resource(&self) -> &'a R {
        self.resource
    }
}

impl<R> Clone for StateRef<'_, R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R> Copy for StateRef<'_, R> {}

impl<R> std::fmt::Debug for StateRef<'_, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateRef")
            .field("id", &self.id)
            .field("path", &self.path())
            .finish()
    }
}
