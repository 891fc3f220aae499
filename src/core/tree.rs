//! Runtime tree of state nodes instantiated from a specification.
//!
//! Nodes live in an arena owned by the tree. Parents own their children
//! through the arena; a child refers back to its parent by [`StateId`] only.

use crate::core::spec::Specification;
use std::fmt;
use std::sync::Arc;

/// Index of a node inside its [`StateTree`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateId(usize);

impl StateId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A live state in the tree.
pub struct StateNode<R> {
    name: Option<String>,
    parent: Option<StateId>,
    children: Vec<(String, StateId)>,
    spec: Arc<Specification<R>>,
}

impl<R> StateNode<R> {
    /// Local name, `None` for the root.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn parent(&self) -> Option<StateId> {
        self.parent
    }

    pub fn children(&self) -> impl Iterator<Item = (&str, StateId)> {
        self.children.iter().map(|(name, id)| (name.as_str(), *id))
    }

    pub fn spec(&self) -> &Arc<Specification<R>> {
        &self.spec
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// One tree per manager. Built eagerly and never reshaped afterwards:
/// transitions enter and exit nodes, they never create or destroy them.
pub struct StateTree<R> {
    nodes: Vec<StateNode<R>>,
}

impl<R> StateTree<R> {
    /// Instantiate one node per state declared below `root`, recursively.
    pub fn new(root: Arc<Specification<R>>) -> Self {
        let mut tree = Self { nodes: Vec::new() };
        tree.instantiate(None, None, root);
        tree
    }

    fn instantiate(
        &mut self,
        name: Option<String>,
        parent: Option<StateId>,
        spec: Arc<Specification<R>>,
    ) -> StateId {
        let id = StateId(self.nodes.len());
        self.nodes.push(StateNode {
            name,
            parent,
            children: Vec::new(),
            spec: Arc::clone(&spec),
        });
        for (child_name, child_spec) in spec.states() {
            let child = self.instantiate(Some(child_name.to_string()), Some(id), Arc::clone(child_spec));
            self.nodes[id.0].children.push((child_name.to_string(), child));
        }
        id
    }

    pub fn root(&self) -> StateId {
        StateId(0)
    }

    pub fn node(&self, id: StateId) -> &StateNode<R> {
        &self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Every node id, parents before their children.
    pub fn ids(&self) -> impl Iterator<Item = StateId> {
        (0..self.nodes.len()).map(StateId)
    }

    pub fn parent(&self, id: StateId) -> Option<StateId> {
        self.node(id).parent
    }

    /// Exact-match child lookup.
    pub fn child(&self, id: StateId, name: &str) -> Option<StateId> {
        self.node(id)
            .children
            .iter()
            .find(|(child, _)| child == name)
            .map(|(_, child)| *child)
    }

    pub fn is_leaf(&self, id: StateId) -> bool {
        self.node(id).is_leaf()
    }

    /// `id` followed by each of its ancestors up to the root.
    pub fn ancestors(&self, id: StateId) -> Ancestors<'_, R> {
        Ancestors {
            tree: self,
            next: Some(id),
        }
    }

    /// True when `ancestor` is `id` or lies above it.
    pub fn is_within(&self, id: StateId, ancestor: StateId) -> bool {
        self.ancestors(id).any(|state| state == ancestor)
    }

    /// Dot-joined names from the root down to `id`; empty for the root.
    pub fn path(&self, id: StateId) -> String {
        let mut names: Vec<&str> = self
            .ancestors(id)
            .filter_map(|state| self.node(state).name())
            .collect();
        names.reverse();
        names.join(".")
    }

    /// Walk `path` downwards from `from`, returning every node visited
    /// starting with `from` itself, or `None` at the first unknown name.
    pub fn find_states(&self, from: StateId, path: &str) -> Option<Vec<StateId>> {
        let mut visited = vec![from];
        if path.is_empty() {
            return Some(visited);
        }
        let mut state = from;
        for name in path.split('.') {
            state = self.child(state, name)?;
            visited.push(state);
        }
        Some(visited)
    }

    /// Resolve an absolute path from the root.
    pub fn find_state(&self, path: &str) -> Option<StateId> {
        self.find_state_from(self.root(), path)
    }

    pub fn find_state_from(&self, from: StateId, path: &str) -> Option<StateId> {
        self.find_states(from, path)
            .and_then(|states| states.last().copied())
    }

    /// Default leaf below `from`: follow each state's declared initial state,
    /// or its first child when none is declared, until a leaf is reached.
    pub fn initial_leaf(&self, from: StateId) -> Option<StateId> {
        let mut state = from;
        while !self.is_leaf(state) {
            let next = match self.node(state).spec.initial_state() {
                Some(initial) => self.find_state_from(state, initial)?,
                None => self.node(state).children.first().map(|(_, child)| *child)?,
            };
            if next == state {
                return None;
            }
            state = next;
        }
        Some(state)
    }
}

impl<R> fmt::Debug for StateTree<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.ids().map(|id| self.path(id)))
            .finish()
    }
}

/// Iterator over a node and its ancestors, innermost first.
pub struct Ancestors<'a, R> {
    tree: &'a StateTree<R>,
    next: Option<StateId>,
}

impl<'a, R> Iterator for Ancestors<'a, R> {
    type Item = StateId;

    fn next(&mut self) -> Option<StateId> {
        let current = self.next?;
        self.next = self.tree.parent(current);
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item_states() -> Arc<Specification<()>> {
        let mut root = Specification::new();
        root.add_state("default", None);
        let outer = root.add_state("root", None);
        let outer1 = outer.add_state("outer1", None);
        outer1.add_state("inner", None);
        outer1.add_state("inner2", None);
        outer.add_state("outer2", None).add_state("inner", None);
        Arc::new(root)
    }

    #[test]
    fn builds_one_node_per_declared_state() {
        let tree = StateTree::new(item_states());
        // root, default, root, outer1, inner, inner2, outer2, inner
        assert_eq!(tree.len(), 8);
        assert_eq!(tree.node(tree.root()).name(), None);
        assert_eq!(tree.path(tree.root()), "");
    }

    #[test]
    fn paths_are_unique_and_dot_joined() {
        let tree = StateTree::new(item_states());
        let mut paths: Vec<String> = tree.ids().map(|id| tree.path(id)).collect();
        let total = paths.len();
        paths.sort();
        paths.dedup();
        assert_eq!(paths.len(), total);
        assert!(paths.contains(&"root.outer2.inner".to_string()));
    }

    #[test]
    fn find_states_returns_visited_sequence() {
        let tree = StateTree::new(item_states());
        let states = tree.find_states(tree.root(), "root.outer1.inner");
        let paths: Option<Vec<String>> =
            states.map(|states| states.into_iter().map(|id| tree.path(id)).collect());

        assert_eq!(
            paths,
            Some(vec![
                "".to_string(),
                "root".to_string(),
                "root.outer1".to_string(),
                "root.outer1.inner".to_string(),
            ])
        );
    }

    #[test]
    fn find_states_fails_on_first_unknown_name() {
        let tree = StateTree::new(item_states());
        assert!(tree.find_states(tree.root(), "root.outer3.inner").is_none());
        assert!(tree.find_state("Root").is_none());
        assert!(tree.find_state("root.outer").is_none());
    }

    #[test]
    fn relative_lookup_starts_at_given_node() {
        let tree = StateTree::new(item_states());
        let outer1 = tree.find_state("root.outer1");
        let inner2 = outer1.and_then(|outer1| tree.find_state_from(outer1, "inner2"));
        assert_eq!(inner2, tree.find_state("root.outer1.inner2"));
    }

    #[test]
    fn ancestors_walk_up_to_root() {
        let tree = StateTree::new(item_states());
        let inner = tree.find_state("root.outer2.inner");
        let chain: Vec<String> = inner
            .map(|inner| tree.ancestors(inner).map(|id| tree.path(id)).collect())
            .unwrap_or_default();
        assert_eq!(chain, vec!["root.outer2.inner", "root.outer2", "root", ""]);
    }

    #[test]
    fn initial_leaf_defaults_to_first_child() {
        let tree = StateTree::new(item_states());
        let leaf = tree.initial_leaf(tree.root());
        assert_eq!(leaf.map(|id| tree.path(id)), Some("default".to_string()));

        let outer = tree.find_state("root");
        let leaf = outer.and_then(|outer| tree.initial_leaf(outer));
        assert_eq!(
            leaf.map(|id| tree.path(id)),
            Some("root.outer1.inner".to_string())
        );
    }

    #[test]
    fn initial_leaf_follows_declared_initial_states() {
        let mut root: Specification<()> = Specification::new();
        root.set_initial_state("unsubmitted");
        root.add_state("draft", None);
        let unsubmitted = root.add_state("unsubmitted", None);
        unsubmitted.set_initial_state("initial");
        unsubmitted.add_state("reminded", None);
        unsubmitted.add_state("initial", None);

        let tree = StateTree::new(Arc::new(root));
        let leaf = tree.initial_leaf(tree.root());
        assert_eq!(
            leaf.map(|id| tree.path(id)),
            Some("unsubmitted.initial".to_string())
        );
    }

    #[test]
    fn leaf_detection() {
        let tree = StateTree::new(item_states());
        assert!(!tree.is_leaf(tree.root()));
        assert!(tree.find_state("default").is_some_and(|id| tree.is_leaf(id)));
        assert!(tree.find_state("root.outer1").is_some_and(|id| !tree.is_leaf(id)));
    }
}
