//! Validated, shareable state-manager definitions.

use crate::builder::error::BuildError;
use crate::builder::validate::validate;
use crate::core::spec::Specification;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use stillwater::validation::Validation;

/// Names derived from a specification once, when it is built.
///
/// Predicates map an underscore-joined name to a path (`root_outer1` to
/// `root.outer1`) so hosts can expose `is_*` style checks without walking
/// the specification on every call.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Catalog {
    paths: Vec<String>,
    predicates: BTreeMap<String, String>,
    events: BTreeSet<String>,
}

impl Catalog {
    pub fn new<R>(root: &Specification<R>) -> Self {
        let mut catalog = Self::default();
        catalog.events.extend(root.events().map(|e| e.name().to_string()));
        catalog.collect(root, &[]);
        catalog
    }

    fn collect<R>(&mut self, spec: &Specification<R>, prefix: &[&str]) {
        for (name, child) in spec.states() {
            let mut parts = prefix.to_vec();
            parts.push(name);
            let path = parts.join(".");
            self.predicates.insert(parts.join("_"), path.clone());
            self.paths.push(path);
            self.events
                .extend(child.events().map(|e| e.name().to_string()));
            self.collect(child, &parts);
        }
    }

    /// Every state path, depth first in declaration order.
    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    pub fn predicate_path(&self, predicate: &str) -> Option<&str> {
        self.predicates.get(predicate).map(String::as_str)
    }

    pub fn predicates(&self) -> impl Iterator<Item = (&str, &str)> {
        self.predicates
            .iter()
            .map(|(name, path)| (name.as_str(), path.as_str()))
    }

    /// Every event name declared anywhere in the tree.
    pub fn events(&self) -> impl Iterator<Item = &str> {
        self.events.iter().map(String::as_str)
    }

    pub fn has_event(&self, name: &str) -> bool {
        self.events.contains(name)
    }
}

/// A validated root specification and its catalog.
///
/// Built once per kind of managed resource and shared by every manager
/// created for it.
pub struct Definition<R> {
    root: Arc<Specification<R>>,
    catalog: Catalog,
}

impl<R> Definition<R> {
    /// Validate `root`, reporting every problem found at once.
    pub fn new(root: Specification<R>) -> Result<Self, BuildError> {
        match validate(&root) {
            Validation::Success(_) => {
                let catalog = Catalog::new(&root);
                Ok(Self {
                    root: Arc::new(root),
                    catalog,
                })
            }
            Validation::Failure(violations) => Err(BuildError::InvalidSpecification {
                violations: violations.iter().cloned().collect(),
            }),
        }
    }

    pub fn root(&self) -> &Arc<Specification<R>> {
        &self.root
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Specification of the state at `path`; the empty path is the root.
    pub fn find(&self, path: &str) -> Option<&Specification<R>> {
        self.root.find(path)
    }
}

impl<R> std::fmt::Debug for Definition<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Definition")
            .field("root", &self.root)
            .field("catalog", &self.catalog)
            .finish()
    }
}
