//! Specification checks using Validation.
//!
//! Every check runs; all violations are reported together instead of
//! stopping at the first one.

use crate::builder::error::SpecViolation;
use crate::core::{Specification, StateId, StateTree};
use std::collections::BTreeMap;
use std::sync::Arc;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

type Check = Validation<(), NonEmptyVec<SpecViolation>>;

fn check(ok: bool, violation: impl FnOnce() -> SpecViolation) -> Check {
    if ok {
        Validation::success(())
    } else {
        Validation::fail(violation())
    }
}

/// Validate a root specification, accumulating ALL violations.
pub fn validate<R>(root: &Specification<R>) -> Validation<(), NonEmptyVec<SpecViolation>> {
    let mut checks: Vec<Check> = vec![check(!root.is_leaf(), || SpecViolation::NoStates)];

    let tree = StateTree::new(Arc::new(root.clone()));
    let mut predicates: BTreeMap<String, String> = BTreeMap::new();
    for id in tree.ids() {
        let node = tree.node(id);
        let path = tree.path(id);

        if let Some(name) = node.name() {
            let parent = node.parent().map(|p| tree.path(p)).unwrap_or_default();
            checks.push(check(!name.is_empty() && !name.contains('.'), || {
                SpecViolation::InvalidStateName {
                    parent,
                    name: name.to_string(),
                }
            }));

            let predicate = path.replace('.', "_");
            let taken = predicates.get(&predicate).cloned();
            checks.push(check(taken.is_none(), || SpecViolation::PredicateCollision {
                predicate: predicate.clone(),
                first: taken.unwrap_or_default(),
                second: path.clone(),
            }));
            predicates.entry(predicate).or_insert_with(|| path.clone());
        }

        if let Some(initial) = node.spec().initial_state() {
            let resolves = tree
                .find_state_from(id, initial)
                .is_some_and(|target| target != id);
            checks.push(check(resolves, || SpecViolation::UnknownInitialState {
                owner: path.clone(),
                target: initial.to_string(),
            }));
        }

        for event in node.spec().events() {
            checks.push(check(!event.name().is_empty(), || {
                SpecViolation::InvalidEventName { state: path.clone() }
            }));

            if let Some(target) = event.target() {
                checks.push(check_target(&tree, id, &path, event.name(), target));
            }
        }
    }

    Validation::all_vec(checks).map(|_| ())
}

/// An event is sent from a leaf at or below the state declaring it, and its
/// target resolves from that leaf upwards. It must reach a leaf from every
/// such origin.
fn check_target<R>(
    tree: &StateTree<R>,
    declaring: StateId,
    state: &str,
    event: &str,
    target: &str,
) -> Check {
    let unresolvable = || SpecViolation::UnresolvableTarget {
        state: state.to_string(),
        event: event.to_string(),
        target: target.to_string(),
    };
    if target.is_empty() {
        return Validation::fail(unresolvable());
    }

    let origins = tree
        .ids()
        .filter(|id| tree.is_leaf(*id) && tree.is_within(*id, declaring));
    for origin in origins {
        let resolved = tree
            .ancestors(origin)
            .find_map(|from| tree.find_state_from(from, target));
        match resolved {
            None => return Validation::fail(unresolvable()),
            Some(found) if !tree.is_leaf(found) => {
                return Validation::fail(SpecViolation::TargetNotLeaf {
                    state: state.to_string(),
                    event: event.to_string(),
                    target: tree.path(found),
                })
            }
            Some(_) => {}
        }
    }
    Validation::success(())
}
