//! Shared ancestor-walk helpers for the two entity trees.

use std::collections::HashSet;

use crate::entities::Universe;
use crate::{BodyId, GroupId};

/// Whether attaching `node` under `new_parent` would close a cycle.
///
/// Walks the ancestor chain of the proposed parent through the abstract
/// accessor; the same walk serves body reparents and group membership
/// moves. `bound` caps the walk at the tree size, so a corrupt chain
/// fails closed as a cycle instead of looping.
pub fn creates_cycle<I, F>(node: &I, new_parent: &I, mut parent_of: F, bound: usize) -> bool
where
    I: PartialEq + Clone,
    F: FnMut(&I) -> Option<I>,
{
    if node == new_parent {
        return true;
    }
    let mut current = parent_of(new_parent);
    let mut steps = 0usize;
    while let Some(ancestor) = current {
        if &ancestor == node {
            return true;
        }
        steps += 1;
        if steps > bound {
            return true;
        }
        current = parent_of(&ancestor);
    }
    false
}

/// All body ids in the subtree rooted at `id`, root first.
pub fn collect_body_subtree(universe: &Universe, id: &BodyId) -> Vec<BodyId> {
    let mut collected = Vec::new();
    let mut queue = vec![id.clone()];
    let mut seen = HashSet::new();
    while let Some(current) = queue.pop() {
        if !seen.insert(current.clone()) {
            continue;
        }
        if let Some(body) = universe.bodies.get(&current) {
            queue.extend(body.children.iter().cloned());
        }
        collected.push(current);
    }
    collected
}

/// All group ids in the subtree rooted at `id`, root first. Body-root
/// members are not part of the group tree and are skipped.
pub fn collect_group_subtree(universe: &Universe, id: &GroupId) -> Vec<GroupId> {
    let mut collected = Vec::new();
    let mut queue = vec![id.clone()];
    let mut seen = HashSet::new();
    while let Some(current) = queue.pop() {
        if !seen.insert(current.clone()) {
            continue;
        }
        if let Some(group) = universe.groups.get(&current) {
            queue.extend(group.children.iter().filter_map(|c| c.group_id().cloned()));
        }
        collected.push(current);
    }
    collected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Body, BodyKind};

    fn chain(universe: &mut Universe, ids: &[&str]) {
        // Builds a -> b -> c ... parent-first.
        for (i, raw) in ids.iter().enumerate() {
            let mut body = Body::new(*raw, BodyKind::Planet, *raw);
            if i > 0 {
                body.parent_id = Some(BodyId::from(ids[i - 1]));
                let parent = BodyId::from(ids[i - 1]);
                if let Some(p) = universe.bodies.get_mut(&parent) {
                    p.children.push(body.id.clone());
                }
            }
            universe.bodies.insert(body.id.clone(), body);
        }
    }

    #[test]
    fn attaching_under_own_descendant_is_a_cycle() {
        let mut universe = Universe::new();
        chain(&mut universe, &["a", "b", "c"]);
        let bound = universe.bodies.len();
        assert!(creates_cycle(
            &BodyId::from("a"),
            &BodyId::from("c"),
            |id| universe.body_parent(id),
            bound
        ));
    }

    #[test]
    fn self_parent_is_a_cycle() {
        let universe = Universe::new();
        assert!(creates_cycle(
            &BodyId::from("a"),
            &BodyId::from("a"),
            |id| universe.body_parent(id),
            1
        ));
    }

    #[test]
    fn attaching_to_an_unrelated_chain_is_not_a_cycle() {
        let mut universe = Universe::new();
        chain(&mut universe, &["a", "b"]);
        chain(&mut universe, &["x", "y"]);
        let bound = universe.bodies.len();
        assert!(!creates_cycle(
            &BodyId::from("a"),
            &BodyId::from("y"),
            |id| universe.body_parent(id),
            bound
        ));
    }

    #[test]
    fn corrupt_parent_chain_fails_closed() {
        let mut universe = Universe::new();
        chain(&mut universe, &["a", "b"]);
        // Manually corrupt: a's parent is b while b's parent is a.
        if let Some(a) = universe.bodies.get_mut(&BodyId::from("a")) {
            a.parent_id = Some(BodyId::from("b"));
        }
        let bound = universe.bodies.len();
        assert!(creates_cycle(
            &BodyId::from("z"),
            &BodyId::from("b"),
            |id| universe.body_parent(id),
            bound
        ));
    }

    #[test]
    fn subtree_collection_includes_every_descendant() {
        let mut universe = Universe::new();
        chain(&mut universe, &["a", "b", "c"]);
        let mut removed = collect_body_subtree(&universe, &BodyId::from("a"));
        removed.sort();
        assert_eq!(
            removed,
            vec![BodyId::from("a"), BodyId::from("b"), BodyId::from("c")]
        );
    }
}
