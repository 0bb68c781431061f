//! Structural invariant checks for whole documents.
//!
//! `replaceSnapshot` is the one command that substitutes the entire
//! universe; the candidate must satisfy the same invariants the reducer
//! maintains incrementally. Dangling flat-collection host references are
//! tolerated by definition and not checked here.

use std::collections::HashSet;

use crate::entities::Universe;

/// Verify the four structural invariants of a document: resolvable
/// parents, acyclic body tree, acyclic group tree, and root sets that
/// exactly mirror the null-parent entities. Returns the first violation
/// found, described for the `snapshotRejected` event.
pub fn validate(universe: &Universe) -> Result<(), String> {
    // Parents resolve to existing entities of the same kind.
    for (id, body) in &universe.bodies {
        if let Some(parent_id) = &body.parent_id {
            if !universe.bodies.contains_key(parent_id) {
                return Err(format!("body {id} references missing parent {parent_id}"));
            }
        }
    }
    for (id, group) in &universe.groups {
        if let Some(parent_id) = &group.parent_id {
            if !universe.groups.contains_key(parent_id) {
                return Err(format!("group {id} references missing parent {parent_id}"));
            }
        }
    }

    // Acyclicity: no id may be reachable from itself by parent traversal.
    let body_bound = universe.bodies.len();
    for id in universe.bodies.keys() {
        let mut current = universe.body_parent(id);
        let mut steps = 0usize;
        while let Some(ancestor) = current {
            if &ancestor == id {
                return Err(format!("body hierarchy contains a cycle through {id}"));
            }
            steps += 1;
            if steps > body_bound {
                return Err(format!("body hierarchy contains a cycle through {id}"));
            }
            current = universe.body_parent(&ancestor);
        }
    }
    let group_bound = universe.groups.len();
    for id in universe.groups.keys() {
        let mut current = universe.group_parent(id);
        let mut steps = 0usize;
        while let Some(ancestor) = current {
            if &ancestor == id {
                return Err(format!("group hierarchy contains a cycle through {id}"));
            }
            steps += 1;
            if steps > group_bound {
                return Err(format!("group hierarchy contains a cycle through {id}"));
            }
            current = universe.group_parent(&ancestor);
        }
    }

    // Root collections equal the null-parent sets exactly.
    let body_roots: HashSet<_> = universe.root_bodies.iter().collect();
    if body_roots.len() != universe.root_bodies.len() {
        return Err("root body list contains duplicates".to_string());
    }
    let null_parent_bodies: HashSet<_> = universe
        .bodies
        .iter()
        .filter(|(_, b)| b.parent_id.is_none())
        .map(|(id, _)| id)
        .collect();
    if body_roots != null_parent_bodies {
        return Err("root body list does not match parentless bodies".to_string());
    }

    let group_roots: HashSet<_> = universe.root_groups.iter().collect();
    if group_roots.len() != universe.root_groups.len() {
        return Err("root group list contains duplicates".to_string());
    }
    let null_parent_groups: HashSet<_> = universe
        .groups
        .iter()
        .filter(|(_, g)| g.parent_id.is_none())
        .map(|(id, _)| id)
        .collect();
    if group_roots != null_parent_groups {
        return Err("root group list does not match parentless groups".to_string());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Body, BodyKind};
    use crate::BodyId;

    fn valid_universe() -> Universe {
        let mut universe = Universe::new();
        let mut sol = Body::new("sol", BodyKind::Star, "Sol");
        let earth = Body::new("earth", BodyKind::Planet, "Earth").with_parent("sol");
        sol.children.push(earth.id.clone());
        universe.root_bodies.push(sol.id.clone());
        universe.bodies.insert(sol.id.clone(), sol);
        universe.bodies.insert(earth.id.clone(), earth);
        universe
    }

    #[test]
    fn accepts_a_well_formed_document() {
        assert_eq!(validate(&valid_universe()), Ok(()));
    }

    #[test]
    fn rejects_missing_parent() {
        let mut universe = valid_universe();
        if let Some(earth) = universe.bodies.get_mut(&BodyId::from("earth")) {
            earth.parent_id = Some(BodyId::from("vanished"));
        }
        assert!(validate(&universe).is_err());
    }

    #[test]
    fn rejects_parent_cycle() {
        let mut universe = valid_universe();
        if let Some(sol) = universe.bodies.get_mut(&BodyId::from("sol")) {
            sol.parent_id = Some(BodyId::from("earth"));
        }
        // sol is no longer a root, so fix the root list to isolate the
        // cycle check.
        universe.root_bodies.clear();
        assert!(validate(&universe)
            .expect_err("cycle must be rejected")
            .contains("cycle"));
    }

    #[test]
    fn rejects_stale_root_list() {
        let mut universe = valid_universe();
        universe.root_bodies.push(BodyId::from("earth"));
        assert!(validate(&universe).is_err());
    }
}
