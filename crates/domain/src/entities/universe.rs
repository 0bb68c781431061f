//! Universe - the aggregate document.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::entities::{Belt, Body, Disk, Group, Nebula, SmallBodyField};
use crate::{BeltId, BodyId, DiskId, FieldId, GroupId, NebulaId};

/// The aggregate root: simulation clock, two entity trees, and the flat
/// collections that reference bodies without joining the hierarchy.
///
/// Universes are created externally and handed to this crate through the
/// persistence port; the reducer is the only code that mutates one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Universe {
    /// Simulation clock, advanced by `tick` commands.
    pub time: f64,
    pub bodies: HashMap<BodyId, Body>,
    /// Identifiers of bodies whose `parent_id` is null.
    pub root_bodies: Vec<BodyId>,
    pub groups: HashMap<GroupId, Group>,
    /// Identifiers of groups whose `parent_id` is null.
    pub root_groups: Vec<GroupId>,
    pub fields: HashMap<FieldId, SmallBodyField>,
    pub disks: HashMap<DiskId, Disk>,
    pub nebulae: HashMap<NebulaId, Nebula>,
    pub belts: HashMap<BeltId, Belt>,
}

impl Universe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parent accessor for the body tree, shaped for the shared cycle
    /// walk.
    pub fn body_parent(&self, id: &BodyId) -> Option<BodyId> {
        self.bodies.get(id).and_then(|b| b.parent_id.clone())
    }

    /// Parent accessor for the group tree.
    pub fn group_parent(&self, id: &GroupId) -> Option<GroupId> {
        self.groups.get(id).and_then(|g| g.parent_id.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::BodyKind;

    #[test]
    fn empty_universe_round_trips_through_json() {
        let universe = Universe::new();
        let json = serde_json::to_string(&universe).expect("serialize");
        let back: Universe = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, universe);
    }

    #[test]
    fn body_parent_follows_the_stored_link() {
        let mut universe = Universe::new();
        let sol = Body::new("sol", BodyKind::Star, "Sol");
        let earth = Body::new("earth", BodyKind::Planet, "Earth").with_parent("sol");
        universe.bodies.insert(sol.id.clone(), sol);
        universe.bodies.insert(earth.id.clone(), earth);

        assert_eq!(
            universe.body_parent(&BodyId::from("earth")),
            Some(BodyId::from("sol"))
        );
        assert_eq!(universe.body_parent(&BodyId::from("sol")), None);
        assert_eq!(universe.body_parent(&BodyId::from("missing")), None);
    }
}
