//! Group - a node in the secondary, organizational hierarchy.

use serde::{Deserialize, Serialize};

use crate::{BodyId, GroupId};

/// Spatial placement of a group in the scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Placement {
    pub position: [f64; 3],
    pub rotation: [f64; 3],
    pub scale: f64,
}

impl Default for Placement {
    fn default() -> Self {
        Self {
            position: [0.0; 3],
            rotation: [0.0; 3],
            scale: 1.0,
        }
    }
}

/// One entry in a group's ordered child list. A child is either a root of
/// the body hierarchy or a nested group; the two trees never interleave
/// below this tagging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum GroupChild {
    BodyRoot { id: BodyId },
    Group { id: GroupId },
}

impl GroupChild {
    pub fn body_id(&self) -> Option<&BodyId> {
        match self {
            GroupChild::BodyRoot { id } => Some(id),
            GroupChild::Group { .. } => None,
        }
    }

    pub fn group_id(&self) -> Option<&GroupId> {
        match self {
            GroupChild::Group { id } => Some(id),
            GroupChild::BodyRoot { .. } => None,
        }
    }
}

/// A node in the organizational tree. `parent_id == None` marks a root
/// group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: GroupId,
    #[serde(default)]
    pub parent_id: Option<GroupId>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub placement: Placement,
    /// Ordered members; maintained by the reducer.
    #[serde(default)]
    pub children: Vec<GroupChild>,
}

impl Group {
    pub fn new(id: impl Into<GroupId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            parent_id: None,
            name: name.into(),
            placement: Placement::default(),
            children: Vec::new(),
        }
    }

    pub fn with_parent(mut self, parent_id: impl Into<GroupId>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn with_placement(mut self, placement: Placement) -> Self {
        self.placement = placement;
        self
    }

    /// Position of a member in the child list, if present.
    pub fn member_index(&self, member: &GroupChild) -> Option<usize> {
        self.children.iter().position(|c| c == member)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_child_tags_disambiguate_in_json() {
        let child = GroupChild::BodyRoot {
            id: BodyId::from("sol"),
        };
        let json = serde_json::to_value(&child).expect("serialize");
        assert_eq!(json["kind"], "bodyRoot");

        let nested: GroupChild =
            serde_json::from_value(serde_json::json!({"kind": "group", "id": "inner"}))
                .expect("parse");
        assert_eq!(nested.group_id(), Some(&GroupId::from("inner")));
    }

    #[test]
    fn default_placement_has_unit_scale() {
        assert_eq!(Placement::default().scale, 1.0);
    }
}
