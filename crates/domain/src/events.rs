//! Reported outcomes of applying a command.
//!
//! The reducer never throws for domain-level problems; rejections travel
//! as events next to the (unchanged) state, and callers decide what a
//! given event implies at their transport boundary.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{BodyId, DiskId, FieldId, GroupId, NebulaId};

/// Which entity family a rejection refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EntityKind {
    Body,
    Group,
    Member,
    Field,
    Disk,
    Nebula,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Body => write!(f, "body"),
            EntityKind::Group => write!(f, "group"),
            EntityKind::Member => write!(f, "member"),
            EntityKind::Field => write!(f, "field"),
            EntityKind::Disk => write!(f, "disk"),
            EntityKind::Nebula => write!(f, "nebula"),
        }
    }
}

/// Outcome of one command application: either a success describing what
/// changed, or a rejection describing what could not be applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Event {
    // Successes
    TimeAdvanced { time: f64 },
    BodyAdded { id: BodyId },
    BodyUpdated { id: BodyId },
    /// Carries every id deleted by the recursive cascade, subtree
    /// included.
    BodyRemoved { removed: Vec<BodyId> },
    BodyReparented { id: BodyId, parent_id: BodyId },
    BodyDetached { id: BodyId },
    GroupAdded { id: GroupId },
    GroupUpdated { id: GroupId },
    GroupRemoved { removed: Vec<GroupId> },
    MemberAdded { group_id: GroupId },
    MemberRemoved { group_id: GroupId },
    MemberMoved { from_group: GroupId, to_group: GroupId },
    FieldSet { id: FieldId },
    FieldUpdated { id: FieldId },
    FieldRemoved { id: FieldId },
    DiskSet { id: DiskId },
    DiskAdded { id: DiskId },
    DiskUpdated { id: DiskId },
    DiskRemoved { id: DiskId },
    NebulaSet { id: NebulaId },
    NebulaUpdated { id: NebulaId },
    NebulaRemoved { id: NebulaId },
    RingUpdated { body_id: BodyId },
    RingRemoved { body_id: BodyId },
    SnapshotReplaced { time: f64 },

    // Rejections
    EntityNotFound { entity: EntityKind, id: String },
    CycleRejected { id: String, parent_id: String },
    InvalidPayload { reason: String },
    UnrecognizedCommand { kind: String },
    SnapshotRejected { violation: String },
}

impl Event {
    /// Whether this event reports a domain-level rejection rather than an
    /// applied change.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Event::EntityNotFound { .. }
                | Event::CycleRejected { .. }
                | Event::InvalidPayload { .. }
                | Event::UnrecognizedCommand { .. }
                | Event::SnapshotRejected { .. }
        )
    }

    pub fn entity_not_found(entity: EntityKind, id: impl fmt::Display) -> Self {
        Event::EntityNotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn invalid_payload(reason: impl Into<String>) -> Self {
        Event::InvalidPayload {
            reason: reason.into(),
        }
    }

    pub fn cycle_rejected(id: impl fmt::Display, parent_id: impl fmt::Display) -> Self {
        Event::CycleRejected {
            id: id.to_string(),
            parent_id: parent_id.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejections_are_flagged() {
        assert!(Event::invalid_payload("bad").is_rejection());
        assert!(Event::entity_not_found(EntityKind::Body, "x").is_rejection());
        assert!(!Event::TimeAdvanced { time: 1.0 }.is_rejection());
    }

    #[test]
    fn events_serialize_with_a_type_tag() {
        let event = Event::BodyAdded {
            id: BodyId::from("earth"),
        };
        let json = serde_json::to_value(&event).expect("serialize");
        assert_eq!(json["type"], "bodyAdded");
        assert_eq!(json["id"], "earth");
    }
}
