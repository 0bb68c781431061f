//! The closed set of mutation commands.
//!
//! Commands arrive as JSON envelopes with a `type` discriminant and are
//! parsed into this tagged union. The union is exhaustive on the wire
//! vocabulary; anything else becomes [`Command::Unrecognized`] or
//! [`Command::Malformed`] so the reducer can report it as an event
//! instead of the transport crashing.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entities::{
    Body, BodyExtras, BodyKind, Disk, Group, GroupChild, Nebula, OrbitalElements, Placement,
    RingSystem, SmallBodyField, Universe,
};
use crate::error::EnvelopeError;
use crate::{BodyId, DiskId, FieldId, GroupId, NebulaId};

/// Partial update for a body. Absent fields are left untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct BodyPatch {
    pub name: Option<String>,
    pub kind: Option<BodyKind>,
    pub orbit: Option<OrbitalElements>,
    pub extras: Option<BodyExtras>,
}

/// Partial update for a group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct GroupPatch {
    pub name: Option<String>,
    pub placement: Option<Placement>,
}

/// Partial update for a small-body field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct FieldPatch {
    pub host: Option<BodyId>,
    pub radius: Option<f64>,
    pub width: Option<f64>,
    pub thickness: Option<f64>,
    pub count: Option<u32>,
    pub seed: Option<u64>,
}

/// Partial update for a disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct DiskPatch {
    pub host: Option<BodyId>,
    pub inner_radius: Option<f64>,
    pub outer_radius: Option<f64>,
    pub density: Option<f64>,
}

/// Partial update for a nebula.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct NebulaPatch {
    pub center: Option<[f64; 3]>,
    pub radius: Option<f64>,
    pub palette: Option<Vec<String>>,
}

/// A tagged request to mutate a universe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Command {
    // Clock
    Tick { delta: f64 },

    // Bodies
    AddBody { body: Body },
    UpdateBody {
        id: BodyId,
        #[serde(default)]
        patch: BodyPatch,
    },
    RemoveBody { id: BodyId },

    // Body tree surgery
    ReparentBody {
        id: BodyId,
        parent_id: BodyId,
        #[serde(default)]
        index: Option<usize>,
    },
    DetachBody { id: BodyId },

    // Groups
    AddGroup { group: Group },
    UpdateGroup {
        id: GroupId,
        #[serde(default)]
        patch: GroupPatch,
    },
    RemoveGroup { id: GroupId },

    // Group membership
    AddGroupMember {
        group_id: GroupId,
        member: GroupChild,
        #[serde(default)]
        index: Option<usize>,
    },
    RemoveGroupMember {
        group_id: GroupId,
        member: GroupChild,
    },
    MoveGroupMember {
        from_group: GroupId,
        to_group: GroupId,
        member: GroupChild,
        #[serde(default)]
        index: Option<usize>,
    },

    // Small-body fields
    SetField { field: SmallBodyField },
    UpdateField {
        id: FieldId,
        #[serde(default)]
        patch: FieldPatch,
    },
    RemoveField { id: FieldId },

    // Proto-planetary disks
    SetDisk { disk: Disk },
    AddDisk { disk: Disk },
    UpdateDisk {
        id: DiskId,
        #[serde(default)]
        patch: DiskPatch,
    },
    RemoveDisk { id: DiskId },

    // Nebulae
    SetNebula { nebula: Nebula },
    UpdateNebula {
        id: NebulaId,
        #[serde(default)]
        patch: NebulaPatch,
    },
    RemoveNebula { id: NebulaId },

    // Rings
    UpdateRing { body_id: BodyId, rings: RingSystem },
    RemoveRing { body_id: BodyId },

    // Snapshot
    ReplaceSnapshot { universe: Universe },

    /// Envelope carried a `type` outside the wire vocabulary. Produced
    /// only by [`parse_envelope`], never deserialized directly.
    #[serde(skip)]
    Unrecognized { kind: String },

    /// Envelope named a known `type` but the payload failed to parse.
    /// Produced only by [`parse_envelope`].
    #[serde(skip)]
    Malformed { kind: String, reason: String },
}

/// Wire description of one command kind, served by the `list_commands`
/// tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandSpec {
    pub kind: &'static str,
    pub category: &'static str,
    pub summary: &'static str,
}

/// Every command kind understood on the wire.
pub const CATALOG: &[CommandSpec] = &[
    CommandSpec { kind: "tick", category: "clock", summary: "Advance the simulation clock by a delta." },
    CommandSpec { kind: "addBody", category: "body", summary: "Create a body, optionally under a parent." },
    CommandSpec { kind: "updateBody", category: "body", summary: "Patch a body's name, kind, orbit, or extras." },
    CommandSpec { kind: "removeBody", category: "body", summary: "Delete a body and, recursively, its whole subtree." },
    CommandSpec { kind: "reparentBody", category: "bodyTree", summary: "Move a body under a new parent; cycles are rejected." },
    CommandSpec { kind: "detachBody", category: "bodyTree", summary: "Detach a body from its parent, making it a root." },
    CommandSpec { kind: "addGroup", category: "group", summary: "Create an organizational group, optionally nested." },
    CommandSpec { kind: "updateGroup", category: "group", summary: "Patch a group's name or placement." },
    CommandSpec { kind: "removeGroup", category: "group", summary: "Delete a group and its nested subgroups; member bodies survive." },
    CommandSpec { kind: "addGroupMember", category: "membership", summary: "Add a body root or root group into a group's child list." },
    CommandSpec { kind: "removeGroupMember", category: "membership", summary: "Remove a member from a group's child list." },
    CommandSpec { kind: "moveGroupMember", category: "membership", summary: "Move a member between groups; group cycles are rejected." },
    CommandSpec { kind: "setField", category: "field", summary: "Insert or replace a small-body field keyed by id." },
    CommandSpec { kind: "updateField", category: "field", summary: "Patch a small-body field." },
    CommandSpec { kind: "removeField", category: "field", summary: "Delete a small-body field." },
    CommandSpec { kind: "setDisk", category: "disk", summary: "Insert or replace a proto-planetary disk keyed by id." },
    CommandSpec { kind: "addDisk", category: "disk", summary: "Create a proto-planetary disk; duplicate ids are rejected." },
    CommandSpec { kind: "updateDisk", category: "disk", summary: "Patch a proto-planetary disk." },
    CommandSpec { kind: "removeDisk", category: "disk", summary: "Delete a proto-planetary disk." },
    CommandSpec { kind: "setNebula", category: "nebula", summary: "Insert or replace a nebula keyed by id." },
    CommandSpec { kind: "updateNebula", category: "nebula", summary: "Patch a nebula." },
    CommandSpec { kind: "removeNebula", category: "nebula", summary: "Delete a nebula." },
    CommandSpec { kind: "updateRing", category: "ring", summary: "Set or replace a body's ring geometry." },
    CommandSpec { kind: "removeRing", category: "ring", summary: "Clear a body's ring geometry." },
    CommandSpec { kind: "replaceSnapshot", category: "snapshot", summary: "Replace the entire document after re-validating invariants." },
];

fn is_wire_kind(kind: &str) -> bool {
    CATALOG.iter().any(|spec| spec.kind == kind)
}

/// Parse a raw command envelope.
///
/// A missing or empty `type` is a hard [`EnvelopeError`]; everything else
/// yields a `Command` the reducer can apply totally, including the
/// reportable `Unrecognized` and `Malformed` shapes.
pub fn parse_envelope(envelope: &Value) -> Result<Command, EnvelopeError> {
    if !envelope.is_object() {
        return Err(EnvelopeError::NotAnObject);
    }
    let kind = envelope
        .get("type")
        .and_then(Value::as_str)
        .map(str::trim)
        .unwrap_or("");
    if kind.is_empty() {
        return Err(EnvelopeError::MissingType);
    }

    match serde_json::from_value::<Command>(envelope.clone()) {
        Ok(command) => Ok(command),
        Err(err) if is_wire_kind(kind) => Ok(Command::Malformed {
            kind: kind.to_string(),
            reason: err.to_string(),
        }),
        Err(_) => Ok(Command::Unrecognized {
            kind: kind.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_a_tick_envelope() {
        let command = parse_envelope(&json!({"type": "tick", "delta": 0.5})).expect("parse");
        assert_eq!(command, Command::Tick { delta: 0.5 });
    }

    #[test]
    fn missing_type_is_a_hard_error() {
        assert_eq!(
            parse_envelope(&json!({"delta": 0.5})),
            Err(EnvelopeError::MissingType)
        );
        assert_eq!(
            parse_envelope(&json!({"type": "  ", "delta": 0.5})),
            Err(EnvelopeError::MissingType)
        );
        assert_eq!(parse_envelope(&json!([1, 2])), Err(EnvelopeError::NotAnObject));
    }

    #[test]
    fn unknown_type_becomes_unrecognized() {
        let command = parse_envelope(&json!({"type": "explodeGalaxy"})).expect("parse");
        assert_eq!(
            command,
            Command::Unrecognized {
                kind: "explodeGalaxy".to_string()
            }
        );
    }

    #[test]
    fn known_type_with_broken_payload_becomes_malformed() {
        let command =
            parse_envelope(&json!({"type": "tick", "delta": "not a number"})).expect("parse");
        match command {
            Command::Malformed { kind, .. } => assert_eq!(kind, "tick"),
            other => panic!("expected Malformed, got {other:?}"),
        }
    }

    #[test]
    fn update_patch_defaults_to_empty() {
        let command = parse_envelope(&json!({"type": "updateBody", "id": "earth"})).expect("parse");
        assert_eq!(
            command,
            Command::UpdateBody {
                id: BodyId::from("earth"),
                patch: BodyPatch::default()
            }
        );
    }

    #[test]
    fn catalog_covers_every_wire_variant() {
        // One spec per wire kind, no duplicates.
        let mut kinds: Vec<_> = CATALOG.iter().map(|s| s.kind).collect();
        kinds.sort_unstable();
        kinds.dedup();
        assert_eq!(kinds.len(), CATALOG.len());
        assert_eq!(CATALOG.len(), 25);
    }
}
