//! Pure state-transition engine over a universe document.
//!
//! `apply` is total: every command variant produces a next state and a
//! list of events without panicking or returning `Err`. Domain-level
//! problems (missing entities, cycles, bad payloads) come back as
//! rejection events next to the *unchanged* state; callers must not
//! expect exceptions for them.

mod hierarchy;
mod snapshot;

pub use hierarchy::{collect_body_subtree, collect_group_subtree, creates_cycle};
pub use snapshot::validate as validate_snapshot;

use crate::commands::{
    BodyPatch, Command, DiskPatch, FieldPatch, GroupPatch, NebulaPatch,
};
use crate::entities::{
    Body, Disk, Group, GroupChild, Nebula, RingSystem, SmallBodyField, Universe,
};
use crate::events::{EntityKind, Event};
use crate::{BodyId, DiskId, FieldId, GroupId, NebulaId};

/// Apply one command to a universe document.
pub fn apply(state: Universe, command: &Command) -> (Universe, Vec<Event>) {
    match command {
        Command::Tick { delta } => tick(state, *delta),

        Command::AddBody { body } => add_body(state, body),
        Command::UpdateBody { id, patch } => update_body(state, id, patch),
        Command::RemoveBody { id } => remove_body(state, id),

        Command::ReparentBody { id, parent_id, index } => {
            reparent_body(state, id, parent_id, *index)
        }
        Command::DetachBody { id } => detach_body(state, id),

        Command::AddGroup { group } => add_group(state, group),
        Command::UpdateGroup { id, patch } => update_group(state, id, patch),
        Command::RemoveGroup { id } => remove_group(state, id),

        Command::AddGroupMember { group_id, member, index } => {
            add_group_member(state, group_id, member, *index)
        }
        Command::RemoveGroupMember { group_id, member } => {
            remove_group_member(state, group_id, member)
        }
        Command::MoveGroupMember { from_group, to_group, member, index } => {
            move_group_member(state, from_group, to_group, member, *index)
        }

        Command::SetField { field } => set_field(state, field),
        Command::UpdateField { id, patch } => update_field(state, id, patch),
        Command::RemoveField { id } => remove_field(state, id),

        Command::SetDisk { disk } => set_disk(state, disk),
        Command::AddDisk { disk } => add_disk(state, disk),
        Command::UpdateDisk { id, patch } => update_disk(state, id, patch),
        Command::RemoveDisk { id } => remove_disk(state, id),

        Command::SetNebula { nebula } => set_nebula(state, nebula),
        Command::UpdateNebula { id, patch } => update_nebula(state, id, patch),
        Command::RemoveNebula { id } => remove_nebula(state, id),

        Command::UpdateRing { body_id, rings } => update_ring(state, body_id, rings),
        Command::RemoveRing { body_id } => remove_ring(state, body_id),

        Command::ReplaceSnapshot { universe } => replace_snapshot(state, universe),

        Command::Unrecognized { kind } => reject(
            state,
            Event::UnrecognizedCommand { kind: kind.clone() },
        ),
        Command::Malformed { kind, reason } => reject(
            state,
            Event::invalid_payload(format!("{kind}: {reason}")),
        ),
    }
}

fn reject(state: Universe, event: Event) -> (Universe, Vec<Event>) {
    (state, vec![event])
}

fn ok(state: Universe, event: Event) -> (Universe, Vec<Event>) {
    (state, vec![event])
}

// =============================================================================
// Clock
// =============================================================================

fn tick(mut state: Universe, delta: f64) -> (Universe, Vec<Event>) {
    if !delta.is_finite() {
        return reject(state, Event::invalid_payload("tick delta must be finite"));
    }
    state.time += delta;
    let time = state.time;
    ok(state, Event::TimeAdvanced { time })
}

// =============================================================================
// Bodies
// =============================================================================

fn add_body(mut state: Universe, body: &Body) -> (Universe, Vec<Event>) {
    if state.bodies.contains_key(&body.id) {
        return reject(
            state,
            Event::invalid_payload(format!("body {} already exists", body.id)),
        );
    }
    if let Some(extras) = &body.extras {
        if !extras.matches_kind(body.kind) {
            return reject(
                state,
                Event::invalid_payload(format!(
                    "extras payload does not match body kind {:?}",
                    body.kind
                )),
            );
        }
    }
    if let Some(rings) = &body.rings {
        if !rings.is_valid() {
            return reject(state, Event::invalid_payload("invalid ring geometry"));
        }
    }
    if let Some(parent_id) = &body.parent_id {
        if parent_id == &body.id {
            return reject(state, Event::cycle_rejected(&body.id, parent_id));
        }
        if !state.bodies.contains_key(parent_id) {
            return reject(state, Event::entity_not_found(EntityKind::Body, parent_id));
        }
    }

    // Children are reducer-maintained; whatever the client sent is
    // ignored.
    let mut inserted = body.clone();
    inserted.children = Vec::new();

    match &inserted.parent_id {
        Some(parent_id) => {
            if let Some(parent) = state.bodies.get_mut(parent_id) {
                parent.children.push(inserted.id.clone());
            }
        }
        None => state.root_bodies.push(inserted.id.clone()),
    }
    let id = inserted.id.clone();
    state.bodies.insert(inserted.id.clone(), inserted);
    ok(state, Event::BodyAdded { id })
}

fn update_body(mut state: Universe, id: &BodyId, patch: &BodyPatch) -> (Universe, Vec<Event>) {
    let Some(existing) = state.bodies.get(id) else {
        return reject(state, Event::entity_not_found(EntityKind::Body, id));
    };

    // The post-patch combination must still agree, whichever side the
    // patch touches.
    let next_kind = patch.kind.unwrap_or(existing.kind);
    let next_extras = patch.extras.as_ref().or(existing.extras.as_ref());
    if let Some(extras) = next_extras {
        if !extras.matches_kind(next_kind) {
            return reject(
                state,
                Event::invalid_payload(format!(
                    "extras payload does not match body kind {next_kind:?}"
                )),
            );
        }
    }

    if let Some(body) = state.bodies.get_mut(id) {
        if let Some(name) = &patch.name {
            body.name = name.clone();
        }
        if let Some(kind) = patch.kind {
            body.kind = kind;
        }
        if let Some(orbit) = &patch.orbit {
            body.orbit = orbit.clone();
        }
        if let Some(extras) = &patch.extras {
            body.extras = Some(extras.clone());
        }
    }
    ok(state, Event::BodyUpdated { id: id.clone() })
}

/// Cascade policy: removing a body removes its entire subtree. Every
/// removed id is pruned from the root list and from group child lists.
fn remove_body(mut state: Universe, id: &BodyId) -> (Universe, Vec<Event>) {
    if !state.bodies.contains_key(id) {
        return reject(state, Event::entity_not_found(EntityKind::Body, id));
    }

    let removed = hierarchy::collect_body_subtree(&state, id);

    if let Some(parent_id) = state.body_parent(id) {
        if let Some(parent) = state.bodies.get_mut(&parent_id) {
            parent.children.retain(|c| c != id);
        }
    }
    for victim in &removed {
        state.bodies.remove(victim);
    }
    state.root_bodies.retain(|r| !removed.contains(r));
    for group in state.groups.values_mut() {
        group
            .children
            .retain(|child| child.body_id().map_or(true, |b| !removed.contains(b)));
    }

    ok(state, Event::BodyRemoved { removed })
}

fn reparent_body(
    mut state: Universe,
    id: &BodyId,
    parent_id: &BodyId,
    index: Option<usize>,
) -> (Universe, Vec<Event>) {
    if !state.bodies.contains_key(id) {
        return reject(state, Event::entity_not_found(EntityKind::Body, id));
    }
    if !state.bodies.contains_key(parent_id) {
        return reject(state, Event::entity_not_found(EntityKind::Body, parent_id));
    }
    let bound = state.bodies.len();
    if hierarchy::creates_cycle(id, parent_id, |b| state.body_parent(b), bound) {
        return reject(state, Event::cycle_rejected(id, parent_id));
    }

    // Unhook from the old position.
    match state.body_parent(id) {
        Some(old_parent) => {
            if let Some(parent) = state.bodies.get_mut(&old_parent) {
                parent.children.retain(|c| c != id);
            }
        }
        None => state.root_bodies.retain(|r| r != id),
    }

    if let Some(body) = state.bodies.get_mut(id) {
        body.parent_id = Some(parent_id.clone());
    }
    if let Some(parent) = state.bodies.get_mut(parent_id) {
        let at = index.unwrap_or(parent.children.len()).min(parent.children.len());
        parent.children.insert(at, id.clone());
    }

    ok(
        state,
        Event::BodyReparented {
            id: id.clone(),
            parent_id: parent_id.clone(),
        },
    )
}

fn detach_body(mut state: Universe, id: &BodyId) -> (Universe, Vec<Event>) {
    let Some(body) = state.bodies.get(id) else {
        return reject(state, Event::entity_not_found(EntityKind::Body, id));
    };

    // Detaching a root is a no-op success, not a rejection.
    if let Some(old_parent) = body.parent_id.clone() {
        if let Some(parent) = state.bodies.get_mut(&old_parent) {
            parent.children.retain(|c| c != id);
        }
        if let Some(body) = state.bodies.get_mut(id) {
            body.parent_id = None;
        }
        state.root_bodies.push(id.clone());
    }

    ok(state, Event::BodyDetached { id: id.clone() })
}

// =============================================================================
// Groups
// =============================================================================

fn add_group(mut state: Universe, group: &Group) -> (Universe, Vec<Event>) {
    if state.groups.contains_key(&group.id) {
        return reject(
            state,
            Event::invalid_payload(format!("group {} already exists", group.id)),
        );
    }
    if let Some(parent_id) = &group.parent_id {
        if parent_id == &group.id {
            return reject(state, Event::cycle_rejected(&group.id, parent_id));
        }
        if !state.groups.contains_key(parent_id) {
            return reject(state, Event::entity_not_found(EntityKind::Group, parent_id));
        }
    }

    let mut inserted = group.clone();
    inserted.children = Vec::new();

    match &inserted.parent_id {
        Some(parent_id) => {
            if let Some(parent) = state.groups.get_mut(parent_id) {
                parent.children.push(GroupChild::Group {
                    id: inserted.id.clone(),
                });
            }
        }
        None => state.root_groups.push(inserted.id.clone()),
    }
    let id = inserted.id.clone();
    state.groups.insert(inserted.id.clone(), inserted);
    ok(state, Event::GroupAdded { id })
}

fn update_group(mut state: Universe, id: &GroupId, patch: &GroupPatch) -> (Universe, Vec<Event>) {
    let Some(group) = state.groups.get_mut(id) else {
        return reject(state, Event::entity_not_found(EntityKind::Group, id));
    };
    if let Some(name) = &patch.name {
        group.name = name.clone();
    }
    if let Some(placement) = &patch.placement {
        group.placement = placement.clone();
    }
    ok(state, Event::GroupUpdated { id: id.clone() })
}

/// Groups are organizational only: removing one removes its nested
/// subgroups but never the bodies its members point at.
fn remove_group(mut state: Universe, id: &GroupId) -> (Universe, Vec<Event>) {
    if !state.groups.contains_key(id) {
        return reject(state, Event::entity_not_found(EntityKind::Group, id));
    }

    let removed = hierarchy::collect_group_subtree(&state, id);

    if let Some(parent_id) = state.group_parent(id) {
        if let Some(parent) = state.groups.get_mut(&parent_id) {
            parent
                .children
                .retain(|child| child.group_id().map_or(true, |g| g != id));
        }
    }
    for victim in &removed {
        state.groups.remove(victim);
    }
    state.root_groups.retain(|r| !removed.contains(r));

    ok(state, Event::GroupRemoved { removed })
}

fn add_group_member(
    mut state: Universe,
    group_id: &GroupId,
    member: &GroupChild,
    index: Option<usize>,
) -> (Universe, Vec<Event>) {
    if !state.groups.contains_key(group_id) {
        return reject(state, Event::entity_not_found(EntityKind::Group, group_id));
    }

    match member {
        GroupChild::BodyRoot { id } => {
            let Some(body) = state.bodies.get(id) else {
                return reject(state, Event::entity_not_found(EntityKind::Body, id));
            };
            if body.parent_id.is_some() {
                return reject(
                    state,
                    Event::invalid_payload(format!("body {id} is not a hierarchy root")),
                );
            }
        }
        GroupChild::Group { id } => {
            let Some(child_group) = state.groups.get(id) else {
                return reject(state, Event::entity_not_found(EntityKind::Group, id));
            };
            if child_group.parent_id.is_some() {
                return reject(
                    state,
                    Event::invalid_payload(format!("group {id} already has a parent")),
                );
            }
            let bound = state.groups.len();
            if hierarchy::creates_cycle(id, group_id, |g| state.group_parent(g), bound) {
                return reject(state, Event::cycle_rejected(id, group_id));
            }
        }
    }

    {
        let Some(group) = state.groups.get(group_id) else {
            return reject(state, Event::entity_not_found(EntityKind::Group, group_id));
        };
        if group.member_index(member).is_some() {
            return reject(
                state,
                Event::invalid_payload(format!("member already present in group {group_id}")),
            );
        }
    }

    if let GroupChild::Group { id } = member {
        if let Some(child_group) = state.groups.get_mut(id) {
            child_group.parent_id = Some(group_id.clone());
        }
        state.root_groups.retain(|r| r != id);
    }
    if let Some(group) = state.groups.get_mut(group_id) {
        let at = index.unwrap_or(group.children.len()).min(group.children.len());
        group.children.insert(at, member.clone());
    }

    ok(
        state,
        Event::MemberAdded {
            group_id: group_id.clone(),
        },
    )
}

fn remove_group_member(
    mut state: Universe,
    group_id: &GroupId,
    member: &GroupChild,
) -> (Universe, Vec<Event>) {
    let Some(group) = state.groups.get(group_id) else {
        return reject(state, Event::entity_not_found(EntityKind::Group, group_id));
    };
    let Some(at) = group.member_index(member) else {
        let id = match member {
            GroupChild::BodyRoot { id } => id.to_string(),
            GroupChild::Group { id } => id.to_string(),
        };
        return reject(state, Event::entity_not_found(EntityKind::Member, id));
    };

    if let Some(group) = state.groups.get_mut(group_id) {
        group.children.remove(at);
    }
    if let GroupChild::Group { id } = member {
        if let Some(child_group) = state.groups.get_mut(id) {
            child_group.parent_id = None;
        }
        state.root_groups.push(id.clone());
    }

    ok(
        state,
        Event::MemberRemoved {
            group_id: group_id.clone(),
        },
    )
}

fn move_group_member(
    mut state: Universe,
    from_group: &GroupId,
    to_group: &GroupId,
    member: &GroupChild,
    index: Option<usize>,
) -> (Universe, Vec<Event>) {
    if !state.groups.contains_key(from_group) {
        return reject(state, Event::entity_not_found(EntityKind::Group, from_group));
    }
    if !state.groups.contains_key(to_group) {
        return reject(state, Event::entity_not_found(EntityKind::Group, to_group));
    }
    let Some(at) = state
        .groups
        .get(from_group)
        .and_then(|g| g.member_index(member))
    else {
        let id = match member {
            GroupChild::BodyRoot { id } => id.to_string(),
            GroupChild::Group { id } => id.to_string(),
        };
        return reject(state, Event::entity_not_found(EntityKind::Member, id));
    };

    // Same-group moves are reorders; for cross-group moves the member
    // must not already be in the destination.
    if to_group != from_group
        && state
            .groups
            .get(to_group)
            .and_then(|g| g.member_index(member))
            .is_some()
    {
        return reject(
            state,
            Event::invalid_payload(format!("member already present in group {to_group}")),
        );
    }

    if let GroupChild::Group { id } = member {
        let bound = state.groups.len();
        if hierarchy::creates_cycle(id, to_group, |g| state.group_parent(g), bound) {
            return reject(state, Event::cycle_rejected(id, to_group));
        }
    }

    if let Some(group) = state.groups.get_mut(from_group) {
        group.children.remove(at);
    }
    if let Some(group) = state.groups.get_mut(to_group) {
        let at = index.unwrap_or(group.children.len()).min(group.children.len());
        group.children.insert(at, member.clone());
    }
    if let GroupChild::Group { id } = member {
        if let Some(child_group) = state.groups.get_mut(id) {
            child_group.parent_id = Some(to_group.clone());
        }
    }

    ok(
        state,
        Event::MemberMoved {
            from_group: from_group.clone(),
            to_group: to_group.clone(),
        },
    )
}

// =============================================================================
// Flat collections
// =============================================================================
//
// Host references are intentionally not validated: a host that no longer
// resolves is dangling and ignored by consumers (invariant 5).

fn set_field(mut state: Universe, field: &SmallBodyField) -> (Universe, Vec<Event>) {
    let id = field.id.clone();
    state.fields.insert(id.clone(), field.clone());
    ok(state, Event::FieldSet { id })
}

fn update_field(mut state: Universe, id: &FieldId, patch: &FieldPatch) -> (Universe, Vec<Event>) {
    let Some(field) = state.fields.get_mut(id) else {
        return reject(state, Event::entity_not_found(EntityKind::Field, id));
    };
    if let Some(host) = &patch.host {
        field.host = Some(host.clone());
    }
    if let Some(radius) = patch.radius {
        field.radius = radius;
    }
    if let Some(width) = patch.width {
        field.width = width;
    }
    if let Some(thickness) = patch.thickness {
        field.thickness = thickness;
    }
    if let Some(count) = patch.count {
        field.count = count;
    }
    if let Some(seed) = patch.seed {
        field.seed = seed;
    }
    ok(state, Event::FieldUpdated { id: id.clone() })
}

fn remove_field(mut state: Universe, id: &FieldId) -> (Universe, Vec<Event>) {
    if state.fields.remove(id).is_none() {
        return reject(state, Event::entity_not_found(EntityKind::Field, id));
    }
    ok(state, Event::FieldRemoved { id: id.clone() })
}

fn set_disk(mut state: Universe, disk: &Disk) -> (Universe, Vec<Event>) {
    let id = disk.id.clone();
    state.disks.insert(id.clone(), disk.clone());
    ok(state, Event::DiskSet { id })
}

fn add_disk(mut state: Universe, disk: &Disk) -> (Universe, Vec<Event>) {
    if state.disks.contains_key(&disk.id) {
        return reject(
            state,
            Event::invalid_payload(format!("disk {} already exists", disk.id)),
        );
    }
    let id = disk.id.clone();
    state.disks.insert(id.clone(), disk.clone());
    ok(state, Event::DiskAdded { id })
}

fn update_disk(mut state: Universe, id: &DiskId, patch: &DiskPatch) -> (Universe, Vec<Event>) {
    let Some(disk) = state.disks.get_mut(id) else {
        return reject(state, Event::entity_not_found(EntityKind::Disk, id));
    };
    if let Some(host) = &patch.host {
        disk.host = Some(host.clone());
    }
    if let Some(inner) = patch.inner_radius {
        disk.inner_radius = inner;
    }
    if let Some(outer) = patch.outer_radius {
        disk.outer_radius = outer;
    }
    if let Some(density) = patch.density {
        disk.density = density;
    }
    ok(state, Event::DiskUpdated { id: id.clone() })
}

fn remove_disk(mut state: Universe, id: &DiskId) -> (Universe, Vec<Event>) {
    if state.disks.remove(id).is_none() {
        return reject(state, Event::entity_not_found(EntityKind::Disk, id));
    }
    ok(state, Event::DiskRemoved { id: id.clone() })
}

fn set_nebula(mut state: Universe, nebula: &Nebula) -> (Universe, Vec<Event>) {
    let id = nebula.id.clone();
    state.nebulae.insert(id.clone(), nebula.clone());
    ok(state, Event::NebulaSet { id })
}

fn update_nebula(
    mut state: Universe,
    id: &NebulaId,
    patch: &NebulaPatch,
) -> (Universe, Vec<Event>) {
    let Some(nebula) = state.nebulae.get_mut(id) else {
        return reject(state, Event::entity_not_found(EntityKind::Nebula, id));
    };
    if let Some(center) = patch.center {
        nebula.center = center;
    }
    if let Some(radius) = patch.radius {
        nebula.radius = radius;
    }
    if let Some(palette) = &patch.palette {
        nebula.palette = palette.clone();
    }
    ok(state, Event::NebulaUpdated { id: id.clone() })
}

fn remove_nebula(mut state: Universe, id: &NebulaId) -> (Universe, Vec<Event>) {
    if state.nebulae.remove(id).is_none() {
        return reject(state, Event::entity_not_found(EntityKind::Nebula, id));
    }
    ok(state, Event::NebulaRemoved { id: id.clone() })
}

// =============================================================================
// Rings
// =============================================================================

fn update_ring(mut state: Universe, body_id: &BodyId, rings: &RingSystem) -> (Universe, Vec<Event>) {
    if !state.bodies.contains_key(body_id) {
        return reject(state, Event::entity_not_found(EntityKind::Body, body_id));
    }
    if !rings.is_valid() {
        return reject(state, Event::invalid_payload("invalid ring geometry"));
    }
    if let Some(body) = state.bodies.get_mut(body_id) {
        body.rings = Some(rings.clone());
    }
    ok(
        state,
        Event::RingUpdated {
            body_id: body_id.clone(),
        },
    )
}

fn remove_ring(mut state: Universe, body_id: &BodyId) -> (Universe, Vec<Event>) {
    let Some(body) = state.bodies.get_mut(body_id) else {
        return reject(state, Event::entity_not_found(EntityKind::Body, body_id));
    };
    // Clearing already-absent rings is a no-op success.
    body.rings = None;
    ok(
        state,
        Event::RingRemoved {
            body_id: body_id.clone(),
        },
    )
}

// =============================================================================
// Snapshot
// =============================================================================

fn replace_snapshot(state: Universe, universe: &Universe) -> (Universe, Vec<Event>) {
    match snapshot::validate(universe) {
        Ok(()) => {
            let time = universe.time;
            (universe.clone(), vec![Event::SnapshotReplaced { time }])
        }
        Err(violation) => reject(state, Event::SnapshotRejected { violation }),
    }
}
