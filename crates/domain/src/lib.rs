//! Domain model and pure command reducer for universe documents.
//!
//! This crate has no I/O and no async: it defines the universe document,
//! the command vocabulary, the events a command produces, and a total
//! `apply` function. Persistence and transports live in the engine crate
//! and talk to this one through plain values.

pub mod commands;
pub mod entities;
pub mod error;
pub mod events;
pub mod ids;
pub mod reducer;

pub use commands::{
    parse_envelope, BodyPatch, Command, CommandSpec, DiskPatch, FieldPatch, GroupPatch,
    NebulaPatch, CATALOG,
};
pub use entities::{
    Belt, Body, BodyExtras, BodyKind, CometTail, CompactVisuals, Disk, Group, GroupChild,
    LagrangeAnchor, Nebula, OrbitalElements, Placement, RingSystem, SmallBodyField, StellarTraits,
    Universe,
};
pub use error::EnvelopeError;
pub use events::{EntityKind, Event};
pub use ids::{BeltId, BodyId, DiskId, FieldId, GroupId, NebulaId, UniverseId};
pub use reducer::{apply, validate_snapshot};
