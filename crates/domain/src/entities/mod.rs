//! Entity types making up a universe document.

mod body;
mod flat;
mod group;
mod universe;

pub use body::{
    Body, BodyExtras, BodyKind, CometTail, CompactVisuals, LagrangeAnchor, OrbitalElements,
    RingSystem, StellarTraits,
};
pub use flat::{Belt, Disk, Nebula, SmallBodyField};
pub use group::{Group, GroupChild, Placement};
pub use universe::Universe;
