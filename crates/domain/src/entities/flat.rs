//! Flat, independently-keyed collections: small-body fields, disks,
//! nebulae, and legacy belts.
//!
//! These reference bodies only loosely: a `host` id that no longer
//! resolves is treated as dangling and ignored by consumers, never erased
//! by the reducer.

use serde::{Deserialize, Serialize};

use crate::{BeltId, BodyId, DiskId, FieldId, NebulaId};

/// A field of small bodies (asteroid/Kuiper-style population) anchored to
/// an optional host body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmallBodyField {
    pub id: FieldId,
    #[serde(default)]
    pub host: Option<BodyId>,
    pub radius: f64,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub thickness: f64,
    #[serde(default = "default_count")]
    pub count: u32,
    #[serde(default)]
    pub seed: u64,
}

fn default_count() -> u32 {
    500
}

/// A proto-planetary disk around an optional host body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Disk {
    pub id: DiskId,
    #[serde(default)]
    pub host: Option<BodyId>,
    pub inner_radius: f64,
    pub outer_radius: f64,
    #[serde(default)]
    pub density: f64,
}

/// A free-standing nebula region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Nebula {
    pub id: NebulaId,
    #[serde(default)]
    pub center: [f64; 3],
    pub radius: f64,
    #[serde(default)]
    pub palette: Vec<String>,
}

/// Legacy belt record. Only snapshot replacement touches these; the
/// editor migrated belts to [`SmallBodyField`] but old documents still
/// carry them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Belt {
    pub id: BeltId,
    #[serde(default)]
    pub host: Option<BodyId>,
    pub radius: f64,
    #[serde(default)]
    pub width: f64,
}
