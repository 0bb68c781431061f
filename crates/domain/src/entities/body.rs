//! Body - a node in the primary object hierarchy.

use serde::{Deserialize, Serialize};

use crate::BodyId;

/// Discriminant for the kind of celestial body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BodyKind {
    Star,
    Planet,
    Moon,
    Asteroid,
    Comet,
    RogueBody,
    CompactObject,
    LagrangePoint,
}

/// Keplerian elements describing how a body orbits its parent.
///
/// Roots keep these at their defaults; renderers ignore them for
/// parentless bodies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct OrbitalElements {
    pub semi_major_axis: f64,
    pub eccentricity: f64,
    pub inclination: f64,
    pub phase: f64,
    pub period: f64,
}

/// Ring geometry attached to a body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RingSystem {
    pub inner_radius: f64,
    pub outer_radius: f64,
    #[serde(default)]
    pub tilt: f64,
    #[serde(default = "default_opacity")]
    pub opacity: f64,
}

fn default_opacity() -> f64 {
    1.0
}

impl RingSystem {
    /// Geometric sanity check; a degenerate annulus is rejected as an
    /// invalid payload by the reducer.
    pub fn is_valid(&self) -> bool {
        self.inner_radius > 0.0
            && self.outer_radius > self.inner_radius
            && (0.0..=1.0).contains(&self.opacity)
    }
}

/// Spectral parameters for stars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StellarTraits {
    pub spectral_class: String,
    #[serde(default = "default_luminosity")]
    pub luminosity: f64,
}

fn default_luminosity() -> f64 {
    1.0
}

/// Tail behavior for comets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CometTail {
    pub length: f64,
    #[serde(default)]
    pub activity: f64,
}

/// Visual parameters for exotic compact objects (black holes,
/// neutron stars).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompactVisuals {
    #[serde(default)]
    pub accretion_disk: bool,
    #[serde(default)]
    pub jet_length: f64,
    #[serde(default)]
    pub lensing: f64,
}

/// Anchor pair for a Lagrange point marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LagrangeAnchor {
    pub primary: BodyId,
    pub secondary: BodyId,
    /// 1..=5, which libration point of the pair.
    pub point: u8,
}

/// Type-specific metadata payload whose shape is keyed off [`BodyKind`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum BodyExtras {
    Star(StellarTraits),
    Comet(CometTail),
    Compact(CompactVisuals),
    Lagrange(LagrangeAnchor),
}

impl BodyExtras {
    /// Whether this payload shape belongs to the given body kind.
    pub fn matches_kind(&self, kind: BodyKind) -> bool {
        matches!(
            (self, kind),
            (BodyExtras::Star(_), BodyKind::Star)
                | (BodyExtras::Comet(_), BodyKind::Comet)
                | (BodyExtras::Compact(_), BodyKind::CompactObject)
                | (BodyExtras::Lagrange(_), BodyKind::LagrangePoint)
        )
    }
}

/// A node in the primary object hierarchy. Lives in exactly one tree:
/// `parent_id == None` marks a root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Body {
    pub id: BodyId,
    #[serde(default)]
    pub parent_id: Option<BodyId>,
    /// Ordered child identifiers; maintained by the reducer.
    #[serde(default)]
    pub children: Vec<BodyId>,
    pub kind: BodyKind,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub orbit: OrbitalElements,
    #[serde(default)]
    pub rings: Option<RingSystem>,
    #[serde(default)]
    pub extras: Option<BodyExtras>,
}

impl Body {
    pub fn new(id: impl Into<BodyId>, kind: BodyKind, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            parent_id: None,
            children: Vec::new(),
            kind,
            name: name.into(),
            orbit: OrbitalElements::default(),
            rings: None,
            extras: None,
        }
    }

    pub fn with_parent(mut self, parent_id: impl Into<BodyId>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn with_orbit(mut self, orbit: OrbitalElements) -> Self {
        self.orbit = orbit;
        self
    }

    pub fn with_extras(mut self, extras: BodyExtras) -> Self {
        self.extras = Some(extras);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extras_match_only_their_own_kind() {
        let tail = BodyExtras::Comet(CometTail {
            length: 2.0,
            activity: 0.5,
        });
        assert!(tail.matches_kind(BodyKind::Comet));
        assert!(!tail.matches_kind(BodyKind::Planet));
    }

    #[test]
    fn ring_system_rejects_inverted_annulus() {
        let rings = RingSystem {
            inner_radius: 4.0,
            outer_radius: 2.0,
            tilt: 0.0,
            opacity: 1.0,
        };
        assert!(!rings.is_valid());
    }

    #[test]
    fn body_deserializes_with_minimal_fields() {
        let body: Body = serde_json::from_str(r#"{"id":"sol","kind":"star"}"#).expect("parse");
        assert_eq!(body.id, BodyId::from("sol"));
        assert!(body.parent_id.is_none());
        assert!(body.children.is_empty());
    }
}
