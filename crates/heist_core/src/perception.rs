//! Sight and ambush queries.
//!
//! Guards use [`in_sight`] to decide when to give chase; the exploration
//! layer uses [`check_ambush`] to decide who strikes first.

use serde::{Deserialize, Serialize};

use crate::entity::Entity;
use crate::math::{Direction, Vec2};
use crate::tilemap::TileMap;

/// Coincident positions closer than this are always visible.
const COINCIDENT: f32 = 0.001;

/// Minimum facing alignment for an attack from behind (about 60 degrees).
pub const AMBUSH_ALIGNMENT: f32 = 0.5;

/// A sight cone: range plus full opening angle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewCone {
    /// Maximum sight distance.
    pub distance: f32,
    /// Full cone angle in degrees; half of it lies on each side of the
    /// facing vector.
    pub angle_deg: f32,
}

impl Default for ViewCone {
    fn default() -> Self {
        Self::new(150.0, 90.0)
    }
}

impl ViewCone {
    /// Create a cone.
    #[must_use]
    pub const fn new(distance: f32, angle_deg: f32) -> Self {
        Self {
            distance,
            angle_deg,
        }
    }

    /// Geometric test without activity or wall checks.
    ///
    /// The angle test is strict: a target exactly on the cone edge is not
    /// seen.
    #[must_use]
    pub fn contains(&self, origin: Vec2, facing: Direction, target: Vec2) -> bool {
        let to_target = target - origin;
        let dist = to_target.length();
        if dist > self.distance {
            return false;
        }
        if dist <= COINCIDENT {
            return true;
        }

        let threshold = (self.angle_deg / 2.0).to_radians().cos();
        facing.unit_vector().dot(to_target / dist) > threshold
    }
}

/// Whether `observer` can see `target`.
///
/// Inactive bodies neither see nor are seen. When a map is supplied, walls
/// between the two also block sight.
#[must_use]
pub fn in_sight(observer: &Entity, target: &Entity, cone: &ViewCone, map: Option<&TileMap>) -> bool {
    if !observer.is_active() || !target.is_active() {
        return false;
    }
    if !cone.contains(observer.position, observer.facing, target.position) {
        return false;
    }
    map.map_or(true, |map| {
        map.has_line_of_sight(observer.position, target.position)
    })
}

/// Whether `attacker` is behind `victim`, meaning both face roughly the
/// same way.
#[must_use]
pub fn check_ambush(attacker: &Entity, victim: &Entity) -> bool {
    if !attacker.is_active() || !victim.is_active() {
        return false;
    }
    attacker.facing.unit_vector().dot(victim.facing.unit_vector()) > AMBUSH_ALIGNMENT
}
