//! Kinematic bodies: movement, axis-separated collision, and breadcrumbs.
//!
//! A body's velocity is set directly from its movement intent every tick
//! (no force integration). Each axis is moved and resolved on its own, X
//! fully before Y, first against other bodies and then against the map.

use serde::{Deserialize, Serialize};

use crate::ai::AiBrain;
use crate::components::{Animation, Breadcrumbs, CollisionFlags, EntityKind, EntityStatus};
use crate::math::{normalize_or_zero, Aabb, Direction, Rect, Vec2};
use crate::tilemap::TileMap;

/// A world body.
///
/// # Invariants
///
/// - After an unobstructed update, `velocity == normalize(movement) * speed`
/// - The collider is centered on `position`
/// - `history` never holds more than [`Breadcrumbs::CAPACITY`] samples
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// World position (collider center).
    pub position: Vec2,
    /// Velocity in units per second.
    pub velocity: Vec2,
    /// Requested movement direction. Normalized during update.
    pub movement: Vec2,
    /// Unused by the kinematic path.
    pub acceleration: Vec2,
    /// Cardinal facing.
    pub facing: Direction,
    /// Visual rotation in degrees.
    pub angle: f32,
    /// Visual size.
    pub scale: Vec2,
    /// Collider size, independent of `scale`.
    pub collider: Vec2,
    /// Movement speed in units per second.
    pub speed: f32,
    /// Classification.
    pub kind: EntityKind,
    /// Active or inactive.
    pub status: EntityStatus,
    /// Contacts from the latest update.
    pub collisions: CollisionFlags,
    /// Past positions, newest first.
    pub history: Breadcrumbs,
    /// Sprite-sheet animation, if any.
    pub animation: Option<Animation>,
    /// AI controller for NPCs.
    pub ai: Option<AiBrain>,
    /// Props only: whether this is a chest.
    pub chest: bool,
    /// Per-body phase offset for follower jitter.
    pub salt: f32,
}

impl Entity {
    /// Default movement speed.
    pub const DEFAULT_SPEED: f32 = 200.0;
    /// Default collider and visual size.
    pub const DEFAULT_SIZE: Vec2 = Vec2::new(32.0, 32.0);

    /// Create an active body at rest.
    #[must_use]
    pub fn new(position: Vec2, kind: EntityKind) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
            movement: Vec2::ZERO,
            acceleration: Vec2::ZERO,
            facing: Direction::default(),
            angle: 0.0,
            scale: Self::DEFAULT_SIZE,
            collider: Self::DEFAULT_SIZE,
            speed: Self::DEFAULT_SPEED,
            kind,
            status: EntityStatus::Active,
            collisions: CollisionFlags::default(),
            history: Breadcrumbs::new(),
            animation: None,
            ai: None,
            chest: false,
            salt: 0.0,
        }
    }

    /// Builder method to set the collider size.
    #[must_use]
    pub fn with_collider(mut self, collider: Vec2) -> Self {
        self.collider = collider;
        self
    }

    /// Builder method to set the visual size.
    #[must_use]
    pub fn with_scale(mut self, scale: Vec2) -> Self {
        self.scale = scale;
        self
    }

    /// Builder method to set the speed.
    #[must_use]
    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }

    /// Builder method to set the facing.
    #[must_use]
    pub fn with_facing(mut self, facing: Direction) -> Self {
        self.facing = facing;
        self
    }

    /// Builder method to attach an animation.
    #[must_use]
    pub fn with_animation(mut self, animation: Animation) -> Self {
        self.animation = Some(animation);
        self
    }

    /// Builder method to attach an AI controller.
    #[must_use]
    pub fn with_ai(mut self, brain: AiBrain) -> Self {
        self.ai = Some(brain);
        self
    }

    /// Builder method to set the jitter salt.
    #[must_use]
    pub fn with_salt(mut self, salt: f32) -> Self {
        self.salt = salt;
        self
    }

    /// Builder method to mark a prop as a chest.
    #[must_use]
    pub fn as_chest(mut self) -> Self {
        self.chest = true;
        self
    }

    /// Whether the body takes part in the simulation.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == EntityStatus::Active
    }

    /// Re-enable the body.
    pub fn activate(&mut self) {
        self.status = EntityStatus::Active;
    }

    /// Remove the body from update and collision.
    pub fn deactivate(&mut self) {
        self.status = EntityStatus::Inactive;
    }

    /// Collider box.
    #[must_use]
    pub fn aabb(&self) -> Aabb {
        Aabb::new(self.position, self.collider)
    }

    /// Whether both bodies are active, distinct, and their colliders overlap
    /// with a strictly negative gap on both axes.
    #[must_use]
    pub fn is_colliding(&self, other: &Self) -> bool {
        if !self.is_active() || !other.is_active() || std::ptr::eq(self, other) {
            return false;
        }
        self.aabb().overlaps(&other.aabb())
    }

    /// Request movement up and face up.
    pub fn move_up(&mut self) {
        self.movement.y = -1.0;
        self.facing = Direction::Up;
    }

    /// Request movement down and face down.
    pub fn move_down(&mut self) {
        self.movement.y = 1.0;
        self.facing = Direction::Down;
    }

    /// Request movement left and face left.
    pub fn move_left(&mut self) {
        self.movement.x = -1.0;
        self.facing = Direction::Left;
    }

    /// Request movement right and face right.
    pub fn move_right(&mut self) {
        self.movement.x = 1.0;
        self.facing = Direction::Right;
    }

    /// Clear the movement request.
    pub fn reset_movement(&mut self) {
        self.movement = Vec2::ZERO;
    }

    /// Point the movement request at `target`. Zero when already there.
    pub fn move_towards(&mut self, target: Vec2) {
        self.movement = normalize_or_zero(target - self.position);
    }

    /// Atlas rectangle the renderer should draw this tick.
    #[must_use]
    pub fn source_rect(&self) -> Option<Rect> {
        self.animation
            .as_ref()
            .and_then(|anim| anim.source_rect(self.facing))
    }

    /// Advance one tick.
    ///
    /// NPCs run their AI first. Then movement is normalized, velocity set
    /// from it, and each axis moved and resolved against `others` followed
    /// by `map`. Missing collaborators skip the steps that need them.
    pub fn update(&mut self, dt: f32, player: Option<&Self>, map: Option<&TileMap>, others: &[Self]) {
        if !self.is_active() {
            return;
        }

        if self.kind == EntityKind::Npc {
            if let Some(mut brain) = self.ai.take() {
                brain.advance(self, player, map, dt);
                self.ai = Some(brain);
            }
        }

        self.collisions.reset();

        self.movement = normalize_or_zero(self.movement);
        self.velocity = self.movement * self.speed;

        self.position.x += self.velocity.x * dt;
        self.resolve_bodies_x(others);
        if let Some(map) = map {
            self.resolve_map_x(map);
        }

        self.position.y += self.velocity.y * dt;
        self.resolve_bodies_y(others);
        if let Some(map) = map {
            self.resolve_map_y(map);
        }

        if self.kind == EntityKind::Player || self.velocity.length() > 0.0 {
            self.history.record(self.position);
        }

        if self.movement != Vec2::ZERO {
            self.animate(dt);
        }
    }

    pub(crate) fn animate(&mut self, dt: f32) {
        let facing = self.facing;
        if let Some(anim) = self.animation.as_mut() {
            anim.advance(dt, facing);
        }
    }

    /// Push back out of overlapping bodies along X.
    pub(crate) fn resolve_bodies_x(&mut self, others: &[Self]) {
        for other in others {
            if !self.is_colliding(other) {
                continue;
            }
            let distance = (self.position.x - other.position.x).abs();
            let overlap = (distance - self.collider.x / 2.0 - other.collider.x / 2.0).abs();
            if self.velocity.x > 0.0 {
                self.position.x -= overlap;
                self.velocity.x = 0.0;
                self.collisions.right = true;
            } else if self.velocity.x < 0.0 {
                self.position.x += overlap;
                self.velocity.x = 0.0;
                self.collisions.left = true;
            }
        }
    }

    /// Push back out of overlapping bodies along Y.
    pub(crate) fn resolve_bodies_y(&mut self, others: &[Self]) {
        for other in others {
            if !self.is_colliding(other) {
                continue;
            }
            let distance = (self.position.y - other.position.y).abs();
            let overlap = (distance - self.collider.y / 2.0 - other.collider.y / 2.0).abs();
            if self.velocity.y > 0.0 {
                self.position.y -= overlap;
                self.velocity.y = 0.0;
                self.collisions.bottom = true;
            } else if self.velocity.y < 0.0 {
                self.position.y += overlap;
                self.velocity.y = 0.0;
                self.collisions.top = true;
            }
        }
    }

    /// Snap back out of a wall along X using a single probe at the centre
    /// of the leading edge.
    pub(crate) fn resolve_map_x(&mut self, map: &TileMap) {
        let half = self.collider.x / 2.0;

        if self.velocity.x > 0.0 {
            let probe = Vec2::new(self.position.x + half, self.position.y);
            if let Some(overlap) = map.solid_tile_at(probe) {
                self.position.x -= overlap.x;
                self.velocity.x = 0.0;
                self.collisions.right = true;
            }
        }

        if self.velocity.x < 0.0 {
            let probe = Vec2::new(self.position.x - half, self.position.y);
            if let Some(overlap) = map.solid_tile_at(probe) {
                self.position.x += overlap.x;
                self.velocity.x = 0.0;
                self.collisions.left = true;
            }
        }
    }

    /// Snap back out of a wall along Y using centre and corner probes on the
    /// leading edge. The first solid probe supplies the overlap.
    pub(crate) fn resolve_map_y(&mut self, map: &TileMap) {
        let half = self.collider / 2.0;
        let probes = |edge_y: f32| {
            [
                Vec2::new(self.position.x, edge_y),
                Vec2::new(self.position.x - half.x, edge_y),
                Vec2::new(self.position.x + half.x, edge_y),
            ]
        };
        let first_solid = |points: [Vec2; 3]| points.into_iter().find_map(|p| map.solid_tile_at(p));

        let top = probes(self.position.y - half.y);
        let bottom = probes(self.position.y + half.y);

        if self.velocity.y < 0.0 {
            if let Some(overlap) = first_solid(top) {
                self.position.y += overlap.y;
                self.velocity.y = 0.0;
                self.collisions.top = true;
            }
        }

        if self.velocity.y > 0.0 {
            if let Some(overlap) = first_solid(bottom) {
                self.position.y -= overlap.y;
                self.velocity.y = 0.0;
                self.collisions.bottom = true;
            }
        }
    }
}
