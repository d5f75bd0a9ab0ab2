//! Follower flocking: elastic tether, personal space, and idle jitter.
//!
//! Followers are the only bodies with force-style integration. Each tick
//! the three contributions are summed into an acceleration that is added
//! straight to velocity (no `dt` scaling), clamped, and damped. Movement
//! and map collision then run X before Y as for every other body.
//!
//! Constants are per-call parameters ([`FlockParams`]), not engine
//! constants.

use crate::ai::AiArchetype;
use crate::components::EntityKind;
use crate::config::FlockParams;
use crate::entity::Entity;
use crate::math::{normalize_or_zero, Direction, Vec2};
use crate::tilemap::TileMap;

/// Weight of separation relative to the tether.
const SEPARATION_WEIGHT: f32 = 2.0;

/// Separation distance floor, avoiding the inverse-square singularity.
const MIN_REPEL_DISTANCE: f32 = 1.0;

/// Speed above which the walk animation plays.
const ANIMATE_THRESHOLD: f32 = 1.0;

/// Whether the flocking pass drives this body.
#[must_use]
pub fn is_follower(body: &Entity) -> bool {
    body.kind == EntityKind::Npc
        && body
            .ai
            .as_ref()
            .is_some_and(|brain| brain.archetype == AiArchetype::Follower)
}

/// Tether target: the leader's breadcrumb at the configured lag, or the
/// leader's position while the trail is still short.
#[must_use]
pub fn tether_target(leader: &Entity, params: &FlockParams) -> Vec2 {
    if leader.history.len() > params.history_lag {
        leader.history.get(params.history_lag).unwrap_or(leader.position)
    } else {
        leader.position
    }
}

/// Summed inverse-square push away from every neighbour inside the repel
/// radius.
#[must_use]
pub fn separation(position: Vec2, neighbours: &[Vec2], params: &FlockParams) -> Vec2 {
    neighbours
        .iter()
        .filter_map(|&other| {
            let dist = position.distance(other);
            if dist >= params.repel_radius {
                return None;
            }
            let dist = dist.max(MIN_REPEL_DISTANCE);
            let push = normalize_or_zero(position - other);
            Some(push * (params.repel_strength / (dist * dist)))
        })
        .fold(Vec2::ZERO, |acc, v| acc + v)
}

/// Deterministic pseudo-noise for an idle follower.
#[must_use]
pub fn idle_jitter(time: f32, salt: f32, strength: f32) -> Vec2 {
    let phase = time + salt;
    Vec2::new(phase.sin(), phase.cos()) * strength
}

/// Run one flocking tick for `follower`.
///
/// `neighbours` holds the positions of the other followers (not including
/// this one). Bodies that are not active NPC followers are left untouched.
pub fn update_follower(
    follower: &mut Entity,
    leader: &Entity,
    neighbours: &[Vec2],
    map: Option<&TileMap>,
    dt: f32,
    time: f32,
    params: &FlockParams,
) {
    if !follower.is_active() || !is_follower(follower) {
        return;
    }

    let pos = follower.position;

    let tether = (tether_target(leader, params) - pos) * params.tether_gain;

    let mut push = separation(pos, std::slice::from_ref(&leader.position), params);
    push += separation(pos, neighbours, params);

    let jitter = if follower.velocity.length() < params.idle_threshold {
        idle_jitter(time, follower.salt, params.jitter)
    } else {
        Vec2::ZERO
    };

    let acceleration = tether + push * SEPARATION_WEIGHT + jitter;
    follower.velocity = (follower.velocity + acceleration).clamp_length_max(params.max_speed);
    follower.velocity *= params.damping;

    follower.collisions.reset();

    follower.position.x += follower.velocity.x * dt;
    if let Some(map) = map {
        follower.resolve_map_x(map);
    }
    follower.position.y += follower.velocity.y * dt;
    if let Some(map) = map {
        follower.resolve_map_y(map);
    }

    let speed = follower.velocity.length();
    if speed > 0.0 {
        follower.history.record(follower.position);
        follower.movement = follower.velocity / speed;
        follower.facing = Direction::from_dominant_axis(follower.velocity);
    } else {
        follower.movement = Vec2::ZERO;
    }

    if speed > ANIMATE_THRESHOLD {
        follower.animate(dt);
    }
}

/// Run the flocking pass over the whole roster in order.
///
/// Each follower sees the positions its siblings hold at the moment it is
/// processed, so earlier followers have already moved this tick.
pub fn update_party(
    leader: &Entity,
    followers: &mut [Entity],
    map: Option<&TileMap>,
    dt: f32,
    time: f32,
    params: &FlockParams,
) {
    let mut neighbours = Vec::with_capacity(followers.len());
    for i in 0..followers.len() {
        neighbours.clear();
        neighbours.extend(
            followers
                .iter()
                .enumerate()
                .filter(|&(j, _)| j != i)
                .map(|(_, f)| f.position),
        );
        update_follower(&mut followers[i], leader, &neighbours, map, dt, time, params);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{AiBrain, AiTuning};

    const DT: f32 = 1.0 / 60.0;

    fn follower(pos: Vec2) -> Entity {
        Entity::new(pos, EntityKind::Npc)
            .with_collider(Vec2::splat(28.0))
            .with_ai(AiBrain::new(AiArchetype::Follower, pos, pos, AiTuning::default()))
    }

    #[test]
    fn test_tether_uses_lagged_breadcrumb() {
        let params = FlockParams::default();
        let mut leader = Entity::new(Vec2::ZERO, EntityKind::Player);
        assert_eq!(tether_target(&leader, &params), Vec2::ZERO);

        for i in 0..10 {
            leader.history.record(Vec2::new(i as f32, 0.0));
        }
        // Newest is 9, six samples back is 4.
        assert_eq!(tether_target(&leader, &params), Vec2::new(4.0, 0.0));
    }

    #[test]
    fn test_separation_floor_and_radius() {
        let params = FlockParams::default();
        let near = separation(Vec2::ZERO, &[Vec2::new(0.5, 0.0)], &params);
        assert!((near.x + 20_000.0).abs() < 1.0e-2);

        let far = separation(Vec2::ZERO, &[Vec2::new(30.0, 0.0)], &params);
        assert_eq!(far, Vec2::ZERO);

        let coincident = separation(Vec2::ZERO, &[Vec2::ZERO], &params);
        assert_eq!(coincident, Vec2::ZERO);
    }

    #[test]
    fn test_follower_moves_toward_leader() {
        let params = FlockParams::default();
        let leader = Entity::new(Vec2::new(200.0, 0.0), EntityKind::Player);
        let mut body = follower(Vec2::ZERO);
        body.velocity = Vec2::new(10.0, 0.0);
        update_follower(&mut body, &leader, &[], None, DT, 0.0, &params);

        // 0.08 * 200 = 16 added, then damped.
        assert!((body.velocity.x - 26.0 * 0.9).abs() < 1.0e-3);
        assert!(body.position.x > 0.0);
        assert_eq!(body.facing, Direction::Right);
        assert_eq!(body.history.len(), 1);
    }

    #[test]
    fn test_speed_clamped_then_damped() {
        let params = FlockParams::default();
        let leader = Entity::new(Vec2::new(0.0, 29.0), EntityKind::Player);
        let mut body = follower(Vec2::ZERO);
        body.velocity = Vec2::new(0.0, -100.0);
        update_follower(&mut body, &leader, &[], None, DT, 0.0, &params);
        assert!(body.velocity.length() <= params.max_speed * params.damping + 1.0e-3);
        assert_eq!(body.facing, Direction::Up);
    }

    #[test]
    fn test_idle_jitter_deterministic() {
        assert_eq!(idle_jitter(1.5, 0.25, 5.0), idle_jitter(1.5, 0.25, 5.0));
        assert_ne!(idle_jitter(1.5, 0.25, 5.0), idle_jitter(1.5, 0.75, 5.0));
        let j = idle_jitter(0.0, 0.0, 5.0);
        assert!((j - Vec2::new(0.0, 5.0)).length() < 1.0e-6);
    }

    #[test]
    fn test_non_follower_untouched() {
        let params = FlockParams::default();
        let leader = Entity::new(Vec2::new(100.0, 0.0), EntityKind::Player);
        let mut npc = Entity::new(Vec2::ZERO, EntityKind::Npc);
        let before = npc.clone();
        update_follower(&mut npc, &leader, &[], None, DT, 0.0, &params);
        assert_eq!(npc, before);
    }

    #[test]
    fn test_party_spreads_out() {
        let params = FlockParams::default();
        let leader = Entity::new(Vec2::new(-100.0, 0.0), EntityKind::Player);
        let mut party = vec![follower(Vec2::ZERO), follower(Vec2::new(2.0, 0.0))];
        update_party(&leader, &mut party, None, DT, 0.0, &params);
        let gap = party[0].position.distance(party[1].position);
        assert!(gap > 2.0);
    }
}
