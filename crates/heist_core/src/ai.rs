//! Finite-state AI for world NPCs.
//!
//! Every archetype is built from the same four states and two shared
//! behaviours: patrol (ping-pong between waypoints with a wait at each end)
//! and chase (pure seek toward the player). The archetype decides which
//! transitions are reachable.
//!
//! The brain only rewrites the body's movement intent, facing, and speed.
//! Integration and collision happen afterwards in [`Entity::update`].

use serde::{Deserialize, Serialize};

use crate::config::SimConfig;
use crate::entity::Entity;
use crate::math::{Direction, Vec2};
use crate::perception::{in_sight, ViewCone};
use crate::tilemap::TileMap;

/// Behaviour family of an NPC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AiArchetype {
    /// Patrols; chases on sight; gives up and returns when it loses the
    /// player.
    Guard,
    /// Stands still until the player is near or it is alerted, then chases.
    Sentry,
    /// Patrols forever.
    Trap,
    /// Party member driven by flocking instead of the AI pass.
    Follower,
    /// Stationary; sweeps its gaze clockwise and raises the alarm.
    Searchlight,
    /// Stationary encounter.
    Boss,
    /// Patrols to a new cardinal waypoint around its home on every trip.
    Wanderer,
}

impl AiArchetype {
    /// Whether encountering this NPC starts a battle.
    #[must_use]
    pub const fn engages_combat(self) -> bool {
        !matches!(self, Self::Searchlight | Self::Follower)
    }
}

/// Current state of an NPC's state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum AiState {
    /// Waiting in place.
    #[default]
    Idle,
    /// Walking to the patrol target.
    Patrolling,
    /// Seeking the player.
    Chasing,
    /// Walking back to the post.
    Returning,
}

/// Thresholds and speeds an NPC carries with it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AiTuning {
    /// Guard and searchlight sight.
    pub view: ViewCone,
    /// Whether walls block sight.
    pub require_line_of_sight: bool,
    /// Sentry wake distance.
    pub wake_radius: f32,
    /// Speed set on first sighting.
    pub chase_speed: f32,
    /// Speed set when re-sighting on the way back.
    pub rechase_speed: f32,
    /// Speed while returning.
    pub return_speed: f32,
    /// Speed restored at the post.
    pub patrol_speed: f32,
    /// Seconds out of sight before giving up a chase.
    pub lost_sight_timeout: f32,
    /// Seconds waited at each waypoint; also the searchlight sweep period.
    pub patrol_wait: f32,
    /// Waypoint arrival distance.
    pub arrival_radius: f32,
    /// Wanderer waypoint offset.
    pub wander_radius: f32,
}

impl AiTuning {
    /// Take the AI-related values from a config.
    #[must_use]
    pub fn from_config(config: &SimConfig) -> Self {
        Self {
            view: config.guard_cone(),
            require_line_of_sight: config.require_line_of_sight,
            wake_radius: config.sentry_wake_radius,
            chase_speed: config.chase_speed,
            rechase_speed: config.rechase_speed,
            return_speed: config.return_speed,
            patrol_speed: config.patrol_speed,
            lost_sight_timeout: config.lost_sight_timeout,
            patrol_wait: config.patrol_wait,
            arrival_radius: config.arrival_radius,
            wander_radius: config.wander_radius,
        }
    }
}

impl Default for AiTuning {
    fn default() -> Self {
        Self::from_config(&SimConfig::default())
    }
}

/// Per-NPC state machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiBrain {
    /// Behaviour family.
    pub archetype: AiArchetype,
    /// Current state.
    pub state: AiState,
    /// Waypoint the NPC last left (and returns to after a chase).
    pub start: Vec2,
    /// Waypoint the NPC is heading for.
    pub patrol_target: Vec2,
    /// Spawn position. Wanderer waypoints are offsets from here.
    pub home: Vec2,
    /// Time spent waiting, or time out of sight while chasing.
    pub wait_timer: f32,
    /// Searchlight time since the last turn.
    pub sweep_timer: f32,
    /// Next wanderer offset in [`Direction::CLOCKWISE`].
    pub wander_step: usize,
    /// Set externally to wake a sentry.
    pub alerted: bool,
    /// Whether the player was seen during the latest tick.
    pub spotted: bool,
    /// Thresholds and speeds.
    pub tuning: AiTuning,
}

impl AiBrain {
    /// Create a brain that starts idle at `start`.
    ///
    /// Wanderers ignore `patrol_target` and pick their first waypoint from
    /// their wander radius.
    #[must_use]
    pub fn new(archetype: AiArchetype, start: Vec2, patrol_target: Vec2, tuning: AiTuning) -> Self {
        let mut brain = Self {
            archetype,
            state: AiState::Idle,
            start,
            patrol_target,
            home: start,
            wait_timer: 0.0,
            sweep_timer: 0.0,
            wander_step: 0,
            alerted: false,
            spotted: false,
            tuning,
        };
        if archetype == AiArchetype::Wanderer {
            brain.patrol_target = brain.next_wander_waypoint();
        }
        brain
    }

    fn next_wander_waypoint(&mut self) -> Vec2 {
        let dir = Direction::CLOCKWISE[self.wander_step % Direction::CLOCKWISE.len()];
        self.wander_step = (self.wander_step + 1) % Direction::CLOCKWISE.len();
        self.home + dir.unit_vector() * self.tuning.wander_radius
    }

    fn transition(&mut self, to: AiState) {
        if self.state != to {
            tracing::debug!(
                archetype = ?self.archetype,
                from = ?self.state,
                to = ?to,
                "AI state change"
            );
            self.state = to;
        }
    }

    fn sees_player(&self, body: &Entity, player: Option<&Entity>, map: Option<&TileMap>) -> bool {
        let map = if self.tuning.require_line_of_sight {
            map
        } else {
            None
        };
        player.is_some_and(|p| in_sight(body, p, &self.tuning.view, map))
    }

    /// Run one tick of the state machine against `body`.
    pub fn advance(&mut self, body: &mut Entity, player: Option<&Entity>, map: Option<&TileMap>, dt: f32) {
        self.spotted = false;

        match self.archetype {
            AiArchetype::Guard => self.guard(body, player, map, dt),
            AiArchetype::Sentry => self.sentry(body, player),
            AiArchetype::Trap | AiArchetype::Wanderer => self.patrol(body, dt),
            AiArchetype::Searchlight => self.searchlight(body, player, map, dt),
            AiArchetype::Boss => {
                body.reset_movement();
                body.speed = 0.0;
            }
            AiArchetype::Follower => {}
        }
    }

    /// Wait at a waypoint, then walk to the target; on arrival swap the
    /// waypoints, turn around, and wait again.
    fn patrol(&mut self, body: &mut Entity, dt: f32) {
        match self.state {
            AiState::Idle => {
                self.wait_timer += dt;
                if self.wait_timer > self.tuning.patrol_wait {
                    self.transition(AiState::Patrolling);
                    self.wait_timer = 0.0;
                }
                body.reset_movement();
            }
            AiState::Patrolling => {
                body.move_towards(self.patrol_target);
                if body.position.distance(self.patrol_target) < self.tuning.arrival_radius {
                    std::mem::swap(&mut self.start, &mut self.patrol_target);
                    if self.archetype == AiArchetype::Wanderer && self.start == self.home {
                        self.patrol_target = self.next_wander_waypoint();
                    }
                    self.transition(AiState::Idle);
                    body.reset_movement();
                    body.facing = body.facing.opposite();
                }
            }
            AiState::Chasing | AiState::Returning => {}
        }
    }

    /// Seek the player and face along the dominant axis of the offset.
    fn chase(body: &mut Entity, player: Option<&Entity>) {
        let Some(player) = player else {
            return;
        };
        body.move_towards(player.position);
        body.facing = Direction::from_dominant_axis(player.position - body.position);
    }

    fn guard(&mut self, body: &mut Entity, player: Option<&Entity>, map: Option<&TileMap>, dt: f32) {
        let sees = self.sees_player(body, player, map);
        self.spotted = sees;

        match self.state {
            AiState::Idle | AiState::Patrolling => {
                if sees {
                    self.transition(AiState::Chasing);
                    body.speed = self.tuning.chase_speed;
                }
                self.patrol(body, dt);
            }
            AiState::Chasing => {
                if sees {
                    self.wait_timer = 0.0;
                } else {
                    self.wait_timer += dt;
                    if self.wait_timer > self.tuning.lost_sight_timeout {
                        self.transition(AiState::Returning);
                        self.wait_timer = 0.0;
                        body.speed = self.tuning.return_speed;
                    }
                }
                Self::chase(body, player);
            }
            AiState::Returning => {
                body.move_towards(self.start);
                if body.position.distance(self.start) < self.tuning.arrival_radius {
                    self.transition(AiState::Idle);
                    body.speed = self.tuning.patrol_speed;
                }
                if sees {
                    self.transition(AiState::Chasing);
                    body.speed = self.tuning.rechase_speed;
                }
            }
        }
    }

    fn sentry(&mut self, body: &mut Entity, player: Option<&Entity>) {
        let near = player
            .is_some_and(|p| p.is_active() && body.position.distance(p.position) < self.tuning.wake_radius);
        if near || self.alerted {
            self.transition(AiState::Chasing);
        }
        if self.state == AiState::Chasing {
            Self::chase(body, player);
        }
    }

    fn searchlight(&mut self, body: &mut Entity, player: Option<&Entity>, map: Option<&TileMap>, dt: f32) {
        body.reset_movement();
        self.sweep_timer += dt;
        if self.sweep_timer > self.tuning.patrol_wait {
            self.sweep_timer = 0.0;
            body.facing = body.facing.clockwise();
        }
        self.spotted = self.sees_player(body, player, map);
    }
}
