//! Tunable simulation constants.
//!
//! Every threshold the exploration and combat loops compare against lives
//! here so levels can override them from RON without touching code.

use serde::{Deserialize, Serialize};

use crate::error::DataError;
use crate::perception::ViewCone;

/// Follower flocking parameters.
///
/// Acceleration units are not physically dimensioned; the values are
/// tuned, not derived.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlockParams {
    /// Pull toward the tether target per unit of offset.
    pub tether_gain: f32,
    /// Inverse-square separation strength.
    pub repel_strength: f32,
    /// Idle jitter amplitude.
    pub jitter: f32,
    /// Multiplicative velocity decay applied every tick.
    pub damping: f32,
    /// Speed clamp applied before damping.
    pub max_speed: f32,
    /// Neighbours closer than this push the follower away.
    pub repel_radius: f32,
    /// Below this speed the follower receives idle jitter.
    pub idle_threshold: f32,
    /// Index into the leader's breadcrumbs used as the tether target.
    pub history_lag: usize,
}

impl Default for FlockParams {
    fn default() -> Self {
        Self {
            tether_gain: 0.08,
            repel_strength: 20_000.0,
            jitter: 5.0,
            damping: 0.90,
            max_speed: 250.0,
            repel_radius: 30.0,
            idle_threshold: 5.0,
            history_lag: 5,
        }
    }
}

/// Exploration and combat tuning.
///
/// # Example RON
///
/// ```ron
/// SimConfig(
///     guard_view_distance: 200.0,
///     guard_view_angle: 90.0,
///     flock: FlockParams(damping: 0.85),
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// How far a guard can see.
    pub guard_view_distance: f32,
    /// Full cone angle of a guard's sight, in degrees.
    pub guard_view_angle: f32,
    /// Whether guard sight is blocked by walls.
    pub require_line_of_sight: bool,
    /// Sentries wake when the player comes closer than this.
    pub sentry_wake_radius: f32,
    /// Speed for bodies that do not override it.
    pub base_speed: f32,
    /// Guard speed when first spotting the player.
    pub chase_speed: f32,
    /// Guard speed when re-spotting the player on the way back.
    pub rechase_speed: f32,
    /// Guard speed while walking back to its post.
    pub return_speed: f32,
    /// Guard speed once back on patrol.
    pub patrol_speed: f32,
    /// Seconds out of sight before a chasing guard gives up.
    pub lost_sight_timeout: f32,
    /// Seconds spent waiting at each waypoint.
    pub patrol_wait: f32,
    /// Distance at which a waypoint counts as reached.
    pub arrival_radius: f32,
    /// Maximum distance for a player-initiated ambush.
    pub ambush_distance: f32,
    /// Fog-of-war reveal radius around the player.
    pub reveal_radius: f32,
    /// Sentries within this radius of a searchlight that spots the player
    /// are alerted.
    pub searchlight_alert_radius: f32,
    /// Offset distance for wanderer waypoints.
    pub wander_radius: f32,
    /// Maximum distance for opening a chest.
    pub chest_reach: f32,
    /// Delay after an action resolves before the battle continues.
    pub action_wait: f32,
    /// Delay between enemy attacks.
    pub enemy_attack_delay: f32,
    /// Follower flocking.
    pub flock: FlockParams,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            guard_view_distance: 150.0,
            guard_view_angle: 90.0,
            require_line_of_sight: true,
            sentry_wake_radius: 150.0,
            base_speed: 200.0,
            chase_speed: 100.0,
            rechase_speed: 140.0,
            return_speed: 70.0,
            patrol_speed: 80.0,
            lost_sight_timeout: 2.0,
            patrol_wait: 2.0,
            arrival_radius: 5.0,
            ambush_distance: 60.0,
            reveal_radius: 200.0,
            searchlight_alert_radius: 300.0,
            wander_radius: 64.0,
            chest_reach: 40.0,
            action_wait: 0.8,
            enemy_attack_delay: 1.0,
            flock: FlockParams::default(),
        }
    }
}

impl SimConfig {
    /// Parse a config from RON. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::Parse`] on malformed input, or the first
    /// validation failure.
    pub fn from_ron_str(source: &str) -> Result<Self, DataError> {
        let config: Self = ron::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// The guard sight cone.
    #[must_use]
    pub fn guard_cone(&self) -> ViewCone {
        ViewCone::new(self.guard_view_distance, self.guard_view_angle)
    }

    /// Check that every value is in range.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::InvalidValue`] naming the first bad field.
    pub fn validate(&self) -> Result<(), DataError> {
        let non_negative = [
            ("guard_view_distance", self.guard_view_distance),
            ("sentry_wake_radius", self.sentry_wake_radius),
            ("base_speed", self.base_speed),
            ("chase_speed", self.chase_speed),
            ("rechase_speed", self.rechase_speed),
            ("return_speed", self.return_speed),
            ("patrol_speed", self.patrol_speed),
            ("lost_sight_timeout", self.lost_sight_timeout),
            ("patrol_wait", self.patrol_wait),
            ("arrival_radius", self.arrival_radius),
            ("ambush_distance", self.ambush_distance),
            ("reveal_radius", self.reveal_radius),
            ("searchlight_alert_radius", self.searchlight_alert_radius),
            ("wander_radius", self.wander_radius),
            ("chest_reach", self.chest_reach),
            ("action_wait", self.action_wait),
            ("enemy_attack_delay", self.enemy_attack_delay),
            ("flock.max_speed", self.flock.max_speed),
            ("flock.repel_radius", self.flock.repel_radius),
        ];
        for (field, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(DataError::InvalidValue {
                    field: field.to_string(),
                    message: format!("must be a non-negative number, got {value}"),
                });
            }
        }

        if !(0.0..=360.0).contains(&self.guard_view_angle) {
            return Err(DataError::InvalidValue {
                field: "guard_view_angle".to_string(),
                message: format!("must be within 0..=360 degrees, got {}", self.guard_view_angle),
            });
        }

        if !(0.0..=1.0).contains(&self.flock.damping) {
            return Err(DataError::InvalidValue {
                field: "flock.damping".to_string(),
                message: format!("must be within 0..=1, got {}", self.flock.damping),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flock_defaults() {
        let flock = FlockParams::default();
        assert!((flock.tether_gain - 0.08).abs() < f32::EPSILON);
        assert!((flock.repel_strength - 20_000.0).abs() < f32::EPSILON);
        assert_eq!(flock.history_lag, 5);
    }

    #[test]
    fn test_partial_ron_keeps_defaults() {
        let config = SimConfig::from_ron_str(
            "(guard_view_distance: 200.0, flock: (damping: 0.5))",
        )
        .unwrap();
        assert!((config.guard_view_distance - 200.0).abs() < f32::EPSILON);
        assert!((config.flock.damping - 0.5).abs() < f32::EPSILON);
        assert!((config.flock.jitter - 5.0).abs() < f32::EPSILON);
        assert!((config.patrol_wait - 2.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_invalid_damping_rejected() {
        let err = SimConfig::from_ron_str("(flock: (damping: 1.5))").unwrap_err();
        assert!(matches!(err, DataError::InvalidValue { ref field, .. } if field == "flock.damping"));
    }

    #[test]
    fn test_malformed_ron() {
        assert!(matches!(
            SimConfig::from_ron_str("(guard_view_distance: )"),
            Err(DataError::Parse(_))
        ));
    }
}
