//! Level layout and spawn definitions.

use serde::{Deserialize, Serialize};

use crate::ai::AiArchetype;
use crate::error::DataError;
use crate::items::Item;
use crate::math::Direction;
use crate::tilemap::{AtlasLayout, TILE_WALL};

/// An enemy placed in a level.
///
/// The spawn index (position in [`LevelData::enemies`]) is the key used by
/// the defeated-enemy list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemySpawn {
    /// World position.
    pub position: (f32, f32),

    /// Behaviour.
    pub archetype: AiArchetype,

    /// Second patrol waypoint. Patrolling archetypes without one stand still.
    #[serde(default)]
    pub patrol_target: Option<(f32, f32)>,

    /// Initial facing.
    #[serde(default)]
    pub facing: Direction,

    /// Movement speed. Defaults to the config's patrol speed.
    #[serde(default)]
    pub speed: Option<f32>,

    /// Enemy names fought when this spawn is engaged.
    #[serde(default)]
    pub encounter: Vec<String>,

    /// Collider size.
    #[serde(default = "default_collider")]
    pub collider: (f32, f32),
}

/// A chest placed in a level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChestSpawn {
    /// World position.
    pub position: (f32, f32),

    /// Items added to the inventory when opened.
    #[serde(default)]
    pub loot: Vec<Item>,
}

const fn default_collider() -> (f32, f32) {
    (28.0, 28.0)
}

const fn default_tile_size() -> f32 {
    32.0
}

/// Static level content.
///
/// # Example RON
///
/// ```ron
/// LevelData(
///     name: "Office",
///     width: 4,
///     height: 3,
///     tiles: [
///         1, 1, 1, 1,
///         1, 2, 2, 1,
///         1, 1, 1, 1,
///     ],
///     player_spawn: (-16.0, 0.0),
///     enemies: [
///         EnemySpawn(
///             position: (16.0, 0.0),
///             archetype: Guard,
///             patrol_target: Some((16.0, 80.0)),
///             encounter: ["Pixie", "Jack Frost"],
///         ),
///     ],
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelData {
    /// Level name, used in logs and error messages.
    pub name: String,

    /// Columns.
    pub width: u32,

    /// Rows.
    pub height: u32,

    /// Tile side length in world units.
    #[serde(default = "default_tile_size")]
    pub tile_size: f32,

    /// World-space center of the map.
    #[serde(default)]
    pub origin: (f32, f32),

    /// Row-major tile ids.
    pub tiles: Vec<u32>,

    /// Tileset layout.
    #[serde(default)]
    pub atlas: AtlasLayout,

    /// Player start position.
    pub player_spawn: (f32, f32),

    /// Enemies in spawn order.
    #[serde(default)]
    pub enemies: Vec<EnemySpawn>,

    /// Chests in spawn order.
    #[serde(default)]
    pub chests: Vec<ChestSpawn>,
}

impl LevelData {
    /// Parse a level from RON and validate it.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::Parse`] on malformed input, or the first
    /// validation failure.
    pub fn from_ron_str(source: &str) -> Result<Self, DataError> {
        let level: Self = ron::from_str(source)?;
        level.validate()?;
        Ok(level)
    }

    /// Check grid dimensions and spawn placement.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::TileCountMismatch`] when the grid is the wrong
    /// size, or [`DataError::InvalidValue`] for a bad tile size or a player
    /// spawning inside a wall.
    pub fn validate(&self) -> Result<(), DataError> {
        let expected = (self.width * self.height) as usize;
        if self.tiles.len() != expected {
            return Err(DataError::TileCountMismatch {
                name: self.name.clone(),
                expected,
                actual: self.tiles.len(),
            });
        }

        if !(self.tile_size.is_finite() && self.tile_size > 0.0) {
            return Err(DataError::InvalidValue {
                field: format!("{}.tile_size", self.name),
                message: format!("must be positive, got {}", self.tile_size),
            });
        }

        if self.tile_id_at(self.player_spawn) == Some(TILE_WALL) {
            return Err(DataError::InvalidValue {
                field: format!("{}.player_spawn", self.name),
                message: format!("{:?} is inside a wall", self.player_spawn),
            });
        }

        for (i, spawn) in self.enemies.iter().enumerate() {
            if spawn.collider.0 <= 0.0 || spawn.collider.1 <= 0.0 {
                return Err(DataError::InvalidValue {
                    field: format!("{}.enemies[{i}].collider", self.name),
                    message: format!("must be positive, got {:?}", spawn.collider),
                });
            }
            if spawn.speed.is_some_and(|s| !s.is_finite() || s < 0.0) {
                return Err(DataError::InvalidValue {
                    field: format!("{}.enemies[{i}].speed", self.name),
                    message: "must be a non-negative number".to_string(),
                });
            }
        }

        Ok(())
    }

    /// Tile id under a world position, if inside the grid.
    fn tile_id_at(&self, (x, y): (f32, f32)) -> Option<u32> {
        let left = self.origin.0 - self.width as f32 * self.tile_size / 2.0;
        let top = self.origin.1 - self.height as f32 * self.tile_size / 2.0;
        let col = ((x - left) / self.tile_size).floor();
        let row = ((y - top) / self.tile_size).floor();
        if col < 0.0 || row < 0.0 || col >= self.width as f32 || row >= self.height as f32 {
            return None;
        }
        self.tiles
            .get(row as usize * self.width as usize + col as usize)
            .copied()
    }
}
