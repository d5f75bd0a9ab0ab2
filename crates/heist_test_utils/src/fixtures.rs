//! Test fixtures and helpers.
//!
//! Pre-built levels, parties, and input scripts for consistent testing.

use heist_core::ai::AiArchetype;
use heist_core::combatant::{Ability, Combatant, CostType, Element};
use heist_core::config::SimConfig;
use heist_core::data::{ChestSpawn, EnemySpawn, LevelData, PartyData};
use heist_core::exploration::{Exploration, ExplorationInput, SessionState};
use heist_core::items::Inventory;
use heist_core::math::Direction;
use heist_core::tilemap::{AtlasLayout, TILE_FLOOR, TILE_WALL};

/// Fixed timestep used by the fixtures (60 Hz).
pub const DT: f32 = 1.0 / 60.0;

/// Tile side used by every fixture level.
pub const TILE: f32 = 32.0;

/// A small level in RON, as content authors write it.
pub const VAULT_RON: &str = r#"LevelData(
    name: "Vault",
    width: 8,
    height: 6,
    tiles: [
        1, 1, 1, 1, 1, 1, 1, 1,
        1, 2, 2, 2, 2, 2, 2, 1,
        1, 2, 2, 1, 1, 2, 2, 1,
        1, 2, 2, 2, 2, 2, 2, 1,
        1, 2, 2, 2, 2, 2, 2, 1,
        1, 1, 1, 1, 1, 1, 1, 1,
    ],
    player_spawn: (-80.0, 48.0),
    enemies: [
        EnemySpawn(
            position: (80.0, -48.0),
            archetype: Guard,
            patrol_target: Some((80.0, 48.0)),
            facing: Down,
            encounter: ["Pixie", "Jack Frost"],
        ),
    ],
    chests: [
        ChestSpawn(position: (-80.0, -48.0), loot: [Item(name: "Medicine", effect: Heal(50))]),
    ],
)"#;

/// Row-major tiles for a walled square room `size` tiles a side.
#[must_use]
pub fn room_tiles(size: u32) -> Vec<u32> {
    (0..size * size)
        .map(|i| {
            let (col, row) = (i % size, i / size);
            if col == 0 || row == 0 || col == size - 1 || row == size - 1 {
                TILE_WALL
            } else {
                TILE_FLOOR
            }
        })
        .collect()
}

/// Walled square room centered on the origin, player at the center.
#[must_use]
pub fn open_room(size: u32) -> LevelData {
    LevelData {
        name: format!("Room{size}"),
        width: size,
        height: size,
        tile_size: TILE,
        origin: (0.0, 0.0),
        tiles: room_tiles(size),
        atlas: AtlasLayout::default(),
        player_spawn: (0.0, 0.0),
        enemies: Vec::new(),
        chests: Vec::new(),
    }
}

/// Builder-style additions to a fixture level.
pub trait LevelFixture {
    /// Add an enemy spawn.
    #[must_use]
    fn with_enemy(self, spawn: EnemySpawn) -> Self;
    /// Add a chest spawn.
    #[must_use]
    fn with_chest(self, chest: ChestSpawn) -> Self;
    /// Turn the tile at (`col`, `row`) into a wall.
    #[must_use]
    fn with_wall(self, col: u32, row: u32) -> Self;
}

impl LevelFixture for LevelData {
    fn with_enemy(mut self, spawn: EnemySpawn) -> Self {
        self.enemies.push(spawn);
        self
    }

    fn with_chest(mut self, chest: ChestSpawn) -> Self {
        self.chests.push(chest);
        self
    }

    fn with_wall(mut self, col: u32, row: u32) -> Self {
        let index = (row * self.width + col) as usize;
        if let Some(tile) = self.tiles.get_mut(index) {
            *tile = TILE_WALL;
        }
        self
    }
}

/// Enemy spawn with a one-Shadow encounter.
#[must_use]
pub fn enemy_at(x: f32, y: f32, archetype: AiArchetype, facing: Direction) -> EnemySpawn {
    EnemySpawn {
        position: (x, y),
        archetype,
        patrol_target: None,
        facing,
        speed: None,
        encounter: vec!["Shadow".to_string()],
        collider: (28.0, 28.0),
    }
}

/// Guard patrolling from (`x`, `y`) to `target`.
#[must_use]
pub fn guard_at(x: f32, y: f32, target: (f32, f32), facing: Direction) -> EnemySpawn {
    EnemySpawn {
        patrol_target: Some(target),
        ..enemy_at(x, y, AiArchetype::Guard, facing)
    }
}

/// The default party and inventory.
#[must_use]
pub fn default_session() -> SessionState {
    SessionState::from_party_data(&PartyData::default())
}

/// A level ready to tick with default tuning and party.
///
/// # Panics
///
/// Panics if the fixture level does not validate.
#[must_use]
pub fn exploration(level: &LevelData) -> Exploration {
    Exploration::new(level, SimConfig::default(), default_session())
        .expect("fixture level should validate")
}

/// A lone party member with one wind spell and one heal.
#[must_use]
pub fn caster(name: &str) -> Combatant {
    Combatant::new(name, 80, 60, 12, 8).with_skills(vec![
        Ability::new("Garu", 4, 20, Element::Wind, CostType::Sp),
        Ability::new("Dia", 4, -30, Element::None, CostType::Sp),
    ])
}

/// A plain enemy with the given weaknesses.
#[must_use]
pub fn shadow(name: &str, hp: i32, weaknesses: Vec<Element>) -> Combatant {
    Combatant::new(name, hp, 0, 10, 0).with_weaknesses(weaknesses)
}

/// Empty inventory.
#[must_use]
pub fn no_items() -> Inventory {
    Inventory::default()
}

/// Walk the sides of a square, `side_ticks` ticks per side.
#[must_use]
pub fn square_walk(side_ticks: usize) -> Vec<ExplorationInput> {
    [Direction::Right, Direction::Down, Direction::Left, Direction::Up]
        .into_iter()
        .flat_map(|dir| std::iter::repeat(ExplorationInput::walking(dir)).take(side_ticks))
        .collect()
}
