//! # Heist Core
//!
//! Simulation core for a top-down stealth heist with turn-based battles.
//!
//! This crate contains **only** game logic:
//! - No rendering
//! - No audio
//! - No file IO (content is parsed from strings)
//! - No system randomness (battles own a seeded RNG)
//!
//! Every update is a synchronous pass driven by the caller's game loop, so
//! a headless run with the same inputs reproduces the same state.
//!
//! ## Crate Structure
//!
//! - [`tilemap`] - Tile grid, wall queries, line of sight, fog of war
//! - [`entity`] - Kinematic bodies and axis-separated collision
//! - [`ai`] - NPC state machines
//! - [`perception`] - Sight cones and ambush checks
//! - [`flocking`] - Party followers
//! - [`combat`] - Damage and weakness resolution
//! - [`battle`] - Turn state machine
//! - [`exploration`] - Level tick and battle hand-off
//! - [`data`] - RON content definitions

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod ai;
pub mod battle;
pub mod combat;
pub mod combatant;
pub mod components;
pub mod config;
pub mod data;
pub mod entity;
pub mod error;
pub mod exploration;
pub mod flocking;
pub mod items;
pub mod math;
pub mod perception;
pub mod tilemap;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::ai::{AiArchetype, AiBrain, AiState, AiTuning};
    pub use crate::battle::{
        Battle, BattleCommand, BattleOutcome, BattleState, BattleTiming, SelectedAction,
    };
    pub use crate::combat::{resolve_attack, resolve_heal, resolve_item, HitReport};
    pub use crate::combatant::{Ability, Combatant, CostType, Element, Equipment, Gear};
    pub use crate::components::*;
    pub use crate::config::{FlockParams, SimConfig};
    pub use crate::data::{EnemyTable, LevelData, PartyData};
    pub use crate::entity::Entity;
    pub use crate::error::{CombatError, DataError, GameError, Result};
    pub use crate::exploration::{
        EncounterHandoff, Exploration, ExplorationEvent, ExplorationInput, LevelProgress,
        SessionState,
    };
    pub use crate::items::{Inventory, Item, ItemEffect};
    pub use crate::math::{Direction, Vec2};
    pub use crate::perception::{check_ambush, in_sight, ViewCone};
    pub use crate::tilemap::TileMap;
}
