//! Data structures for level and combatant content.
//!
//! This module contains pure data structures that define levels, party
//! members, enemies and items. All structs are designed to be deserialized
//! from RON files.
//!
//! **Note:** This module contains no IO - it only defines data types.
//! File loading is handled by `heist_tools`.

mod combatant_data;
mod level_data;

pub use combatant_data::{default_inventory, CombatantData, EnemyTable, PartyData};
pub use level_data::{ChestSpawn, EnemySpawn, LevelData};
