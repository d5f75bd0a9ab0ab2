//! Error types for the simulation core.
//!
//! Simulation ticks never fail; deviant conditions are clamped or skipped.
//! These types cover the places where a caller hands the core something it
//! can refuse: combat commands, content data, and entity lookups.

use thiserror::Error;

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Top-level error type for all simulation errors.
#[derive(Debug, Error)]
pub enum GameError {
    /// A combat command was rejected.
    #[error(transparent)]
    Combat(#[from] CombatError),

    /// Content data failed to load or validate.
    #[error(transparent)]
    Data(#[from] DataError),

    /// Invalid entity reference.
    #[error("Entity not found: {0}")]
    EntityNotFound(usize),

    /// Invalid game state.
    #[error("Invalid game state: {0}")]
    InvalidState(String),
}

/// A combat input that the battle refused to act on.
///
/// The battle state is left untouched whenever one of these is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CombatError {
    /// The actor cannot pay the skill's SP cost.
    #[error("{actor} does not have enough SP ({available}/{required})")]
    NotEnoughSp {
        /// Acting combatant.
        actor: String,
        /// SP required.
        required: i32,
        /// SP available.
        available: i32,
    },

    /// The actor cannot pay the skill's HP cost without dying.
    #[error("{actor} does not have enough HP ({available}/{required})")]
    NotEnoughHp {
        /// Acting combatant.
        actor: String,
        /// HP required.
        required: i32,
        /// HP available.
        available: i32,
    },

    /// The ranged weapon is empty.
    #[error("{0} is out of ammo")]
    OutOfAmmo(String),

    /// The actor has no ranged weapon equipped.
    #[error("{0} has no gun equipped")]
    NoRangedWeapon(String),

    /// The selected list (skills, items, targets) is empty.
    #[error("Nothing to select: {0}")]
    NothingToSelect(&'static str),

    /// The selected item cannot be used on the chosen target.
    #[error("{item} has no effect on {target}")]
    NoEffect {
        /// Item name.
        item: String,
        /// Target name.
        target: String,
    },

    /// The command does not apply in the current state.
    #[error("Command {command} is not valid during {state}")]
    WrongState {
        /// Command name.
        command: &'static str,
        /// Battle state name.
        state: &'static str,
    },
}

/// Errors raised by content loading and validation.
#[derive(Debug, Error)]
pub enum DataError {
    /// Failed to parse a RON document.
    #[error("Failed to parse data: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// Tile grid does not match the declared dimensions.
    #[error("Level '{name}' declares {expected} tiles but has {actual}")]
    TileCountMismatch {
        /// Level name.
        name: String,
        /// width * height.
        expected: usize,
        /// Length of the tile array.
        actual: usize,
    },

    /// Explored bitset does not match the map size.
    #[error("Explored state has {actual} entries, map has {expected} tiles")]
    ExploredLengthMismatch {
        /// width * height.
        expected: usize,
        /// Provided length.
        actual: usize,
    },

    /// A value is outside its allowed range.
    #[error("Invalid value for {field}: {message}")]
    InvalidValue {
        /// Field name.
        field: String,
        /// What was wrong.
        message: String,
    },
}
