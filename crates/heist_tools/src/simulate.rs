//! Headless runs of a level.
//!
//! The party walks a fixed square circuit and presses interact every half
//! second. Encounters are fought to the end by an auto-battler that melees
//! the first living enemy and always takes the All-Out Attack.

use std::fs;
use std::path::Path;

use heist_core::battle::{Battle, BattleCommand, BattleOutcome, BattleState};
use heist_core::config::SimConfig;
use heist_core::data::{EnemyTable, LevelData, PartyData};
use heist_core::error::DataError;
use heist_core::exploration::{Exploration, ExplorationEvent, ExplorationInput, SessionState};
use heist_core::math::Direction;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{ToolError, ToolResult};

/// Exploration timestep (60 Hz).
pub const DT: f32 = 1.0 / 60.0;

/// Battle timestep. Coarser than exploration; only timers advance.
pub const BATTLE_DT: f32 = 0.1;

/// Steps before a battle is declared stuck.
pub const MAX_BATTLE_STEPS: usize = 10_000;

const SIDE_TICKS: u64 = 90;
const INTERACT_EVERY: u64 = 30;

/// Read and parse a content file with `parse`.
///
/// # Errors
///
/// Returns an IO error for unreadable files and a content error for bad
/// content.
pub fn load<T>(path: &Path, parse: fn(&str) -> Result<T, DataError>) -> ToolResult<T> {
    let source = fs::read_to_string(path).map_err(|e| ToolError::io(path, e))?;
    parse(&source).map_err(|e| ToolError::content(path, e))
}

/// Everything a run needs besides the tick count.
#[derive(Debug, Clone)]
pub struct RunSetup {
    /// Level to explore.
    pub level: LevelData,
    /// Tuning.
    pub config: SimConfig,
    /// Party and starting inventory.
    pub party: PartyData,
    /// Enemy definitions.
    pub enemies: EnemyTable,
    /// Seed for battle randomness. Each battle adds its encounter number.
    pub seed: u64,
}

impl RunSetup {
    /// Setup with built-in party, enemies and tuning.
    #[must_use]
    pub fn new(level: LevelData) -> Self {
        Self {
            level,
            config: SimConfig::default(),
            party: PartyData::default(),
            enemies: EnemyTable::default(),
            seed: 0,
        }
    }

    /// Builder method to set the seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// One fought encounter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncounterRecord {
    /// Tick the encounter started on.
    pub tick: u64,
    /// Spawn index of the engaged enemy.
    pub enemy: usize,
    /// The party struck first.
    pub advantage: bool,
    /// How it ended.
    pub outcome: BattleOutcome,
    /// Battle steps taken.
    pub steps: usize,
}

/// What happened during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Level name.
    pub level: String,
    /// Exploration ticks simulated.
    pub ticks: u64,
    /// Encounters in order.
    pub encounters: Vec<EncounterRecord>,
    /// Chests opened.
    pub chests_opened: usize,
    /// Tiles revealed.
    pub explored_tiles: usize,
    /// Whether the run ended with the party wiped.
    pub wiped: bool,
    /// Final world state hash.
    pub state_hash: u64,
}

impl RunSummary {
    /// Serialize as pretty RON.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::Report`] if serialization fails.
    pub fn to_ron(&self) -> ToolResult<String> {
        Ok(ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?)
    }
}

/// Input for exploration tick `tick`: a clockwise square, interacting on a
/// fixed beat.
#[must_use]
pub fn scripted_input(tick: u64) -> ExplorationInput {
    let side = [Direction::Right, Direction::Down, Direction::Left, Direction::Up];
    let dir = side[((tick / SIDE_TICKS) % 4) as usize];
    let input = ExplorationInput::walking(dir);
    if tick % INTERACT_EVERY == 0 {
        input.with_interact()
    } else {
        input
    }
}

/// The auto-battler's choice for `state`, or `None` to let time pass.
#[must_use]
pub fn auto_command(state: BattleState) -> Option<BattleCommand> {
    match state {
        BattleState::PlayerMain => Some(BattleCommand::Attack),
        BattleState::PlayerTarget { .. } | BattleState::Victory | BattleState::Defeat => {
            Some(BattleCommand::Confirm)
        }
        BattleState::HoldUp => Some(BattleCommand::AllOutAttack),
        BattleState::PlayerSkills { .. }
        | BattleState::PlayerItem { .. }
        | BattleState::PlayerTargetAlly { .. } => Some(BattleCommand::Cancel),
        BattleState::EnemyTurn | BattleState::AnimationWait => None,
    }
}

/// Fight `battle` to its confirmed end.
///
/// Returns the outcome and the number of steps taken, or `None` if the
/// battle is still going after `max_steps`.
pub fn auto_battle(battle: &mut Battle, max_steps: usize) -> Option<(BattleOutcome, usize)> {
    for step in 0..max_steps {
        if let Some(command) = auto_command(battle.state()) {
            if let Err(err) = battle.handle(command) {
                warn!(command = command.name(), error = %err, "Auto-battle command rejected");
            }
        }
        if let Some(outcome) = battle.outcome() {
            return Some((outcome, step + 1));
        }
        battle.update(BATTLE_DT);
    }
    None
}

/// Run `setup` for up to `ticks` exploration ticks.
///
/// Stops early if the party is wiped.
///
/// # Errors
///
/// Returns a content error if the level does not validate, or
/// [`ToolError::BattleStalled`] if a battle never ends.
pub fn run(setup: &RunSetup, ticks: u64) -> ToolResult<RunSummary> {
    let session = SessionState::from_party_data(&setup.party);
    let mut world = Exploration::new(&setup.level, setup.config.clone(), session)
        .map_err(|e| ToolError::content(setup.level.name.as_str(), e))?;

    let mut encounters = Vec::new();
    let mut chests_opened = 0;
    let mut wiped = false;

    for tick in 0..ticks {
        for event in world.tick(DT, scripted_input(tick)) {
            match event {
                ExplorationEvent::ChestOpened { chest, loot } => {
                    chests_opened += 1;
                    info!(tick, chest, items = loot.len(), "Chest opened");
                }
                ExplorationEvent::AlarmRaised { searchlight, sentries } => {
                    info!(tick, searchlight, alerted = sentries.len(), "Alarm raised");
                }
                ExplorationEvent::Spotted { enemy } => debug!(tick, enemy, "Spotted"),
                ExplorationEvent::EncounterStarted(handoff) => {
                    info!(
                        tick,
                        enemy = handoff.engaged_enemy,
                        advantage = handoff.advantage,
                        "Encounter started"
                    );
                    let seed = setup.seed.wrapping_add(encounters.len() as u64);
                    let mut battle = world.start_battle(&setup.enemies, seed)?;
                    let (outcome, steps) = auto_battle(&mut battle, MAX_BATTLE_STEPS).ok_or(
                        ToolError::BattleStalled {
                            enemy: handoff.engaged_enemy,
                            steps: MAX_BATTLE_STEPS,
                        },
                    )?;
                    info!(tick, ?outcome, steps, "Battle over");

                    let (party, inventory) = battle.into_parts();
                    world.apply_battle_outcome(outcome, party, inventory)?;
                    encounters.push(EncounterRecord {
                        tick,
                        enemy: handoff.engaged_enemy,
                        advantage: handoff.advantage,
                        outcome,
                        steps,
                    });
                }
            }
        }

        if world.session().is_wiped() {
            warn!(tick, "Party wiped, ending run");
            wiped = true;
            break;
        }
    }

    Ok(RunSummary {
        level: world.name().to_string(),
        ticks: world.tick_count(),
        encounters,
        chests_opened,
        explored_tiles: world.map().explored_count(),
        wiped,
        state_hash: world.state_hash(),
    })
}
