//! One level in play: the world tick and the hand-off to battle.
//!
//! [`Exploration`] is the owning context for a level. It holds the map, the
//! player and followers, enemies and props, the per-level progress flags,
//! and the [`SessionState`] (party roster and inventory) while the player
//! is in the level.
//!
//! # Tick order
//!
//! 1. Player movement from input, against props and the map
//! 2. Fog reveal around the player
//! 3. Chest interaction
//! 4. Follower flocking, in roster order
//! 5. Enemies in spawn order (AI, then kinematics)
//! 6. Searchlight alarms
//! 7. Encounter checks (ambush on interact, then contact)
//!
//! While an encounter is pending the world is frozen until
//! [`Exploration::apply_battle_outcome`] is called.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::ai::{AiArchetype, AiBrain, AiTuning};
use crate::battle::{Battle, BattleOutcome, BattleTiming};
use crate::combatant::Combatant;
use crate::components::{Animation, DirectionalFrames, EntityKind};
use crate::config::SimConfig;
use crate::data::{EnemyTable, LevelData, PartyData};
use crate::entity::Entity;
use crate::error::{DataError, GameError, Result};
use crate::flocking::update_party;
use crate::items::{Inventory, Item};
use crate::math::{Direction, Vec2};
use crate::perception::check_ambush;
use crate::tilemap::TileMap;

/// Gap between party members at spawn.
const PARTY_SPACING: f32 = 40.0;

/// Collider side for people and chests.
const BODY_SIZE: f32 = 28.0;

/// Character sheet layout: columns, rows, pixel size.
const SHEET_COLUMNS: u32 = 5;
const SHEET_ROWS: u32 = 4;
const SHEET_SIZE: Vec2 = Vec2::new(160.0, 128.0);

// ============================================================================
// Transfer records
// ============================================================================

/// State carried between levels and battles.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SessionState {
    /// Party roster. The first member leads in the world.
    pub party: Vec<Combatant>,
    /// Shared consumables.
    pub inventory: Inventory,
}

impl SessionState {
    /// Create a session.
    #[must_use]
    pub fn new(party: Vec<Combatant>, inventory: Inventory) -> Self {
        Self { party, inventory }
    }

    /// Session from party content.
    #[must_use]
    pub fn from_party_data(data: &PartyData) -> Self {
        Self::new(data.roster(), data.starting_inventory())
    }

    /// Whether no member is standing.
    #[must_use]
    pub fn is_wiped(&self) -> bool {
        !self.party.iter().any(|m| m.alive)
    }
}

/// Hand-off from the world to a battle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EncounterHandoff {
    /// Spawn index of the enemy that was engaged.
    pub engaged_enemy: usize,
    /// Level to return to.
    pub return_scene: String,
    /// The party struck first.
    pub advantage: bool,
}

/// Per-level flags that outlive the level instance.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LevelProgress {
    /// By enemy spawn index.
    pub defeated_enemies: Vec<bool>,
    /// By chest spawn index.
    pub opened_chests: Vec<bool>,
    /// Row-major explored flag per tile.
    pub explored: Vec<bool>,
}

/// Input for one world tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[allow(clippy::struct_excessive_bools)]
pub struct ExplorationInput {
    /// Move up.
    pub up: bool,
    /// Move down.
    pub down: bool,
    /// Move left.
    pub left: bool,
    /// Move right.
    pub right: bool,
    /// Interact (ambush or open a chest).
    pub interact: bool,
}

impl ExplorationInput {
    /// Walk in one direction.
    #[must_use]
    pub fn walking(direction: Direction) -> Self {
        let mut input = Self::default();
        match direction {
            Direction::Up => input.up = true,
            Direction::Down => input.down = true,
            Direction::Left => input.left = true,
            Direction::Right => input.right = true,
        }
        input
    }

    /// Builder method to press interact.
    #[must_use]
    pub const fn with_interact(mut self) -> Self {
        self.interact = true;
        self
    }
}

/// Something the caller may want to react to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExplorationEvent {
    /// A battle should start.
    EncounterStarted(EncounterHandoff),
    /// An enemy can see the player this tick.
    Spotted {
        /// Enemy spawn index.
        enemy: usize,
    },
    /// A searchlight woke sentries.
    AlarmRaised {
        /// Searchlight spawn index.
        searchlight: usize,
        /// Sentries newly alerted.
        sentries: Vec<usize>,
    },
    /// A chest was opened and its loot added to the inventory.
    ChestOpened {
        /// Chest spawn index.
        chest: usize,
        /// Items added.
        loot: Vec<Item>,
    },
}

// ============================================================================
// Exploration
// ============================================================================

/// A level in play.
#[derive(Debug, Clone)]
pub struct Exploration {
    name: String,
    map: TileMap,
    player: Entity,
    followers: Vec<Entity>,
    enemies: Vec<Entity>,
    encounters: Vec<Vec<String>>,
    props: Vec<Entity>,
    chest_loot: Vec<Vec<Item>>,
    defeated_enemies: Vec<bool>,
    opened_chests: Vec<bool>,
    config: SimConfig,
    session: SessionState,
    pending: Option<EncounterHandoff>,
    time: f32,
    tick: u64,
}

fn walker(position: Vec2, kind: EntityKind) -> Entity {
    Entity::new(position, kind)
        .with_collider(Vec2::splat(BODY_SIZE))
        .with_animation(Animation::new(
            DirectionalFrames::walking(),
            SHEET_COLUMNS,
            SHEET_ROWS,
            SHEET_SIZE,
        ))
}

impl Exploration {
    /// Build a level from content.
    ///
    /// One follower is spawned behind the player for every party member
    /// after the first.
    ///
    /// # Errors
    ///
    /// Returns a [`DataError`] if the level or config does not validate.
    pub fn new(level: &LevelData, config: SimConfig, session: SessionState) -> std::result::Result<Self, DataError> {
        level.validate()?;
        config.validate()?;

        let map = TileMap::from_level(level)?;
        let tuning = AiTuning::from_config(&config);

        let spawn = Vec2::from(level.player_spawn);
        let player = walker(spawn, EntityKind::Player).with_speed(config.base_speed);

        let followers = (1..session.party.len())
            .map(|i| {
                let pos = spawn + Vec2::new(-PARTY_SPACING * i as f32, PARTY_SPACING);
                walker(pos, EntityKind::Npc)
                    .with_ai(AiBrain::new(AiArchetype::Follower, pos, pos, tuning))
                    .with_salt(i as f32 * 1.7)
            })
            .collect();

        let enemies = level
            .enemies
            .iter()
            .map(|e| {
                let pos = Vec2::from(e.position);
                let target = e.patrol_target.map_or(pos, Vec2::from);
                walker(pos, EntityKind::Npc)
                    .with_collider(Vec2::from(e.collider))
                    .with_facing(e.facing)
                    .with_speed(e.speed.unwrap_or(config.patrol_speed))
                    .with_ai(AiBrain::new(e.archetype, pos, target, tuning))
            })
            .collect();

        let props = level
            .chests
            .iter()
            .map(|c| {
                Entity::new(Vec2::from(c.position), EntityKind::Prop)
                    .with_collider(Vec2::splat(BODY_SIZE))
                    .as_chest()
            })
            .collect();

        info!(
            level = %level.name,
            enemies = level.enemies.len(),
            chests = level.chests.len(),
            "Level loaded"
        );

        Ok(Self {
            name: level.name.clone(),
            map,
            player,
            followers,
            enemies,
            encounters: level.enemies.iter().map(|e| e.encounter.clone()).collect(),
            props,
            chest_loot: level.chests.iter().map(|c| c.loot.clone()).collect(),
            defeated_enemies: vec![false; level.enemies.len()],
            opened_chests: vec![false; level.chests.len()],
            config,
            session,
            pending: None,
            time: 0.0,
            tick: 0,
        })
    }

    /// Re-apply saved flags: defeated enemies and opened chests are removed
    /// from play and explored tiles are revealed.
    ///
    /// Shorter flag lists are padded with `false`; extra entries are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::ExploredLengthMismatch`] if a non-empty explored
    /// list does not match the map.
    pub fn restore_progress(&mut self, progress: &LevelProgress) -> std::result::Result<(), DataError> {
        if !progress.explored.is_empty() {
            self.map.set_explored(&progress.explored)?;
        }
        for (i, &defeated) in progress.defeated_enemies.iter().enumerate() {
            if defeated && i < self.enemies.len() {
                self.defeated_enemies[i] = true;
                self.enemies[i].deactivate();
            }
        }
        for (i, &opened) in progress.opened_chests.iter().enumerate() {
            if opened && i < self.props.len() {
                self.opened_chests[i] = true;
                self.props[i].deactivate();
            }
        }
        Ok(())
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Level name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The map.
    #[must_use]
    pub const fn map(&self) -> &TileMap {
        &self.map
    }

    /// The party leader's body.
    #[must_use]
    pub const fn player(&self) -> &Entity {
        &self.player
    }

    /// Mutable access to the leader, for placement.
    pub fn player_mut(&mut self) -> &mut Entity {
        &mut self.player
    }

    /// Follower bodies in roster order.
    #[must_use]
    pub fn followers(&self) -> &[Entity] {
        &self.followers
    }

    /// Enemy bodies in spawn order.
    #[must_use]
    pub fn enemies(&self) -> &[Entity] {
        &self.enemies
    }

    /// Mutable access to an enemy body.
    pub fn enemy_mut(&mut self, index: usize) -> Option<&mut Entity> {
        self.enemies.get_mut(index)
    }

    /// Chest and prop bodies in spawn order.
    #[must_use]
    pub fn props(&self) -> &[Entity] {
        &self.props
    }

    /// Party roster and inventory.
    #[must_use]
    pub const fn session(&self) -> &SessionState {
        &self.session
    }

    /// Active tuning.
    #[must_use]
    pub const fn config(&self) -> &SimConfig {
        &self.config
    }

    /// The encounter waiting for a battle, if any.
    #[must_use]
    pub const fn pending_encounter(&self) -> Option<&EncounterHandoff> {
        self.pending.as_ref()
    }

    /// Seconds simulated in this level.
    #[must_use]
    pub const fn time(&self) -> f32 {
        self.time
    }

    /// Ticks simulated in this level.
    #[must_use]
    pub const fn tick_count(&self) -> u64 {
        self.tick
    }

    /// Snapshot of the flags to persist.
    #[must_use]
    pub fn progress(&self) -> LevelProgress {
        LevelProgress {
            defeated_enemies: self.defeated_enemies.clone(),
            opened_chests: self.opened_chests.clone(),
            explored: self.map.explored().to_vec(),
        }
    }

    /// Give the session back when leaving the level.
    #[must_use]
    pub fn into_session(self) -> SessionState {
        self.session
    }

    // ========================================================================
    // Tick
    // ========================================================================

    /// Advance the world by `dt` seconds.
    pub fn tick(&mut self, dt: f32, input: ExplorationInput) -> Vec<ExplorationEvent> {
        let mut events = Vec::new();
        if self.pending.is_some() {
            return events;
        }

        self.time += dt;
        self.tick += 1;

        // 1. Player
        self.player.reset_movement();
        if input.left {
            self.player.move_left();
        }
        if input.right {
            self.player.move_right();
        }
        if input.up {
            self.player.move_up();
        }
        if input.down {
            self.player.move_down();
        }
        self.player.update(dt, None, Some(&self.map), &self.props);

        // 2. Fog
        self.map.reveal_tiles(self.player.position, self.config.reveal_radius);

        // 3. Chests
        if input.interact {
            if let Some(event) = self.open_chest() {
                events.push(event);
            }
        }

        // 4. Followers
        update_party(
            &self.player,
            &mut self.followers,
            Some(&self.map),
            dt,
            self.time,
            &self.config.flock,
        );

        // 5. Enemies
        for enemy in &mut self.enemies {
            enemy.update(dt, Some(&self.player), Some(&self.map), &[]);
        }
        for (i, enemy) in self.enemies.iter().enumerate() {
            if enemy.is_active() && enemy.ai.as_ref().is_some_and(|b| b.spotted) {
                events.push(ExplorationEvent::Spotted { enemy: i });
            }
        }

        // 6. Alarms
        self.raise_alarms(&mut events);

        // 7. Encounters
        if let Some(handoff) = self.check_encounters(input.interact) {
            info!(
                level = %self.name,
                enemy = handoff.engaged_enemy,
                advantage = handoff.advantage,
                "Encounter"
            );
            self.pending = Some(handoff.clone());
            events.push(ExplorationEvent::EncounterStarted(handoff));
        }

        #[cfg(debug_assertions)]
        {
            let hash = self.state_hash();
            tracing::debug!(tick = self.tick, state_hash = hash, "Exploration state hash");
        }

        events
    }

    fn open_chest(&mut self) -> Option<ExplorationEvent> {
        let reach = self.config.chest_reach;
        let player = self.player.position;
        let index = self.props.iter().enumerate().position(|(i, prop)| {
            prop.chest
                && prop.is_active()
                && !self.opened_chests[i]
                && prop.position.distance(player) < reach
        })?;

        self.opened_chests[index] = true;
        self.props[index].deactivate();
        let loot = self.chest_loot[index].clone();
        for item in &loot {
            self.session.inventory.push(item.clone());
        }
        debug!(chest = index, items = loot.len(), "Chest opened");
        Some(ExplorationEvent::ChestOpened { chest: index, loot })
    }

    fn raise_alarms(&mut self, events: &mut Vec<ExplorationEvent>) {
        let spotters: Vec<(usize, Vec2)> = self
            .enemies
            .iter()
            .enumerate()
            .filter(|(_, e)| {
                e.is_active()
                    && e.ai
                        .as_ref()
                        .is_some_and(|b| b.archetype == AiArchetype::Searchlight && b.spotted)
            })
            .map(|(i, e)| (i, e.position))
            .collect();

        let radius = self.config.searchlight_alert_radius;
        for (searchlight, origin) in spotters {
            let mut sentries = Vec::new();
            for (i, enemy) in self.enemies.iter_mut().enumerate() {
                if !enemy.is_active() || enemy.position.distance(origin) > radius {
                    continue;
                }
                if let Some(brain) = enemy.ai.as_mut() {
                    if brain.archetype == AiArchetype::Sentry && !brain.alerted {
                        brain.alerted = true;
                        sentries.push(i);
                    }
                }
            }
            if !sentries.is_empty() {
                info!(searchlight, sentries = sentries.len(), "Alarm raised");
                events.push(ExplorationEvent::AlarmRaised {
                    searchlight,
                    sentries,
                });
            }
        }
    }

    fn check_encounters(&self, interact: bool) -> Option<EncounterHandoff> {
        for (i, enemy) in self.enemies.iter().enumerate() {
            let engages = enemy
                .ai
                .as_ref()
                .map_or(true, |b| b.archetype.engages_combat());
            if !enemy.is_active() || !engages {
                continue;
            }

            let close = self.player.position.distance(enemy.position) < self.config.ambush_distance;
            if interact && close && check_ambush(&self.player, enemy) {
                return Some(self.handoff(i, true));
            }
            if self.player.is_colliding(enemy) {
                return Some(self.handoff(i, false));
            }
        }
        None
    }

    fn handoff(&self, engaged_enemy: usize, advantage: bool) -> EncounterHandoff {
        EncounterHandoff {
            engaged_enemy,
            return_scene: self.name.clone(),
            advantage,
        }
    }

    // ========================================================================
    // Battle hand-off
    // ========================================================================

    /// Build the battle for the pending encounter.
    ///
    /// The party and inventory are copied in; write them back with
    /// [`Self::apply_battle_outcome`].
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidState`] if no encounter is pending.
    pub fn start_battle(&self, table: &EnemyTable, seed: u64) -> Result<Battle> {
        let handoff = self
            .pending
            .as_ref()
            .ok_or_else(|| GameError::InvalidState("no encounter pending".to_string()))?;
        let names = self
            .encounters
            .get(handoff.engaged_enemy)
            .ok_or(GameError::EntityNotFound(handoff.engaged_enemy))?;

        Ok(Battle::new(
            self.session.party.clone(),
            table.encounter(names),
            self.session.inventory.clone(),
            handoff.advantage,
            seed,
        )
        .with_timing(BattleTiming::from_config(&self.config)))
    }

    /// Close the pending encounter.
    ///
    /// The roster and inventory replace the session's. On victory the
    /// engaged enemy is marked defeated and removed from play. On defeat it
    /// stays where it is; what happens to a wiped party is up to the caller.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidState`] if no encounter is pending.
    pub fn apply_battle_outcome(
        &mut self,
        outcome: BattleOutcome,
        party: Vec<Combatant>,
        inventory: Inventory,
    ) -> Result<()> {
        let handoff = self
            .pending
            .take()
            .ok_or_else(|| GameError::InvalidState("no encounter pending".to_string()))?;

        self.session.party = party;
        self.session.inventory = inventory;

        if outcome == BattleOutcome::Victory {
            let index = handoff.engaged_enemy;
            let enemy = self
                .enemies
                .get_mut(index)
                .ok_or(GameError::EntityNotFound(index))?;
            enemy.deactivate();
            self.defeated_enemies[index] = true;
        }
        info!(level = %self.name, ?outcome, enemy = handoff.engaged_enemy, "Returned from battle");
        Ok(())
    }

    // ========================================================================
    // Determinism
    // ========================================================================

    /// Hash of the simulated state. Equal inputs from equal starting states
    /// give equal hashes.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        fn body(entity: &Entity, hasher: &mut DefaultHasher) {
            entity.position.x.to_bits().hash(hasher);
            entity.position.y.to_bits().hash(hasher);
            entity.velocity.x.to_bits().hash(hasher);
            entity.velocity.y.to_bits().hash(hasher);
            entity.facing.hash(hasher);
            entity.status.hash(hasher);
            entity.history.len().hash(hasher);
            if let Some(brain) = &entity.ai {
                brain.state.hash(hasher);
                brain.alerted.hash(hasher);
            }
        }

        let mut hasher = DefaultHasher::new();
        self.tick.hash(&mut hasher);
        self.time.to_bits().hash(&mut hasher);

        body(&self.player, &mut hasher);
        self.followers.iter().for_each(|f| body(f, &mut hasher));
        self.enemies.iter().for_each(|e| body(e, &mut hasher));
        self.props.iter().for_each(|p| p.status.hash(&mut hasher));

        self.defeated_enemies.hash(&mut hasher);
        self.opened_chests.hash(&mut hasher);
        self.map.explored().hash(&mut hasher);
        self.session.inventory.len().hash(&mut hasher);
        for member in &self.session.party {
            member.hp.hash(&mut hasher);
            member.sp.hash(&mut hasher);
        }

        hasher.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{ChestSpawn, EnemySpawn};
    use crate::items::ItemEffect;
    use crate::tilemap::{AtlasLayout, TILE_FLOOR, TILE_WALL};

    const DT: f32 = 1.0 / 60.0;

    /// Walled square room, `size` tiles a side, centered on the origin.
    fn room(size: u32, enemies: Vec<EnemySpawn>, chests: Vec<ChestSpawn>) -> LevelData {
        let tiles = (0..size * size)
            .map(|i| {
                let (col, row) = (i % size, i / size);
                if col == 0 || row == 0 || col == size - 1 || row == size - 1 {
                    TILE_WALL
                } else {
                    TILE_FLOOR
                }
            })
            .collect();
        LevelData {
            name: "Test Room".to_string(),
            width: size,
            height: size,
            tile_size: 32.0,
            origin: (0.0, 0.0),
            tiles,
            atlas: AtlasLayout::default(),
            player_spawn: (0.0, 0.0),
            enemies,
            chests,
        }
    }

    fn spawn(position: (f32, f32), archetype: AiArchetype, facing: Direction) -> EnemySpawn {
        EnemySpawn {
            position,
            archetype,
            patrol_target: None,
            facing,
            speed: None,
            encounter: vec!["Pixie".to_string()],
            collider: (28.0, 28.0),
        }
    }

    fn session() -> SessionState {
        SessionState::from_party_data(&PartyData::default())
    }

    fn world(level: &LevelData) -> Exploration {
        Exploration::new(level, SimConfig::default(), session()).unwrap()
    }

    #[test]
    fn test_followers_spawn_behind_leader() {
        let w = world(&room(16, vec![], vec![]));
        assert_eq!(w.followers().len(), 3);
        assert_eq!(w.followers()[0].position, Vec2::new(-40.0, 40.0));
        assert_eq!(w.followers()[2].position, Vec2::new(-120.0, 40.0));
    }

    #[test]
    fn test_walking_reveals_and_moves() {
        let mut w = world(&room(16, vec![], vec![]));
        let events = w.tick(DT, ExplorationInput::walking(Direction::Right));
        assert!(events.is_empty());
        assert!(w.player().position.x > 0.0);
        assert_eq!(w.player().facing, Direction::Right);
        assert!(w.map().explored_count() > 0);
        assert_eq!(w.tick_count(), 1);
    }

    #[test]
    fn test_contact_is_a_surprise() {
        let level = room(16, vec![spawn((20.0, 0.0), AiArchetype::Sentry, Direction::Left)], vec![]);
        let mut w = world(&level);
        let events = w.tick(DT, ExplorationInput::default());
        let handoff = EncounterHandoff {
            engaged_enemy: 0,
            return_scene: "Test Room".to_string(),
            advantage: false,
        };
        assert!(events.contains(&ExplorationEvent::EncounterStarted(handoff.clone())));
        assert_eq!(w.pending_encounter(), Some(&handoff));
    }

    #[test]
    fn test_ambush_from_behind() {
        let level = room(16, vec![spawn((40.0, 0.0), AiArchetype::Boss, Direction::Right)], vec![]);
        let mut w = world(&level);
        let events = w.tick(DT, ExplorationInput::default().with_interact());
        assert!(matches!(
            events.last(),
            Some(ExplorationEvent::EncounterStarted(EncounterHandoff { advantage: true, .. }))
        ));
    }

    #[test]
    fn test_no_ambush_face_to_face() {
        let level = room(16, vec![spawn((40.0, 0.0), AiArchetype::Boss, Direction::Left)], vec![]);
        let mut w = world(&level);
        let events = w.tick(DT, ExplorationInput::default().with_interact());
        assert!(events.is_empty());
    }

    #[test]
    fn test_pending_encounter_freezes_world() {
        let level = room(16, vec![spawn((20.0, 0.0), AiArchetype::Sentry, Direction::Left)], vec![]);
        let mut w = world(&level);
        w.tick(DT, ExplorationInput::default());
        let before = w.state_hash();
        assert!(w.tick(DT, ExplorationInput::walking(Direction::Up)).is_empty());
        assert_eq!(w.state_hash(), before);
    }

    #[test]
    fn test_victory_removes_enemy() {
        let level = room(16, vec![spawn((20.0, 0.0), AiArchetype::Sentry, Direction::Left)], vec![]);
        let mut w = world(&level);
        w.tick(DT, ExplorationInput::default());

        let battle = w.start_battle(&EnemyTable::default(), 1).unwrap();
        assert_eq!(battle.enemies()[0].name, "Pixie");
        let (party, inventory) = battle.into_parts();
        w.apply_battle_outcome(BattleOutcome::Victory, party, inventory).unwrap();

        assert!(w.pending_encounter().is_none());
        assert!(!w.enemies()[0].is_active());
        assert_eq!(w.progress().defeated_enemies, vec![true]);
        assert!(w.tick(DT, ExplorationInput::default()).is_empty());
    }

    #[test]
    fn test_outcome_without_encounter_rejected() {
        let mut w = world(&room(16, vec![], vec![]));
        let result = w.apply_battle_outcome(BattleOutcome::Victory, vec![], Inventory::default());
        assert!(matches!(result, Err(GameError::InvalidState(_))));
    }

    #[test]
    fn test_chest_opens_once() {
        let chest = ChestSpawn {
            position: (30.0, 0.0),
            loot: vec![Item::new("Medicine", ItemEffect::Heal(50))],
        };
        let mut w = world(&room(16, vec![], vec![chest]));
        let before = w.session().inventory.len();

        let events = w.tick(DT, ExplorationInput::default().with_interact());
        assert!(matches!(events[0], ExplorationEvent::ChestOpened { chest: 0, .. }));
        assert_eq!(w.session().inventory.len(), before + 1);
        assert!(!w.props()[0].is_active());

        assert!(w.tick(DT, ExplorationInput::default().with_interact()).is_empty());
        assert_eq!(w.session().inventory.len(), before + 1);
    }

    #[test]
    fn test_searchlight_alerts_sentries() {
        let level = room(
            16,
            vec![
                spawn((0.0, -100.0), AiArchetype::Searchlight, Direction::Down),
                spawn((-200.0, 100.0), AiArchetype::Sentry, Direction::Right),
            ],
            vec![],
        );
        let mut w = world(&level);
        let events = w.tick(DT, ExplorationInput::default());
        assert!(events.contains(&ExplorationEvent::Spotted { enemy: 0 }));
        assert!(events.contains(&ExplorationEvent::AlarmRaised {
            searchlight: 0,
            sentries: vec![1],
        }));

        w.tick(DT, ExplorationInput::default());
        let sentry = w.enemies()[1].ai.as_ref().unwrap();
        assert_eq!(sentry.state, crate::ai::AiState::Chasing);
    }

    #[test]
    fn test_progress_restores() {
        let level = room(
            16,
            vec![spawn((100.0, 100.0), AiArchetype::Boss, Direction::Down)],
            vec![ChestSpawn {
                position: (-100.0, -100.0),
                loot: vec![],
            }],
        );
        let mut first = world(&level);
        first.tick(DT, ExplorationInput::default());
        let mut progress = first.progress();
        progress.defeated_enemies[0] = true;
        progress.opened_chests[0] = true;

        let mut second = world(&level);
        second.restore_progress(&progress).unwrap();
        assert!(!second.enemies()[0].is_active());
        assert!(!second.props()[0].is_active());
        assert_eq!(second.map().explored_count(), first.map().explored_count());

        progress.explored.pop();
        assert!(second.restore_progress(&progress).is_err());
    }

    #[test]
    fn test_same_inputs_same_hash() {
        let level = room(
            16,
            vec![spawn((-150.0, -150.0), AiArchetype::Wanderer, Direction::Down)],
            vec![],
        );
        let mut a = world(&level);
        let mut b = world(&level);
        for i in 0..120 {
            let dir = if i < 60 { Direction::Right } else { Direction::Down };
            a.tick(DT, ExplorationInput::walking(dir));
            b.tick(DT, ExplorationInput::walking(dir));
        }
        assert_eq!(a.state_hash(), b.state_hash());
    }
}
