//! Turn-based battle state machine.
//!
//! A [`Battle`] owns the party roster, the enemy group, and the shared
//! inventory for the duration of one encounter. The caller feeds it
//! [`BattleCommand`]s (player input) and elapsed time through
//! [`Battle::update`]; timed phases (action display, enemy attacks) advance
//! only through `update`.
//!
//! ```text
//! PlayerMain ─┬─ Attack/Gun ──> PlayerTarget ──Confirm──┐
//!             ├─ Skills ──> PlayerSkills ─┬─> PlayerTarget
//!             │                           └─> PlayerTargetAlly ─┐
//!             ├─ Items ──> PlayerItem ──> PlayerTargetAlly ─────┤
//!             └─ Guard ─────────────────────────────────────────┤
//!                                                               v
//!        HoldUp <── all living enemies down ── AnimationWait <──┘
//!                                                  │
//!                      one more / next member / EnemyTurn
//! ```

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::combat::{resolve_attack, resolve_enemy_attack, resolve_heal, resolve_item};
use crate::combatant::{Ability, Combatant};
use crate::config::SimConfig;
use crate::error::CombatError;
use crate::items::Inventory;

/// Action chosen in the menus, carried through targeting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SelectedAction {
    /// Basic melee strike.
    Melee,
    /// Basic gunshot, one round of ammo.
    Gun,
    /// Skill by index into the actor's skill list.
    Skill(usize),
    /// Item by index into the inventory.
    Item(usize),
}

/// Where the battle currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BattleState {
    /// Top-level command menu for the active member.
    #[default]
    PlayerMain,
    /// Browsing the active member's skills.
    PlayerSkills {
        /// Highlighted skill.
        cursor: usize,
    },
    /// Browsing the inventory.
    PlayerItem {
        /// Highlighted item.
        cursor: usize,
    },
    /// Choosing an enemy for an offensive action.
    PlayerTarget {
        /// Action being aimed.
        action: SelectedAction,
        /// Highlighted enemy.
        target: usize,
    },
    /// Choosing an ally for a healing skill or an item.
    PlayerTargetAlly {
        /// Action being aimed.
        action: SelectedAction,
        /// Highlighted party member.
        target: usize,
    },
    /// Enemies attack one by one.
    EnemyTurn,
    /// Showing the result of the last action.
    AnimationWait,
    /// Every living enemy is down.
    HoldUp,
    /// No enemies remain. Waiting for confirmation.
    Victory,
    /// No party member remains. Waiting for confirmation.
    Defeat,
}

impl BattleState {
    /// Short name for logs and errors.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::PlayerMain => "PlayerMain",
            Self::PlayerSkills { .. } => "PlayerSkills",
            Self::PlayerItem { .. } => "PlayerItem",
            Self::PlayerTarget { .. } => "PlayerTarget",
            Self::PlayerTargetAlly { .. } => "PlayerTargetAlly",
            Self::EnemyTurn => "EnemyTurn",
            Self::AnimationWait => "AnimationWait",
            Self::HoldUp => "HoldUp",
            Self::Victory => "Victory",
            Self::Defeat => "Defeat",
        }
    }

    /// Whether the battle has ended.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Victory | Self::Defeat)
    }
}

/// Player input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BattleCommand {
    /// Melee attack.
    Attack,
    /// Fire the ranged weapon.
    Gun,
    /// Open the skill list.
    Skills,
    /// Open the inventory.
    Items,
    /// Guard until the next round.
    Guard,
    /// Move the cursor forward.
    Next,
    /// Move the cursor back.
    Prev,
    /// Accept the highlighted entry.
    Confirm,
    /// Back out of the current menu.
    Cancel,
    /// Finish a hold-up.
    AllOutAttack,
    /// Let a hold-up pass.
    DeclineHoldUp,
}

impl BattleCommand {
    /// Short name for errors.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Attack => "Attack",
            Self::Gun => "Gun",
            Self::Skills => "Skills",
            Self::Items => "Items",
            Self::Guard => "Guard",
            Self::Next => "Next",
            Self::Prev => "Prev",
            Self::Confirm => "Confirm",
            Self::Cancel => "Cancel",
            Self::AllOutAttack => "AllOutAttack",
            Self::DeclineHoldUp => "DeclineHoldUp",
        }
    }
}

/// How a confirmed battle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BattleOutcome {
    /// All enemies defeated.
    Victory,
    /// The whole party fell.
    Defeat,
}

/// Delays between timed phases, in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BattleTiming {
    /// Pause after each player action.
    pub action_wait: f32,
    /// Pause before each enemy attack.
    pub enemy_attack_delay: f32,
}

impl Default for BattleTiming {
    fn default() -> Self {
        Self {
            action_wait: 0.8,
            enemy_attack_delay: 1.0,
        }
    }
}

impl BattleTiming {
    /// Timing taken from the simulation config.
    #[must_use]
    pub fn from_config(config: &SimConfig) -> Self {
        Self {
            action_wait: config.action_wait,
            enemy_attack_delay: config.enemy_attack_delay,
        }
    }
}

/// One encounter in progress.
#[derive(Debug, Clone)]
pub struct Battle {
    party: Vec<Combatant>,
    enemies: Vec<Combatant>,
    inventory: Inventory,
    state: BattleState,
    active: usize,
    enemy_cursor: usize,
    timer: f32,
    timing: BattleTiming,
    log: Vec<String>,
    outcome: Option<BattleOutcome>,
    rng: StdRng,
}

impl Battle {
    /// Start a battle.
    ///
    /// All combatants have their per-battle flags reset. With `advantage`
    /// the party opens; otherwise the enemies strike first.
    #[must_use]
    pub fn new(
        mut party: Vec<Combatant>,
        mut enemies: Vec<Combatant>,
        inventory: Inventory,
        advantage: bool,
        seed: u64,
    ) -> Self {
        party.iter_mut().for_each(Combatant::reset_for_battle);
        enemies.iter_mut().for_each(Combatant::reset_for_battle);

        let mut battle = Self {
            party,
            enemies,
            inventory,
            state: BattleState::EnemyTurn,
            active: 0,
            enemy_cursor: 0,
            timer: 0.0,
            timing: BattleTiming::default(),
            log: Vec::new(),
            outcome: None,
            rng: StdRng::seed_from_u64(seed),
        };

        if advantage {
            battle.say("Ambush! Phantom Thieves have the advantage.");
            battle.next_turn();
        } else {
            battle.say("Surprise Attack! Shadows act first.");
        }
        info!(
            party = battle.party.len(),
            enemies = battle.enemies.len(),
            advantage,
            "Battle started"
        );
        battle
    }

    /// Builder method to set phase delays.
    #[must_use]
    pub fn with_timing(mut self, timing: BattleTiming) -> Self {
        self.timing = timing;
        self
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> BattleState {
        self.state
    }

    /// Party roster in menu order.
    #[must_use]
    pub fn party(&self) -> &[Combatant] {
        &self.party
    }

    /// Enemy group.
    #[must_use]
    pub fn enemies(&self) -> &[Combatant] {
        &self.enemies
    }

    /// Shared inventory.
    #[must_use]
    pub const fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    /// Index of the member whose turn it is.
    #[must_use]
    pub const fn active_member(&self) -> usize {
        self.active
    }

    /// Every message so far, oldest first.
    #[must_use]
    pub fn log(&self) -> &[String] {
        &self.log
    }

    /// The latest message.
    #[must_use]
    pub fn message(&self) -> &str {
        self.log.last().map_or("", String::as_str)
    }

    /// The outcome, once the end screen has been confirmed.
    #[must_use]
    pub const fn outcome(&self) -> Option<BattleOutcome> {
        self.outcome
    }

    /// Hand the roster and inventory back to the caller.
    #[must_use]
    pub fn into_parts(self) -> (Vec<Combatant>, Inventory) {
        (self.party, self.inventory)
    }

    fn any_enemy_alive(&self) -> bool {
        self.enemies.iter().any(|e| e.alive)
    }

    fn any_member_alive(&self) -> bool {
        self.party.iter().any(|m| m.alive)
    }

    fn first_living_enemy(&self) -> Option<usize> {
        self.enemies.iter().position(|e| e.alive)
    }

    /// At least one enemy alive and every living enemy down.
    #[must_use]
    pub fn is_hold_up(&self) -> bool {
        self.any_enemy_alive() && self.enemies.iter().filter(|e| e.alive).all(|e| e.down)
    }

    // ========================================================================
    // Time
    // ========================================================================

    /// Advance timed phases by `dt` seconds.
    pub fn update(&mut self, dt: f32) {
        if self.state.is_terminal() {
            return;
        }
        if !self.any_enemy_alive() {
            self.say("VICTORY! Press ENTER.");
            self.set_state(BattleState::Victory);
            return;
        }
        if !self.any_member_alive() {
            self.say("The Phantom Thieves have fallen...");
            self.set_state(BattleState::Defeat);
            return;
        }

        match self.state {
            BattleState::AnimationWait => {
                self.timer += dt;
                if self.timer > self.timing.action_wait {
                    self.timer = 0.0;
                    if self.is_hold_up() {
                        self.say("HOLD UP! Press [Y] for All-Out Attack!");
                        self.set_state(BattleState::HoldUp);
                    } else {
                        self.continue_turn();
                    }
                }
            }
            BattleState::EnemyTurn => {
                self.timer += dt;
                if self.timer > self.timing.enemy_attack_delay {
                    self.timer = 0.0;
                    self.enemy_step();
                }
            }
            _ => {}
        }
    }

    fn enemy_step(&mut self) {
        while self.enemy_cursor < self.enemies.len() && !self.enemies[self.enemy_cursor].alive {
            self.enemy_cursor += 1;
        }

        let Some(enemy) = self.enemies.get(self.enemy_cursor) else {
            self.new_round();
            return;
        };

        let living: Vec<usize> = (0..self.party.len()).filter(|&i| self.party[i].alive).collect();
        if !living.is_empty() {
            let target = living[self.rng.gen_range(0..living.len())];
            let report = resolve_enemy_attack(enemy, &mut self.party[target]);
            let line = format!(
                "{} attacks {}! ({} damage)",
                enemy.name, self.party[target].name, report.damage
            );
            self.say(line);
            if report.lethal {
                let line = format!("{} is down for the count!", self.party[target].name);
                self.say(line);
            }
        }
        self.enemy_cursor += 1;
    }

    fn new_round(&mut self) {
        for member in &mut self.party {
            member.has_acted = false;
            member.guarding = false;
        }
        debug!("New round");
        self.next_turn();
    }

    /// Hand control to the first member who can still act, or to the
    /// enemies.
    fn next_turn(&mut self) {
        if let Some(next) = self.party.iter().position(Combatant::can_act) {
            self.active = next;
            let line = format!("{}'s Turn!", self.party[next].name);
            self.say(line);
            self.set_state(BattleState::PlayerMain);
        } else {
            self.enemy_cursor = 0;
            self.timer = 0.0;
            for enemy in &mut self.enemies {
                if enemy.alive {
                    enemy.down = false;
                }
            }
            self.say("Enemy Turn...");
            self.set_state(BattleState::EnemyTurn);
        }
    }

    /// After an action: one more for the same member, or the next turn.
    fn continue_turn(&mut self) {
        if self.party.get(self.active).is_some_and(Combatant::can_act) {
            self.say("1 MORE! Go again!");
            self.set_state(BattleState::PlayerMain);
        } else {
            self.next_turn();
        }
    }

    fn finish_action(&mut self, consumed_turn: bool) {
        if consumed_turn {
            self.party[self.active].has_acted = true;
        }
        self.timer = 0.0;
        self.set_state(BattleState::AnimationWait);
    }

    fn set_state(&mut self, state: BattleState) {
        if self.state != state {
            debug!(from = self.state.name(), to = state.name(), "Battle state change");
        }
        self.state = state;
        if let BattleState::Victory | BattleState::Defeat = state {
            info!(state = state.name(), "Battle over");
        }
    }

    fn say(&mut self, line: impl Into<String>) {
        self.log.push(line.into());
    }

    // ========================================================================
    // Input
    // ========================================================================

    /// Apply one player command.
    ///
    /// # Errors
    ///
    /// Returns a [`CombatError`] if the command is refused. A refused command
    /// never changes the battle; the reason is also appended to the log.
    pub fn handle(&mut self, command: BattleCommand) -> Result<(), CombatError> {
        let result = self.dispatch(command);
        if let Err(err) = &result {
            debug!(command = command.name(), error = %err, "Command rejected");
            if !matches!(err, CombatError::WrongState { .. }) {
                self.say(err.to_string());
            }
        }
        result
    }

    fn wrong_state(&self, command: BattleCommand) -> CombatError {
        CombatError::WrongState {
            command: command.name(),
            state: self.state.name(),
        }
    }

    fn dispatch(&mut self, command: BattleCommand) -> Result<(), CombatError> {
        match self.state {
            BattleState::PlayerMain => self.on_main(command),
            BattleState::PlayerSkills { cursor } => self.on_skills(command, cursor),
            BattleState::PlayerItem { cursor } => self.on_items(command, cursor),
            BattleState::PlayerTarget { action, target } => self.on_target(command, action, target),
            BattleState::PlayerTargetAlly { action, target } => {
                self.on_target_ally(command, action, target)
            }
            BattleState::HoldUp => self.on_hold_up(command),
            BattleState::Victory | BattleState::Defeat => self.on_end(command),
            BattleState::EnemyTurn | BattleState::AnimationWait => Err(self.wrong_state(command)),
        }
    }

    fn on_main(&mut self, command: BattleCommand) -> Result<(), CombatError> {
        let actor = &self.party[self.active];
        match command {
            BattleCommand::Attack => self.aim(SelectedAction::Melee),
            BattleCommand::Gun => {
                if actor.equipment.ranged.is_none() {
                    return Err(CombatError::NoRangedWeapon(actor.name.clone()));
                }
                if actor.ammo == 0 {
                    return Err(CombatError::OutOfAmmo(actor.name.clone()));
                }
                self.aim(SelectedAction::Gun)
            }
            BattleCommand::Skills => {
                if actor.skills.is_empty() {
                    return Err(CombatError::NothingToSelect("skills"));
                }
                self.set_state(BattleState::PlayerSkills { cursor: 0 });
                Ok(())
            }
            BattleCommand::Items => {
                if self.inventory.is_empty() {
                    return Err(CombatError::NothingToSelect("items"));
                }
                self.set_state(BattleState::PlayerItem { cursor: 0 });
                Ok(())
            }
            BattleCommand::Guard => {
                let line = format!("{} is guarding.", actor.name);
                self.party[self.active].guarding = true;
                self.say(line);
                self.finish_action(true);
                Ok(())
            }
            _ => Err(self.wrong_state(command)),
        }
    }

    /// Enter enemy targeting on the first living enemy.
    fn aim(&mut self, action: SelectedAction) -> Result<(), CombatError> {
        let target = self
            .first_living_enemy()
            .ok_or(CombatError::NothingToSelect("enemies"))?;
        self.set_state(BattleState::PlayerTarget { action, target });
        Ok(())
    }

    fn on_skills(&mut self, command: BattleCommand, cursor: usize) -> Result<(), CombatError> {
        let actor = &self.party[self.active];
        let count = actor.skills.len();
        match command {
            BattleCommand::Next => {
                self.state = BattleState::PlayerSkills {
                    cursor: wrap_next(cursor, count),
                };
                Ok(())
            }
            BattleCommand::Prev => {
                self.state = BattleState::PlayerSkills {
                    cursor: wrap_prev(cursor, count),
                };
                Ok(())
            }
            BattleCommand::Confirm => {
                let skill = actor
                    .skills
                    .get(cursor)
                    .ok_or(CombatError::NothingToSelect("skills"))?;
                actor.can_afford(skill)?;
                let action = SelectedAction::Skill(cursor);
                if skill.is_healing() {
                    self.set_state(BattleState::PlayerTargetAlly {
                        action,
                        target: self.active,
                    });
                    Ok(())
                } else {
                    self.aim(action)
                }
            }
            BattleCommand::Cancel => {
                self.set_state(BattleState::PlayerMain);
                Ok(())
            }
            _ => Err(self.wrong_state(command)),
        }
    }

    fn on_items(&mut self, command: BattleCommand, cursor: usize) -> Result<(), CombatError> {
        let count = self.inventory.len();
        match command {
            BattleCommand::Next => {
                self.state = BattleState::PlayerItem {
                    cursor: wrap_next(cursor, count),
                };
                Ok(())
            }
            BattleCommand::Prev => {
                self.state = BattleState::PlayerItem {
                    cursor: wrap_prev(cursor, count),
                };
                Ok(())
            }
            BattleCommand::Confirm => {
                if self.inventory.get(cursor).is_none() {
                    return Err(CombatError::NothingToSelect("items"));
                }
                self.set_state(BattleState::PlayerTargetAlly {
                    action: SelectedAction::Item(cursor),
                    target: self.active,
                });
                Ok(())
            }
            BattleCommand::Cancel => {
                self.set_state(BattleState::PlayerMain);
                Ok(())
            }
            _ => Err(self.wrong_state(command)),
        }
    }

    /// Next living enemy after `from` in `step` direction, wrapping.
    fn cycle_enemy(&self, from: usize, forward: bool) -> usize {
        let count = self.enemies.len();
        let mut index = from;
        for _ in 0..count {
            index = if forward {
                wrap_next(index, count)
            } else {
                wrap_prev(index, count)
            };
            if self.enemies[index].alive {
                return index;
            }
        }
        from
    }

    fn ability_for(&self, action: SelectedAction) -> Option<Ability> {
        match action {
            SelectedAction::Melee => Some(Ability::melee()),
            SelectedAction::Gun => Some(Ability::gunshot()),
            SelectedAction::Skill(i) => self.party[self.active].skills.get(i).cloned(),
            SelectedAction::Item(_) => None,
        }
    }

    fn on_target(
        &mut self,
        command: BattleCommand,
        action: SelectedAction,
        target: usize,
    ) -> Result<(), CombatError> {
        match command {
            BattleCommand::Next | BattleCommand::Prev => {
                let target = self.cycle_enemy(target, command == BattleCommand::Next);
                self.state = BattleState::PlayerTarget { action, target };
                Ok(())
            }
            BattleCommand::Confirm => self.strike(action, target),
            BattleCommand::Cancel => {
                let back = match action {
                    SelectedAction::Skill(cursor) => BattleState::PlayerSkills { cursor },
                    _ => BattleState::PlayerMain,
                };
                self.set_state(back);
                Ok(())
            }
            _ => Err(self.wrong_state(command)),
        }
    }

    fn strike(&mut self, action: SelectedAction, target: usize) -> Result<(), CombatError> {
        let ability = self
            .ability_for(action)
            .ok_or(CombatError::NothingToSelect("skills"))?;
        let target = if self.enemies.get(target).is_some_and(|e| e.alive) {
            target
        } else {
            self.first_living_enemy()
                .ok_or(CombatError::NothingToSelect("enemies"))?
        };

        let actor = &mut self.party[self.active];
        if action == SelectedAction::Gun {
            if actor.ammo == 0 {
                return Err(CombatError::OutOfAmmo(actor.name.clone()));
            }
            actor.ammo -= 1;
        } else {
            actor.pay_cost(&ability)?;
        }

        let report = resolve_attack(&self.party[self.active], &mut self.enemies[target], &ability);
        let attacker = self.party[self.active].name.clone();
        let defender = self.enemies[target].name.clone();
        debug!(
            attacker = %attacker,
            defender = %defender,
            ability = %ability.name,
            damage = report.damage,
            weakness = report.weakness,
            "Attack resolved"
        );

        if report.one_more {
            self.say("WEAKNESS! 1 More!");
        } else {
            self.say(format!(
                "Hit! {attacker} deals {} damage to {defender}.",
                report.damage
            ));
        }
        if report.lethal {
            self.say(format!("{defender} is defeated!"));
        }

        self.finish_action(!report.one_more);
        Ok(())
    }

    fn on_target_ally(
        &mut self,
        command: BattleCommand,
        action: SelectedAction,
        target: usize,
    ) -> Result<(), CombatError> {
        let count = self.party.len();
        match command {
            BattleCommand::Next => {
                self.state = BattleState::PlayerTargetAlly {
                    action,
                    target: wrap_next(target, count),
                };
                Ok(())
            }
            BattleCommand::Prev => {
                self.state = BattleState::PlayerTargetAlly {
                    action,
                    target: wrap_prev(target, count),
                };
                Ok(())
            }
            BattleCommand::Confirm => match action {
                SelectedAction::Item(index) => self.use_item(index, target),
                _ => self.heal_ally(action, target),
            },
            BattleCommand::Cancel => {
                let back = match action {
                    SelectedAction::Item(cursor) => BattleState::PlayerItem { cursor },
                    SelectedAction::Skill(cursor) => BattleState::PlayerSkills { cursor },
                    _ => BattleState::PlayerMain,
                };
                self.set_state(back);
                Ok(())
            }
            _ => Err(self.wrong_state(command)),
        }
    }

    fn heal_ally(&mut self, action: SelectedAction, target: usize) -> Result<(), CombatError> {
        let skill = self
            .ability_for(action)
            .ok_or(CombatError::NothingToSelect("skills"))?;
        let ally = self
            .party
            .get(target)
            .ok_or(CombatError::NothingToSelect("allies"))?;
        if !ally.alive {
            return Err(CombatError::NoEffect {
                item: skill.name,
                target: ally.name.clone(),
            });
        }

        self.party[self.active].pay_cost(&skill)?;
        let healed = resolve_heal(&mut self.party[target], &skill);
        let line = format!("Healed {} for {healed} HP!", self.party[target].name);
        self.say(line);
        self.finish_action(true);
        Ok(())
    }

    fn use_item(&mut self, index: usize, target: usize) -> Result<(), CombatError> {
        let item = self
            .inventory
            .get(index)
            .ok_or(CombatError::NothingToSelect("items"))?;
        let ally = self
            .party
            .get(target)
            .ok_or(CombatError::NothingToSelect("allies"))?;
        item.check_target(ally)?;

        let Some(item) = self.inventory.take(index) else {
            return Err(CombatError::NothingToSelect("items"));
        };
        let amount = resolve_item(&item, &mut self.party[target])?;
        let line = format!(
            "Used {} on {} ({amount}).",
            item.name, self.party[target].name
        );
        self.say(line);
        self.finish_action(true);
        Ok(())
    }

    fn on_hold_up(&mut self, command: BattleCommand) -> Result<(), CombatError> {
        match command {
            BattleCommand::AllOutAttack => {
                for enemy in &mut self.enemies {
                    enemy.apply_damage(enemy.hp);
                }
                self.say("ALL-OUT ATTACK! It's over!");
                self.finish_action(false);
                Ok(())
            }
            BattleCommand::DeclineHoldUp => {
                self.say("The Phantom Thieves hold back.");
                self.continue_turn();
                Ok(())
            }
            _ => Err(self.wrong_state(command)),
        }
    }

    fn on_end(&mut self, command: BattleCommand) -> Result<(), CombatError> {
        if command != BattleCommand::Confirm {
            return Err(self.wrong_state(command));
        }
        self.outcome = Some(match self.state {
            BattleState::Defeat => BattleOutcome::Defeat,
            _ => BattleOutcome::Victory,
        });
        Ok(())
    }
}

const fn wrap_next(index: usize, count: usize) -> usize {
    if count == 0 {
        0
    } else {
        (index + 1) % count
    }
}

const fn wrap_prev(index: usize, count: usize) -> usize {
    if count == 0 {
        0
    } else {
        (index + count - 1) % count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combatant::{CostType, Element, Equipment, Gear};
    use crate::items::{Item, ItemEffect};

    fn mona() -> Combatant {
        Combatant::new("Mona", 80, 60, 12, 8).with_skills(vec![
            Ability::new("Garu", 4, 20, Element::Wind, CostType::Sp),
            Ability::new("Dia", 4, -30, Element::None, CostType::Sp),
        ])
    }

    fn skull() -> Combatant {
        Combatant::new("Skull", 150, 30, 20, 15).with_equipment(Equipment {
            melee: Some(Gear::melee("Pipe", 8)),
            ranged: Some(Gear::ranged("Shotgun", 10, 1)),
            ..Equipment::default()
        })
    }

    fn shadow(name: &str, hp: i32, weaknesses: Vec<Element>) -> Combatant {
        Combatant::new(name, hp, 0, 10, 0).with_weaknesses(weaknesses)
    }

    fn ambush(party: Vec<Combatant>, enemies: Vec<Combatant>) -> Battle {
        Battle::new(party, enemies, Inventory::default(), true, 7)
    }

    #[test]
    fn test_opening_depends_on_advantage() {
        let b = ambush(vec![mona()], vec![shadow("Pixie", 50, vec![])]);
        assert_eq!(b.state(), BattleState::PlayerMain);
        assert_eq!(b.message(), "Mona's Turn!");

        let b = Battle::new(vec![mona()], vec![shadow("Pixie", 50, vec![])], Inventory::default(), false, 7);
        assert_eq!(b.state(), BattleState::EnemyTurn);
        assert_eq!(b.message(), "Surprise Attack! Shadows act first.");
    }

    #[test]
    fn test_weakness_grants_one_more() {
        let mut b = ambush(
            vec![mona(), skull()],
            vec![shadow("Pixie", 100, vec![Element::Wind]), shadow("Shadow", 100, vec![])],
        );
        b.handle(BattleCommand::Skills).unwrap();
        b.handle(BattleCommand::Confirm).unwrap();
        assert!(matches!(b.state(), BattleState::PlayerTarget { target: 0, .. }));
        b.handle(BattleCommand::Confirm).unwrap();

        assert_eq!(b.state(), BattleState::AnimationWait);
        assert!(b.enemies()[0].down);
        assert!(!b.party()[0].has_acted);
        assert_eq!(b.party()[0].sp, 56);

        b.update(1.0);
        assert_eq!(b.state(), BattleState::PlayerMain);
        assert_eq!(b.active_member(), 0);
        assert_eq!(b.message(), "1 MORE! Go again!");
    }

    #[test]
    fn test_hold_up_and_all_out_attack() {
        let mut b = ambush(vec![mona()], vec![shadow("Pixie", 100, vec![Element::Wind])]);
        b.handle(BattleCommand::Skills).unwrap();
        b.handle(BattleCommand::Confirm).unwrap();
        b.handle(BattleCommand::Confirm).unwrap();
        b.update(1.0);
        assert_eq!(b.state(), BattleState::HoldUp);

        b.handle(BattleCommand::AllOutAttack).unwrap();
        assert!(b.enemies().iter().all(|e| !e.alive && e.hp == 0));
        b.update(0.1);
        assert_eq!(b.state(), BattleState::Victory);
        assert_eq!(b.outcome(), None);

        b.handle(BattleCommand::Confirm).unwrap();
        assert_eq!(b.outcome(), Some(BattleOutcome::Victory));
    }

    #[test]
    fn test_decline_hold_up_keeps_turn() {
        let mut b = ambush(vec![mona()], vec![shadow("Pixie", 100, vec![Element::Wind])]);
        b.handle(BattleCommand::Skills).unwrap();
        b.handle(BattleCommand::Confirm).unwrap();
        b.handle(BattleCommand::Confirm).unwrap();
        b.update(1.0);
        b.handle(BattleCommand::DeclineHoldUp).unwrap();
        assert_eq!(b.state(), BattleState::PlayerMain);
        assert!(b.enemies()[0].alive);
    }

    #[test]
    fn test_plain_hit_passes_turn() {
        let mut b = ambush(vec![skull(), mona()], vec![shadow("Shadow", 200, vec![])]);
        b.handle(BattleCommand::Attack).unwrap();
        b.handle(BattleCommand::Confirm).unwrap();
        assert!(b.party()[0].has_acted);
        assert_eq!(b.enemies()[0].hp, 172);

        b.update(1.0);
        assert_eq!(b.state(), BattleState::PlayerMain);
        assert_eq!(b.active_member(), 1);
    }

    #[test]
    fn test_round_ends_with_enemy_phase() {
        let mut b = ambush(vec![skull()], vec![shadow("Shadow", 200, vec![])]);
        b.handle(BattleCommand::Guard).unwrap();
        b.update(1.0);
        assert_eq!(b.state(), BattleState::EnemyTurn);

        b.update(1.1);
        assert!(b.message().starts_with("Shadow attacks Skull!"));
        // Guarding halves 10 - 15 floored at 1, still 1.
        assert_eq!(b.party()[0].hp, 149);

        b.update(1.1);
        assert_eq!(b.state(), BattleState::PlayerMain);
        assert!(!b.party()[0].guarding);
        assert!(!b.party()[0].has_acted);
    }

    #[test]
    fn test_gun_spends_ammo() {
        let mut b = ambush(vec![skull()], vec![shadow("Shadow", 500, vec![])]);
        b.handle(BattleCommand::Gun).unwrap();
        b.handle(BattleCommand::Confirm).unwrap();
        assert_eq!(b.party()[0].ammo, 0);
        assert_eq!(b.enemies()[0].hp, 470);

        b.update(1.0);
        b.update(1.1);
        b.update(1.1);
        assert_eq!(b.state(), BattleState::PlayerMain);
        assert_eq!(
            b.handle(BattleCommand::Gun),
            Err(CombatError::OutOfAmmo("Skull".to_string()))
        );
        assert_eq!(b.state(), BattleState::PlayerMain);
    }

    #[test]
    fn test_rejected_skill_keeps_state() {
        let mut member = mona();
        member.sp = 2;
        let mut b = ambush(vec![member], vec![shadow("Shadow", 50, vec![])]);
        b.party[0].sp = 2;
        b.handle(BattleCommand::Skills).unwrap();
        let err = b.handle(BattleCommand::Confirm).unwrap_err();
        assert!(matches!(err, CombatError::NotEnoughSp { .. }));
        assert_eq!(b.state(), BattleState::PlayerSkills { cursor: 0 });
        assert_eq!(b.party()[0].sp, 2);
    }

    #[test]
    fn test_heal_targets_ally_and_ends_turn() {
        let mut b = ambush(vec![mona(), skull()], vec![shadow("Shadow", 50, vec![])]);
        b.party[1].hp = 100;
        b.handle(BattleCommand::Skills).unwrap();
        b.handle(BattleCommand::Next).unwrap();
        b.handle(BattleCommand::Confirm).unwrap();
        assert!(matches!(b.state(), BattleState::PlayerTargetAlly { target: 0, .. }));
        b.handle(BattleCommand::Next).unwrap();
        b.handle(BattleCommand::Confirm).unwrap();
        assert_eq!(b.party()[1].hp, 130);
        assert!(b.party()[0].has_acted);
        assert_eq!(b.message(), "Healed Skull for 30 HP!");
    }

    #[test]
    fn test_revival_item_rejected_on_living_ally() {
        let inventory = Inventory::new(vec![Item::new("Revival Bead", ItemEffect::Revive(50))]);
        let mut b = Battle::new(vec![mona(), skull()], vec![shadow("Shadow", 50, vec![])], inventory, true, 1);
        b.handle(BattleCommand::Items).unwrap();
        b.handle(BattleCommand::Confirm).unwrap();
        let err = b.handle(BattleCommand::Confirm).unwrap_err();
        assert!(matches!(err, CombatError::NoEffect { .. }));
        assert_eq!(b.inventory().len(), 1);

        b.party[1].apply_damage(1000);
        b.handle(BattleCommand::Next).unwrap();
        b.handle(BattleCommand::Confirm).unwrap();
        assert!(b.inventory().is_empty());
        assert!(b.party()[1].alive && !b.party()[1].down);
        assert_eq!(b.party()[1].hp, 50);
    }

    #[test]
    fn test_cancel_returns_to_menu() {
        let mut b = ambush(vec![mona()], vec![shadow("Shadow", 50, vec![])]);
        b.handle(BattleCommand::Attack).unwrap();
        b.handle(BattleCommand::Cancel).unwrap();
        assert_eq!(b.state(), BattleState::PlayerMain);

        b.handle(BattleCommand::Skills).unwrap();
        b.handle(BattleCommand::Confirm).unwrap();
        b.handle(BattleCommand::Cancel).unwrap();
        assert_eq!(b.state(), BattleState::PlayerSkills { cursor: 0 });
    }

    #[test]
    fn test_targeting_skips_defeated_enemies() {
        let mut b = ambush(
            vec![skull()],
            vec![shadow("A", 10, vec![]), shadow("B", 10, vec![]), shadow("C", 10, vec![])],
        );
        b.enemies[1].apply_damage(100);
        b.handle(BattleCommand::Attack).unwrap();
        b.handle(BattleCommand::Next).unwrap();
        assert!(matches!(b.state(), BattleState::PlayerTarget { target: 2, .. }));
        b.handle(BattleCommand::Prev).unwrap();
        assert!(matches!(b.state(), BattleState::PlayerTarget { target: 0, .. }));
    }

    #[test]
    fn test_wrong_state_is_rejected() {
        let mut b = Battle::new(vec![mona()], vec![shadow("Shadow", 50, vec![])], Inventory::default(), false, 3);
        assert_eq!(
            b.handle(BattleCommand::Attack),
            Err(CombatError::WrongState {
                command: "Attack",
                state: "EnemyTurn"
            })
        );
    }

    #[test]
    fn test_party_wipe_is_defeat() {
        let mut weak = mona();
        weak.hp = 1;
        let brute = Combatant::new("Brute", 500, 0, 200, 0);
        let mut b = Battle::new(vec![weak], vec![brute], Inventory::default(), false, 11);
        b.update(1.1);
        assert!(!b.party()[0].alive);
        b.update(0.1);
        assert_eq!(b.state(), BattleState::Defeat);
        b.handle(BattleCommand::Confirm).unwrap();
        assert_eq!(b.outcome(), Some(BattleOutcome::Defeat));
    }

    #[test]
    fn test_enemy_ignores_fallen_members() {
        let mut b = Battle::new(
            vec![skull(), mona()],
            vec![shadow("Shadow", 50, vec![])],
            Inventory::default(),
            false,
            5,
        );
        b.party[1].apply_damage(1000);
        for _ in 0..10 {
            b.enemy_cursor = 0;
            b.update(1.1);
            assert!(b.message().contains("Skull"));
        }
    }
}
