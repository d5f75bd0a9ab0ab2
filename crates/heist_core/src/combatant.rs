//! Combat-side records: elements, abilities, equipment, and combatants.
//!
//! A [`Combatant`] is independent of the exploration [`Entity`]. The same
//! record is carried across battles as part of the party roster, so all
//! transient battle flags are reset by [`Combatant::reset_for_battle`].
//!
//! [`Entity`]: crate::entity::Entity

use serde::{Deserialize, Serialize};

use crate::error::CombatError;

/// Elemental affinity of an ability or weapon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Element {
    /// Non-elemental (healing, support).
    #[default]
    None,
    /// Physical strikes. Adds the attacker's melee attack.
    Phys,
    /// Gunfire. Adds the attacker's ranged attack.
    Gun,
    /// Fire.
    Fire,
    /// Ice.
    Ice,
    /// Electricity.
    Elec,
    /// Wind.
    Wind,
    /// Psychokinesis.
    Psi,
    /// Nuclear.
    Nuke,
    /// Light.
    Bless,
    /// Darkness.
    Curse,
}

/// Which resource an ability consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CostType {
    /// Spirit points (magic).
    #[default]
    Sp,
    /// Health points (physical skills).
    Hp,
}

/// A usable combat ability.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ability {
    /// Display name.
    pub name: String,
    /// Resource cost paid by the user.
    pub cost: i32,
    /// Base damage. Negative values heal.
    pub magnitude: i32,
    /// Element used for weakness checks.
    #[serde(default)]
    pub element: Element,
    /// Which resource pays the cost.
    #[serde(default)]
    pub cost_type: CostType,
}

impl Ability {
    /// Create a new ability.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        cost: i32,
        magnitude: i32,
        element: Element,
        cost_type: CostType,
    ) -> Self {
        Self {
            name: name.into(),
            cost,
            magnitude,
            element,
            cost_type,
        }
    }

    /// Basic melee strike: free, damage comes entirely from the weapon.
    #[must_use]
    pub fn melee() -> Self {
        Self::new("Attack", 0, 0, Element::Phys, CostType::Hp)
    }

    /// Basic gunshot: free, costs one round of ammo at the battle level.
    #[must_use]
    pub fn gunshot() -> Self {
        Self::new("Gun", 0, 0, Element::Gun, CostType::Hp)
    }

    /// Whether this ability restores HP instead of dealing damage.
    #[must_use]
    pub const fn is_healing(&self) -> bool {
        self.magnitude < 0
    }
}

/// A piece of equipment. Every field is additive on top of base stats.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Gear {
    /// Display name.
    pub name: String,
    /// Attack bonus.
    #[serde(default)]
    pub attack: i32,
    /// Defense bonus.
    #[serde(default)]
    pub defense: i32,
    /// Rounds per battle (ranged weapons only).
    #[serde(default)]
    pub magazine: u32,
    /// Element carried by the weapon.
    #[serde(default)]
    pub element: Element,
}

impl Gear {
    /// A melee weapon.
    #[must_use]
    pub fn melee(name: impl Into<String>, attack: i32) -> Self {
        Self {
            name: name.into(),
            attack,
            element: Element::Phys,
            ..Self::default()
        }
    }

    /// A ranged weapon with a magazine.
    #[must_use]
    pub fn ranged(name: impl Into<String>, attack: i32, magazine: u32) -> Self {
        Self {
            name: name.into(),
            attack,
            magazine,
            element: Element::Gun,
            ..Self::default()
        }
    }

    /// A defensive item (armor or accessory).
    #[must_use]
    pub fn armor(name: impl Into<String>, defense: i32) -> Self {
        Self {
            name: name.into(),
            defense,
            ..Self::default()
        }
    }
}

/// Equipped gear slots.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Equipment {
    /// Melee weapon.
    #[serde(default)]
    pub melee: Option<Gear>,
    /// Ranged weapon.
    #[serde(default)]
    pub ranged: Option<Gear>,
    /// Body armor.
    #[serde(default)]
    pub armor: Option<Gear>,
    /// Accessory.
    #[serde(default)]
    pub accessory: Option<Gear>,
}

impl Equipment {
    fn slots(&self) -> impl Iterator<Item = &Gear> {
        [&self.armor, &self.accessory]
            .into_iter()
            .filter_map(Option::as_ref)
    }
}

/// Result of applying damage to a combatant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DamageOutcome {
    /// HP actually removed.
    pub dealt: i32,
    /// Whether this hit took the combatant from alive to defeated.
    pub lethal: bool,
}

/// A party member or enemy in battle.
///
/// # Invariants
///
/// - `0 <= hp <= max_hp` and `0 <= sp <= max_sp`
/// - `alive == (hp > 0)`
/// - `down` implies `alive`, except for defeated combatants which are both
///   `down` and not `alive`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Combatant {
    /// Display name.
    pub name: String,
    /// Sprite reference for the renderer.
    #[serde(default)]
    pub sprite: String,
    /// Current HP.
    pub hp: i32,
    /// Maximum HP.
    pub max_hp: i32,
    /// Current SP.
    pub sp: i32,
    /// Maximum SP.
    pub max_sp: i32,
    /// Rounds left in the ranged weapon.
    #[serde(default)]
    pub ammo: u32,
    /// Base attack.
    pub attack: i32,
    /// Base defense.
    pub defense: i32,
    /// Equipped gear.
    #[serde(default)]
    pub equipment: Equipment,
    /// Skills in menu order.
    #[serde(default)]
    pub skills: Vec<Ability>,
    /// Elements that knock this combatant down.
    #[serde(default)]
    pub weaknesses: Vec<Element>,
    /// Whether HP is above zero.
    #[serde(default = "default_true")]
    pub alive: bool,
    /// Knocked down by a weakness (or defeated).
    #[serde(default)]
    pub down: bool,
    /// Already acted this round.
    #[serde(default)]
    pub has_acted: bool,
    /// Guarding until the next round.
    #[serde(default)]
    pub guarding: bool,
}

const fn default_true() -> bool {
    true
}

impl Combatant {
    /// Create a combatant at full HP and SP with no gear or skills.
    #[must_use]
    pub fn new(name: impl Into<String>, max_hp: i32, max_sp: i32, attack: i32, defense: i32) -> Self {
        let max_hp = max_hp.max(1);
        let max_sp = max_sp.max(0);
        Self {
            name: name.into(),
            sprite: String::new(),
            hp: max_hp,
            max_hp,
            sp: max_sp,
            max_sp,
            ammo: 0,
            attack,
            defense,
            equipment: Equipment::default(),
            skills: Vec::new(),
            weaknesses: Vec::new(),
            alive: true,
            down: false,
            has_acted: false,
            guarding: false,
        }
    }

    /// Builder method to set the skill list.
    #[must_use]
    pub fn with_skills(mut self, skills: Vec<Ability>) -> Self {
        self.skills = skills;
        self
    }

    /// Builder method to set the weakness set.
    #[must_use]
    pub fn with_weaknesses(mut self, weaknesses: Vec<Element>) -> Self {
        self.weaknesses = weaknesses;
        self
    }

    /// Builder method to set equipment. Reloads the magazine.
    #[must_use]
    pub fn with_equipment(mut self, equipment: Equipment) -> Self {
        self.equipment = equipment;
        self.ammo = self.magazine_size();
        self
    }

    /// Builder method to set the sprite reference.
    #[must_use]
    pub fn with_sprite(mut self, sprite: impl Into<String>) -> Self {
        self.sprite = sprite.into();
        self
    }

    fn gear_bonus(&self, pick: impl Fn(&Gear) -> i32) -> i32 {
        self.equipment.slots().map(pick).sum()
    }

    /// Base attack plus melee weapon and gear bonuses.
    #[must_use]
    pub fn total_melee_attack(&self) -> i32 {
        let weapon = self.equipment.melee.as_ref().map_or(0, |g| g.attack);
        self.attack + weapon + self.gear_bonus(|g| g.attack)
    }

    /// Base attack plus ranged weapon and gear bonuses.
    #[must_use]
    pub fn total_ranged_attack(&self) -> i32 {
        let weapon = self.equipment.ranged.as_ref().map_or(0, |g| g.attack);
        self.attack + weapon + self.gear_bonus(|g| g.attack)
    }

    /// Base defense plus armor and accessory bonuses.
    #[must_use]
    pub fn total_defense(&self) -> i32 {
        self.defense + self.gear_bonus(|g| g.defense)
    }

    /// Magazine size of the equipped ranged weapon, zero without one.
    #[must_use]
    pub fn magazine_size(&self) -> u32 {
        self.equipment.ranged.as_ref().map_or(0, |g| g.magazine)
    }

    /// Whether `element` is in this combatant's weakness set.
    #[must_use]
    pub fn is_weak_to(&self, element: Element) -> bool {
        self.weaknesses.contains(&element)
    }

    /// Whether this combatant can still take a turn this round.
    #[must_use]
    pub const fn can_act(&self) -> bool {
        self.alive && !self.has_acted
    }

    /// Remove up to `amount` HP, saturating at zero.
    ///
    /// A lethal hit sets `hp = 0`, `alive = false` and `down = true` in one
    /// step.
    pub fn apply_damage(&mut self, amount: i32) -> DamageOutcome {
        let amount = amount.max(0);
        let was_alive = self.alive;
        let before = self.hp;
        self.hp = (self.hp - amount).clamp(0, self.max_hp);
        if self.hp == 0 {
            self.alive = false;
            self.down = true;
        }
        DamageOutcome {
            dealt: before - self.hp,
            lethal: was_alive && !self.alive,
        }
    }

    /// Restore up to `amount` HP, capped at max. Returns HP actually gained.
    pub fn heal(&mut self, amount: i32) -> i32 {
        let before = self.hp;
        self.hp = (self.hp + amount.max(0)).clamp(0, self.max_hp);
        self.hp - before
    }

    /// Restore up to `amount` SP, capped at max. Returns SP actually gained.
    pub fn restore_sp(&mut self, amount: i32) -> i32 {
        let before = self.sp;
        self.sp = (self.sp + amount.max(0)).clamp(0, self.max_sp);
        self.sp - before
    }

    /// Spend `amount` SP if available. Returns `false` and changes nothing
    /// otherwise.
    pub fn spend_sp(&mut self, amount: i32) -> bool {
        if amount < 0 || self.sp < amount {
            return false;
        }
        self.sp -= amount;
        true
    }

    /// Check that this combatant can pay for `ability`.
    ///
    /// HP costs may not take the user to zero.
    pub fn can_afford(&self, ability: &Ability) -> Result<(), CombatError> {
        match ability.cost_type {
            CostType::Sp if self.sp < ability.cost => Err(CombatError::NotEnoughSp {
                actor: self.name.clone(),
                required: ability.cost,
                available: self.sp,
            }),
            CostType::Hp if ability.cost > 0 && self.hp <= ability.cost => {
                Err(CombatError::NotEnoughHp {
                    actor: self.name.clone(),
                    required: ability.cost,
                    available: self.hp,
                })
            }
            _ => Ok(()),
        }
    }

    /// Deduct the cost of `ability`. Fails without side effects if the
    /// combatant cannot afford it.
    pub fn pay_cost(&mut self, ability: &Ability) -> Result<(), CombatError> {
        self.can_afford(ability)?;
        match ability.cost_type {
            CostType::Sp => self.sp = (self.sp - ability.cost).clamp(0, self.max_sp),
            CostType::Hp => self.hp = (self.hp - ability.cost).clamp(1, self.max_hp),
        }
        Ok(())
    }

    /// Bring a defeated combatant back with `hp` (capped at max).
    ///
    /// Returns `false` and changes nothing if the combatant is alive.
    pub fn revive(&mut self, hp: i32) -> bool {
        if self.alive {
            return false;
        }
        self.hp = hp.clamp(1, self.max_hp);
        self.alive = true;
        self.down = false;
        true
    }

    /// Clear per-battle flags and reload the magazine.
    pub fn reset_for_battle(&mut self) {
        self.has_acted = false;
        self.guarding = false;
        self.down = !self.alive;
        self.ammo = self.magazine_size();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fighter() -> Combatant {
        Combatant::new("Skull", 150, 30, 20, 15).with_equipment(Equipment {
            melee: Some(Gear::melee("Pipe", 10)),
            ranged: Some(Gear::ranged("Shotgun", 12, 4)),
            armor: Some(Gear::armor("Jacket", 5)),
            accessory: None,
        })
    }

    #[test]
    fn test_totals_include_gear() {
        let c = fighter();
        assert_eq!(c.total_melee_attack(), 30);
        assert_eq!(c.total_ranged_attack(), 32);
        assert_eq!(c.total_defense(), 20);
        assert_eq!(c.ammo, 4);
    }

    #[test]
    fn test_lethal_damage_sets_flags_in_one_step() {
        let mut c = fighter();
        let outcome = c.apply_damage(500);
        assert!(outcome.lethal);
        assert_eq!(outcome.dealt, 150);
        assert_eq!(c.hp, 0);
        assert!(!c.alive);
        assert!(c.down);
    }

    #[test]
    fn test_heal_clamps_to_max() {
        let mut c = fighter();
        c.apply_damage(20);
        assert_eq!(c.heal(100), 20);
        assert_eq!(c.hp, c.max_hp);
    }

    #[test]
    fn test_sp_cost_rejected_without_side_effects() {
        let mut c = fighter();
        c.sp = 3;
        let zio = Ability::new("Zio", 4, 25, Element::Elec, CostType::Sp);
        let err = c.pay_cost(&zio).unwrap_err();
        assert!(matches!(err, CombatError::NotEnoughSp { required: 4, available: 3, .. }));
        assert_eq!(c.sp, 3);
    }

    #[test]
    fn test_hp_cost_cannot_kill_user() {
        let mut c = fighter();
        c.hp = 5;
        let lunge = Ability::new("Lunge", 5, 25, Element::Phys, CostType::Hp);
        assert!(c.pay_cost(&lunge).is_err());
        c.hp = 6;
        assert!(c.pay_cost(&lunge).is_ok());
        assert_eq!(c.hp, 1);
    }

    #[test]
    fn test_revive_only_when_defeated() {
        let mut c = fighter();
        assert!(!c.revive(50));
        c.apply_damage(1000);
        assert!(c.revive(500));
        assert_eq!(c.hp, 150);
        assert!(c.alive);
        assert!(!c.down);
    }

    #[test]
    fn test_reset_for_battle_keeps_defeated_down() {
        let mut c = fighter();
        c.has_acted = true;
        c.guarding = true;
        c.ammo = 0;
        c.reset_for_battle();
        assert!(!c.has_acted && !c.guarding && !c.down);
        assert_eq!(c.ammo, 4);

        c.apply_damage(1000);
        c.reset_for_battle();
        assert!(c.down && !c.alive);
    }
}
