//! Weakness-based action resolution.
//!
//! This module implements the per-action rules of a battle:
//! - Flat defense subtraction with a minimum of 1 damage
//! - Elemental weakness: ×1.5 damage, knockdown, and an extra action
//! - Guarding: ×0.5 damage and immunity to weakness triggers
//! - Healing skills and consumable items
//!
//! Turn sequencing lives in [`crate::battle`].

use crate::combatant::{Ability, Combatant, Element};
use crate::error::CombatError;
use crate::items::Item;

/// Damage multiplier on a weakness hit, applied before defense.
pub const WEAKNESS_MULTIPLIER: f32 = 1.5;

/// Damage multiplier against a guarding defender, applied last.
pub const GUARD_MULTIPLIER: f32 = 0.5;

/// Damage floor for any landed hit.
pub const MIN_DAMAGE: i32 = 1;

/// What happened when an attack resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[allow(clippy::struct_excessive_bools)]
pub struct HitReport {
    /// HP removed from the defender.
    pub damage: i32,
    /// The element matched a weakness of a non-guarding defender.
    pub weakness: bool,
    /// The defender was knocked down by this hit.
    pub knocked_down: bool,
    /// The attacker keeps their turn.
    pub one_more: bool,
    /// This hit defeated the defender.
    pub lethal: bool,
    /// The defender was guarding.
    pub guarded: bool,
}

/// Base power of `ability` in `attacker`'s hands.
///
/// Physical and gun abilities add the matching weapon attack total; every
/// other element uses the ability's magnitude alone.
#[must_use]
pub fn raw_power(attacker: &Combatant, ability: &Ability) -> i32 {
    match ability.element {
        Element::Phys => ability.magnitude + attacker.total_melee_attack(),
        Element::Gun => ability.magnitude + attacker.total_ranged_attack(),
        _ => ability.magnitude,
    }
}

/// Whether `ability` would trigger a weakness on `defender`.
///
/// Guarding defenders never trigger weaknesses.
#[must_use]
pub fn triggers_weakness(defender: &Combatant, ability: &Ability) -> bool {
    !defender.guarding && defender.is_weak_to(ability.element)
}

/// Calculate damage without applying it.
///
/// Formula:
/// ```text
/// Raw     = Magnitude (+ total melee/ranged attack for Phys/Gun)
/// Raw     = Raw × 1.5                      if weakness
/// Damage  = max(Raw - Total Defense, 1)
/// Damage  = max(Damage × 0.5, 1)           if guarding
/// ```
#[must_use]
pub fn calculate_damage(attacker: &Combatant, defender: &Combatant, ability: &Ability) -> i32 {
    let mut raw = raw_power(attacker, ability);

    if triggers_weakness(defender, ability) {
        raw = (raw as f32 * WEAKNESS_MULTIPLIER) as i32;
    }

    let mut damage = (raw - defender.total_defense()).max(MIN_DAMAGE);

    if defender.guarding {
        damage = ((damage as f32 * GUARD_MULTIPLIER) as i32).max(MIN_DAMAGE);
    }

    damage
}

/// Resolve an offensive ability against `defender`.
///
/// Costs are not paid here. A weakness hit that leaves the defender alive
/// and not already down knocks them down and grants one more action.
pub fn resolve_attack(attacker: &Combatant, defender: &mut Combatant, ability: &Ability) -> HitReport {
    let weakness = triggers_weakness(defender, ability);
    let guarded = defender.guarding;
    let was_down = defender.down;
    let damage = calculate_damage(attacker, defender, ability);

    let outcome = defender.apply_damage(damage);

    let knocked_down = weakness && defender.alive && !was_down;
    if knocked_down {
        defender.down = true;
    }

    HitReport {
        damage: outcome.dealt,
        weakness,
        knocked_down,
        one_more: knocked_down,
        lethal: outcome.lethal,
        guarded,
    }
}

/// Damage of an enemy's basic attack.
///
/// Enemies strike with their base attack against the target's total
/// defense; guarding halves the result.
#[must_use]
pub fn enemy_attack_damage(attacker: &Combatant, defender: &Combatant) -> i32 {
    let mut damage = (attacker.attack - defender.total_defense()).max(MIN_DAMAGE);
    if defender.guarding {
        damage = ((damage as f32 * GUARD_MULTIPLIER) as i32).max(MIN_DAMAGE);
    }
    damage
}

/// Resolve an enemy's basic attack. Enemy attacks never knock down.
pub fn resolve_enemy_attack(attacker: &Combatant, defender: &mut Combatant) -> HitReport {
    let guarded = defender.guarding;
    let outcome = defender.apply_damage(enemy_attack_damage(attacker, defender));
    HitReport {
        damage: outcome.dealt,
        lethal: outcome.lethal,
        guarded,
        ..HitReport::default()
    }
}

/// Apply a healing ability to `target`. Returns HP actually restored.
///
/// Defeated targets are not healed.
pub fn resolve_heal(target: &mut Combatant, ability: &Ability) -> i32 {
    if !target.alive {
        return 0;
    }
    target.heal(-ability.magnitude)
}

/// Use `item` on `target`. Returns the amount restored.
///
/// # Errors
///
/// Returns [`CombatError::NoEffect`] if the item does not apply to the
/// target (revival on a living ally, anything else on a defeated one).
pub fn resolve_item(item: &Item, target: &mut Combatant) -> Result<i32, CombatError> {
    item.apply(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combatant::{CostType, Equipment, Gear};
    use crate::items::ItemEffect;

    fn mona() -> Combatant {
        Combatant::new("Mona", 80, 60, 12, 8)
    }

    fn enemy(hp: i32, weaknesses: Vec<Element>) -> Combatant {
        Combatant::new("Shadow", hp, 0, 10, 0).with_weaknesses(weaknesses)
    }

    fn garu() -> Ability {
        Ability::new("Garu", 4, 20, Element::Wind, CostType::Sp)
    }

    #[test]
    fn test_weakness_chain() {
        let attacker = mona();
        let mut target = enemy(100, vec![Element::Wind]);
        let report = resolve_attack(&attacker, &mut target, &garu());
        assert_eq!(report.damage, 30);
        assert!(report.weakness && report.knocked_down && report.one_more);
        assert!(target.down && target.alive);
        assert_eq!(target.hp, 70);
    }

    #[test]
    fn test_weakness_on_already_down_target() {
        let attacker = mona();
        let mut target = enemy(100, vec![Element::Wind]);
        target.down = true;
        let report = resolve_attack(&attacker, &mut target, &garu());
        assert!(report.weakness);
        assert!(!report.one_more);
        assert_eq!(report.damage, 30);
    }

    #[test]
    fn test_guard_blocks_weakness() {
        let attacker = mona();
        let mut target = enemy(100, vec![Element::Wind]);
        target.guarding = true;
        let report = resolve_attack(&attacker, &mut target, &garu());
        assert!(!report.weakness && !report.knocked_down);
        assert!(!target.down);
        assert_eq!(report.damage, 10);
    }

    #[test]
    fn test_defense_floor() {
        let attacker = mona();
        let mut target = Combatant::new("Tank", 100, 0, 5, 500);
        let report = resolve_attack(&attacker, &mut target, &garu());
        assert_eq!(report.damage, 1);

        target.guarding = true;
        assert_eq!(calculate_damage(&attacker, &target, &garu()), 1);
    }

    #[test]
    fn test_physical_adds_weapon() {
        let attacker = Combatant::new("Skull", 150, 30, 20, 15).with_equipment(Equipment {
            melee: Some(Gear::melee("Pipe", 10)),
            ranged: Some(Gear::ranged("Shotgun", 5, 4)),
            ..Equipment::default()
        });
        assert_eq!(raw_power(&attacker, &Ability::melee()), 30);
        assert_eq!(raw_power(&attacker, &Ability::gunshot()), 25);
        assert_eq!(raw_power(&attacker, &garu()), 20);
    }

    #[test]
    fn test_lethal_weakness_is_not_knockdown() {
        let attacker = mona();
        let mut target = enemy(10, vec![Element::Wind]);
        let report = resolve_attack(&attacker, &mut target, &garu());
        assert!(report.lethal);
        assert!(!report.one_more);
        assert_eq!(target.hp, 0);
        assert!(!target.alive && target.down);
    }

    #[test]
    fn test_enemy_attack_respects_guard() {
        let attacker = Combatant::new("Jack Frost", 120, 0, 15, 0);
        let mut target = mona();
        assert_eq!(enemy_attack_damage(&attacker, &target), 7);
        target.guarding = true;
        let report = resolve_enemy_attack(&attacker, &mut target);
        assert_eq!(report.damage, 3);
        assert!(!target.down);
    }

    #[test]
    fn test_heal_skill_clamps() {
        let mut target = mona();
        target.apply_damage(10);
        let dia = Ability::new("Dia", 4, -30, Element::None, CostType::Sp);
        assert_eq!(resolve_heal(&mut target, &dia), 10);
        assert_eq!(target.hp, 80);

        target.apply_damage(500);
        assert_eq!(resolve_heal(&mut target, &dia), 0);
        assert_eq!(target.hp, 0);
    }

    #[test]
    fn test_item_revival() {
        let mut target = mona();
        target.apply_damage(500);
        let bead = Item::new("Revival Bead", ItemEffect::Revive(50));
        assert_eq!(resolve_item(&bead, &mut target).unwrap(), 50);
        assert!(target.alive && !target.down);
        assert!(resolve_item(&bead, &mut target).is_err());
    }
}
