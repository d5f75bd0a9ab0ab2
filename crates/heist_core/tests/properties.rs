//! Property tests for movement, collision and combat invariants.

use heist_core::math::Aabb;
use heist_core::prelude::*;
use heist_core::tilemap::TILE_WALL;
use heist_test_utils::determinism::strategies::{arb_ability, arb_combatant, arb_movement};
use heist_test_utils::fixtures::{caster, no_items, open_room, shadow, DT};
use proptest::prelude::*;

/// Largest overlap with any wall tile, as a positive depth on the shallower
/// axis. Zero when clear.
fn wall_penetration(body: &Entity, map: &TileMap) -> f32 {
    let tile = Vec2::splat(map.tile_size());
    let mut worst = 0.0f32;
    for row in 0..map.height() {
        for col in 0..map.width() {
            if map.tile_at(col, row) != Some(TILE_WALL) {
                continue;
            }
            let gap = body.aabb().gap(&Aabb::new(map.tile_center(col, row), tile));
            if gap.x < 0.0 && gap.y < 0.0 {
                worst = worst.max((-gap.x).min(-gap.y));
            }
        }
    }
    worst
}

fn player_at(position: Vec2) -> Entity {
    Entity::new(position, EntityKind::Player).with_collider(Vec2::splat(28.0))
}

proptest! {
    /// Any non-zero intent moves at exactly the configured speed,
    /// diagonals included.
    #[test]
    fn prop_velocity_matches_speed(
        movement in arb_movement().prop_filter("moving", |m| *m != Vec2::ZERO),
        speed in 1.0f32..400.0,
    ) {
        let mut body = player_at(Vec2::ZERO).with_speed(speed);
        body.movement = movement;
        body.update(DT, None, None, &[]);
        prop_assert!((body.velocity.length() - speed).abs() <= speed * 1.0e-4);
    }

    /// The trail never grows past its capacity.
    #[test]
    fn prop_breadcrumbs_are_bounded(
        steps in proptest::collection::vec(arb_movement(), 0..600),
    ) {
        let mut body = player_at(Vec2::ZERO);
        for step in &steps {
            body.movement = *step;
            body.update(DT, None, None, &[]);
        }
        prop_assert_eq!(body.history.len(), steps.len().min(Breadcrumbs::CAPACITY));
    }

    /// Walking along one axis in a walled room never ends a tick inside a
    /// wall.
    #[test]
    fn prop_walls_contain_axis_walks(
        start_x in -110.0f32..110.0,
        start_y in -110.0f32..110.0,
        horizontal in any::<bool>(),
        steps in proptest::collection::vec(-1i8..=1, 1..300),
    ) {
        let map = TileMap::from_level(&open_room(10)).unwrap();
        let mut body = player_at(Vec2::new(start_x, start_y));
        for step in steps {
            body.reset_movement();
            match (horizontal, step) {
                (true, 1) => body.move_right(),
                (true, -1) => body.move_left(),
                (false, 1) => body.move_down(),
                (false, -1) => body.move_up(),
                _ => {}
            }
            body.update(DT, None, Some(&map), &[]);
            let depth = wall_penetration(&body, &map);
            prop_assert!(depth < 0.01, "{} units inside a wall at {:?}", depth, body.position);
        }
    }

    /// HP and SP stay inside their bounds whatever is thrown at them.
    #[test]
    fn prop_pools_stay_clamped(
        mut attacker in arb_combatant(),
        mut defender in arb_combatant(),
        ability in arb_ability(),
    ) {
        let _ = attacker.pay_cost(&ability);
        if ability.is_healing() {
            resolve_heal(&mut defender, &ability);
        } else {
            resolve_attack(&attacker, &mut defender, &ability);
        }

        for c in [&attacker, &defender] {
            prop_assert!((0..=c.max_hp).contains(&c.hp));
            prop_assert!((0..=c.max_sp).contains(&c.sp));
            prop_assert_eq!(c.alive, c.hp > 0);
        }
    }

    /// A guarding defender is never knocked down, even by its weakness.
    #[test]
    fn prop_guard_blocks_knockdown(
        attacker in arb_combatant(),
        mut defender in arb_combatant(),
        ability in arb_ability().prop_filter("offensive", |a| !a.is_healing()),
    ) {
        defender.weaknesses.push(ability.element);
        defender.guarding = true;
        defender.down = false;

        let report = resolve_attack(&attacker, &mut defender, &ability);
        prop_assert!(!report.weakness);
        prop_assert!(!report.knocked_down);
        prop_assert!(!report.one_more);
        if defender.alive {
            prop_assert!(!defender.down);
        }
    }

    /// Knocking down the last standing enemy always offers the hold-up,
    /// whichever action lands the final blow.
    #[test]
    fn prop_hold_up_follows_last_knockdown(
        actions in proptest::collection::vec(0u8..3, 1..5),
    ) {
        let joker = caster("Joker").with_equipment(Equipment {
            ranged: Some(Gear::ranged("Pistol", 4, 8)),
            ..Equipment::default()
        });
        let enemies = actions
            .iter()
            .map(|_| shadow("Shadow", 1000, vec![Element::Phys, Element::Gun, Element::Wind]))
            .collect();
        let mut battle = Battle::new(vec![joker], enemies, no_items(), true, 1);

        for (i, action) in actions.iter().enumerate() {
            match action {
                0 => battle.handle(BattleCommand::Attack).unwrap(),
                1 => battle.handle(BattleCommand::Gun).unwrap(),
                _ => {
                    battle.handle(BattleCommand::Skills).unwrap();
                    battle.handle(BattleCommand::Confirm).unwrap();
                }
            }
            for _ in 0..i {
                battle.handle(BattleCommand::Next).unwrap();
            }
            battle.handle(BattleCommand::Confirm).unwrap();
            prop_assert!(battle.enemies()[i].down);

            battle.update(1.0);
            if i + 1 < actions.len() {
                prop_assert_eq!(battle.state(), BattleState::PlayerMain);
            } else {
                prop_assert_eq!(battle.state(), BattleState::HoldUp);
            }
        }
    }
}
