//! Determinism testing utilities.
//!
//! Provides a harness for verifying that a level or battle produces
//! identical results given identical inputs.
//!
//! # Testing Strategy
//!
//! The world tick uses `f32`, so bit-for-bit reproducibility only holds on
//! the same build and target. Within that, the sources of divergence are:
//!
//! - **Iteration order**: every roster is a `Vec` walked in spawn order.
//! - **Randomness**: only battles roll dice, through a seeded `StdRng`.
//! - **Wall-clock time**: follower jitter uses simulated time, never the
//!   system clock.
//!
//! # Test Levels
//!
//! 1. **Unit tests**: `state_hash` equality for two runs of one module
//! 2. **Property tests**: random input scripts still reproduce
//! 3. **Parallel tests**: runs on separate threads match

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::thread;

use heist_core::battle::{Battle, BattleCommand};
use heist_core::data::LevelData;
use heist_core::exploration::{Exploration, ExplorationInput, LevelProgress, SessionState};

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Final hash from each run.
    pub hashes: Vec<u64>,
    /// Number of steps per run.
    pub steps: u64,
}

impl DeterminismResult {
    fn from_hashes(hashes: Vec<u64>, steps: u64) -> Self {
        Self {
            is_deterministic: hashes.windows(2).all(|w| w[0] == w[1]),
            hashes,
            steps,
        }
    }

    /// Distinct hashes seen (one for a deterministic run).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that every run matched.
    ///
    /// # Panics
    ///
    /// Panics with the diverging hashes if the runs differ.
    pub fn assert_deterministic(&self) {
        assert!(
            self.is_deterministic,
            "Runs diverged after {} steps: {} unique hashes in {:?}",
            self.steps,
            self.unique_hashes().len(),
            self.hashes
        );
    }
}

/// Run a setup and step function several times and compare final hashes.
///
/// # Arguments
///
/// * `runs` - Number of independent runs
/// * `steps` - Steps per run
/// * `setup` - Builds the initial state
/// * `step` - Advances the state by one step (given the step index)
/// * `hash` - Hashes the final state
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    steps: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S, u64),
    HashFn: Fn(&S) -> u64,
{
    let hashes = (0..runs)
        .map(|_| {
            let mut state = setup();
            for i in 0..steps {
                step(&mut state, i);
            }
            hash(&state)
        })
        .collect();
    DeterminismResult::from_hashes(hashes, steps)
}

/// Play an input script through a level twice and compare.
///
/// The script is replayed from the start; once it runs out the player
/// stands still.
pub fn verify_exploration_determinism<F>(setup: F, script: &[ExplorationInput], dt: f32) -> DeterminismResult
where
    F: Fn() -> Exploration,
{
    verify_determinism(
        2,
        script.len() as u64,
        setup,
        |world, i| {
            let input = script.get(i as usize).copied().unwrap_or_default();
            world.tick(dt, input);
        },
        Exploration::state_hash,
    )
}

/// Compare two runs tick by tick and report the first tick that differs.
///
/// Returns `None` if the runs agree throughout, `Some(0)` if they already
/// differ before the first tick.
pub fn find_first_divergence<F>(setup: F, script: &[ExplorationInput], dt: f32) -> Option<u64>
where
    F: Fn() -> Exploration,
{
    let mut a = setup();
    let mut b = setup();
    if a.state_hash() != b.state_hash() {
        return Some(0);
    }
    for (tick, input) in (1u64..).zip(script) {
        a.tick(dt, *input);
        b.tick(dt, *input);
        if a.state_hash() != b.state_hash() {
            tracing::warn!(tick, "Exploration runs diverged");
            return Some(tick);
        }
    }
    None
}

/// Run the same level script on separate threads and collect final hashes.
///
/// # Panics
///
/// Panics if a worker thread panics.
pub fn run_parallel_explorations<F>(
    setup: F,
    script: &[ExplorationInput],
    dt: f32,
    num_runs: usize,
) -> DeterminismResult
where
    F: Fn() -> Exploration + Sync,
{
    let hashes = thread::scope(|s| {
        let handles: Vec<_> = (0..num_runs)
            .map(|_| {
                s.spawn(|| {
                    let mut world = setup();
                    for input in script {
                        world.tick(dt, *input);
                    }
                    world.state_hash()
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().expect("exploration thread panicked"))
            .collect()
    });
    DeterminismResult::from_hashes(hashes, script.len() as u64)
}

/// Hash of everything observable about a battle.
#[must_use]
pub fn battle_hash(battle: &Battle) -> u64 {
    let mut hasher = DefaultHasher::new();
    battle.state().hash(&mut hasher);
    battle.active_member().hash(&mut hasher);
    battle.party().hash(&mut hasher);
    battle.enemies().hash(&mut hasher);
    battle.inventory().len().hash(&mut hasher);
    battle.log().hash(&mut hasher);
    hasher.finish()
}

/// Feed the same commands and time steps to two battles built by `setup`
/// and compare.
///
/// Each step sends the command (rejections are ignored) and then advances
/// the battle by `dt`.
pub fn verify_battle_determinism<F>(setup: F, commands: &[Option<BattleCommand>], dt: f32) -> DeterminismResult
where
    F: Fn() -> Battle,
{
    verify_determinism(
        2,
        commands.len() as u64,
        setup,
        |battle, i| {
            if let Some(command) = commands[i as usize] {
                let _ = battle.handle(command);
            }
            battle.update(dt);
        },
        battle_hash,
    )
}

/// Check that progress and session survive a RON round trip and restore
/// into a fresh level with the same flags.
pub fn verify_progress_persistence(world: &Exploration, level: &LevelData) -> bool {
    let saved = match (
        ron::to_string(&world.progress()),
        ron::to_string(world.session()),
    ) {
        (Ok(progress), Ok(session)) => (progress, session),
        _ => return false,
    };

    let progress: LevelProgress = match ron::from_str(&saved.0) {
        Ok(p) => p,
        Err(_) => return false,
    };
    let session: SessionState = match ron::from_str(&saved.1) {
        Ok(s) => s,
        Err(_) => return false,
    };

    let Ok(mut restored) = Exploration::new(level, world.config().clone(), session) else {
        return false;
    };
    if restored.restore_progress(&progress).is_err() {
        return false;
    }
    restored.progress() == world.progress() && restored.session() == world.session()
}

/// Compute a simple hash for any hashable value.
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Proptest strategies for simulation inputs.
pub mod strategies {
    use heist_core::combatant::{Ability, Combatant, CostType, Element};
    use heist_core::exploration::ExplorationInput;
    use heist_core::math::{Direction, Vec2};
    use proptest::prelude::*;

    /// Any cardinal direction.
    pub fn arb_direction() -> impl Strategy<Value = Direction> {
        prop_oneof![
            Just(Direction::Left),
            Just(Direction::Up),
            Just(Direction::Right),
            Just(Direction::Down),
        ]
    }

    /// A world position in a typical level range.
    pub fn arb_position(extent: f32) -> impl Strategy<Value = Vec2> {
        (-extent..extent, -extent..extent).prop_map(|(x, y)| Vec2::new(x, y))
    }

    /// Any movement intent, including zero and diagonals.
    pub fn arb_movement() -> impl Strategy<Value = Vec2> {
        (-1i8..=1, -1i8..=1).prop_map(|(x, y)| Vec2::new(f32::from(x), f32::from(y)))
    }

    /// One tick of player input.
    pub fn arb_input() -> impl Strategy<Value = ExplorationInput> {
        (any::<bool>(), any::<bool>(), any::<bool>(), any::<bool>(), any::<bool>()).prop_map(
            |(up, down, left, right, interact)| ExplorationInput {
                up,
                down,
                left,
                right,
                interact,
            },
        )
    }

    /// A sequence of inputs.
    pub fn arb_input_script(max_len: usize) -> impl Strategy<Value = Vec<ExplorationInput>> {
        proptest::collection::vec(arb_input(), 1..max_len)
    }

    /// Any element.
    pub fn arb_element() -> impl Strategy<Value = Element> {
        prop_oneof![
            Just(Element::None),
            Just(Element::Phys),
            Just(Element::Gun),
            Just(Element::Fire),
            Just(Element::Ice),
            Just(Element::Elec),
            Just(Element::Wind),
            Just(Element::Psi),
            Just(Element::Nuke),
            Just(Element::Bless),
            Just(Element::Curse),
        ]
    }

    /// An offensive or healing ability with an SP cost.
    pub fn arb_ability() -> impl Strategy<Value = Ability> {
        (0i32..20, -100i32..200, arb_element())
            .prop_map(|(cost, magnitude, element)| Ability::new("Skill", cost, magnitude, element, CostType::Sp))
    }

    /// A combatant with random stats and weaknesses.
    pub fn arb_combatant() -> impl Strategy<Value = Combatant> {
        (
            1i32..500,
            0i32..100,
            0i32..50,
            0i32..50,
            proptest::collection::vec(arb_element(), 0..4),
            any::<bool>(),
        )
            .prop_map(|(hp, sp, attack, defense, weaknesses, guarding)| {
                let mut c = Combatant::new("Prop", hp, sp, attack, defense).with_weaknesses(weaknesses);
                c.guarding = guarding;
                c
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{caster, enemy_at, exploration, guard_at, open_room, shadow, square_walk, LevelFixture, DT};
    use heist_core::ai::AiArchetype;
    use heist_core::combatant::Element;
    use heist_core::items::Inventory;
    use heist_core::math::Direction;
    use proptest::prelude::*;

    // =========================================================================
    // Basic determinism tests
    // =========================================================================

    #[test]
    fn test_verify_determinism_simple() {
        let result = verify_determinism(3, 100, || 0u64, |n, _| *n += 1, |n| *n);
        assert!(result.is_deterministic);
        assert_eq!(result.hashes, vec![100, 100, 100]);
    }

    #[test]
    fn test_empty_level_determinism() {
        let level = open_room(12);
        let result = verify_exploration_determinism(|| exploration(&level), &square_walk(30), DT);
        result.assert_deterministic();
    }

    #[test]
    fn test_patrolling_guards_determinism() {
        let level = open_room(20)
            .with_enemy(guard_at(-200.0, -200.0, (-200.0, 200.0), Direction::Down))
            .with_enemy(enemy_at(200.0, 200.0, AiArchetype::Wanderer, Direction::Up));
        let script = square_walk(60);
        assert!(find_first_divergence(|| exploration(&level), &script, DT).is_none());
    }

    #[test]
    fn test_parallel_runs_match() {
        let level = open_room(12);
        let result = run_parallel_explorations(|| exploration(&level), &square_walk(20), DT, 4);
        result.assert_deterministic();
        assert_eq!(result.hashes.len(), 4);
    }

    #[test]
    fn test_seeded_battle_determinism() {
        let setup = || {
            Battle::new(
                vec![caster("Mona"), caster("Morgana")],
                vec![shadow("Pixie", 200, vec![Element::Wind]), shadow("Shadow", 200, vec![])],
                Inventory::default(),
                false,
                42,
            )
        };
        let mut commands = vec![None; 10];
        commands.extend([Some(BattleCommand::Attack), Some(BattleCommand::Confirm)]);
        commands.extend(vec![None; 10]);
        verify_battle_determinism(setup, &commands, 0.5).assert_deterministic();
    }

    #[test]
    fn test_progress_persistence() {
        let level = open_room(12);
        let mut world = exploration(&level);
        for input in square_walk(10) {
            world.tick(DT, input);
        }
        assert!(verify_progress_persistence(&world, &level));
    }

    // =========================================================================
    // Property tests
    // =========================================================================

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        /// Any input script replays identically.
        #[test]
        fn prop_input_scripts_are_deterministic(script in strategies::arb_input_script(120)) {
            let level = open_room(14).with_enemy(guard_at(100.0, -100.0, (100.0, 100.0), Direction::Down));
            let result = verify_exploration_determinism(|| exploration(&level), &script, DT);
            prop_assert!(result.is_deterministic);
        }
    }
}
