//! Simulation benchmarks for heist_core.
//!
//! Run with: `cargo bench -p heist_core`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use heist_core::flocking::update_party;
use heist_core::prelude::*;
use heist_test_utils::fixtures::{enemy_at, exploration, guard_at, open_room, square_walk, LevelFixture, DT};

fn patrolled_level() -> LevelData {
    let mut level = open_room(40);
    for i in 0..8 {
        let x = -400.0 + i as f32 * 100.0;
        level = level.with_enemy(guard_at(x, -400.0, (x, 400.0), Direction::Down));
    }
    level
        .with_enemy(enemy_at(300.0, 300.0, AiArchetype::Wanderer, Direction::Up))
        .with_enemy(enemy_at(-300.0, 300.0, AiArchetype::Searchlight, Direction::Right))
}

/// One second of world ticks with patrolling guards.
pub fn exploration_benchmark(c: &mut Criterion) {
    let level = patrolled_level();
    let script = square_walk(15);

    c.bench_function("exploration_60_ticks", |b| {
        b.iter_batched(
            || exploration(&level),
            |mut world| {
                for input in &script {
                    black_box(world.tick(DT, *input));
                }
                world
            },
            BatchSize::SmallInput,
        );
    });
}

/// One flocking pass over a large follower roster.
pub fn flocking_benchmark(c: &mut Criterion) {
    let params = FlockParams::default();
    let mut leader = Entity::new(Vec2::ZERO, EntityKind::Player);
    for i in 0..20 {
        leader.history.record(Vec2::new(i as f32 * 4.0, 0.0));
    }
    let tuning = AiTuning::default();
    let followers: Vec<Entity> = (0..32)
        .map(|i| {
            let pos = Vec2::new(-(i as f32) * 12.0, (i % 4) as f32 * 12.0);
            Entity::new(pos, EntityKind::Npc)
                .with_ai(AiBrain::new(AiArchetype::Follower, pos, pos, tuning))
                .with_salt(i as f32)
        })
        .collect();

    c.bench_function("flocking_32_followers", |b| {
        b.iter_batched(
            || followers.clone(),
            |mut roster| {
                update_party(&leader, &mut roster, None, DT, 1.0, &params);
                roster
            },
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, exploration_benchmark, flocking_benchmark);
criterion_main!(benches);
