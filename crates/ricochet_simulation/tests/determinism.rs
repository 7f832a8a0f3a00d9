//! Тесты детерминизма
//!
//! Один и тот же уровень + один и тот же скрипт input'а → идентичный мир.

use bevy::prelude::*;
use ricochet_simulation::{
    create_headless_app, run_tick, spawn_level, world_snapshot, Action, ActionInput, Collider, Health, LevelData,
    PhysicsBody,
};

#[test]
fn test_determinism_same_seed() {
    const SEED: u64 = 12345;
    const TICK_COUNT: u32 = 600;

    // Первый прогон
    let snapshot1 = run_simulation(SEED, TICK_COUNT);

    // Второй прогон с тем же seed
    let snapshot2 = run_simulation(SEED, TICK_COUNT);

    assert_eq!(
        snapshot1, snapshot2,
        "Симуляция с одинаковым seed ({}) дала разные результаты!",
        SEED
    );
}

#[test]
fn test_determinism_multiple_runs() {
    const SEED: u64 = 42;
    const TICK_COUNT: u32 = 400;

    // Запускаем 5 раз — все должны быть идентичны
    let snapshots: Vec<_> = (0..5).map(|_| run_simulation(SEED, TICK_COUNT)).collect();

    for (i, snapshot) in snapshots.iter().enumerate().skip(1) {
        assert_eq!(
            snapshots[0], *snapshot,
            "Прогон {} дал результат отличный от прогона 0",
            i
        );
    }
}

/// Скрипт: бег вправо, прыжки, атаки и бросок бумеранга
fn script_input(input: &mut ActionInput, tick: u32) {
    input.set_held(Action::MoveRight, tick % 200 < 150);
    input.set_held(Action::MoveLeft, tick % 200 >= 170);
    input.set_held(Action::Jump, tick % 60 == 30);
    input.set_held(Action::Attack, tick % 25 < 4);
    input.set_held(Action::Boomerang, tick % 180 >= 120 && tick % 180 < 140);
}

/// Запускает симуляцию демо-уровня и возвращает snapshot мира
fn run_simulation(seed: u64, tick_count: u32) -> Vec<u8> {
    let mut app = create_headless_app(seed);
    spawn_level(app.world_mut(), &LevelData::demo()).expect("demo level spawns");

    for tick in 0..tick_count {
        script_input(&mut app.world_mut().resource_mut::<ActionInput>(), tick);
        run_tick(&mut app);
    }

    let world = app.world_mut();
    let mut snapshot = world_snapshot::<Collider>(world);
    snapshot.extend(world_snapshot::<PhysicsBody>(world));
    snapshot.extend(world_snapshot::<Health>(world));
    snapshot
}
