//! Headless симуляция Ricochet
//!
//! Спавнит демо-уровень и прогоняет 1000 тиков со скриптовым input'ом
//! (бег вправо + периодические атаки/броски), без рендера.

use ricochet_simulation::{
    create_headless_app, log_error, run_tick, spawn_level, Action, ActionInput, EnemyAI, Hitbox, LevelData,
    SimulationContext,
};

fn main() {
    let seed = 42;
    println!("Starting Ricochet headless simulation (seed: {})", seed);

    let mut app = create_headless_app(seed);

    let level = LevelData::demo();
    if let Err(err) = spawn_level(app.world_mut(), &level) {
        log_error(&format!("❌ Failed to spawn level '{}': {}", level.name, err));
        std::process::exit(1);
    }

    for tick in 0..1000 {
        script_input(&mut app.world_mut().resource_mut::<ActionInput>(), tick);
        run_tick(&mut app);

        if tick % 100 == 0 {
            let world = app.world_mut();
            let enemies = world.query::<&EnemyAI>().iter(world).count();
            let hitboxes = world.query::<&Hitbox>().iter(world).count();
            let context = world.resource::<SimulationContext>();
            println!(
                "Tick {}: {} entities, {} enemies, {} hitboxes, game over: {}",
                tick,
                world.entities().len(),
                enemies,
                hitboxes,
                context.game_over
            );
        }

        if app.world().resource::<SimulationContext>().game_over {
            println!("Game over at tick {}", tick);
            break;
        }
    }

    println!("Simulation complete!");
}

/// Детерминированный сценарий: бежим вправо, бьём каждые 40 тиков,
/// бросаем бумеранг каждые 150
fn script_input(input: &mut ActionInput, tick: u32) {
    input.set_held(Action::MoveRight, true);
    input.set_held(Action::Attack, tick % 40 < 3);
    input.set_held(Action::Boomerang, tick % 150 >= 100 && tick % 150 < 120);
    input.set_held(Action::Jump, tick % 90 == 45);
}
