//! Ricochet Simulation Core
//!
//! Per-tick ядро side-scroller платформера на Bevy 0.16 (headless ECS).
//!
//! Порядок одного тика (FixedUpdate, SimulationSet chain):
//! Physics → Collision → Behavior (player + enemy FSM) → Projectile →
//! Hitboxes → Hazards → Damage → Death
//!
//! Рендер, аудио, загрузка ассетов и опрос устройств — внешние коллабораторы:
//! они пишут `ActionInput` / `AnimationFinished` и читают компоненты и события.

use bevy::prelude::*;

// Публичные модули
pub mod ai;
pub mod collision;
pub mod combat;
pub mod components;
pub mod config;
pub mod input;
pub mod level;
pub mod logger;
pub mod physics;
pub mod player;
pub mod spatial;

// Re-export базовых типов для удобства
pub use ai::{AIPlugin, EnemyAI, EnemyState, EnemyType};
pub use combat::{
    Boomerang, CheckpointActivated, CombatPlugin, DamageDealt, DamageEvent, DamageSource, EntityDied,
    EntityRemoved, GameOver, Hitbox, PlayerRespawned,
};
pub use components::*;
pub use config::{ConfigError, GameConfig};
pub use input::{Action, ActionInput, ActionState, AnimationFinished};
pub use level::{spawn_level, LevelData, LevelError};
pub use logger::{init_logger, log, log_error, log_info, log_warning, set_log_level, set_logger, LogLevel, LogPrinter};
pub use player::{Player, PlayerPlugin, PlayerState};
pub use spatial::{Aabb, Collider, CollisionTags, SpatialIndex};

/// Фазы одного тика (строго по порядку)
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimulationSet {
    Physics,
    Collision,
    Behavior,
    Projectile,
    Hitboxes,
    Hazards,
    Damage,
    Death,
}

/// Активный чекпоинт: id + позиция респавна (левый верхний угол игрока)
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct ActiveCheckpoint {
    pub id: u32,
    pub position: Vec2,
}

/// Singleton-слоты симуляции.
///
/// Вместо поиска "первой entity типа" системы читают handle отсюда;
/// None → зависимое поведение пропускается на этот тик.
#[derive(Resource, Debug, Clone, Default, PartialEq)]
pub struct SimulationContext {
    pub player: Option<Entity>,
    pub paused: bool,
    pub game_over: bool,
    pub tick: u64,
    /// Seed прогона (симуляция детерминирована, seed нужен replay/коллабораторам)
    pub seed: u64,
    /// Точка спавна уровня (левый верхний угол игрока)
    pub player_spawn: Vec2,
    pub active_checkpoint: Option<ActiveCheckpoint>,
}

fn simulation_running(context: Res<SimulationContext>) -> bool {
    !context.paused
}

fn advance_tick(mut context: ResMut<SimulationContext>) {
    context.tick += 1;
}

/// Главный plugin симуляции (объединяет все подсистемы)
///
/// `GameConfig`, вставленный до plugin'а, сохраняется (иначе Default).
pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        let config = app
            .world()
            .get_resource::<GameConfig>()
            .cloned()
            .unwrap_or_default();

        app
            // Fixed timestep 60Hz: один FixedUpdate = один тик
            .insert_resource(Time::<Fixed>::from_hz(60.0))
            .insert_resource(SpatialIndex::new(config.physics.cell_size))
            .insert_resource(config)
            .init_resource::<ActionInput>()
            .init_resource::<SimulationContext>()
            .configure_sets(
                FixedUpdate,
                (
                    SimulationSet::Physics,
                    SimulationSet::Collision,
                    SimulationSet::Behavior,
                    SimulationSet::Projectile,
                    SimulationSet::Hitboxes,
                    SimulationSet::Hazards,
                    SimulationSet::Damage,
                    SimulationSet::Death,
                )
                    .chain()
                    .distributive_run_if(simulation_running),
            )
            .add_systems(
                FixedUpdate,
                (
                    physics::integrate_velocity.in_set(SimulationSet::Physics),
                    collision::resolve_collisions.in_set(SimulationSet::Collision),
                    advance_tick.after(SimulationSet::Death).run_if(simulation_running),
                ),
            )
            // Подсистемы
            .add_plugins((PlayerPlugin, AIPlugin, CombatPlugin));
    }
}

/// Создаёт minimal Bevy App для headless симуляции
pub fn create_headless_app(seed: u64) -> App {
    let mut app = App::new();
    init_logger();
    app.add_plugins(MinimalPlugins)
        .add_plugins(SimulationPlugin)
        .insert_resource(SimulationContext {
            seed,
            ..Default::default()
        });

    app
}

/// Ровно один тик симуляции (FixedUpdate) + сдвиг буферов событий.
///
/// Тесты шагают этим, а не `app.update()`: число тиков не зависит от wall clock.
pub fn run_tick(app: &mut App) {
    app.world_mut().run_schedule(FixedUpdate);
    combat::update_event_buffers(app.world_mut());
}

/// Snapshot мира для сравнения детерминизма
pub fn world_snapshot<T: Component>(world: &mut World) -> Vec<u8>
where
    T: std::fmt::Debug,
{
    // Собираем все компоненты в детерминированный формат
    let mut snapshot = Vec::new();

    let mut query = world.query::<(Entity, &T)>();
    let mut entities: Vec<_> = query.iter(world).collect();

    // Сортируем по Entity ID для детерминизма
    entities.sort_by_key(|(entity, _)| entity.index());

    // Сериализуем в байты через Debug (простейший способ)
    for (entity, component) in entities {
        snapshot.extend_from_slice(&entity.index().to_le_bytes());
        snapshot.extend_from_slice(format!("{:?}", component).as_bytes());
    }

    snapshot
}
