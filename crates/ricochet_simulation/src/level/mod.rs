//! Level geometry: данные уровня (RON) → статичные entities + игрок + враги.
//!
//! Парсинг tile-map'ов — внешний коллаборатор; сюда приходят уже
//! готовые прямоугольники, рампы, пути патруля и точки спавна.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

use crate::ai::{enemy_bundle, EnemyAI, EnemyType};
use crate::combat::{FireHazard, FireMode};
use crate::components::{Checkpoint, DeadZone, StaticGeometry};
use crate::config::GameConfig;
use crate::player::player_bundle;
use crate::spatial::{Aabb, Collider, CollisionTags, Slope, SpatialIndex};
use crate::SimulationContext;

#[derive(Debug, Error)]
pub enum LevelError {
    #[error("failed to read level file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse RON level: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("level has no player spawn point")]
    NoPlayerSpawn,
    #[error("degenerate {kind} #{index}: {rect:?}")]
    DegenerateGeometry {
        kind: &'static str,
        index: usize,
        rect: Aabb,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RampData {
    pub rect: Aabb,
    pub slope: Slope,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CheckpointData {
    pub id: u32,
    pub rect: Aabb,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FireData {
    pub rect: Aabb,
    #[serde(default)]
    pub pulsing: bool,
    /// None → `hazards.fire_damage`
    #[serde(default)]
    pub damage: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemySpawn {
    /// Левый верхний угол коллайдера
    pub position: (f32, f32),
    #[serde(default)]
    pub enemy_type: Option<String>,
    #[serde(default)]
    pub patrol_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelData {
    pub name: String,
    pub solids: Vec<Aabb>,
    pub platforms: Vec<Aabb>,
    pub ramps: Vec<RampData>,
    /// Tile layer без дискретных объектов: только теги клеток индекса
    pub solid_tiles: Vec<Aabb>,
    pub dead_zones: Vec<Aabb>,
    pub checkpoints: Vec<CheckpointData>,
    pub fires: Vec<FireData>,
    /// Именованные polyline'ы (точки в мировых координатах)
    pub patrol_paths: BTreeMap<String, Vec<(f32, f32)>>,
    /// Левый верхний угол игрока; используется первая
    pub player_spawns: Vec<(f32, f32)>,
    pub enemy_spawns: Vec<EnemySpawn>,
}

/// Пути патруля уровня
#[derive(Resource, Debug, Clone, Default, PartialEq)]
pub struct PatrolPaths(pub BTreeMap<String, Vec<Vec2>>);

impl PatrolPaths {
    /// Границы патруля по X (min/max точек пути)
    pub fn bounds(&self, name: &str) -> Option<(f32, f32)> {
        let points = self.0.get(name)?;
        let first = points.first()?;
        Some(points.iter().fold((first.x, first.x), |(lo, hi), p| (lo.min(p.x), hi.max(p.x))))
    }
}

impl LevelData {
    pub fn from_ron_str(source: &str) -> Result<Self, LevelError> {
        Ok(ron::from_str(source)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, LevelError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_ron_str(&content)
    }

    /// Проверка геометрии до спавна (ничего не спавнится при ошибке)
    pub fn validate(&self) -> Result<(), LevelError> {
        if self.player_spawns.is_empty() {
            return Err(LevelError::NoPlayerSpawn);
        }

        let groups: [(&'static str, Vec<Aabb>); 7] = [
            ("solid", self.solids.clone()),
            ("platform", self.platforms.clone()),
            ("ramp", self.ramps.iter().map(|r| r.rect).collect()),
            ("solid tile", self.solid_tiles.clone()),
            ("dead zone", self.dead_zones.clone()),
            ("checkpoint", self.checkpoints.iter().map(|c| c.rect).collect()),
            ("fire", self.fires.iter().map(|f| f.rect).collect()),
        ];

        for (kind, rects) in groups {
            if let Some((index, rect)) = rects.iter().enumerate().find(|(_, rect)| !rect.is_valid()) {
                return Err(LevelError::DegenerateGeometry {
                    kind,
                    index,
                    rect: *rect,
                });
            }
        }

        Ok(())
    }

    /// Встроенный демо-уровень (headless бинарник, интеграционные тесты)
    pub fn demo() -> Self {
        let mut patrol_paths = BTreeMap::new();
        patrol_paths.insert("yard".to_string(), vec![(420.0, 160.0), (520.0, 160.0)]);

        Self {
            name: "demo".to_string(),
            solids: vec![
                Aabb::new(0.0, 200.0, 560.0, 40.0),
                Aabb::new(640.0, 200.0, 320.0, 40.0),
                Aabb::new(944.0, 80.0, 16.0, 120.0),
            ],
            platforms: vec![Aabb::new(160.0, 150.0, 64.0, 8.0)],
            ramps: vec![RampData {
                rect: Aabb::new(288.0, 168.0, 64.0, 32.0),
                slope: Slope::UpRight,
            }],
            solid_tiles: vec![Aabb::new(0.0, 48.0, 128.0, 16.0)],
            dead_zones: vec![Aabb::new(560.0, 300.0, 80.0, 40.0)],
            checkpoints: vec![CheckpointData {
                id: 1,
                rect: Aabb::new(660.0, 160.0, 16.0, 40.0),
            }],
            fires: vec![FireData {
                rect: Aabb::new(720.0, 184.0, 16.0, 16.0),
                pulsing: true,
                damage: None,
            }],
            patrol_paths,
            player_spawns: vec![(32.0, 160.0)],
            enemy_spawns: vec![
                EnemySpawn {
                    position: (460.0, 160.0),
                    enemy_type: Some("guard".to_string()),
                    patrol_path: Some("yard".to_string()),
                },
                EnemySpawn {
                    position: (800.0, 156.0),
                    enemy_type: Some("brute".to_string()),
                    patrol_path: None,
                },
            ],
        }
    }
}

/// Спавнит уровень в мир. Возвращает entity игрока.
///
/// Статичная геометрия регистрируется в индексе через Collider hooks,
/// solid tiles помечают клетки индекса напрямую.
pub fn spawn_level(world: &mut World, level: &LevelData) -> Result<Entity, LevelError> {
    level.validate()?;

    let config = world.get_resource::<GameConfig>().cloned().unwrap_or_default();
    if !world.contains_resource::<SpatialIndex>() {
        world.insert_resource(SpatialIndex::new(config.physics.cell_size));
    }

    for rect in &level.solids {
        world.spawn((StaticGeometry, Collider::new(*rect, CollisionTags::SOLID)));
    }
    for rect in &level.platforms {
        world.spawn((StaticGeometry, Collider::new(*rect, CollisionTags::PLATFORM)));
    }
    for ramp in &level.ramps {
        world.spawn((StaticGeometry, Collider::ramp(ramp.rect, ramp.slope)));
    }
    if let Some(mut index) = world.get_resource_mut::<SpatialIndex>() {
        for rect in &level.solid_tiles {
            index.tag_cells(rect, CollisionTags::SOLID);
        }
    }

    for rect in &level.dead_zones {
        world.spawn((DeadZone, Collider::new(*rect, CollisionTags::DEADZONE)));
    }
    for checkpoint in &level.checkpoints {
        world.spawn((
            Checkpoint { id: checkpoint.id },
            Collider::new(checkpoint.rect, CollisionTags::CHECKPOINT),
        ));
    }

    let hazards = &config.hazards;
    for fire in &level.fires {
        let mode = if fire.pulsing {
            FireMode::Pulsing {
                on_frames: hazards.pulse_on_frames,
                off_frames: hazards.pulse_off_frames,
            }
        } else {
            FireMode::Continuous
        };
        let damage = fire.damage.unwrap_or(hazards.fire_damage);
        world.spawn((
            FireHazard::new(mode, damage, hazards.fire_knockback),
            Collider::new(fire.rect, CollisionTags::FIRE),
        ));
    }

    let paths = PatrolPaths(
        level
            .patrol_paths
            .iter()
            .map(|(name, points)| {
                let points = points.iter().map(|&(x, y)| Vec2::new(x, y)).collect();
                (name.clone(), points)
            })
            .collect(),
    );

    let (spawn_x, spawn_y) = level.player_spawns[0];
    let spawn = Vec2::new(spawn_x, spawn_y);
    let player = world.spawn(player_bundle(spawn, &config)).id();

    for enemy in &level.enemy_spawns {
        let type_name = enemy
            .enemy_type
            .as_deref()
            .unwrap_or(&config.enemy.default_type);
        let enemy_type = EnemyType::resolve(type_name, &config);

        let (x, y) = enemy.position;
        let ai = match enemy.patrol_path.as_deref() {
            Some(name) => match paths.bounds(name) {
                Some((left, right)) => EnemyAI::new(left, right).with_path(name),
                None => {
                    crate::log_warning(&format!(
                        "⚠️ Unknown patrol path '{}', using default patrol range",
                        name
                    ));
                    default_patrol(x, &config)
                }
            },
            None => default_patrol(x, &config),
        };

        world.spawn(enemy_bundle(Vec2::new(x, y), enemy_type, ai));
    }

    world.insert_resource(paths);

    let mut context = world.get_resource_or_insert_with(SimulationContext::default);
    context.player = Some(player);
    context.player_spawn = spawn;
    context.active_checkpoint = None;
    context.game_over = false;

    crate::log_info(&format!(
        "🗺️ Level '{}' spawned: {} solids, {} platforms, {} ramps, {} enemies",
        level.name,
        level.solids.len(),
        level.platforms.len(),
        level.ramps.len(),
        level.enemy_spawns.len()
    ));

    Ok(player)
}

fn default_patrol(x: f32, config: &GameConfig) -> EnemyAI {
    let distance = config.enemy.default_patrol_distance;
    EnemyAI::new(x - distance, x + distance)
}
