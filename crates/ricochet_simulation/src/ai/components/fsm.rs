//! Enemy AI components (state, patrol bounds, cached type).

use bevy::prelude::*;

use crate::components::{Combatant, CombatantKind, Facing, Health, PhysicsBody, StateMachine};
use crate::config::{EnemyTypeConfig, GameConfig};
use crate::spatial::{Aabb, Collider, CollisionTags};

/// Enemy FSM состояния
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect)]
pub enum EnemyState {
    /// Patrol — ходит между patrol_left и patrol_right
    Patrol,
    /// Chase — идёт к игроку, держит stopping_distance
    Chase,
    /// Attack — стоит на месте attack_duration кадров (хитбокс на первом кадре)
    Attack,
    /// Hit — получил урон, ждёт hitstun_duration
    Hit,
}

/// Параметры поведения конкретного врага
#[derive(Component, Debug, Clone, PartialEq, Reflect)]
#[reflect(Component)]
pub struct EnemyAI {
    /// Границы патруля (x левого края коллайдера)
    pub patrol_left: f32,
    pub patrol_right: f32,
    /// Имя patrol path из уровня (если был задан)
    pub patrol_path: Option<String>,
    /// Кадры до следующей атаки (0 = можно атаковать)
    pub attack_cooldown: u32,
}

impl EnemyAI {
    pub fn new(patrol_left: f32, patrol_right: f32) -> Self {
        Self {
            patrol_left: patrol_left.min(patrol_right),
            patrol_right: patrol_left.max(patrol_right),
            patrol_path: None,
            attack_cooldown: 0,
        }
    }

    pub fn with_path(mut self, name: impl Into<String>) -> Self {
        self.patrol_path = Some(name.into());
        self
    }
}

/// Тип врага: резолвится один раз при спавне и кешируется на entity
#[derive(Component, Debug, Clone, PartialEq)]
pub struct EnemyType {
    pub name: String,
    pub config: EnemyTypeConfig,
}

impl EnemyType {
    /// Неизвестное имя → default тип (warning в лог)
    pub fn resolve(name: &str, config: &GameConfig) -> Self {
        let resolved = if config.enemy.types.contains_key(name) {
            name.to_string()
        } else {
            config.enemy.default_type.clone()
        };

        Self {
            name: resolved,
            config: config.enemy_type(name),
        }
    }
}

/// Bundle врага. `position` — левый верхний угол коллайдера.
pub fn enemy_bundle(
    position: Vec2,
    enemy_type: EnemyType,
    ai: EnemyAI,
) -> impl Bundle {
    let tc = &enemy_type.config;

    let mut combatant = Combatant::new(CombatantKind::Enemy, tc.invuln_frames);
    combatant.facing = Facing::Left;

    let collider = Collider::new(
        Aabb::new(position.x, position.y, tc.collision_width, tc.collision_height),
        CollisionTags::CHARACTER | CollisionTags::ENEMY,
    );

    (
        StateMachine::new(EnemyState::Patrol),
        PhysicsBody::new(tc.gravity, tc.friction, tc.friction, tc.max_speed),
        combatant,
        Health::new(tc.health),
        collider,
        ai,
        enemy_type,
    )
}
