//! Movement components: скорость + контактные ссылки

use bevy::prelude::*;

use crate::spatial::CellCoord;

/// Скорость и физические параметры персонажа.
///
/// Меняется только Physics Integrator'ом и Collision Resolver'ом
/// (FSM выставляют намерение: ускорение, прыжок, drop-through).
#[derive(Component, Debug, Clone, Copy, PartialEq, Reflect)]
#[reflect(Component)]
pub struct PhysicsBody {
    pub speed_x: f32,
    pub speed_y: f32,
    pub gravity: f32,
    pub friction: f32,
    /// Friction во время атак (вместо `friction`)
    pub attack_friction: f32,
    pub max_speed: f32,
    /// Выставляется FSM: атака/бросок → attack_friction
    pub attack_friction_active: bool,
    /// Может ли цепляться за стены (wall slide)
    pub can_wall_slide: bool,

    /// Поверхность под ногами
    pub grounded: Option<Entity>,
    /// Стена, по которой скользим
    pub wall_sliding: Option<Entity>,
    /// Платформа, сквозь которую проваливаемся (drop-through)
    pub ignore_platform: Option<Entity>,

    /// Клетка tile layer'а под ногами (земля без дискретного объекта)
    pub ground_cell: Option<CellCoord>,
    /// Клетка tile layer'а, по которой скользим
    pub wall_cell: Option<CellCoord>,
}

impl Default for PhysicsBody {
    fn default() -> Self {
        Self {
            speed_x: 0.0,
            speed_y: 0.0,
            gravity: 0.75,
            friction: 0.5,
            attack_friction: 0.2,
            max_speed: 6.0,
            attack_friction_active: false,
            can_wall_slide: false,
            grounded: None,
            wall_sliding: None,
            ignore_platform: None,
            ground_cell: None,
            wall_cell: None,
        }
    }
}

impl PhysicsBody {
    pub fn new(gravity: f32, friction: f32, attack_friction: f32, max_speed: f32) -> Self {
        Self {
            gravity,
            friction,
            attack_friction,
            max_speed,
            ..Default::default()
        }
    }

    /// Стоит на объекте или на solid-клетке
    pub fn is_grounded(&self) -> bool {
        self.grounded.is_some() || self.ground_cell.is_some()
    }

    pub fn is_wall_sliding(&self) -> bool {
        self.wall_sliding.is_some() || self.wall_cell.is_some()
    }

    pub fn clear_ground(&mut self) {
        self.grounded = None;
        self.ground_cell = None;
    }

    pub fn release_wall(&mut self) {
        self.wall_sliding = None;
        self.wall_cell = None;
    }

    /// Полная остановка + сброс контактов (респавн, смерть)
    pub fn reset_motion(&mut self) {
        self.speed_x = 0.0;
        self.speed_y = 0.0;
        self.clear_ground();
        self.release_wall();
        self.ignore_platform = None;
        self.attack_friction_active = false;
    }
}
