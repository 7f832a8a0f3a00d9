//! Статичная геометрия уровня и триггер-зоны

use bevy::prelude::*;

/// Маркер: статичная геометрия (solid / platform / ramp)
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct StaticGeometry;

/// Зона мгновенной смерти (пропасть, шипы)
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct DeadZone;

/// Чекпоинт: при касании игроком становится точкой респавна
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Reflect)]
#[reflect(Component)]
pub struct Checkpoint {
    pub id: u32,
}
