//! Базовые компоненты персонажей: Health, Lives, Death, Combatant

use bevy::prelude::*;

use crate::spatial::CollisionTags;

/// Здоровье персонажа
///
/// Инвариант: 0 ≤ current ≤ max
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Reflect)]
#[reflect(Component)]
pub struct Health {
    pub current: u32,
    pub max: u32,
}

impl Default for Health {
    fn default() -> Self {
        Self::new(100) // Default 100 HP
    }
}

impl Health {
    pub fn new(max: u32) -> Self {
        Self { current: max, max }
    }

    pub fn is_alive(&self) -> bool {
        self.current > 0
    }

    pub fn take_damage(&mut self, amount: u32) {
        self.current = self.current.saturating_sub(amount);
    }

    pub fn heal(&mut self, amount: u32) {
        self.current = self.current.saturating_add(amount).min(self.max);
    }

    /// Знаковый урон: отрицательный лечит. Результат клампится в [0, max].
    pub fn apply_damage(&mut self, amount: i32) {
        let next = i64::from(self.current) - i64::from(amount);
        self.current = next.clamp(0, i64::from(self.max)) as u32;
    }

    pub fn clamp(&mut self) {
        self.current = self.current.min(self.max);
    }

    pub fn restore(&mut self) {
        self.current = self.max;
    }
}

/// Оставшиеся жизни игрока
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Reflect)]
#[reflect(Component)]
pub struct Lives {
    pub remaining: u32,
}

/// Обратный отсчёт смерти (кадры). Максимум один на entity.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Reflect)]
#[reflect(Component)]
pub struct Death {
    pub timer: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Reflect)]
pub enum Facing {
    Left,
    #[default]
    Right,
}

impl Facing {
    pub fn sign(self) -> f32 {
        match self {
            Facing::Left => -1.0,
            Facing::Right => 1.0,
        }
    }

    pub fn flipped(self) -> Self {
        match self {
            Facing::Left => Facing::Right,
            Facing::Right => Facing::Left,
        }
    }

    /// Направление на точку `to` из `from` (при равенстве — Right)
    pub fn towards(from: f32, to: f32) -> Self {
        if to < from {
            Facing::Left
        } else {
            Facing::Right
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub enum CombatantKind {
    Player,
    Enemy,
}

/// Общая боевая способность игрока и врагов.
///
/// Hit/collision логика пишется один раз против Combatant, без ветвления
/// "игрок или враг" по конкретным типам.
#[derive(Component, Debug, Clone, Copy, PartialEq, Reflect)]
#[reflect(Component)]
pub struct Combatant {
    pub kind: CombatantKind,
    pub facing: Facing,
    /// Текущие кадры неуязвимости (тикают каждый кадр)
    pub invuln_frames: u32,
    /// Сколько кадров неуязвимости выдаётся при попадании (зависит от типа)
    pub hit_invuln_frames: u32,
    /// Хитбокс текущей атаки (если жив)
    pub active_hitbox: Option<Entity>,
    /// Guard: хитбоксы этой атаки уже заспавнены
    pub hitbox_spawned: bool,
}

impl Combatant {
    pub fn new(kind: CombatantKind, hit_invuln_frames: u32) -> Self {
        Self {
            kind,
            facing: Facing::Right,
            invuln_frames: 0,
            hit_invuln_frames,
            active_hitbox: None,
            hitbox_spawned: false,
        }
    }

    pub fn is_invulnerable(&self) -> bool {
        self.invuln_frames > 0
    }

    /// Теги целей, которых бьют атаки этого персонажа
    pub fn opposing_tags(&self) -> CollisionTags {
        match self.kind {
            CombatantKind::Player => CollisionTags::ENEMY,
            CombatantKind::Enemy => CollisionTags::PLAYER,
        }
    }

    /// Новая атака: guard сбрасывается
    pub fn begin_attack(&mut self) {
        self.hitbox_spawned = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_damage() {
        let mut health = Health::new(100);
        assert_eq!(health.current, 100);

        health.take_damage(30);
        assert_eq!(health.current, 70);
        assert!(health.is_alive());

        health.take_damage(100); // Saturating sub
        assert_eq!(health.current, 0);
        assert!(!health.is_alive());
    }

    #[test]
    fn test_health_signed_damage_clamps() {
        let mut health = Health::new(10);
        health.apply_damage(15);
        assert_eq!(health.current, 0);

        health.apply_damage(-50); // Лечение не выше max
        assert_eq!(health.current, 10);

        health.apply_damage(i32::MAX);
        assert_eq!(health.current, 0);
    }

    #[test]
    fn test_health_heal_and_restore() {
        let mut health = Health::new(100);
        health.take_damage(50);
        health.heal(30);
        assert_eq!(health.current, 80);

        health.heal(u32::MAX); // Clamped to max
        assert_eq!(health.current, 100);

        health.take_damage(100);
        health.restore();
        assert_eq!(health.current, 100);
    }

    #[test]
    fn test_facing() {
        assert_eq!(Facing::Left.sign(), -1.0);
        assert_eq!(Facing::Right.flipped(), Facing::Left);
        assert_eq!(Facing::towards(10.0, 5.0), Facing::Left);
        assert_eq!(Facing::towards(10.0, 10.0), Facing::Right);
    }

    #[test]
    fn test_combatant_opposing_tags() {
        let player = Combatant::new(CombatantKind::Player, 30);
        let enemy = Combatant::new(CombatantKind::Enemy, 15);
        assert_eq!(player.opposing_tags(), CollisionTags::ENEMY);
        assert_eq!(enemy.opposing_tags(), CollisionTags::PLAYER);
        assert!(!player.is_invulnerable());
    }
}
