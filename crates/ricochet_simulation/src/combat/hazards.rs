//! Hazards и триггер-зоны: огонь, dead zones, чекпоинты.

use bevy::prelude::*;

use super::damage::{DamageEvent, DamageSource};
use super::hitbox::{apply_hit, Hit};
use crate::components::{Checkpoint, Combatant, DeadZone, Death, Health, PhysicsBody};
use crate::config::GameConfig;
use crate::spatial::{Collider, CollisionTags, SpatialIndex};
use crate::{ActiveCheckpoint, SimulationContext};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub enum FireMode {
    Continuous,
    /// Цикл: `on_frames` опасен, затем `off_frames` безопасен
    Pulsing { on_frames: u32, off_frames: u32 },
}

#[derive(Component, Debug, Clone, Copy, PartialEq, Reflect)]
#[reflect(Component)]
pub struct FireHazard {
    pub mode: FireMode,
    pub damage: u32,
    pub knockback: f32,
    /// Кадр внутри цикла
    pub frame: u32,
}

impl FireHazard {
    pub fn new(mode: FireMode, damage: u32, knockback: f32) -> Self {
        Self {
            mode,
            damage,
            knockback,
            frame: 0,
        }
    }

    pub fn is_active(&self) -> bool {
        match self.mode {
            FireMode::Continuous => true,
            FireMode::Pulsing { on_frames, off_frames } => {
                let period = on_frames + off_frames;
                period == 0 || self.frame % period < on_frames
            }
        }
    }

    pub fn advance(&mut self) {
        if let FireMode::Pulsing { on_frames, off_frames } = self.mode {
            let period = (on_frames + off_frames).max(1);
            self.frame = (self.frame + 1) % period;
        }
    }
}

/// Событие: активирован новый чекпоинт
#[derive(Event, Debug, Clone, PartialEq)]
pub struct CheckpointActivated {
    pub id: u32,
    pub position: Vec2,
}

/// Система: огонь бьёт персонажей, которых касается (с той же неуязвимостью)
#[allow(clippy::type_complexity)]
pub fn fire_hazards(
    mut fires: Query<(Entity, &mut FireHazard, &Collider)>,
    mut characters: Query<(&Collider, &mut Combatant, &mut PhysicsBody, Has<Death>), Without<FireHazard>>,
    index: Res<SpatialIndex>,
    mut damage_events: EventWriter<DamageEvent>,
    config: Res<GameConfig>,
) {
    for (fire_entity, mut fire, fire_collider) in fires.iter_mut() {
        let active = fire.is_active();
        fire.advance();
        if !active {
            continue;
        }

        let fire_center = fire_collider.center();
        for target in index.overlapping(&fire_collider.rect, CollisionTags::CHARACTER, Some(fire_entity)) {
            let Ok((collider, mut combatant, mut body, dying)) = characters.get_mut(target) else {
                continue;
            };
            if dying || combatant.is_invulnerable() {
                continue;
            }

            let direction = if collider.center().x < fire_center.x { -1.0 } else { 1.0 };
            let hit = Hit {
                target,
                attacker: None,
                amount: fire.damage,
                knockback: Vec2::new(direction * fire.knockback, -config.combat.knockback_lift),
                source: DamageSource::Fire,
            };
            apply_hit(hit, &mut combatant, &mut body, &mut damage_events);

            crate::log(&format!("🔥 Fire {:?} burned {:?}", fire_entity, target));
        }
    }
}

/// Система: персонаж в dead zone → health = 0 (Death стартует в Damage)
pub fn dead_zones(
    zones: Query<(Entity, &Collider), With<DeadZone>>,
    mut characters: Query<&mut Health, (With<Combatant>, Without<Death>)>,
    index: Res<SpatialIndex>,
) {
    for (zone, collider) in zones.iter() {
        for target in index.overlapping(&collider.rect, CollisionTags::CHARACTER, Some(zone)) {
            let Ok(mut health) = characters.get_mut(target) else {
                continue;
            };
            if health.current > 0 {
                health.current = 0;
                crate::log(&format!("🕳️ {:?} fell into dead zone {:?}", target, zone));
            }
        }
    }
}

/// Система: игрок касается чекпоинта → новая точка респавна
pub fn activate_checkpoints(
    checkpoints: Query<(&Collider, &Checkpoint)>,
    players: Query<&Collider, (Without<Checkpoint>, Without<Death>)>,
    mut context: ResMut<SimulationContext>,
    mut activated_events: EventWriter<CheckpointActivated>,
) {
    let Some(player_rect) = context
        .player
        .and_then(|player| players.get(player).ok())
        .map(|collider| collider.rect)
    else {
        return;
    };

    for (collider, checkpoint) in checkpoints.iter() {
        if !collider.rect.intersects(&player_rect) {
            continue;
        }
        if context.active_checkpoint.map(|active| active.id) == Some(checkpoint.id) {
            continue;
        }

        // Респавн стоя на нижней кромке чекпоинта, по центру
        let position = Vec2::new(
            collider.center().x - player_rect.w / 2.0,
            collider.rect.bottom() - player_rect.h,
        );
        context.active_checkpoint = Some(ActiveCheckpoint {
            id: checkpoint.id,
            position,
        });
        activated_events.write(CheckpointActivated {
            id: checkpoint.id,
            position,
        });
        crate::log_info(&format!("🚩 Checkpoint {} activated", checkpoint.id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_continuous_fire_is_always_active() {
        let mut fire = FireHazard::new(FireMode::Continuous, 10, 4.0);
        for _ in 0..200 {
            assert!(fire.is_active());
            fire.advance();
        }
    }

    #[test]
    fn test_pulsing_fire_cycle() {
        let mut fire = FireHazard::new(
            FireMode::Pulsing {
                on_frames: 2,
                off_frames: 3,
            },
            10,
            4.0,
        );

        let mut pattern = Vec::new();
        for _ in 0..10 {
            pattern.push(fire.is_active());
            fire.advance();
        }
        assert_eq!(
            pattern,
            vec![true, true, false, false, false, true, true, false, false, false]
        );
    }
}
