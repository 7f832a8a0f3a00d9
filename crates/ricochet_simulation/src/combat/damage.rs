//! Damage/Death resolver.
//!
//! 1. Дренирует очередь `DamageEvent` (полностью, в тот же тик)
//! 2. Клампит Health в [0, max], на нуле стартует Death (один раз на entity)
//! 3. Обратный отсчёт Death: враг удаляется, игрок респавнится или game over

use bevy::prelude::*;
use std::collections::BTreeMap;

use crate::ai::{stagger_enemy, EnemyAI, EnemyState, EnemyType};
use crate::components::{Combatant, Death, Health, Lives, PhysicsBody, StateMachine};
use crate::config::GameConfig;
use crate::player::{MeleeAttack, Player, PlayerState};
use crate::spatial::{Aabb, Collider, SpatialIndex};
use crate::SimulationContext;

/// Источник урона (для реакций и коллабораторов)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect)]
pub enum DamageSource {
    Melee,
    Boomerang,
    Fire,
}

/// Урон в очереди. Живёт максимум один тик.
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct DamageEvent {
    pub target: Entity,
    pub attacker: Option<Entity>,
    /// Отрицательное значение лечит
    pub amount: i32,
    pub knockback: Vec2,
    pub source: DamageSource,
}

/// Событие: урон применён к Health
#[derive(Event, Debug, Clone, PartialEq)]
pub struct DamageDealt {
    pub attacker: Option<Entity>,
    pub target: Entity,
    pub amount: i32,
    /// Health после применения
    pub remaining: u32,
    pub source: DamageSource,
}

/// Событие: entity начал умирать (Death добавлен)
#[derive(Event, Debug, Clone, PartialEq)]
pub struct EntityDied {
    pub entity: Entity,
    pub killer: Option<Entity>,
}

/// Событие: entity удалён из мира по истечении Death
#[derive(Event, Debug, Clone, PartialEq)]
pub struct EntityRemoved {
    pub entity: Entity,
}

#[derive(Event, Debug, Clone, PartialEq)]
pub struct PlayerRespawned {
    pub entity: Entity,
    pub position: Vec2,
    pub lives_remaining: u32,
}

#[derive(Event, Debug, Clone, PartialEq)]
pub struct GameOver {
    pub player: Entity,
}

/// Реакция игрока на попадание
pub fn player_reaction(event: &DamageEvent, knockback_threshold: f32) -> PlayerState {
    if event.knockback.x.abs() >= knockback_threshold {
        PlayerState::Knockback
    } else if event.source == DamageSource::Fire {
        PlayerState::Stunned
    } else {
        PlayerState::Hit
    }
}

/// Система: очередь урона → Health, реакции, старт смерти
#[allow(clippy::type_complexity)]
pub fn resolve_damage(
    mut commands: Commands,
    mut damage_events: EventReader<DamageEvent>,
    mut targets: Query<(
        Entity,
        &mut Health,
        Option<&mut PhysicsBody>,
        Option<&mut StateMachine<PlayerState>>,
        Option<&mut MeleeAttack>,
        Option<&mut StateMachine<EnemyState>>,
        Option<(&mut EnemyAI, &EnemyType)>,
        Has<Player>,
        Has<Death>,
    )>,
    mut dealt_events: EventWriter<DamageDealt>,
    mut died_events: EventWriter<EntityDied>,
    config: Res<GameConfig>,
) {
    // Последний атакующий за тик (killer для EntityDied)
    let mut last_attacker: BTreeMap<Entity, Option<Entity>> = BTreeMap::new();

    for event in damage_events.read() {
        let Ok((_, mut health, _, player_fsm, melee, enemy_fsm, enemy, _, dying)) = targets.get_mut(event.target) else {
            continue;
        };
        if dying {
            continue;
        }

        health.apply_damage(event.amount);
        last_attacker.insert(event.target, event.attacker);

        dealt_events.write(DamageDealt {
            attacker: event.attacker,
            target: event.target,
            amount: event.amount,
            remaining: health.current,
            source: event.source,
        });

        if !health.is_alive() {
            continue;
        }

        if let Some(mut fsm) = player_fsm {
            let reaction = player_reaction(event, config.combat.knockback_state_threshold);
            fsm.transition(reaction);
            if let Some(mut melee) = melee {
                melee.is_attacking = false;
                melee.is_charging = false;
                melee.charge_time = 0;
            }
        } else if let Some(mut fsm) = enemy_fsm {
            match enemy {
                Some((mut ai, enemy_type)) => stagger_enemy(&mut fsm, &mut ai, &enemy_type.config),
                None => fsm.transition(EnemyState::Hit),
            }
        }
    }

    // Clamp + Death (в т.ч. health, обнулённый dead zone)
    for (entity, mut health, body, _, _, _, _, is_player, dying) in targets.iter_mut() {
        health.clamp();
        if health.is_alive() || dying {
            continue;
        }

        commands.entity(entity).insert(Death {
            timer: config.timings.death_frames,
        });

        if is_player {
            if let Some(mut body) = body {
                body.speed_x = 0.0;
                body.speed_y = 0.0;
            }
        }

        let killer = last_attacker.get(&entity).copied().flatten();
        died_events.write(EntityDied { entity, killer });
        crate::log_info(&format!("💀 {:?} died (killer {:?})", entity, killer));
    }
}

/// Система: обратный отсчёт Death
#[allow(clippy::type_complexity)]
pub fn tick_deaths(
    mut commands: Commands,
    mut dying: Query<(
        Entity,
        &mut Death,
        &mut Health,
        Option<&mut Collider>,
        Option<&mut Lives>,
        Option<&mut PhysicsBody>,
        Option<&mut Combatant>,
        Option<&mut StateMachine<PlayerState>>,
        Option<&mut MeleeAttack>,
    )>,
    mut index: ResMut<SpatialIndex>,
    mut context: ResMut<SimulationContext>,
    mut removed_events: EventWriter<EntityRemoved>,
    mut respawn_events: EventWriter<PlayerRespawned>,
    mut game_over_events: EventWriter<GameOver>,
    config: Res<GameConfig>,
) {
    for (entity, mut death, mut health, collider, lives, body, combatant, fsm, melee) in dying.iter_mut() {
        death.timer = death.timer.saturating_sub(1);
        if death.timer > 0 {
            continue;
        }

        let Some(mut lives) = lives else {
            commands.entity(entity).despawn();
            removed_events.write(EntityRemoved { entity });
            continue;
        };

        lives.remaining = lives.remaining.saturating_sub(1);

        if lives.remaining == 0 {
            if context.player == Some(entity) {
                context.player = None;
            }
            context.game_over = true;

            commands.entity(entity).despawn();
            game_over_events.write(GameOver { player: entity });
            removed_events.write(EntityRemoved { entity });
            crate::log_info(&format!("☠️ Game over: {:?} is out of lives", entity));
            continue;
        }

        let position = context
            .active_checkpoint
            .map(|checkpoint| checkpoint.position)
            .unwrap_or(context.player_spawn);

        if let Some(mut collider) = collider {
            let rect = Aabb::new(position.x, position.y, collider.rect.w, collider.rect.h);
            collider.set_rect(entity, rect, &mut index);
        }

        health.restore();
        if let Some(mut body) = body {
            body.reset_motion();
        }
        if let Some(mut combatant) = combatant {
            combatant.invuln_frames = config.player.respawn_invuln_frames;
            combatant.active_hitbox = None;
            combatant.hitbox_spawned = false;
        }
        if let Some(mut fsm) = fsm {
            fsm.transition(PlayerState::Idle);
        }
        if let Some(mut melee) = melee {
            *melee = MeleeAttack::default();
        }

        commands.entity(entity).remove::<Death>();
        respawn_events.write(PlayerRespawned {
            entity,
            position,
            lives_remaining: lives.remaining,
        });
        crate::log_info(&format!(
            "🔁 {:?} respawned at ({:.0}, {:.0}), {} lives left",
            entity, position.x, position.y, lives.remaining
        ));
    }
}
