//! Enemy FSM system: Patrol ↔ Chase → Attack → Chase, Hit → Chase.
//!
//! Дистанция до игрока — только по X (центры коллайдеров).
//! Disengage из Chase использует chase_range × hysteresis.

use bevy::prelude::*;

use crate::ai::{EnemyAI, EnemyState, EnemyType};
use crate::components::{Combatant, Death, Facing, Health, PhysicsBody, StateMachine};
use crate::config::EnemyTypeConfig;
use crate::spatial::Collider;
use crate::SimulationContext;

/// Всё, что FSM врага читает и пишет за один тик
pub struct EnemyTick<'a> {
    pub fsm: &'a mut StateMachine<EnemyState>,
    pub ai: &'a mut EnemyAI,
    pub body: &'a mut PhysicsBody,
    pub combatant: &'a mut Combatant,
    pub kind: &'a EnemyTypeConfig,
    /// Левый край коллайдера (для границ патруля)
    pub x: f32,
    pub center_x: f32,
    /// Центр игрока; None — игрока нет или он умирает
    pub player_x: Option<f32>,
    pub hysteresis: f32,
}

impl EnemyTick<'_> {
    fn distance(&self) -> f32 {
        self.player_x
            .map(|px| (px - self.center_x).abs())
            .unwrap_or(f32::INFINITY)
    }
}

/// Один тик FSM врага
pub fn update_enemy(tick: &mut EnemyTick) {
    tick.fsm.tick();
    tick.ai.attack_cooldown = tick.ai.attack_cooldown.saturating_sub(1);

    let distance = tick.distance();

    match tick.fsm.current() {
        EnemyState::Patrol => {
            if distance <= tick.kind.chase_range {
                tick.fsm.transition(EnemyState::Chase);
            } else {
                patrol(tick);
            }
        }
        EnemyState::Chase => chase(tick, distance),
        EnemyState::Attack => {
            tick.body.speed_x = 0.0;
            if tick.fsm.frames() >= tick.kind.attack_duration {
                tick.fsm.transition(EnemyState::Chase);
                tick.ai.attack_cooldown = tick.kind.attack_cooldown;
            }
        }
        EnemyState::Hit => {
            if tick.fsm.frames() >= tick.kind.hitstun_duration {
                tick.fsm.transition(EnemyState::Chase);
            }
        }
    }

    tick.body.attack_friction_active = tick.fsm.is(EnemyState::Attack);
}

/// Реакция на урон: → Hit. Прерванная атака взводит cooldown, как и законченная.
pub fn stagger_enemy(fsm: &mut StateMachine<EnemyState>, ai: &mut EnemyAI, kind: &EnemyTypeConfig) {
    if fsm.is(EnemyState::Attack) {
        ai.attack_cooldown = kind.attack_cooldown;
    }
    fsm.transition(EnemyState::Hit);
}

fn patrol(tick: &mut EnemyTick) {
    let speed = tick.kind.patrol_speed;
    match tick.combatant.facing {
        Facing::Right => {
            tick.body.speed_x = speed;
            if tick.x >= tick.ai.patrol_right {
                tick.combatant.facing = Facing::Left;
            }
        }
        Facing::Left => {
            tick.body.speed_x = -speed;
            if tick.x <= tick.ai.patrol_left {
                tick.combatant.facing = Facing::Right;
            }
        }
    }
}

fn chase(tick: &mut EnemyTick, distance: f32) {
    // Атака проверяется раньше disengage
    if distance <= tick.kind.attack_range && tick.ai.attack_cooldown == 0 {
        tick.fsm.transition(EnemyState::Attack);
        tick.body.speed_x = 0.0;
        tick.combatant.begin_attack();
        return;
    }

    let Some(player_x) = tick.player_x else {
        tick.fsm.transition(EnemyState::Patrol);
        return;
    };

    if distance > tick.kind.chase_range * tick.hysteresis {
        tick.fsm.transition(EnemyState::Patrol);
        return;
    }

    tick.combatant.facing = Facing::towards(tick.center_x, player_x);
    tick.body.speed_x = if distance > tick.kind.stopping_distance {
        tick.combatant.facing.sign() * tick.kind.chase_speed
    } else {
        0.0
    };
}

/// Система: FSM всех живых врагов
///
/// Игрок берётся из `SimulationContext::player`; мёртвый/умирающий игрок
/// равен отсутствующему (враги возвращаются к патрулю).
#[allow(clippy::type_complexity)]
pub fn update_enemy_ai(
    mut enemies: Query<
        (
            Entity,
            &Collider,
            &mut StateMachine<EnemyState>,
            &mut EnemyAI,
            &mut PhysicsBody,
            &mut Combatant,
            &EnemyType,
        ),
        Without<Death>,
    >,
    players: Query<(&Collider, &Health), Without<Death>>,
    context: Res<SimulationContext>,
    config: Res<crate::config::GameConfig>,
) {
    let player_x = context
        .player
        .and_then(|player| players.get(player).ok())
        .filter(|(_, health)| health.is_alive())
        .map(|(collider, _)| collider.center().x);

    for (entity, collider, mut fsm, mut ai, mut body, mut combatant, enemy_type) in enemies.iter_mut() {
        let previous = fsm.current();

        let mut tick = EnemyTick {
            fsm: &mut *fsm,
            ai: &mut *ai,
            body: &mut *body,
            combatant: &mut *combatant,
            kind: &enemy_type.config,
            x: collider.rect.x,
            center_x: collider.center().x,
            player_x,
            hysteresis: config.enemy.hysteresis,
        };
        update_enemy(&mut tick);

        let current = fsm.current();
        if current != previous {
            crate::log(&format!(
                "🤖 {} {:?}: {:?} → {:?}",
                enemy_type.name, entity, previous, current
            ));
        }
    }
}
