//! Player FSM: input → намерение движения/атаки → переходы состояний.
//!
//! Запускается после Collision Resolver: grounded / wall slide уже актуальны
//! для этого тика. Скорость, выставленная здесь, применяется на следующем тике.

use bevy::prelude::*;

use super::{MeleeAttack, Player, PlayerState};
use crate::combat::boomerang::{spawn_boomerang, Boomerang};
use crate::components::{Combatant, Death, Facing, PhysicsBody, StateMachine};
use crate::config::GameConfig;
use crate::input::{Action, ActionInput, AnimationFinished};
use crate::spatial::{Collider, CollisionTags, SpatialIndex};

/// Movement-состояние как чистая функция физики (не запоминается)
pub fn movement_state(body: &PhysicsBody) -> PlayerState {
    if body.is_wall_sliding() {
        PlayerState::WallSlide
    } else if !body.is_grounded() {
        PlayerState::Jump
    } else if body.speed_x != 0.0 {
        PlayerState::Running
    } else {
        PlayerState::Idle
    }
}

/// Запрос на бросок бумеранга (спавн делает система через Commands)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThrowRequest {
    pub charge: u32,
}

/// Всё, что FSM игрока читает и пишет за один тик
pub struct PlayerTick<'a> {
    pub fsm: &'a mut StateMachine<PlayerState>,
    pub body: &'a mut PhysicsBody,
    pub combatant: &'a mut Combatant,
    pub melee: &'a mut MeleeAttack,
    pub player: &'a mut Player,
    /// None — анимационного сигнала нет, работают fallback-длительности
    pub animation_finished: Option<bool>,
    /// Стоим на one-way платформе
    pub on_platform: bool,
    /// X центра стены, по которой скользим
    pub wall_center_x: Option<f32>,
    pub center_x: f32,
}

impl PlayerTick<'_> {
    fn to_movement(&mut self) {
        let next = movement_state(self.body);
        self.fsm.transition(next);
    }

    fn begin_attack(&mut self, state: PlayerState) {
        self.fsm.transition(state);
        self.melee.is_attacking = true;
        self.melee.is_charging = false;
        self.combatant.begin_attack();
    }

    fn end_attack(&mut self) {
        self.melee.is_attacking = false;
        self.melee.charge_time = 0;
        self.melee.frames_since_attack = 0;
        self.to_movement();
    }

    fn animation_done(&self, fallback_frames: u32) -> bool {
        match self.animation_finished {
            Some(finished) => finished,
            None => self.fsm.frames() >= fallback_frames,
        }
    }
}

/// Один тик FSM игрока. Возвращает запрос на бросок, если он случился.
pub fn update_player(tick: &mut PlayerTick, input: &ActionInput, config: &GameConfig) -> Option<ThrowRequest> {
    tick.fsm.tick();

    let state = tick.fsm.current();
    if !state.is_attack() && state != PlayerState::ChargingAttack {
        tick.melee.frames_since_attack = tick.melee.frames_since_attack.saturating_add(1);
    }

    if !state.is_locked() {
        handle_actions(tick, input, config);
    }

    handle_movement(tick, input, config);

    let throw = update_current_state(tick, input, config);

    let state = tick.fsm.current();
    tick.body.attack_friction_active = state.is_attack() || state == PlayerState::Throw;

    throw
}

/// Новые действия: атака, бросок, присед, подкат
fn handle_actions(tick: &mut PlayerTick, input: &ActionInput, config: &GameConfig) {
    let state = tick.fsm.current();
    let grounded = tick.body.is_grounded();
    let idle_or_running = matches!(state, PlayerState::Idle | PlayerState::Running);

    if input.just_pressed(Action::Attack) {
        let busy = state.is_attack()
            || matches!(state, PlayerState::ChargingAttack | PlayerState::ChargingBoomerang);

        if !grounded && !busy {
            tick.melee.charge_time = 0;
            tick.begin_attack(PlayerState::AttackingJump);
            return;
        }

        if idle_or_running {
            tick.fsm.transition(PlayerState::ChargingAttack);
            tick.melee.is_charging = true;
            tick.melee.charge_time = 0;
            return;
        }
    }

    if input.just_pressed(Action::Boomerang) && idle_or_running && tick.player.active_boomerang.is_none() {
        tick.fsm.transition(PlayerState::ChargingBoomerang);
        tick.player.boomerang_charge = 0;
        return;
    }

    if grounded && idle_or_running {
        let fast_enough = tick.body.speed_x.abs() >= config.player.slide_threshold;
        if input.just_pressed(Action::Crouch) && state == PlayerState::Running && fast_enough {
            tick.fsm.transition(PlayerState::Sliding);
            return;
        }

        if input.pressed(Action::Crouch) {
            tick.fsm.transition(PlayerState::Crouch);
        }
    }
}

/// Горизонтальный input + прыжок / drop-through / wall jump
fn handle_movement(tick: &mut PlayerTick, input: &ActionInput, config: &GameConfig) {
    let pc = &config.player;
    let state = tick.fsm.current();

    let blocked = state.is_locked()
        || matches!(
            state,
            PlayerState::Crouch | PlayerState::Sliding | PlayerState::ChargingBoomerang
        );

    if !blocked && !tick.body.is_wall_sliding() {
        let accel = if state.is_attack() || state == PlayerState::ChargingAttack {
            pc.attack_acceleration
        } else {
            pc.acceleration
        };

        if input.pressed(Action::MoveRight) {
            tick.body.speed_x += accel;
            tick.combatant.facing = Facing::Right;
        }
        if input.pressed(Action::MoveLeft) {
            tick.body.speed_x -= accel;
            tick.combatant.facing = Facing::Left;
        }
    }

    let can_jump = state.is_movement() || state == PlayerState::Crouch;
    if !can_jump || !input.just_pressed(Action::Jump) {
        return;
    }

    if input.pressed(Action::Crouch) && tick.on_platform {
        // Drop-through: игнорируем текущую платформу до следующего приземления
        tick.body.ignore_platform = tick.body.grounded;
    } else if tick.body.is_grounded() {
        tick.body.speed_y = -pc.jump_speed;
    } else if let Some(wall_x) = tick.wall_center_x {
        // Wall jump: вверх и от стены
        tick.body.speed_y = -pc.jump_speed;
        if wall_x > tick.center_x {
            tick.body.speed_x = -pc.max_speed;
            tick.combatant.facing = Facing::Left;
        } else {
            tick.body.speed_x = pc.max_speed;
            tick.combatant.facing = Facing::Right;
        }
        tick.body.release_wall();
    }
}

/// Таймеры и выходы из текущего состояния
fn update_current_state(tick: &mut PlayerTick, input: &ActionInput, config: &GameConfig) -> Option<ThrowRequest> {
    let timings = &config.timings;

    match tick.fsm.current() {
        PlayerState::ChargingAttack => {
            if input.pressed(Action::Attack) {
                tick.melee.charge_time = (tick.melee.charge_time + 1).min(config.combat.max_charge_time);
            } else {
                release_charged_attack(tick, config);
            }
        }
        PlayerState::ChargingBoomerang => {
            tick.body.speed_x = 0.0;
            if input.pressed(Action::Boomerang) {
                tick.player.boomerang_charge =
                    (tick.player.boomerang_charge + 1).min(config.boomerang.max_charge_time);
            } else {
                let charge = tick.player.boomerang_charge;
                tick.player.boomerang_charge = 0;
                tick.fsm.transition(PlayerState::Throw);
                return Some(ThrowRequest { charge });
            }
        }
        PlayerState::AttackingPunch => {
            if tick.animation_done(timings.punch_frames) {
                tick.end_attack();
            }
        }
        PlayerState::AttackingKick => {
            if tick.animation_done(timings.kick_frames) {
                tick.end_attack();
            }
        }
        PlayerState::AttackingJump => {
            if tick.animation_done(timings.jump_kick_frames) {
                tick.end_attack();
            }
        }
        PlayerState::Throw => {
            if tick.animation_done(timings.throw_frames) {
                tick.to_movement();
            }
        }
        PlayerState::Hit | PlayerState::Stunned => {
            if tick.fsm.frames() >= timings.hitstun_frames {
                tick.to_movement();
            }
        }
        PlayerState::Knockback => {
            if tick.fsm.frames() >= timings.knockback_frames {
                tick.to_movement();
            }
        }
        PlayerState::Crouch => {
            if !input.pressed(Action::Crouch) || !tick.body.is_grounded() {
                tick.to_movement();
            }
        }
        PlayerState::Sliding => {
            tick.body.speed_x = tick.combatant.facing.sign() * config.player.slide_speed;
            if tick.fsm.frames() >= config.player.slide_frames || !tick.body.is_grounded() {
                tick.to_movement();
            }
        }
        PlayerState::Idle | PlayerState::Running | PlayerState::Jump | PlayerState::WallSlide => {
            let next = movement_state(tick.body);
            tick.fsm.set_if_changed(next);
        }
    }

    None
}

/// Отпускание заряда: punch/kick по очереди, комбо сбрасывается после паузы
fn release_charged_attack(tick: &mut PlayerTick, config: &GameConfig) {
    if tick.melee.frames_since_attack > config.combat.combo_reset_frames {
        tick.melee.combo_step = 0;
    }

    let next = if tick.melee.combo_step == 0 {
        PlayerState::AttackingPunch
    } else {
        PlayerState::AttackingKick
    };
    tick.melee.combo_step = (tick.melee.combo_step + 1) % 2;
    tick.begin_attack(next);
}

/// Система: FSM игрока + спавн бумеранга
#[allow(clippy::type_complexity)]
pub fn update_player_state(
    mut commands: Commands,
    mut players: Query<
        (
            Entity,
            &Collider,
            &mut StateMachine<PlayerState>,
            &mut PhysicsBody,
            &mut Combatant,
            &mut MeleeAttack,
            &mut Player,
            Option<&AnimationFinished>,
        ),
        Without<Death>,
    >,
    boomerangs: Query<(), With<Boomerang>>,
    index: Res<SpatialIndex>,
    input: Res<ActionInput>,
    config: Res<GameConfig>,
) {
    for (entity, collider, mut fsm, mut body, mut combatant, mut melee, mut player, animation) in players.iter_mut() {
        // Stale handle (бумеранг уже уничтожен) → слот свободен
        if let Some(boomerang) = player.active_boomerang {
            if boomerangs.get(boomerang).is_err() {
                player.active_boomerang = None;
            }
        }

        let on_platform = body
            .grounded
            .and_then(|ground| index.get(ground))
            .map(|object| object.tags.contains(CollisionTags::PLATFORM))
            .unwrap_or(false);
        let wall_center_x = body
            .wall_sliding
            .and_then(|wall| index.get(wall))
            .map(|object| object.rect.center().x)
            .or_else(|| body.wall_cell.map(|cell| index.cell_rect(cell).center().x));

        let previous = fsm.current();
        let mut tick = PlayerTick {
            fsm: &mut *fsm,
            body: &mut *body,
            combatant: &mut *combatant,
            melee: &mut *melee,
            player: &mut *player,
            animation_finished: animation.map(|a| a.0),
            on_platform,
            wall_center_x,
            center_x: collider.center().x,
        };

        let throw = update_player(&mut tick, &input, &config);

        let current = fsm.current();
        if current != previous && !current.is_movement() {
            crate::log(&format!("🎮 Player {:?}: {:?} → {:?}", entity, previous, current));
        }

        if let Some(request) = throw {
            let boomerang = spawn_boomerang(
                &mut commands,
                entity,
                collider.rect,
                combatant.facing,
                request.charge,
                &config.boomerang,
            );
            player.active_boomerang = Some(boomerang);
            crate::log(&format!(
                "🪃 Player {:?} threw boomerang {:?} (charge {})",
                entity, boomerang, request.charge
            ));
        }
    }
}
