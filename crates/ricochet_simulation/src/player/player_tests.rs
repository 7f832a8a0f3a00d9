//! Tests for player FSM (transitions, charge, combo, locked states, jumps).

use bevy::prelude::*;

use super::systems::{movement_state, update_player, PlayerTick, ThrowRequest};
use super::{MeleeAttack, Player, PlayerState};
use crate::components::{Combatant, CombatantKind, Facing, PhysicsBody, StateMachine};
use crate::config::GameConfig;
use crate::input::{Action, ActionInput};

/// Владеет компонентами игрока, собирает PlayerTick на каждый шаг
struct Rig {
    fsm: StateMachine<PlayerState>,
    body: PhysicsBody,
    combatant: Combatant,
    melee: MeleeAttack,
    player: Player,
    animation: Option<bool>,
    on_platform: bool,
    wall_center_x: Option<f32>,
    input: ActionInput,
    config: GameConfig,
}

impl Rig {
    fn grounded() -> Self {
        let mut body = PhysicsBody::new(0.75, 0.5, 0.2, 6.0);
        body.can_wall_slide = true;
        body.grounded = Some(Entity::from_raw(100));

        Self {
            fsm: StateMachine::new(PlayerState::Idle),
            body,
            combatant: Combatant::new(CombatantKind::Player, 30),
            melee: MeleeAttack::default(),
            player: Player::default(),
            animation: None,
            on_platform: false,
            wall_center_x: None,
            input: ActionInput::default(),
            config: GameConfig::default(),
        }
    }

    fn airborne() -> Self {
        let mut rig = Self::grounded();
        rig.body.grounded = None;
        rig.fsm = StateMachine::new(PlayerState::Jump);
        rig
    }

    fn hold(&mut self, action: Action, held: bool) -> &mut Self {
        self.input.set_held(action, held);
        self
    }

    fn step(&mut self) -> Option<ThrowRequest> {
        let mut tick = PlayerTick {
            fsm: &mut self.fsm,
            body: &mut self.body,
            combatant: &mut self.combatant,
            melee: &mut self.melee,
            player: &mut self.player,
            animation_finished: self.animation,
            on_platform: self.on_platform,
            wall_center_x: self.wall_center_x,
            center_x: 8.0,
        };
        let throw = update_player(&mut tick, &self.input, &self.config);

        // Edge-флаги живут один тик
        for action in [
            Action::MoveLeft,
            Action::MoveRight,
            Action::Jump,
            Action::Attack,
            Action::Crouch,
            Action::Boomerang,
        ] {
            let held = self.input.pressed(action);
            self.input.set_held(action, held);
        }
        throw
    }

    fn step_n(&mut self, n: u32) {
        for _ in 0..n {
            self.step();
        }
    }

    fn state(&self) -> PlayerState {
        self.fsm.current()
    }
}

#[test]
fn test_movement_state_is_pure_function_of_physics() {
    let mut body = PhysicsBody::default();
    assert_eq!(movement_state(&body), PlayerState::Jump);

    body.grounded = Some(Entity::from_raw(1));
    assert_eq!(movement_state(&body), PlayerState::Idle);

    body.speed_x = 1.0;
    assert_eq!(movement_state(&body), PlayerState::Running);

    body.wall_sliding = Some(Entity::from_raw(2));
    assert_eq!(movement_state(&body), PlayerState::WallSlide);
}

#[test]
fn test_charge_then_release_alternates_punch_and_kick() {
    let mut rig = Rig::grounded();

    rig.hold(Action::Attack, true).step();
    assert_eq!(rig.state(), PlayerState::ChargingAttack);
    assert_eq!(rig.fsm.frames(), 0);
    rig.step();
    assert_eq!(rig.melee.charge_time, 2);

    rig.hold(Action::Attack, false).step();
    assert_eq!(rig.state(), PlayerState::AttackingPunch);
    assert!(rig.melee.is_attacking);
    assert!(!rig.combatant.hitbox_spawned);

    // Fallback-длительность punch → обратно в Idle
    rig.step_n(rig.config.timings.punch_frames);
    assert_eq!(rig.state(), PlayerState::Idle);
    assert_eq!(rig.melee.charge_time, 0);

    rig.hold(Action::Attack, true).step();
    rig.hold(Action::Attack, false).step();
    assert_eq!(rig.state(), PlayerState::AttackingKick);

    rig.step_n(rig.config.timings.kick_frames);
    rig.hold(Action::Attack, true).step();
    rig.hold(Action::Attack, false).step();
    assert_eq!(rig.state(), PlayerState::AttackingPunch);
}

#[test]
fn test_combo_resets_after_pause() {
    let mut rig = Rig::grounded();

    rig.hold(Action::Attack, true).step();
    rig.hold(Action::Attack, false).step();
    assert_eq!(rig.state(), PlayerState::AttackingPunch);
    rig.step_n(rig.config.timings.punch_frames);

    // Пауза дольше окна комбо → снова punch
    rig.step_n(rig.config.combat.combo_reset_frames + 1);
    rig.hold(Action::Attack, true).step();
    rig.hold(Action::Attack, false).step();
    assert_eq!(rig.state(), PlayerState::AttackingPunch);
}

#[test]
fn test_charge_time_is_capped() {
    let mut rig = Rig::grounded();
    rig.hold(Action::Attack, true);
    rig.step_n(rig.config.combat.max_charge_time + 25);
    assert_eq!(rig.melee.charge_time, rig.config.combat.max_charge_time);
}

#[test]
fn test_airborne_attack_goes_to_jump_attack() {
    let mut rig = Rig::airborne();
    rig.combatant.hitbox_spawned = true;

    rig.hold(Action::Attack, true).step();
    assert_eq!(rig.state(), PlayerState::AttackingJump);
    assert!(!rig.combatant.hitbox_spawned);
    assert_eq!(rig.melee.charge_time, 0);
}

#[test]
fn test_animation_signal_gates_attack_exit() {
    let mut rig = Rig::grounded();
    rig.hold(Action::Attack, true).step();
    rig.hold(Action::Attack, false).step();
    assert_eq!(rig.state(), PlayerState::AttackingPunch);

    // Анимация не доиграла — держим атаку дольше fallback
    rig.animation = Some(false);
    rig.step_n(rig.config.timings.punch_frames * 3);
    assert_eq!(rig.state(), PlayerState::AttackingPunch);

    rig.animation = Some(true);
    rig.step();
    assert_eq!(rig.state(), PlayerState::Idle);
}

#[test]
fn test_attack_uses_attack_acceleration() {
    let mut rig = Rig::grounded();
    rig.hold(Action::Attack, true).step();
    rig.hold(Action::Attack, false).step();
    assert_eq!(rig.state(), PlayerState::AttackingPunch);

    rig.body.speed_x = 0.0;
    rig.hold(Action::MoveRight, true).step();
    assert_eq!(rig.body.speed_x, rig.config.player.attack_acceleration);
    assert!(rig.body.attack_friction_active);
}

#[test]
fn test_full_charge_boomerang_throw() {
    let mut rig = Rig::grounded();
    let max = rig.config.boomerang.max_charge_time;

    rig.hold(Action::Boomerang, true).step();
    assert_eq!(rig.state(), PlayerState::ChargingBoomerang);

    rig.body.speed_x = 3.0;
    rig.step_n(max + 10);
    assert_eq!(rig.body.speed_x, 0.0);
    assert_eq!(rig.player.boomerang_charge, max);

    let throw = rig.hold(Action::Boomerang, false).step();
    assert_eq!(throw, Some(ThrowRequest { charge: max }));
    assert_eq!(rig.state(), PlayerState::Throw);
}

#[test]
fn test_no_second_boomerang_while_one_is_owned() {
    let mut rig = Rig::grounded();
    rig.player.active_boomerang = Some(Entity::from_raw(55));

    rig.hold(Action::Boomerang, true).step();
    assert_eq!(rig.state(), PlayerState::Idle);
}

#[test]
fn test_throw_is_locked_until_done() {
    let mut rig = Rig::grounded();
    rig.fsm.transition(PlayerState::Throw);

    rig.hold(Action::Attack, true).step();
    assert_eq!(rig.state(), PlayerState::Throw);

    rig.hold(Action::Attack, false);
    rig.step_n(rig.config.timings.throw_frames);
    assert_eq!(rig.state(), PlayerState::Idle);
}

#[test]
fn test_hit_state_blocks_input_then_expires() {
    let mut rig = Rig::grounded();
    rig.fsm.transition(PlayerState::Hit);

    rig.hold(Action::MoveRight, true).hold(Action::Attack, true).step();
    assert_eq!(rig.state(), PlayerState::Hit);
    assert_eq!(rig.body.speed_x, 0.0);

    rig.hold(Action::MoveRight, false).hold(Action::Attack, false);
    rig.step_n(rig.config.timings.hitstun_frames);
    assert_eq!(rig.state(), PlayerState::Idle);
}

#[test]
fn test_knockback_expires_by_its_own_timer() {
    let mut rig = Rig::airborne();
    rig.fsm.transition(PlayerState::Knockback);

    rig.step_n(rig.config.timings.knockback_frames - 1);
    assert_eq!(rig.state(), PlayerState::Knockback);
    rig.step();
    assert_eq!(rig.state(), PlayerState::Jump);
}

#[test]
fn test_jump_from_ground() {
    let mut rig = Rig::grounded();
    rig.hold(Action::Jump, true).step();
    assert_eq!(rig.body.speed_y, -rig.config.player.jump_speed);
}

#[test]
fn test_crouch_then_drop_through_platform() {
    let mut rig = Rig::grounded();
    rig.on_platform = true;

    rig.hold(Action::Crouch, true).step();
    assert_eq!(rig.state(), PlayerState::Crouch);

    rig.hold(Action::Jump, true).step();
    assert_eq!(rig.body.ignore_platform, rig.body.grounded);
    assert_eq!(rig.body.speed_y, 0.0);

    // Отпустили присед → снова движение
    rig.hold(Action::Crouch, false).hold(Action::Jump, false).step();
    assert_eq!(rig.state(), PlayerState::Idle);
}

#[test]
fn test_wall_jump_pushes_away_from_wall() {
    let mut rig = Rig::airborne();
    rig.body.wall_sliding = Some(Entity::from_raw(7));
    rig.wall_center_x = Some(30.0);
    rig.fsm.transition(PlayerState::WallSlide);

    rig.hold(Action::Jump, true).step();
    assert_eq!(rig.body.speed_y, -rig.config.player.jump_speed);
    assert_eq!(rig.body.speed_x, -rig.config.player.max_speed);
    assert_eq!(rig.body.wall_sliding, None);
    assert_eq!(rig.combatant.facing, Facing::Left);
    assert_eq!(rig.state(), PlayerState::Jump);
}

#[test]
fn test_wall_slide_ignores_horizontal_input() {
    let mut rig = Rig::airborne();
    rig.body.wall_sliding = Some(Entity::from_raw(7));

    rig.hold(Action::MoveLeft, true).step();
    assert_eq!(rig.body.speed_x, 0.0);
    assert_eq!(rig.state(), PlayerState::WallSlide);
}

#[test]
fn test_slide_from_running() {
    let mut rig = Rig::grounded();
    rig.body.speed_x = 5.0;
    rig.fsm.transition(PlayerState::Running);

    rig.hold(Action::Crouch, true).step();
    assert_eq!(rig.state(), PlayerState::Sliding);
    assert_eq!(rig.body.speed_x, rig.config.player.slide_speed);

    rig.step_n(rig.config.player.slide_frames);
    // Присед всё ещё зажат, но подкат закончился → движение
    assert!(rig.state().is_movement() || rig.state() == PlayerState::Crouch);
    assert_ne!(rig.state(), PlayerState::Sliding);
}
