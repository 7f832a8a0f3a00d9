//! Player: компоненты, состояния и FSM система.
//!
//! Отмечает entity которым управляет ActionInput (в отличие от AI).
//! В single-player ровно один Player, его handle лежит в `SimulationContext::player`.

use bevy::prelude::*;

use crate::components::{Combatant, CombatantKind, Health, Lives, PhysicsBody, StateMachine};
use crate::config::GameConfig;
use crate::spatial::{Aabb, Collider, CollisionTags};
use crate::SimulationSet;

pub mod systems;

#[cfg(test)]
mod player_tests;

pub use systems::{movement_state, update_player, update_player_state, PlayerTick, ThrowRequest};

/// Состояния игрока (взаимоисключающие)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect)]
pub enum PlayerState {
    Idle,
    Running,
    Jump,
    Crouch,
    WallSlide,
    ChargingAttack,
    AttackingPunch,
    AttackingKick,
    AttackingJump,
    ChargingBoomerang,
    Throw,
    Hit,
    Stunned,
    Knockback,
    Sliding,
}

impl PlayerState {
    /// Locked: новые движения/атаки запрещены до истечения таймера/анимации
    pub fn is_locked(self) -> bool {
        matches!(
            self,
            PlayerState::Hit | PlayerState::Stunned | PlayerState::Knockback | PlayerState::Throw
        )
    }

    pub fn is_attack(self) -> bool {
        matches!(
            self,
            PlayerState::AttackingPunch | PlayerState::AttackingKick | PlayerState::AttackingJump
        )
    }

    /// Состояния, выводимые из физики (grounded / wall slide / speedX)
    pub fn is_movement(self) -> bool {
        matches!(
            self,
            PlayerState::Idle | PlayerState::Running | PlayerState::Jump | PlayerState::WallSlide
        )
    }

    /// Ключ атаки в `combat.attacks` для attack-состояний
    pub fn attack_key(self) -> Option<&'static str> {
        match self {
            PlayerState::AttackingPunch => Some("punch"),
            PlayerState::AttackingKick => Some("kick"),
            PlayerState::AttackingJump => Some("jump_kick"),
            _ => None,
        }
    }
}

/// Player marker + ссылки на собственные снаряды
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
#[require(MeleeAttack)]
pub struct Player {
    /// Живой бумеранг этого игрока (не больше одного)
    pub active_boomerang: Option<Entity>,
    /// Кадры заряда броска
    pub boomerang_charge: u32,
}

/// Melee комбо игрока
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct MeleeAttack {
    /// 0 → следующий удар punch, 1 → kick
    pub combo_step: u8,
    pub charge_time: u32,
    pub is_charging: bool,
    pub is_attacking: bool,
    /// Кадры без атаки (для сброса комбо)
    pub frames_since_attack: u32,
}

/// Bundle игрока: всё, что нужно FSM, resolver'у и боевой системе
pub fn player_bundle(position: Vec2, config: &GameConfig) -> impl Bundle {
    let pc = &config.player;

    let mut body = PhysicsBody::new(pc.gravity, pc.friction, pc.attack_friction, pc.max_speed);
    body.can_wall_slide = true;

    (
        Player::default(),
        StateMachine::new(PlayerState::Idle),
        body,
        Combatant::new(CombatantKind::Player, pc.invuln_frames),
        Health::new(pc.health),
        Lives {
            remaining: pc.lives,
        },
        Collider::new(
            Aabb::new(position.x, position.y, pc.collision_width, pc.collision_height),
            CollisionTags::CHARACTER | CollisionTags::PLAYER,
        ),
    )
}

/// Player Plugin: FSM в Behavior set
pub struct PlayerPlugin;

impl Plugin for PlayerPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            FixedUpdate,
            update_player_state.in_set(SimulationSet::Behavior),
        );
    }
}
