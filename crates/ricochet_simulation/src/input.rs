//! Logical input — уже дебаунсенное состояние действий на текущий тик.
//!
//! Ядро не опрашивает устройства: input-коллаборатор пишет `ActionInput`
//! перед тиком (или `set_held`, если у него только уровни кнопок).

use bevy::prelude::*;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Reflect)]
pub enum Action {
    MoveLeft,
    MoveRight,
    Jump,
    Attack,
    Crouch,
    Boomerang,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Reflect)]
pub struct ActionState {
    pub pressed: bool,
    pub just_pressed: bool,
    pub just_released: bool,
}

#[derive(Resource, Debug, Clone, Default)]
pub struct ActionInput {
    actions: BTreeMap<Action, ActionState>,
}

impl ActionInput {
    pub fn state(&self, action: Action) -> ActionState {
        self.actions.get(&action).copied().unwrap_or_default()
    }

    pub fn pressed(&self, action: Action) -> bool {
        self.state(action).pressed
    }

    pub fn just_pressed(&self, action: Action) -> bool {
        self.state(action).just_pressed
    }

    pub fn just_released(&self, action: Action) -> bool {
        self.state(action).just_released
    }

    /// Полный snapshot действия от коллаборатора
    pub fn set(&mut self, action: Action, state: ActionState) {
        self.actions.insert(action, state);
    }

    /// Уровень кнопки → edge-флаги выводятся из прошлого уровня
    pub fn set_held(&mut self, action: Action, held: bool) {
        let was_held = self.pressed(action);
        self.actions.insert(
            action,
            ActionState {
                pressed: held,
                just_pressed: held && !was_held,
                just_released: !held && was_held,
            },
        );
    }

    /// Всё отпущено, edge-флаги сброшены
    pub fn clear(&mut self) {
        self.actions.clear();
    }
}

/// Сигнал анимационного коллаборатора: текущая анимация доиграла цикл.
///
/// Используется только для выхода из атак/броска. Если компонента нет —
/// работают fallback-длительности из `TimingConfig`.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Default, Reflect)]
#[reflect(Component)]
pub struct AnimationFinished(pub bool);
