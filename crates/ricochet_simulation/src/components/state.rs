//! Общая форма state machine игрока и врагов: текущее состояние + счётчик кадров.

use bevy::prelude::*;

/// State machine component.
///
/// Состояния взаимоисключающие (одно значение enum). Любой переход
/// (`transition`) обнуляет счётчик кадров.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateMachine<S: Copy + Eq + Send + Sync + 'static> {
    current: S,
    frames: u32,
}

impl<S: Copy + Eq + Send + Sync + 'static> StateMachine<S> {
    pub fn new(initial: S) -> Self {
        Self {
            current: initial,
            frames: 0,
        }
    }

    pub fn current(&self) -> S {
        self.current
    }

    /// Кадры с последнего перехода
    pub fn frames(&self) -> u32 {
        self.frames
    }

    pub fn is(&self, state: S) -> bool {
        self.current == state
    }

    pub fn tick(&mut self) {
        self.frames = self.frames.saturating_add(1);
    }

    /// Переход (в том числе в то же состояние) — frames = 0
    pub fn transition(&mut self, next: S) {
        self.current = next;
        self.frames = 0;
    }

    /// Переход только если состояние меняется. Возвращает true при смене.
    pub fn set_if_changed(&mut self, next: S) -> bool {
        if self.current == next {
            return false;
        }
        self.transition(next);
        true
    }
}
