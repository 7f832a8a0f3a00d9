//! Enemy AI module
//!
//! Простой FSM (Patrol / Chase / Attack / Hit) поверх Combatant capability.
//! Хитбоксы атаки спавнит combat pipeline, AI только входит в Attack.

use bevy::prelude::*;

use crate::SimulationSet;

pub mod components;
pub mod systems;

// Re-export основных типов
pub use components::{enemy_bundle, EnemyAI, EnemyState, EnemyType};
pub use systems::{stagger_enemy, update_enemy, update_enemy_ai, EnemyTick};

/// AI Plugin
///
/// FSM врагов в Behavior set (после Collision Resolver, рядом с FSM игрока).
pub struct AIPlugin;

impl Plugin for AIPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(FixedUpdate, update_enemy_ai.in_set(SimulationSet::Behavior));
    }
}
