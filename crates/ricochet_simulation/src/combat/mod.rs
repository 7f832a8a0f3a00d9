//! Combat system module
//!
//! ECS ответственность:
//! - Hitbox pipeline: spawn / tracking / hit-sets / lifetime
//! - Boomerang: полёт, pierce, возврат, поимка
//! - Hazards: огонь, dead zones, чекпоинты
//! - Damage/Death resolver: очередь DamageEvent → Health → Death → respawn/game over
//!
//! Events: DamageEvent (очередь урона), DamageDealt, EntityDied, EntityRemoved,
//! PlayerRespawned, GameOver, CheckpointActivated (для коллабораторов).

use bevy::prelude::*;

use crate::SimulationSet;

pub mod boomerang;
pub mod damage;
pub mod hazards;
pub mod hitbox;

#[cfg(test)]
mod hitbox_tests;

// Re-export основных типов
pub use boomerang::{spawn_boomerang, Boomerang, BoomerangState};
pub use damage::{
    player_reaction, DamageDealt, DamageEvent, DamageSource, EntityDied, EntityRemoved, GameOver,
    PlayerRespawned,
};
pub use hazards::{CheckpointActivated, FireHazard, FireMode};
pub use hitbox::{apply_hit, charge_bonus, hitbox_rect, Hit, HitSetId, HitSets, Hitbox};

/// Combat Plugin
///
/// Регистрирует combat системы в FixedUpdate по SimulationSet:
/// 1. Projectile: tick_invulnerability → update_boomerangs
/// 2. Hitboxes: spawn_hitboxes → update_hitboxes → expire_hitboxes
/// 3. Hazards: fire_hazards → dead_zones → activate_checkpoints
/// 4. Damage: resolve_damage (дренирует DamageEvent этого тика)
/// 5. Death: tick_deaths
pub struct CombatPlugin;

impl Plugin for CombatPlugin {
    fn build(&self, app: &mut App) {
        // Регистрация событий
        app.add_event::<DamageEvent>()
            .add_event::<DamageDealt>()
            .add_event::<EntityDied>()
            .add_event::<EntityRemoved>()
            .add_event::<PlayerRespawned>()
            .add_event::<GameOver>()
            .add_event::<CheckpointActivated>();

        app.init_resource::<HitSets>();

        app.add_systems(
            FixedUpdate,
            (
                (hitbox::tick_invulnerability, boomerang::update_boomerangs)
                    .chain()
                    .in_set(SimulationSet::Projectile),
                (
                    hitbox::spawn_hitboxes,
                    hitbox::update_hitboxes,
                    hitbox::expire_hitboxes,
                )
                    .chain()
                    .in_set(SimulationSet::Hitboxes),
                (
                    hazards::fire_hazards,
                    hazards::dead_zones,
                    hazards::activate_checkpoints,
                )
                    .chain()
                    .in_set(SimulationSet::Hazards),
                damage::resolve_damage.in_set(SimulationSet::Damage),
                damage::tick_deaths.in_set(SimulationSet::Death),
            ),
        );
    }
}

/// Сдвигает буферы событий combat (для ручного шага без First schedule)
pub fn update_event_buffers(world: &mut World) {
    update_events::<DamageEvent>(world);
    update_events::<DamageDealt>(world);
    update_events::<EntityDied>(world);
    update_events::<EntityRemoved>(world);
    update_events::<PlayerRespawned>(world);
    update_events::<GameOver>(world);
    update_events::<CheckpointActivated>(world);
}

fn update_events<E: Event>(world: &mut World) {
    if let Some(mut events) = world.get_resource_mut::<Events<E>>() {
        events.update();
    }
}
