//! Boomerang: Outbound (летит, гравитация, считает дистанцию) → Inbound (homing к владельцу).
//!
//! Двигается сам (без Physics Integrator / Collision Resolver): позиция
//! обновляется напрямую через индекс.

use bevy::prelude::*;

use super::damage::{DamageEvent, DamageSource};
use super::hitbox::{apply_hit, Hit};
use crate::components::{Combatant, Death, Facing, PhysicsBody};
use crate::config::BoomerangConfig;
use crate::player::Player;
use crate::spatial::{Aabb, Collider, CollisionTags, SpatialIndex};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub enum BoomerangState {
    Outbound,
    Inbound,
}

#[derive(Component, Debug, Clone, PartialEq, Reflect)]
#[reflect(Component)]
pub struct Boomerang {
    pub owner: Entity,
    pub state: BoomerangState,
    pub velocity: Vec2,
    pub gravity: f32,
    /// Только растёт, пока Outbound
    pub distance_traveled: f32,
    /// Только уменьшается (pierce), пока Outbound
    pub max_range: f32,
    pub pierce_distance: f32,
    pub return_speed: f32,
    pub max_speed: f32,
    pub damage: u32,
    pub knockback: f32,
    /// Сбрасывается при переходе в Inbound
    pub hit_enemies: Vec<Entity>,
}

impl Boomerang {
    /// Бросок с зарядом `charge` кадров
    pub fn thrown(owner: Entity, facing: Facing, charge: u32, cfg: &BoomerangConfig) -> Self {
        let ratio = if cfg.max_charge_time == 0 {
            1.0
        } else {
            (charge as f32 / cfg.max_charge_time as f32).min(1.0)
        };
        let speed = cfg.throw_speed * (1.0 + ratio * 0.5);

        Self {
            owner,
            state: BoomerangState::Outbound,
            velocity: Vec2::new(facing.sign() * speed, -cfg.launch_lift),
            gravity: cfg.gravity,
            distance_traveled: 0.0,
            max_range: cfg.base_range + (cfg.max_charge_range - cfg.base_range) * ratio,
            pierce_distance: cfg.pierce_distance,
            return_speed: cfg.return_speed,
            max_speed: speed * 2.0,
            damage: cfg.damage,
            knockback: cfg.enemy_knockback,
            hit_enemies: Vec::new(),
        }
    }

    pub fn switch_to_inbound(&mut self) {
        if self.state == BoomerangState::Inbound {
            return;
        }
        self.state = BoomerangState::Inbound;
        self.gravity = 0.0;
        self.hit_enemies.clear();
    }

    /// Outbound шаг: гравитация, clamp скорости, накопление дистанции
    pub fn advance_outbound(&mut self) {
        self.velocity.y += self.gravity;
        self.velocity = self.velocity.clamp_length_max(self.max_speed);
        self.distance_traveled += self.velocity.length();

        if self.distance_traveled >= self.max_range {
            self.switch_to_inbound();
        }
    }

    /// Inbound шаг: скорость = направление на цель × return_speed
    pub fn home_towards(&mut self, from: Vec2, target: Vec2) {
        let direction = (target - from).normalize_or_zero();
        if direction != Vec2::ZERO {
            self.velocity = direction * self.return_speed;
        }
    }

    /// Попадание по врагу, пока Outbound, укорачивает полёт
    pub fn register_hit(&mut self, enemy: Entity) {
        self.hit_enemies.push(enemy);
        if self.state == BoomerangState::Outbound {
            self.max_range = self.max_range.min(self.distance_traveled + self.pierce_distance);
        }
    }
}

/// Спавн бумеранга у владельца. Возвращает entity (для `Player::active_boomerang`).
pub fn spawn_boomerang(
    commands: &mut Commands,
    owner: Entity,
    owner_rect: Aabb,
    facing: Facing,
    charge: u32,
    cfg: &BoomerangConfig,
) -> Entity {
    let center = owner_rect.center() + Vec2::new(facing.sign() * cfg.spawn_offset, 0.0);
    let rect = Aabb::from_center(center, cfg.size, cfg.size);

    commands
        .spawn((
            Boomerang::thrown(owner, facing, charge, cfg),
            Collider::new(rect, CollisionTags::BOOMERANG),
        ))
        .id()
}

fn overlaps_solid(index: &SpatialIndex, entity: Entity, rect: &Aabb) -> bool {
    if !index.overlapping(rect, CollisionTags::SOLID, Some(entity)).is_empty() {
        return true;
    }
    index.cells_covering(rect).into_iter().any(|cell| {
        index.cell_tags(cell).contains(CollisionTags::SOLID) && index.cell_rect(cell).intersects(rect)
    })
}

/// Система: полёт, попадания, возврат и поимка бумерангов
#[allow(clippy::type_complexity)]
pub fn update_boomerangs(
    mut commands: Commands,
    mut boomerangs: Query<(Entity, &mut Boomerang, &mut Collider)>,
    mut characters: Query<(&Collider, &mut Combatant, &mut PhysicsBody, Has<Death>), Without<Boomerang>>,
    mut players: Query<&mut Player>,
    mut index: ResMut<SpatialIndex>,
    mut damage_events: EventWriter<DamageEvent>,
) {
    for (entity, mut boomerang, mut collider) in boomerangs.iter_mut() {
        let owner_rect = match characters.get(boomerang.owner) {
            Ok((owner_collider, _, _, false)) => Some(owner_collider.rect),
            _ => None,
        };

        // Владелец исчез / умирает → самоуничтожение
        let Some(owner_rect) = owner_rect else {
            if let Ok(mut player) = players.get_mut(boomerang.owner) {
                player.active_boomerang = None;
            }
            commands.entity(entity).despawn();
            crate::log(&format!("🪃 Boomerang {:?} lost its owner, destroyed", entity));
            continue;
        };

        match boomerang.state {
            BoomerangState::Outbound => boomerang.advance_outbound(),
            BoomerangState::Inbound => boomerang.home_towards(collider.center(), owner_rect.center()),
        }

        let velocity = boomerang.velocity;
        collider.move_by(entity, velocity.x, velocity.y, &mut index);
        let rect = collider.rect;

        if overlaps_solid(&index, entity, &rect) {
            boomerang.switch_to_inbound();
        }

        for enemy in index.overlapping(&rect, CollisionTags::ENEMY, Some(entity)) {
            if boomerang.hit_enemies.contains(&enemy) {
                continue;
            }
            let Ok((_, mut combatant, mut body, dying)) = characters.get_mut(enemy) else {
                continue;
            };
            if dying || combatant.is_invulnerable() {
                continue;
            }

            boomerang.register_hit(enemy);

            let direction = if boomerang.velocity.x < 0.0 { -1.0 } else { 1.0 };
            let hit = Hit {
                target: enemy,
                attacker: Some(boomerang.owner),
                amount: boomerang.damage,
                knockback: Vec2::new(direction * boomerang.knockback, body.speed_y),
                source: DamageSource::Boomerang,
            };
            apply_hit(hit, &mut combatant, &mut body, &mut damage_events);

            crate::log(&format!(
                "🪃 Boomerang {:?} hit {:?} (range now {:.0})",
                entity, enemy, boomerang.max_range
            ));
        }

        // Ловит только собственный владелец и только на возврате
        if boomerang.state == BoomerangState::Inbound && rect.intersects(&owner_rect) {
            if let Ok(mut player) = players.get_mut(boomerang.owner) {
                if player.active_boomerang == Some(entity) {
                    player.active_boomerang = None;
                }
            }
            commands.entity(entity).despawn();
            crate::log(&format!("🪃 Boomerang {:?} caught by {:?}", entity, boomerang.owner));
        }
    }
}
