//! Hitbox pipeline: spawn → следование за владельцем → попадания → истечение.
//!
//! Все хитбоксы одной атаки делят один hit-set (`HitSets` арена), поэтому
//! атака из нескольких хитбоксов бьёт каждую цель максимум один раз.

use bevy::prelude::*;
use std::collections::{BTreeMap, BTreeSet};

use super::damage::{DamageEvent, DamageSource};
use crate::ai::{EnemyState, EnemyType};
use crate::components::{Combatant, CombatantKind, Death, Facing, PhysicsBody, StateMachine};
use crate::config::{GameConfig, HitboxShape};
use crate::player::{MeleeAttack, PlayerState};
use crate::spatial::{Aabb, Collider, CollisionTags, SpatialIndex};

/// Handle общего hit-set в `HitSets`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Reflect)]
pub struct HitSetId(u64);

#[derive(Debug, Clone, Default)]
struct HitSet {
    targets: BTreeSet<Entity>,
    /// Сколько живых хитбоксов ссылается на set
    refs: u32,
}

/// Арена hit-set'ов. Set живёт, пока жив хоть один его хитбокс.
#[derive(Resource, Debug, Clone, Default)]
pub struct HitSets {
    next_id: u64,
    sets: BTreeMap<HitSetId, HitSet>,
}

impl HitSets {
    pub fn allocate(&mut self, refs: u32) -> HitSetId {
        let id = HitSetId(self.next_id);
        self.next_id += 1;
        self.sets.insert(
            id,
            HitSet {
                targets: BTreeSet::new(),
                refs,
            },
        );
        id
    }

    pub fn contains(&self, id: HitSetId, target: Entity) -> bool {
        self.sets
            .get(&id)
            .map(|set| set.targets.contains(&target))
            .unwrap_or(false)
    }

    /// true если цель добавлена впервые
    pub fn insert(&mut self, id: HitSetId, target: Entity) -> bool {
        self.sets
            .get_mut(&id)
            .map(|set| set.targets.insert(target))
            .unwrap_or(false)
    }

    /// Хитбокс умер: refs - 1, последний забирает set
    pub fn release(&mut self, id: HitSetId) {
        let Some(set) = self.sets.get_mut(&id) else {
            return;
        };
        set.refs = set.refs.saturating_sub(1);
        if set.refs == 0 {
            self.sets.remove(&id);
        }
    }

    pub fn is_live(&self, id: HitSetId) -> bool {
        self.sets.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }
}

/// Хитбокс атаки (отдельная entity с Collider tag HITBOX)
#[derive(Component, Debug, Clone, PartialEq, Reflect)]
#[reflect(Component)]
pub struct Hitbox {
    pub owner: Entity,
    /// Кого бьём (ENEMY для игрока, PLAYER для врага)
    pub targets: CollisionTags,
    pub damage: u32,
    pub knockback: f32,
    /// Оставшиеся кадры жизни
    pub lifetime: u32,
    /// Размер уже с charge-бонусом
    pub shape: HitboxShape,
    pub hit_set: HitSetId,
    pub attack: String,
}

/// Прямоугольник хитбокса перед владельцем, центрирован по вертикали
pub fn hitbox_rect(owner: &Aabb, facing: Facing, shape: &HitboxShape) -> Aabb {
    let x = match facing {
        Facing::Right => owner.right() + shape.offset_x,
        Facing::Left => owner.x - shape.width - shape.offset_x,
    };
    let y = owner.y + (owner.h - shape.height) / 2.0 + shape.offset_y;
    Aabb::new(x, y, shape.width, shape.height)
}

/// Charge bonus: линейно от заряда (1.0 без заряда)
pub fn charge_bonus(charge_time: u32, rate: f32) -> f32 {
    1.0 + charge_time as f32 * rate
}

/// Одно попадание по цели
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub target: Entity,
    pub attacker: Option<Entity>,
    pub amount: u32,
    pub knockback: Vec2,
    pub source: DamageSource,
}

/// Попадание: knockback + окно неуязвимости цели + DamageEvent.
///
/// Общая точка для хитбоксов, бумеранга и огня.
pub fn apply_hit(
    hit: Hit,
    combatant: &mut Combatant,
    body: &mut PhysicsBody,
    damage_events: &mut EventWriter<DamageEvent>,
) {
    body.speed_x = hit.knockback.x;
    body.speed_y = hit.knockback.y;
    combatant.invuln_frames = combatant.hit_invuln_frames;

    damage_events.write(DamageEvent {
        target: hit.target,
        attacker: hit.attacker,
        amount: hit.amount as i32,
        knockback: hit.knockback,
        source: hit.source,
    });
}

/// Система: неуязвимость тикает каждый кадр независимо от состояния
pub fn tick_invulnerability(mut combatants: Query<&mut Combatant>) {
    for mut combatant in combatants.iter_mut() {
        if combatant.invuln_frames > 0 {
            combatant.invuln_frames -= 1;
        }
    }
}

/// Система: спавн хитбоксов для атакующих (один раз на атаку)
#[allow(clippy::type_complexity)]
pub fn spawn_hitboxes(
    mut commands: Commands,
    mut attackers: Query<
        (
            Entity,
            &Collider,
            &mut Combatant,
            Option<&StateMachine<PlayerState>>,
            Option<&MeleeAttack>,
            Option<&StateMachine<EnemyState>>,
            Option<&EnemyType>,
        ),
        Without<Death>,
    >,
    mut hit_sets: ResMut<HitSets>,
    config: Res<GameConfig>,
) {
    for (entity, collider, mut combatant, player_fsm, melee, enemy_fsm, enemy_type) in attackers.iter_mut() {
        if combatant.hitbox_spawned {
            continue;
        }

        let (attack_key, damage, knockback, bonus) = match combatant.kind {
            CombatantKind::Player => {
                let Some(key) = player_fsm.and_then(|fsm| fsm.current().attack_key()) else {
                    continue;
                };
                let attack = config.attack(key);
                let charge = melee.map(|m| m.charge_time).unwrap_or(0);
                let bonus = charge_bonus(charge, config.combat.charge_bonus_rate);
                (
                    key.to_string(),
                    (attack.damage as f32 * bonus) as u32,
                    attack.knockback * bonus,
                    bonus,
                )
            }
            CombatantKind::Enemy => {
                let attacking = enemy_fsm.map(|fsm| fsm.is(EnemyState::Attack)).unwrap_or(false);
                let Some(enemy_type) = enemy_type.filter(|_| attacking) else {
                    continue;
                };
                let tc = &enemy_type.config;
                (tc.attack.clone(), tc.damage, tc.knockback, 1.0)
            }
        };

        let layout = config.attack(&attack_key).hitboxes;
        if layout.is_empty() {
            combatant.hitbox_spawned = true;
            continue;
        }

        let hit_set = hit_sets.allocate(layout.len() as u32);
        let mut first = None;

        for base in &layout {
            let shape = HitboxShape {
                width: base.width * bonus,
                height: base.height * bonus,
                ..*base
            };
            let rect = hitbox_rect(&collider.rect, combatant.facing, &shape);

            let hitbox = commands
                .spawn((
                    Hitbox {
                        owner: entity,
                        targets: combatant.opposing_tags(),
                        damage,
                        knockback,
                        lifetime: config.combat.hitbox_lifetime,
                        shape,
                        hit_set,
                        attack: attack_key.clone(),
                    },
                    Collider::new(rect, CollisionTags::HITBOX),
                ))
                .id();
            first.get_or_insert(hitbox);
        }

        combatant.hitbox_spawned = true;
        combatant.active_hitbox = first;

        crate::log(&format!(
            "👊 {:?} {} → {} hitbox(es), damage {}, knockback {:.1}",
            entity,
            attack_key,
            layout.len(),
            damage,
            knockback
        ));
    }
}

/// Система: хитбоксы следуют за владельцем и бьют пересечённые цели
#[allow(clippy::type_complexity)]
pub fn update_hitboxes(
    mut hitboxes: Query<(Entity, &mut Hitbox, &mut Collider)>,
    mut characters: Query<(&Collider, &mut Combatant, &mut PhysicsBody, Has<Death>), Without<Hitbox>>,
    mut index: ResMut<SpatialIndex>,
    mut hit_sets: ResMut<HitSets>,
    mut damage_events: EventWriter<DamageEvent>,
    config: Res<GameConfig>,
) {
    let mut order: Vec<Entity> = hitboxes.iter().map(|(entity, _, _)| entity).collect();
    order.sort();

    for hitbox_entity in order {
        let Ok((_, mut hitbox, mut collider)) = hitboxes.get_mut(hitbox_entity) else {
            continue;
        };

        // Владелец исчез или умирает → хитбокс снимается сразу
        let owner = match characters.get(hitbox.owner) {
            Ok((owner_collider, owner_combatant, _, false)) => {
                Some((owner_collider.rect, owner_combatant.facing))
            }
            _ => None,
        };
        let Some((owner_rect, owner_facing)) = owner else {
            // Хитбокс сироты снимет expire_hitboxes на этом же тике
            hitbox.lifetime = 0;
            continue;
        };

        let rect = hitbox_rect(&owner_rect, owner_facing, &hitbox.shape);
        collider.set_rect(hitbox_entity, rect, &mut index);

        for target in index.overlapping(&rect, hitbox.targets, Some(hitbox.owner)) {
            if hit_sets.contains(hitbox.hit_set, target) {
                continue;
            }
            let Ok((target_collider, mut combatant, mut body, dying)) = characters.get_mut(target) else {
                continue;
            };
            if dying || combatant.is_invulnerable() {
                continue;
            }

            hit_sets.insert(hitbox.hit_set, target);

            let direction = if target_collider.rect.x < owner_rect.x { -1.0 } else { 1.0 };
            let knockback = Vec2::new(direction * hitbox.knockback, -config.combat.knockback_lift);

            let hit = Hit {
                target,
                attacker: Some(hitbox.owner),
                amount: hitbox.damage,
                knockback,
                source: DamageSource::Melee,
            };
            apply_hit(hit, &mut combatant, &mut body, &mut damage_events);

            crate::log(&format!(
                "💥 {} hit {:?} → {:?} ({} damage)",
                hitbox.attack, hitbox.owner, target, hitbox.damage
            ));
        }
    }
}

/// Система: lifetime - 1; на нуле — despawn, release hit-set, очистка active_hitbox
pub fn expire_hitboxes(
    mut commands: Commands,
    mut hitboxes: Query<(Entity, &mut Hitbox)>,
    mut owners: Query<&mut Combatant>,
    mut hit_sets: ResMut<HitSets>,
) {
    for (entity, mut hitbox) in hitboxes.iter_mut() {
        hitbox.lifetime = hitbox.lifetime.saturating_sub(1);
        if hitbox.lifetime > 0 {
            continue;
        }

        if let Ok(mut owner) = owners.get_mut(hitbox.owner) {
            if owner.active_hitbox == Some(entity) {
                owner.active_hitbox = None;
            }
        }

        hit_sets.release(hitbox.hit_set);
        commands.entity(entity).despawn();
    }
}
