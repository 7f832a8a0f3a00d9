//! Collision Resolver
//!
//! Два независимых прохода по осям (сначала X, потом Y), не единый swept solve.
//!
//! Горизонталь: solid впереди (объект или помеченная клетка tile layer'а),
//! чей вертикальный span содержит центр entity, останавливает движение
//! (speedX = 0, wall slide если в воздухе).
//! Персонажи не блокируют друг друга — мягкое отталкивание ±pushback.
//!
//! Вертикаль (speedY клампится в ±16, запрос на dy+1 при падении):
//! приоритет ramp → platform → solid (объект, затем solid-клетка). Приземление сбрасывает wall slide
//! и ignore-platform.
//!
//! Wall slide disengage проверяется ПОСЛЕ перемещения.

use bevy::prelude::*;

use crate::components::{Combatant, Death, Facing, PhysicsBody};
use crate::config::{GameConfig, PhysicsConfig};
use crate::spatial::{
    contact_delta, ramp_contact_top, Aabb, CellCoord, Collider, Collision, CollisionTags, Shape, SpatialIndex,
};


/// Допуск "уже касаемся" при сравнении краёв
const CONTACT_EPSILON: f32 = 0.5;

/// Solid лежит впереди по направлению движения (не позади и не под ногами)
fn is_ahead(mover: &Aabb, other: &Aabb, dx: f32) -> bool {
    if dx > 0.0 {
        other.left() >= mover.right() - CONTACT_EPSILON
    } else if dx < 0.0 {
        other.right() <= mover.left() + CONTACT_EPSILON
    } else {
        false
    }
}

/// Поверхность контакта: дискретный объект или клетка tile layer'а
#[derive(Debug, Clone, Copy, PartialEq)]
enum Surface {
    Object(Entity),
    Cell(CellCoord),
}

/// Ближайшая стена впереди: сначала объекты (nearest-first), потом solid-клетки
fn wall_ahead(hit: &Collision, rect: &Aabb, dx: f32) -> Option<(Aabb, Surface)> {
    let blocks = |other: &Aabb| is_ahead(rect, other, dx) && rect.center_within_vertical_span(other);

    if let Some(solid) = hit.objects_with(CollisionTags::SOLID).find(|solid| blocks(&solid.rect)) {
        return Some((solid.rect, Surface::Object(solid.entity)));
    }

    hit.cells_with(CollisionTags::SOLID)
        .filter(|cell| blocks(&cell.rect))
        .min_by(|a, b| {
            let gap_a = contact_delta(rect, &a.rect, dx, 0.0).x.abs();
            let gap_b = contact_delta(rect, &b.rect, dx, 0.0).x.abs();
            gap_a.total_cmp(&gap_b)
        })
        .map(|cell| (cell.rect, Surface::Cell(cell.coord)))
}

/// Горизонтальный проход
pub fn resolve_horizontal(
    entity: Entity,
    collider: &mut Collider,
    body: &mut PhysicsBody,
    index: &mut SpatialIndex,
    physics: &PhysicsConfig,
) {
    let dx = body.speed_x;
    if dx == 0.0 {
        return;
    }

    let rect = collider.rect;
    let mut step = dx;

    if let Some(hit) = index.check(entity, dx, 0.0, CollisionTags::SOLID | CollisionTags::CHARACTER) {
        if let Some((wall_rect, surface)) = wall_ahead(&hit, &rect, dx) {
            // Подходим вплотную, но не дальше чем позволяет скорость
            let gap = contact_delta(&rect, &wall_rect, dx, 0.0).x;
            step = if dx > 0.0 { gap.clamp(0.0, dx) } else { gap.clamp(dx, 0.0) };
            body.speed_x = 0.0;

            if body.can_wall_slide && !body.is_grounded() {
                body.release_wall();
                match surface {
                    Surface::Object(wall) => body.wall_sliding = Some(wall),
                    Surface::Cell(cell) => body.wall_cell = Some(cell),
                }
            }
        } else {
            let moved = rect.translated(dx, 0.0);
            let other = hit.objects_with(CollisionTags::CHARACTER).find(|character| {
                !character.tags.intersects(CollisionTags::SOLID) && character.rect.intersects(&moved)
            });

            if let Some(other) = other {
                let my_x = rect.center().x;
                let other_x = other.rect.center().x;
                let away = if my_x < other_x {
                    -1.0
                } else if my_x > other_x {
                    1.0
                } else {
                    -dx.signum()
                };
                step = away * physics.character_pushback;
            }
        }
    }

    collider.move_by(entity, step, 0.0, index);
}

/// Вертикальный проход
pub fn resolve_vertical(
    entity: Entity,
    collider: &mut Collider,
    body: &mut PhysicsBody,
    index: &mut SpatialIndex,
    physics: &PhysicsConfig,
) {
    body.clear_ground();

    let clamp = physics.vertical_speed_clamp;
    let mut dy = body.speed_y.clamp(-clamp, clamp);
    let mut slide_x = 0.0;

    // +1 при падении/покое: видим землю на кадр раньше
    let reach = if dy >= 0.0 { dy + 1.0 } else { dy };
    let rect = collider.rect;

    let filter = CollisionTags::SOLID | CollisionTags::PLATFORM | CollisionTags::RAMP;
    if let Some(hit) = index.check(entity, 0.0, reach, filter) {
        if dy < 0.0 {
            let ceiling = hit
                .objects_with(CollisionTags::SOLID)
                .filter(|solid| {
                    solid.rect.overlaps_x(&rect)
                        && solid.rect.bottom() <= rect.top() + CONTACT_EPSILON
                        && rect.top() - solid.rect.bottom() <= -dy
                })
                .max_by(|a, b| a.rect.bottom().total_cmp(&b.rect.bottom()));

            if let Some(ceiling) = ceiling {
                dy = contact_delta(&rect, &ceiling.rect, 0.0, dy).y.clamp(dy, 0.0);
                body.speed_y = 0.0;
            } else {
                let cell = hit
                    .cells_with(CollisionTags::SOLID)
                    .filter(|cell| {
                        cell.rect.overlaps_x(&rect)
                            && cell.rect.bottom() <= rect.top() + CONTACT_EPSILON
                            && rect.top() - cell.rect.bottom() <= -dy
                    })
                    .max_by(|a, b| a.rect.bottom().total_cmp(&b.rect.bottom()));

                if let Some(cell) = cell {
                    match index.slide_against_cell(&rect, cell.coord, CollisionTags::SOLID) {
                        Some(slide) => slide_x = slide,
                        None => {
                            // Некуда соскользнуть — клетка работает как потолок
                            dy = (cell.rect.bottom() - rect.top()).clamp(dy, 0.0);
                            body.speed_y = 0.0;
                        }
                    }
                }
            }
        } else {
            // 1. Ramps
            let probe = rect.translated(0.0, physics.ramp_probe_depth);
            for ramp in hit.objects_with(CollisionTags::RAMP) {
                let Shape::Ramp(slope) = ramp.shape else {
                    continue;
                };
                if let Some(top) = ramp_contact_top(&ramp.rect, slope, &probe) {
                    dy = top - rect.bottom() + physics.ramp_snap_fudge;
                    body.grounded = Some(ramp.entity);
                    body.speed_y = 0.0;
                    break;
                }
            }

            // 2. One-way platforms
            if body.grounded.is_none() {
                let platform = hit
                    .objects_with(CollisionTags::PLATFORM)
                    .filter(|platform| {
                        Some(platform.entity) != body.ignore_platform
                            && body.speed_y >= 0.0
                            && platform.rect.overlaps_x(&rect)
                            && rect.bottom() < platform.rect.top() + physics.platform_drop_threshold
                            && platform.rect.top() - rect.bottom() <= reach
                    })
                    .min_by(|a, b| a.rect.top().total_cmp(&b.rect.top()));

                if let Some(platform) = platform {
                    dy = platform.rect.top() - rect.bottom();
                    body.grounded = Some(platform.entity);
                    body.speed_y = 0.0;
                }
            }

            // 3. Solids — только при падении на них
            if body.grounded.is_none() && body.speed_y >= 0.0 {
                let ground = hit
                    .objects_with(CollisionTags::SOLID)
                    .filter(|solid| {
                        solid.rect.overlaps_x(&rect)
                            && solid.rect.top() >= rect.bottom() - physics.platform_drop_threshold
                            && solid.rect.top() - rect.bottom() <= reach
                    })
                    .min_by(|a, b| a.rect.top().total_cmp(&b.rect.top()));

                if let Some(ground) = ground {
                    dy = ground.rect.top() - rect.bottom();
                    body.grounded = Some(ground.entity);
                    body.speed_y = 0.0;
                } else {
                    // Tile layer без дискретных объектов
                    let cell = hit
                        .cells_with(CollisionTags::SOLID)
                        .filter(|cell| {
                            cell.rect.overlaps_x(&rect)
                                && cell.rect.top() >= rect.bottom() - physics.platform_drop_threshold
                                && cell.rect.top() - rect.bottom() <= reach
                        })
                        .min_by(|a, b| a.rect.top().total_cmp(&b.rect.top()).then(a.coord.cmp(&b.coord)));

                    if let Some(cell) = cell {
                        dy = cell.rect.top() - rect.bottom();
                        body.ground_cell = Some(cell.coord);
                        body.speed_y = 0.0;
                    }
                }
            }

            if body.is_grounded() {
                body.release_wall();
                body.ignore_platform = None;
            }
        }
    }

    collider.move_by(entity, slide_x, dy, index);
}

/// Wall slide disengage: нет стены на 1 unit в сторону facing → сброс
pub fn disengage_wall_slide(
    entity: Entity,
    collider: &Collider,
    body: &mut PhysicsBody,
    facing: Facing,
    index: &SpatialIndex,
) {
    if !body.is_wall_sliding() {
        return;
    }

    let rect = collider.rect;
    let step = facing.sign();
    let against = |other: &Aabb| {
        is_ahead(&rect, other, step)
            && rect.center_within_vertical_span(other)
            && contact_delta(&rect, other, step, 0.0).x.abs() <= 1.0
    };
    let touching = index
        .check(entity, step, 0.0, CollisionTags::SOLID)
        .map(|hit| {
            hit.objects_with(CollisionTags::SOLID).any(|solid| against(&solid.rect))
                || hit.cells_with(CollisionTags::SOLID).any(|cell| against(&cell.rect))
        })
        .unwrap_or(false);

    if !touching {
        body.release_wall();
    }
}

/// Полный проход resolver'а для одного entity
pub fn resolve_body(
    entity: Entity,
    collider: &mut Collider,
    body: &mut PhysicsBody,
    facing: Facing,
    index: &mut SpatialIndex,
    physics: &PhysicsConfig,
) {
    resolve_horizontal(entity, collider, body, index, physics);
    resolve_vertical(entity, collider, body, index, physics);
    disengage_wall_slide(entity, collider, body, facing, index);
}

/// Система: перемещение + контакты всех живых тел
pub fn resolve_collisions(
    mut bodies: Query<(Entity, &mut Collider, &mut PhysicsBody, Option<&Combatant>), Without<Death>>,
    mut index: ResMut<SpatialIndex>,
    config: Res<GameConfig>,
) {
    for (entity, mut collider, mut body, combatant) in bodies.iter_mut() {
        let facing = match combatant {
            Some(combatant) => combatant.facing,
            None if body.speed_x < 0.0 => Facing::Left,
            None => Facing::Right,
        };

        resolve_body(
            entity,
            &mut collider,
            &mut body,
            facing,
            &mut index,
            &config.physics,
        );
    }
}
