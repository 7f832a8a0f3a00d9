//! Spatial Index — grid-partitioned collision space
//!
//! Единственный shared mutable ресурс, который трогают несколько систем за тик.
//! Инварианты:
//! - каждая entity с `Collider` зарегистрирована ровно один раз (hooks в collider.rs)
//! - bucket'ы клеток всегда соответствуют текущему rect объекта (`set_rect`)
//!
//! Запросы:
//! - `check` — cell-level broadphase по смещённому прямоугольнику (кандидаты nearest-first)
//! - `overlapping` — точный AABB narrowphase

use bevy::prelude::*;
use std::collections::BTreeMap;

pub mod collider;
pub mod shape;

pub use collider::Collider;
pub use shape::{ramp_contact_top, Aabb, Shape, Slope};

#[cfg(test)]
mod spatial_tests;

/// Размер клетки по умолчанию (units)
pub const DEFAULT_CELL_SIZE: f32 = 16.0;

/// Категории коллизий (bit set)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Reflect)]
pub struct CollisionTags(u16);

impl CollisionTags {
    pub const NONE: Self = Self(0);
    pub const SOLID: Self = Self(1 << 0);
    pub const PLATFORM: Self = Self(1 << 1);
    pub const RAMP: Self = Self(1 << 2);
    pub const CHARACTER: Self = Self(1 << 3);
    pub const PLAYER: Self = Self(1 << 4);
    pub const ENEMY: Self = Self(1 << 5);
    pub const BOOMERANG: Self = Self(1 << 6);
    pub const FIRE: Self = Self(1 << 7);
    pub const HITBOX: Self = Self(1 << 8);
    pub const DEADZONE: Self = Self(1 << 9);
    pub const CHECKPOINT: Self = Self(1 << 10);

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Есть хотя бы один общий тег
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// Все теги `other` присутствуют
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl std::ops::BitOr for CollisionTags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl std::ops::BitOrAssign for CollisionTags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// Координаты клетки сетки
pub type CellCoord = (i32, i32);

/// Объект, зарегистрированный в индексе
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndexedObject {
    pub rect: Aabb,
    pub shape: Shape,
    pub tags: CollisionTags,
}

/// Кандидат из broadphase (копия на момент запроса)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionObject {
    pub entity: Entity,
    pub rect: Aabb,
    pub shape: Shape,
    pub tags: CollisionTags,
}

/// Клетка со статическими тегами (tile layer без дискретных объектов)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellHit {
    pub coord: CellCoord,
    pub rect: Aabb,
    pub tags: CollisionTags,
}

/// Результат `SpatialIndex::check`
#[derive(Debug, Clone, Default)]
pub struct Collision {
    pub dx: f32,
    pub dy: f32,
    /// Отсортированы nearest-first (ties по Entity)
    pub objects: Vec<CollisionObject>,
    pub cells: Vec<CellHit>,
}

impl Collision {
    pub fn objects_with(&self, tags: CollisionTags) -> impl Iterator<Item = &CollisionObject> {
        self.objects.iter().filter(move |o| o.tags.intersects(tags))
    }

    pub fn cells_with(&self, tags: CollisionTags) -> impl Iterator<Item = &CellHit> {
        self.cells.iter().filter(move |c| c.tags.intersects(tags))
    }
}

#[derive(Debug, Clone, Default)]
struct Cell {
    objects: Vec<Entity>,
    tags: CollisionTags,
}

/// Grid-partitioned collision space (Resource)
#[derive(Resource, Debug, Clone)]
pub struct SpatialIndex {
    cell_size: f32,
    cells: BTreeMap<CellCoord, Cell>,
    objects: BTreeMap<Entity, IndexedObject>,
}

impl Default for SpatialIndex {
    fn default() -> Self {
        Self::new(DEFAULT_CELL_SIZE)
    }
}

impl SpatialIndex {
    pub fn new(cell_size: f32) -> Self {
        let cell_size = if cell_size.is_finite() && cell_size > 0.0 {
            cell_size
        } else {
            DEFAULT_CELL_SIZE
        };

        Self {
            cell_size,
            cells: BTreeMap::new(),
            objects: BTreeMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.objects.contains_key(&entity)
    }

    pub fn get(&self, entity: Entity) -> Option<&IndexedObject> {
        self.objects.get(&entity)
    }

    /// Регистрирует (или перерегистрирует) объект
    pub fn insert(&mut self, entity: Entity, rect: Aabb, shape: Shape, tags: CollisionTags) {
        self.remove(entity);
        for coord in self.cells_covering(&rect) {
            self.cells.entry(coord).or_default().objects.push(entity);
        }
        self.objects.insert(entity, IndexedObject { rect, shape, tags });
    }

    /// Удаляет объект из всех клеток. Возвращает false если его не было.
    pub fn remove(&mut self, entity: Entity) -> bool {
        let Some(object) = self.objects.remove(&entity) else {
            return false;
        };

        for coord in self.cells_covering(&object.rect) {
            if let Some(cell) = self.cells.get_mut(&coord) {
                cell.objects.retain(|&e| e != entity);
                if cell.objects.is_empty() && cell.tags.is_empty() {
                    self.cells.remove(&coord);
                }
            }
        }
        true
    }

    /// Перемещение/ресайз: перекладываем bucket'ы только если изменился набор клеток
    pub fn set_rect(&mut self, entity: Entity, rect: Aabb) {
        let Some(object) = self.objects.get(&entity).copied() else {
            return;
        };

        let old_cells = self.cells_covering(&object.rect);
        let new_cells = self.cells_covering(&rect);

        if old_cells != new_cells {
            self.insert(entity, rect, object.shape, object.tags);
        } else if let Some(stored) = self.objects.get_mut(&entity) {
            stored.rect = rect;
        }
    }

    /// Помечает клетки под `rect` статическими тегами (tile layer)
    ///
    /// Правый/нижний край исключительно: tile (0, 0, 16, 16) = ровно одна клетка.
    pub fn tag_cells(&mut self, rect: &Aabb, tags: CollisionTags) {
        let x0 = (rect.left() / self.cell_size).floor() as i32;
        let y0 = (rect.top() / self.cell_size).floor() as i32;
        let x1 = ((rect.right() / self.cell_size).ceil() as i32 - 1).max(x0);
        let y1 = ((rect.bottom() / self.cell_size).ceil() as i32 - 1).max(y0);

        for cy in y0..=y1 {
            for cx in x0..=x1 {
                self.cells.entry((cx, cy)).or_default().tags |= tags;
            }
        }
    }

    pub fn cell_tags(&self, coord: CellCoord) -> CollisionTags {
        self.cells.get(&coord).map(|c| c.tags).unwrap_or_default()
    }

    pub fn cell_rect(&self, coord: CellCoord) -> Aabb {
        Aabb::new(
            coord.0 as f32 * self.cell_size,
            coord.1 as f32 * self.cell_size,
            self.cell_size,
            self.cell_size,
        )
    }

    /// Клетки, которых касается прямоугольник (правый/нижний край включительно)
    pub fn cells_covering(&self, rect: &Aabb) -> Vec<CellCoord> {
        let x0 = (rect.left() / self.cell_size).floor() as i32;
        let x1 = (rect.right() / self.cell_size).floor() as i32;
        let y0 = (rect.top() / self.cell_size).floor() as i32;
        let y1 = (rect.bottom() / self.cell_size).floor() as i32;

        let mut coords = Vec::with_capacity(((x1 - x0 + 1) * (y1 - y0 + 1)).max(0) as usize);
        for cy in y0..=y1 {
            for cx in x0..=x1 {
                coords.push((cx, cy));
            }
        }
        coords
    }

    /// Broadphase: что окажется в клетках entity после смещения на (dx, dy).
    ///
    /// None если ни объектов, ни помеченных клеток с тегами `filter` нет.
    pub fn check(&self, entity: Entity, dx: f32, dy: f32, filter: CollisionTags) -> Option<Collision> {
        let origin = self.objects.get(&entity)?.rect;
        let moved = origin.translated(dx, dy);

        let mut candidates: Vec<Entity> = Vec::new();
        let mut cells = Vec::new();

        for coord in self.cells_covering(&moved) {
            let Some(cell) = self.cells.get(&coord) else {
                continue;
            };

            if cell.tags.intersects(filter) {
                cells.push(CellHit {
                    coord,
                    rect: self.cell_rect(coord),
                    tags: cell.tags,
                });
            }

            for &other in &cell.objects {
                if other != entity && !candidates.contains(&other) {
                    candidates.push(other);
                }
            }
        }

        let center = origin.center();
        let mut objects: Vec<CollisionObject> = candidates
            .into_iter()
            .filter_map(|other| {
                let object = self.objects.get(&other)?;
                object.tags.intersects(filter).then_some(CollisionObject {
                    entity: other,
                    rect: object.rect,
                    shape: object.shape,
                    tags: object.tags,
                })
            })
            .collect();

        objects.sort_by(|a, b| {
            let da = a.rect.center().distance_squared(center);
            let db = b.rect.center().distance_squared(center);
            da.total_cmp(&db).then(a.entity.cmp(&b.entity))
        });

        if objects.is_empty() && cells.is_empty() {
            return None;
        }

        Some(Collision { dx, dy, objects, cells })
    }

    /// Narrowphase: объекты с тегами `filter`, строго пересекающие `rect`.
    ///
    /// Результат отсортирован по Entity (детерминированный порядок).
    pub fn overlapping(&self, rect: &Aabb, filter: CollisionTags, exclude: Option<Entity>) -> Vec<Entity> {
        let mut found: Vec<Entity> = Vec::new();

        for coord in self.cells_covering(rect) {
            let Some(cell) = self.cells.get(&coord) else {
                continue;
            };
            for &other in &cell.objects {
                if Some(other) == exclude || found.contains(&other) {
                    continue;
                }
                let Some(object) = self.objects.get(&other) else {
                    continue;
                };
                if object.tags.intersects(filter) && object.rect.intersects(rect) {
                    found.push(other);
                }
            }
        }

        found.sort();
        found
    }

    /// Горизонтальная коррекция при ударе головой о край помеченной клетки.
    ///
    /// Если соседняя клетка со стороны центра свободна и перекрытие не больше
    /// половины клетки — возвращает сдвиг по X, выводящий `mover` из-под клетки.
    pub fn slide_against_cell(&self, mover: &Aabb, cell: CellCoord, tags: CollisionTags) -> Option<f32> {
        let cell_rect = self.cell_rect(cell);
        let half = self.cell_size / 2.0;

        let (delta, neighbor) = if mover.center().x < cell_rect.center().x {
            (cell_rect.left() - mover.right(), (cell.0 - 1, cell.1))
        } else {
            (cell_rect.right() - mover.left(), (cell.0 + 1, cell.1))
        };

        if delta.abs() > half || self.cell_tags(neighbor).intersects(tags) {
            return None;
        }

        Some(delta)
    }
}

/// Сдвиг, после которого `mover` касается `other` краем вдоль оси движения
pub fn contact_delta(mover: &Aabb, other: &Aabb, dx: f32, dy: f32) -> Vec2 {
    let x = if dx > 0.0 {
        other.left() - mover.right()
    } else if dx < 0.0 {
        other.right() - mover.left()
    } else {
        0.0
    };

    let y = if dy > 0.0 {
        other.top() - mover.bottom()
    } else if dy < 0.0 {
        other.bottom() - mover.top()
    } else {
        0.0
    };

    Vec2::new(x, y)
}
