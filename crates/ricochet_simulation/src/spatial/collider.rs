//! Collider component — позиция/форма/теги entity в мире.
//!
//! Регистрируется в `SpatialIndex` через component hooks:
//! - on_insert: insert в индекс
//! - on_replace (replace, remove, despawn): remove из индекса
//!
//! Мутация rect через `&mut Collider` hooks НЕ вызывает — для перемещения
//! используем `move_by` / `set_rect`, они обновляют индекс синхронно.

use bevy::ecs::component::HookContext;
use bevy::ecs::world::DeferredWorld;
use bevy::prelude::*;

use super::{Aabb, CollisionTags, Shape, Slope, SpatialIndex};

#[derive(Component, Debug, Clone, Copy, PartialEq, Reflect)]
#[reflect(Component)]
#[component(on_insert = register_collider, on_replace = unregister_collider)]
pub struct Collider {
    pub rect: Aabb,
    pub shape: Shape,
    pub tags: CollisionTags,
}

impl Collider {
    pub fn new(rect: Aabb, tags: CollisionTags) -> Self {
        Self {
            rect,
            shape: Shape::Rect,
            tags,
        }
    }

    pub fn ramp(rect: Aabb, slope: Slope) -> Self {
        Self {
            rect,
            shape: Shape::Ramp(slope),
            tags: CollisionTags::RAMP,
        }
    }

    pub fn center(&self) -> Vec2 {
        self.rect.center()
    }

    pub fn move_by(&mut self, entity: Entity, dx: f32, dy: f32, index: &mut SpatialIndex) {
        if dx == 0.0 && dy == 0.0 {
            return;
        }
        self.set_rect(entity, self.rect.translated(dx, dy), index);
    }

    pub fn set_rect(&mut self, entity: Entity, rect: Aabb, index: &mut SpatialIndex) {
        self.rect = rect;
        index.set_rect(entity, rect);
    }
}

fn register_collider(mut world: DeferredWorld, context: HookContext) {
    let Some(collider) = world.get::<Collider>(context.entity).copied() else {
        return;
    };

    if let Some(mut index) = world.get_resource_mut::<SpatialIndex>() {
        index.insert(context.entity, collider.rect, collider.shape, collider.tags);
    }
}

fn unregister_collider(mut world: DeferredWorld, context: HookContext) {
    if let Some(mut index) = world.get_resource_mut::<SpatialIndex>() {
        index.remove(context.entity);
    }
}
