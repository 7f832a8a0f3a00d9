//! Tests for SpatialIndex (buckets, broadphase, narrowphase, hooks).

use bevy::prelude::*;

use super::*;

fn entity(id: u32) -> Entity {
    Entity::from_raw(id)
}

#[test]
fn test_insert_remove_keeps_buckets_consistent() {
    let mut index = SpatialIndex::new(16.0);
    let e = entity(1);

    index.insert(e, Aabb::new(0.0, 0.0, 40.0, 8.0), Shape::Rect, CollisionTags::SOLID);
    assert!(index.contains(e));
    assert_eq!(index.len(), 1);

    // Прямоугольник 40 шириной касается клеток 0..=2 → виден из клетки (2, 0)
    let found = index.overlapping(&Aabb::new(36.0, 2.0, 4.0, 4.0), CollisionTags::SOLID, None);
    assert_eq!(found, vec![e]);

    assert!(index.remove(e));
    assert!(!index.remove(e));
    assert!(index.is_empty());
    assert!(index
        .overlapping(&Aabb::new(0.0, 0.0, 64.0, 64.0), CollisionTags::SOLID, None)
        .is_empty());
}

#[test]
fn test_set_rect_moves_between_cells() {
    let mut index = SpatialIndex::new(16.0);
    let e = entity(1);
    index.insert(e, Aabb::new(0.0, 0.0, 8.0, 8.0), Shape::Rect, CollisionTags::CHARACTER);

    index.set_rect(e, Aabb::new(100.0, 0.0, 8.0, 8.0));

    let probe_old = Aabb::new(0.0, 0.0, 8.0, 8.0);
    let probe_new = Aabb::new(100.0, 0.0, 8.0, 8.0);
    assert!(index.overlapping(&probe_old, CollisionTags::CHARACTER, None).is_empty());
    assert_eq!(index.overlapping(&probe_new, CollisionTags::CHARACTER, None), vec![e]);
    assert_eq!(index.get(e).map(|o| o.rect.x), Some(100.0));
}

#[test]
fn test_check_filters_by_tag_and_sorts_nearest_first() {
    let mut index = SpatialIndex::new(16.0);
    let mover = entity(1);
    let far_wall = entity(2);
    let near_wall = entity(3);
    let platform = entity(4);

    index.insert(mover, Aabb::new(0.0, 0.0, 16.0, 16.0), Shape::Rect, CollisionTags::CHARACTER);
    index.insert(far_wall, Aabb::new(30.0, 0.0, 8.0, 16.0), Shape::Rect, CollisionTags::SOLID);
    index.insert(near_wall, Aabb::new(18.0, 0.0, 8.0, 16.0), Shape::Rect, CollisionTags::SOLID);
    index.insert(platform, Aabb::new(18.0, 14.0, 16.0, 2.0), Shape::Rect, CollisionTags::PLATFORM);

    let collision = index
        .check(mover, 16.0, 0.0, CollisionTags::SOLID)
        .expect("walls in range");

    let order: Vec<Entity> = collision.objects.iter().map(|o| o.entity).collect();
    assert_eq!(order, vec![near_wall, far_wall]);
    assert!(collision.objects_with(CollisionTags::PLATFORM).next().is_none());
}

#[test]
fn test_check_excludes_self_and_reports_nothing_in_empty_space() {
    let mut index = SpatialIndex::new(16.0);
    let mover = entity(1);
    index.insert(mover, Aabb::new(0.0, 0.0, 16.0, 16.0), Shape::Rect, CollisionTags::SOLID);

    assert!(index.check(mover, 0.0, 0.0, CollisionTags::SOLID).is_none());
    assert!(index.check(entity(99), 0.0, 0.0, CollisionTags::SOLID).is_none());
}

#[test]
fn test_tagged_cells_reported_by_check() {
    let mut index = SpatialIndex::new(16.0);
    let mover = entity(1);
    index.insert(mover, Aabb::new(4.0, 40.0, 8.0, 8.0), Shape::Rect, CollisionTags::CHARACTER);
    index.tag_cells(&Aabb::new(0.0, 16.0, 15.0, 15.0), CollisionTags::SOLID);

    let collision = index
        .check(mover, 0.0, -16.0, CollisionTags::SOLID)
        .expect("solid cell above");
    assert_eq!(collision.cells_with(CollisionTags::SOLID).count(), 1);
    assert_eq!(collision.cells[0].coord, (0, 1));
}

#[test]
fn test_slide_against_cell() {
    let mut index = SpatialIndex::new(16.0);
    index.tag_cells(&Aabb::new(16.0, 0.0, 15.0, 15.0), CollisionTags::SOLID);

    // Задевает левый край клетки (1, 0) на 4 единицы → сдвиг влево
    let mover = Aabb::new(4.0, 16.0, 16.0, 32.0);
    assert_eq!(index.slide_against_cell(&mover, (1, 0), CollisionTags::SOLID), Some(-4.0));

    // Соседняя клетка тоже твёрдая → скольжения нет
    index.tag_cells(&Aabb::new(0.0, 0.0, 15.0, 15.0), CollisionTags::SOLID);
    assert_eq!(index.slide_against_cell(&mover, (1, 0), CollisionTags::SOLID), None);
}

#[test]
fn test_contact_delta() {
    let mover = Aabb::new(0.0, 0.0, 16.0, 40.0);
    let wall = Aabb::new(26.0, 0.0, 16.0, 64.0);
    assert_eq!(contact_delta(&mover, &wall, 6.0, 0.0), Vec2::new(10.0, 0.0));

    let floor = Aabb::new(0.0, 41.0, 64.0, 16.0);
    assert_eq!(contact_delta(&mover, &floor, 0.0, 2.0), Vec2::new(0.0, 1.0));
}

#[test]
fn test_collider_hooks_register_and_unregister() {
    let mut world = World::new();
    world.init_resource::<SpatialIndex>();

    let e = world
        .spawn(Collider::new(Aabb::new(0.0, 0.0, 16.0, 16.0), CollisionTags::SOLID))
        .id();
    assert!(world.resource::<SpatialIndex>().contains(e));

    // Replace: индекс видит новый rect
    world
        .entity_mut(e)
        .insert(Collider::new(Aabb::new(64.0, 0.0, 16.0, 16.0), CollisionTags::SOLID));
    assert_eq!(
        world.resource::<SpatialIndex>().get(e).map(|o| o.rect.x),
        Some(64.0)
    );

    world.despawn(e);
    assert!(!world.resource::<SpatialIndex>().contains(e));
    assert!(world.resource::<SpatialIndex>().is_empty());
}
