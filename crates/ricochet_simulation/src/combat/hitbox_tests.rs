//! Tests for hitbox pipeline (spawn, shared hit-sets, tracking, expiry).

#[cfg(test)]
mod tests {
    use bevy::ecs::system::RunSystemOnce;
    use bevy::prelude::*;

    use super::super::damage::{DamageEvent, DamageSource};
    use super::super::hitbox::{
        charge_bonus, expire_hitboxes, hitbox_rect, spawn_hitboxes, update_hitboxes, HitSets, Hitbox,
    };
    use crate::ai::{enemy_bundle, EnemyAI, EnemyState, EnemyType};
    use crate::components::{Combatant, Death, Facing, PhysicsBody, StateMachine};
    use crate::config::{GameConfig, HitboxShape};
    use crate::player::{player_bundle, MeleeAttack, PlayerState};
    use crate::spatial::{Aabb, Collider, CollisionTags, SpatialIndex};

    fn setup() -> World {
        let mut world = World::new();
        world.insert_resource(SpatialIndex::default());
        world.insert_resource(GameConfig::default());
        world.init_resource::<HitSets>();
        world.init_resource::<Events<DamageEvent>>();
        world
    }

    fn spawn_player(world: &mut World, x: f32, y: f32, state: PlayerState) -> Entity {
        let config = world.resource::<GameConfig>().clone();
        let player = world.spawn(player_bundle(Vec2::new(x, y), &config)).id();
        world
            .get_mut::<StateMachine<PlayerState>>(player)
            .unwrap()
            .transition(state);
        player
    }

    fn spawn_enemy(world: &mut World, x: f32, y: f32) -> Entity {
        let config = world.resource::<GameConfig>().clone();
        let enemy_type = EnemyType::resolve("guard", &config);
        world
            .spawn(enemy_bundle(Vec2::new(x, y), enemy_type, EnemyAI::new(x - 32.0, x + 32.0)))
            .id()
    }

    fn damage_events(world: &World) -> Vec<DamageEvent> {
        world
            .resource::<Events<DamageEvent>>()
            .iter_current_update_events()
            .copied()
            .collect()
    }

    fn hitbox_count(world: &mut World) -> usize {
        world.query::<&Hitbox>().iter(world).count()
    }

    fn run_pipeline(world: &mut World) {
        world.run_system_once(spawn_hitboxes).unwrap();
        world.run_system_once(update_hitboxes).unwrap();
    }

    #[test]
    fn test_jump_kick_hits_target_once() {
        let mut world = setup();
        let player = spawn_player(&mut world, 100.0, 100.0, PlayerState::AttackingJump);
        let enemy = spawn_enemy(&mut world, 120.0, 100.0);

        run_pipeline(&mut world);
        assert_eq!(hitbox_count(&mut world), 3);

        // Все три хитбокса пересекают врага, но hit-set общий
        let events = damage_events(&world);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].target, enemy);
        assert_eq!(events[0].attacker, Some(player));
        assert_eq!(events[0].amount, 22);
        assert_eq!(events[0].source, DamageSource::Melee);

        // Даже без неуязвимости тот же hit-set не бьёт повторно
        world.get_mut::<Combatant>(enemy).unwrap().invuln_frames = 0;
        world.run_system_once(update_hitboxes).unwrap();
        assert_eq!(damage_events(&world).len(), 1);
    }

    #[test]
    fn test_hit_applies_knockback_and_invulnerability() {
        let mut world = setup();
        spawn_player(&mut world, 100.0, 100.0, PlayerState::AttackingPunch);
        let enemy = spawn_enemy(&mut world, 118.0, 100.0);

        run_pipeline(&mut world);

        let config = GameConfig::default();
        let body = world.get::<PhysicsBody>(enemy).unwrap();
        assert_eq!(body.speed_x, config.attack("punch").knockback);
        assert_eq!(body.speed_y, -config.combat.knockback_lift);

        let combatant = world.get::<Combatant>(enemy).unwrap();
        assert_eq!(combatant.invuln_frames, config.enemy_type("guard").invuln_frames);
    }

    #[test]
    fn test_invulnerable_target_is_skipped() {
        let mut world = setup();
        spawn_player(&mut world, 100.0, 100.0, PlayerState::AttackingPunch);
        let enemy = spawn_enemy(&mut world, 118.0, 100.0);
        world.get_mut::<Combatant>(enemy).unwrap().invuln_frames = 5;

        run_pipeline(&mut world);

        assert!(damage_events(&world).is_empty());
        let hitbox = world.query::<&Hitbox>().single(&world).unwrap().clone();
        assert!(!world.resource::<HitSets>().contains(hitbox.hit_set, enemy));
    }

    #[test]
    fn test_spawn_happens_once_per_attack() {
        let mut world = setup();
        let player = spawn_player(&mut world, 100.0, 100.0, PlayerState::AttackingPunch);

        world.run_system_once(spawn_hitboxes).unwrap();
        world.run_system_once(spawn_hitboxes).unwrap();
        assert_eq!(hitbox_count(&mut world), 1);

        let combatant = world.get::<Combatant>(player).unwrap();
        assert!(combatant.hitbox_spawned);
        assert!(combatant.active_hitbox.is_some());
    }

    #[test]
    fn test_idle_player_spawns_nothing() {
        let mut world = setup();
        let player = spawn_player(&mut world, 100.0, 100.0, PlayerState::Idle);

        world.run_system_once(spawn_hitboxes).unwrap();

        assert_eq!(hitbox_count(&mut world), 0);
        assert!(!world.get::<Combatant>(player).unwrap().hitbox_spawned);
    }

    #[test]
    fn test_lifetime_expiry_clears_owner_and_hit_set() {
        let mut world = setup();
        let player = spawn_player(&mut world, 100.0, 100.0, PlayerState::AttackingJump);
        world.run_system_once(spawn_hitboxes).unwrap();
        assert_eq!(world.resource::<HitSets>().len(), 1);

        let lifetime = world.resource::<GameConfig>().combat.hitbox_lifetime;
        for _ in 0..lifetime - 1 {
            world.run_system_once(expire_hitboxes).unwrap();
        }
        assert_eq!(hitbox_count(&mut world), 3);

        world.run_system_once(expire_hitboxes).unwrap();
        assert_eq!(hitbox_count(&mut world), 0);
        assert!(world.resource::<HitSets>().is_empty());
        assert_eq!(world.get::<Combatant>(player).unwrap().active_hitbox, None);

        // Хитбоксы сняты и из индекса
        assert_eq!(world.resource::<SpatialIndex>().len(), 1);
    }

    #[test]
    fn test_hitbox_follows_owner() {
        let mut world = setup();
        let player = spawn_player(&mut world, 100.0, 100.0, PlayerState::AttackingPunch);
        world.run_system_once(spawn_hitboxes).unwrap();

        world.resource_scope(|world, mut index: Mut<SpatialIndex>| {
            let mut collider = world.get_mut::<Collider>(player).unwrap();
            collider.move_by(player, 50.0, -10.0, &mut index);
        });
        world.run_system_once(update_hitboxes).unwrap();

        let (hitbox, collider) = world.query::<(&Hitbox, &Collider)>().single(&world).unwrap();
        let owner = Aabb::new(150.0, 90.0, 16.0, 40.0);
        assert_eq!(collider.rect, hitbox_rect(&owner, Facing::Right, &hitbox.shape));
        assert_eq!(collider.rect.x, 166.0);
    }

    #[test]
    fn test_dying_owner_removes_hitbox_same_tick() {
        let mut world = setup();
        let player = spawn_player(&mut world, 100.0, 100.0, PlayerState::AttackingPunch);
        world.run_system_once(spawn_hitboxes).unwrap();

        world.entity_mut(player).insert(Death { timer: 60 });
        world.run_system_once(update_hitboxes).unwrap();
        world.run_system_once(expire_hitboxes).unwrap();

        assert_eq!(hitbox_count(&mut world), 0);
        assert!(world.resource::<HitSets>().is_empty());
    }

    #[test]
    fn test_charge_scales_damage_and_size() {
        let mut world = setup();
        let player = spawn_player(&mut world, 100.0, 100.0, PlayerState::AttackingPunch);
        world.get_mut::<MeleeAttack>(player).unwrap().charge_time = 60;

        world.run_system_once(spawn_hitboxes).unwrap();

        let hitbox = world.query::<&Hitbox>().single(&world).unwrap().clone();
        assert_eq!(hitbox.damage, 30);
        assert!((hitbox.knockback - 6.0).abs() < 1e-4);
        assert!((hitbox.shape.width - 40.0).abs() < 1e-4);
        assert!((hitbox.shape.height - 32.0).abs() < 1e-4);
    }

    #[test]
    fn test_enemy_attack_targets_player() {
        let mut world = setup();
        let player = spawn_player(&mut world, 80.0, 100.0, PlayerState::Idle);
        let enemy = spawn_enemy(&mut world, 100.0, 100.0);
        world
            .get_mut::<StateMachine<EnemyState>>(enemy)
            .unwrap()
            .transition(EnemyState::Attack);

        run_pipeline(&mut world);

        let hitbox = world.query::<&Hitbox>().single(&world).unwrap().clone();
        assert_eq!(hitbox.owner, enemy);
        assert_eq!(hitbox.targets, CollisionTags::PLAYER);

        let events = damage_events(&world);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].target, player);
        assert_eq!(events[0].amount, 10);
        // Враг смотрит влево, игрок слева → knockback влево
        assert!(events[0].knockback.x < 0.0);
    }

    #[test]
    fn test_hitbox_rect_mirrors_by_facing() {
        let owner = Aabb::new(100.0, 100.0, 16.0, 40.0);
        let shape = HitboxShape::new(20.0, 10.0, 4.0, 2.0);

        let right = hitbox_rect(&owner, Facing::Right, &shape);
        assert_eq!(right, Aabb::new(120.0, 117.0, 20.0, 10.0));

        let left = hitbox_rect(&owner, Facing::Left, &shape);
        assert_eq!(left, Aabb::new(76.0, 117.0, 20.0, 10.0));
    }

    #[test]
    fn test_charge_bonus() {
        assert_eq!(charge_bonus(0, 0.5), 1.0);
        assert_eq!(charge_bonus(4, 0.5), 3.0);
    }

    #[test]
    fn test_hit_sets_arena() {
        let mut sets = HitSets::default();
        let target = Entity::from_raw(7);

        let id = sets.allocate(2);
        assert!(sets.insert(id, target));
        assert!(!sets.insert(id, target));
        assert!(sets.contains(id, target));

        sets.release(id);
        assert!(sets.is_live(id));
        sets.release(id);
        assert!(!sets.is_live(id));
        assert!(!sets.contains(id, target));

        // Новый set не видит старых целей
        let next = sets.allocate(1);
        assert_ne!(next, id);
        assert!(!sets.contains(next, target));
    }
}
