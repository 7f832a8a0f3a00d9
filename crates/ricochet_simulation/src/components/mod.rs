//! ECS Components, общие для всех подсистем
//!
//! Организация по доменам:
//! - actor: здоровье, жизни, смерть, боевая способность (Combatant)
//! - movement: скорость и контактные ссылки (PhysicsBody)
//! - state: общая state machine игрока и врагов
//! - world: статичная геометрия и триггер-зоны
//!
//! Компоненты конкретных подсистем (Player, EnemyAI, Hitbox, Boomerang)
//! живут в своих модулях.

pub mod actor;
pub mod movement;
pub mod state;
pub mod world;

// Re-exports для удобного импорта
pub use actor::*;
pub use movement::*;
pub use state::*;
pub use world::*;
