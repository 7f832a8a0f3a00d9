//! Physics Integrator
//!
//! Friction → speed clamp → gravity → wall slide cap.
//! Ничего не двигает: позицию меняет только Collision Resolver.
//! Один тик = один вызов, без sub-stepping.

use bevy::prelude::*;

use crate::components::{Death, PhysicsBody};
use crate::config::GameConfig;

/// Один шаг интеграции скорости
pub fn integrate(body: &mut PhysicsBody, wall_slide_speed: f32) {
    let friction = if body.attack_friction_active {
        body.attack_friction
    } else {
        body.friction
    };

    if body.speed_x > friction {
        body.speed_x -= friction;
    } else if body.speed_x < -friction {
        body.speed_x += friction;
    } else {
        body.speed_x = 0.0;
    }

    body.speed_x = body.speed_x.clamp(-body.max_speed, body.max_speed);

    body.speed_y += body.gravity;
    if body.is_wall_sliding() && body.speed_y > wall_slide_speed {
        body.speed_y = wall_slide_speed;
    }
}

/// Система: интеграция скорости всех живых тел
pub fn integrate_velocity(
    mut bodies: Query<&mut PhysicsBody, Without<Death>>,
    config: Res<GameConfig>,
) {
    let wall_slide_speed = config.physics.wall_slide_speed;
    for mut body in bodies.iter_mut() {
        integrate(&mut body, wall_slide_speed);
    }
}
